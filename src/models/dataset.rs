use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

use super::day_record::{DailyTemperatures, DayRecord};

/// Date-keyed collection of daily temperatures, iterated most recent first.
///
/// Grows monotonically during a scrape: a date, once present, is never replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherDataset {
    days: BTreeMap<NaiveDate, DailyTemperatures>,
}

impl WeatherDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its date is already present. Returns whether it was added.
    pub fn insert(&mut self, record: DayRecord) -> bool {
        if self.days.contains_key(&record.date) {
            return false;
        }
        self.days.insert(record.date, record.temperatures());
        true
    }

    /// Insert every record not yet present, returning how many were added.
    pub fn extend_new<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = DayRecord>,
    {
        records
            .into_iter()
            .filter(|record| self.insert(*record))
            .count()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&DailyTemperatures> {
        self.days.get(date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    /// Drop every record dated on or before `date`.
    pub fn retain_after(&mut self, date: NaiveDate) {
        self.days = self.days.split_off(&date.succ_opt().unwrap_or(date));
        self.days.remove(&date);
    }

    /// Most recent first.
    pub fn iter_recent_first(&self) -> impl Iterator<Item = DayRecord> + '_ {
        self.days
            .iter()
            .rev()
            .map(|(date, temps)| DayRecord::from((*date, *temps)))
    }

    /// Oldest first.
    pub fn iter_chronological(&self) -> impl Iterator<Item = DayRecord> + '_ {
        self.days
            .iter()
            .map(|(date, temps)| DayRecord::from((*date, *temps)))
    }
}

impl FromIterator<DayRecord> for WeatherDataset {
    fn from_iter<I: IntoIterator<Item = DayRecord>>(iter: I) -> Self {
        let mut dataset = Self::new();
        dataset.extend_new(iter);
        dataset
    }
}

impl Serialize for WeatherDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (date, temps) in self.days.iter().rev() {
            map.serialize_entry(date, temps)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    #[test]
    fn test_insert_never_overwrites() {
        let mut dataset = WeatherDataset::new();
        assert!(dataset.insert(DayRecord::new(day(1), Some(20.0), Some(10.0), Some(15.0))));
        assert!(!dataset.insert(DayRecord::new(day(1), Some(99.0), Some(99.0), Some(99.0))));

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.get(&day(1)).unwrap().max, Some(20.0));
    }

    #[test]
    fn test_recency_order() {
        let dataset: WeatherDataset = [2, 5, 1]
            .into_iter()
            .map(|d| DayRecord::new(day(d), None, None, Some(d as f64)))
            .collect();

        let dates: Vec<_> = dataset.iter_recent_first().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(5), day(2), day(1)]);
        assert_eq!(dataset.latest_date(), Some(day(5)));
        assert_eq!(dataset.earliest_date(), Some(day(1)));
    }

    #[test]
    fn test_retain_after_is_strict() {
        let mut dataset: WeatherDataset = (1..=5)
            .map(|d| DayRecord::new(day(d), None, None, None))
            .collect();

        dataset.retain_after(day(3));

        let dates: Vec<_> = dataset.iter_chronological().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(4), day(5)]);
    }

    #[test]
    fn test_serializes_recent_first() {
        let dataset: WeatherDataset = [1, 2]
            .into_iter()
            .map(|d| DayRecord::new(day(d), Some(1.0), Some(0.0), Some(0.5)))
            .collect();

        let json = serde_json::to_string(&dataset).unwrap();
        assert!(json.starts_with(r#"{"2024-08-02":{"Max":1.0"#));
    }
}
