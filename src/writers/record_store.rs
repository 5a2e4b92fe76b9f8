use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{DayRecord, WeatherDataset, DATE_FORMAT};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS weather (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    sample_date TEXT NOT NULL,
    location TEXT NOT NULL,
    min_temp REAL,
    max_temp REAL,
    avg_temp REAL,
    UNIQUE (sample_date, location)
);

CREATE INDEX IF NOT EXISTS idx_weather_sample_date ON weather(sample_date);
"#;

/// SQLite-backed store. A `(date, location)` pair is written at most once;
/// later writes for the same pair are ignored, never merged.
pub struct RecordStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl RecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened database");

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        debug!("Database schema ready");
        Ok(())
    }

    /// Delete every row, returning how many were removed.
    pub fn purge(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM weather", [])?;
        info!(removed, "Database purged");
        Ok(removed)
    }

    /// Insert each day not yet stored for `location`, in one transaction.
    /// Returns the number of rows actually inserted.
    pub fn upsert_many(&mut self, dataset: &WeatherDataset, location: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let inserted = insert_days(&tx, dataset, location)?;
        tx.commit()?;

        info!(
            offered = dataset.len(),
            inserted,
            location,
            "Database insert completed"
        );
        Ok(inserted)
    }

    /// Delete every row and store `dataset` in its place. Both happen in one
    /// transaction: if the insert fails, the previous rows are kept.
    pub fn replace_all(&mut self, dataset: &WeatherDataset, location: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM weather", [])?;
        let inserted = insert_days(&tx, dataset, location)?;
        tx.commit()?;

        info!(removed, inserted, location, "Database contents replaced");
        Ok(inserted)
    }

    /// Every stored day, regardless of location.
    pub fn read_all(&self) -> Result<WeatherDataset> {
        let mut stmt = self.conn.prepare(
            "SELECT sample_date, max_temp, min_temp, avg_temp
             FROM weather
             ORDER BY sample_date DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut dataset = WeatherDataset::new();
        for (date, max, min, mean) in rows {
            let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)?;
            dataset.insert(DayRecord::new(date, max, min, mean));
        }

        debug!(rows = dataset.len(), "Read stored days");
        Ok(dataset)
    }

    pub fn latest_date(&self) -> Result<Option<NaiveDate>> {
        let latest: Option<String> = self
            .conn
            .query_row("SELECT MAX(sample_date) FROM weather", [], |row| row.get(0))
            .optional()?
            .flatten();

        latest
            .map(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT))
            .transpose()
            .map_err(Into::into)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM weather", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn store_info(&self) -> Result<StoreInfo> {
        let locations: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT location) FROM weather", [], |row| {
                    row.get(0)
                })?;
        let earliest: Option<String> = self
            .conn
            .query_row("SELECT MIN(sample_date) FROM weather", [], |row| row.get(0))?;

        Ok(StoreInfo {
            path: self.path.clone(),
            total_rows: self.count()?,
            locations: locations as usize,
            earliest,
            latest: self.latest_date()?.map(|d| d.format(DATE_FORMAT).to_string()),
        })
    }
}

fn insert_days(tx: &Transaction<'_>, dataset: &WeatherDataset, location: &str) -> Result<usize> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR IGNORE INTO weather
            (sample_date, location, min_temp, max_temp, avg_temp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    let mut inserted = 0;
    for record in dataset.iter_recent_first() {
        inserted += stmt.execute(params![
            record.date_key(),
            location,
            record.min_temp,
            record.max_temp,
            record.mean_temp,
        ])?;
    }
    Ok(inserted)
}

#[derive(Debug, Clone)]
pub struct StoreInfo {
    pub path: Option<PathBuf>,
    pub total_rows: usize,
    pub locations: usize,
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

impl StoreInfo {
    pub fn summary(&self) -> String {
        format!(
            "Database Summary:\n\
            - Path: {}\n\
            - Total rows: {}\n\
            - Locations: {}\n\
            - First recorded date: {}\n\
            - Last recorded date: {}",
            self.path
                .as_ref()
                .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string()),
            self.total_rows,
            self.locations,
            self.earliest.as_deref().unwrap_or("-"),
            self.latest.as_deref().unwrap_or("-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dataset(days: &[(u32, f64)]) -> WeatherDataset {
        days.iter()
            .map(|(d, mean)| {
                DayRecord::new(
                    NaiveDate::from_ymd_opt(2024, 8, *d).unwrap(),
                    Some(mean + 5.0),
                    Some(mean - 5.0),
                    Some(*mean),
                )
            })
            .collect()
    }

    #[test]
    fn test_upsert_is_insert_or_ignore() -> Result<()> {
        let mut store = RecordStore::open_in_memory()?;

        assert_eq!(store.upsert_many(&dataset(&[(1, 10.0), (2, 11.0)]), "Winnipeg, MB")?, 2);
        // Day 2 already stored: skipped, not overwritten
        assert_eq!(store.upsert_many(&dataset(&[(2, 99.0), (3, 12.0)]), "Winnipeg, MB")?, 1);

        let stored = store.read_all()?;
        assert_eq!(stored.len(), 3);
        let day2 = NaiveDate::from_ymd_opt(2024, 8, 2).unwrap();
        assert_eq!(stored.get(&day2).unwrap().mean, Some(11.0));
        Ok(())
    }

    #[test]
    fn test_same_date_other_location_is_stored() -> Result<()> {
        let mut store = RecordStore::open_in_memory()?;
        store.upsert_many(&dataset(&[(1, 10.0)]), "Winnipeg, MB")?;
        let inserted = store.upsert_many(&dataset(&[(1, 10.0)]), "Brandon, MB")?;

        assert_eq!(inserted, 1);
        assert_eq!(store.count()?, 2);
        assert_eq!(store.store_info()?.locations, 2);
        Ok(())
    }

    #[test]
    fn test_latest_date_and_purge() -> Result<()> {
        let mut store = RecordStore::open_in_memory()?;
        assert_eq!(store.latest_date()?, None);

        store.upsert_many(&dataset(&[(4, 1.0), (9, 2.0), (7, 3.0)]), "Winnipeg, MB")?;
        assert_eq!(store.latest_date()?, NaiveDate::from_ymd_opt(2024, 8, 9));

        assert_eq!(store.purge()?, 3);
        assert_eq!(store.count()?, 0);
        Ok(())
    }

    #[test]
    fn test_null_fields_round_trip() -> Result<()> {
        let mut store = RecordStore::open_in_memory()?;
        let date = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let partial: WeatherDataset = [DayRecord::new(date, None, Some(-3.5), None)]
            .into_iter()
            .collect();

        store.upsert_many(&partial, "Winnipeg, MB")?;
        let stored = store.read_all()?;

        assert_eq!(stored.get(&date).unwrap().max, None);
        assert_eq!(stored.get(&date).unwrap().min, Some(-3.5));
        Ok(())
    }

    #[test]
    fn test_replace_all_swaps_contents() -> Result<()> {
        let mut store = RecordStore::open_in_memory()?;
        store.upsert_many(&dataset(&[(1, 10.0), (2, 11.0), (3, 12.0)]), "Winnipeg, MB")?;

        let inserted = store.replace_all(&dataset(&[(2, 20.0), (9, 21.0)]), "Winnipeg, MB")?;

        assert_eq!(inserted, 2);
        assert_eq!(store.count()?, 2);
        let stored = store.read_all()?;
        let day2 = NaiveDate::from_ymd_opt(2024, 8, 2).unwrap();
        assert_eq!(stored.get(&day2).unwrap().mean, Some(20.0));
        Ok(())
    }

    #[test]
    fn test_failed_replace_keeps_previous_rows() -> Result<()> {
        let mut store = RecordStore::open_in_memory()?;
        store.upsert_many(&dataset(&[(1, 10.0), (2, 11.0)]), "Winnipeg, MB")?;
        store.conn.execute_batch(
            "CREATE TRIGGER reject_day BEFORE INSERT ON weather
             WHEN NEW.sample_date = '2024-08-05'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )?;

        let result = store.replace_all(&dataset(&[(4, 1.0), (5, 2.0)]), "Winnipeg, MB");

        assert!(result.is_err());
        assert_eq!(store.count()?, 2);
        assert_eq!(store.latest_date()?, NaiveDate::from_ymd_opt(2024, 8, 2));
        Ok(())
    }

    #[test]
    fn test_file_store_persists() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("data").join("weather.sqlite");

        {
            let mut store = RecordStore::open(&path)?;
            store.upsert_many(&dataset(&[(1, 10.0)]), "Winnipeg, MB")?;
        }

        let store = RecordStore::open(&path)?;
        assert_eq!(store.count()?, 1);
        assert!(store.store_info()?.summary().contains("Total rows: 1"));
        Ok(())
    }
}
