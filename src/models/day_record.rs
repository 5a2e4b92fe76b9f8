use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical date format used by the store and exports.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Max/min/mean triple for one day. Serialized with the `Max`/`Min`/`Mean` keys
/// used by the exported mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperatures {
    #[serde(rename = "Max")]
    pub max: Option<f64>,
    #[serde(rename = "Min")]
    pub min: Option<f64>,
    #[serde(rename = "Mean")]
    pub mean: Option<f64>,
}

impl DailyTemperatures {
    pub fn new(max: Option<f64>, min: Option<f64>, mean: Option<f64>) -> Self {
        Self { max, min, mean }
    }

    pub fn is_complete(&self) -> bool {
        self.max.is_some() && self.min.is_some() && self.mean.is_some()
    }
}

/// One calendar day's observation as produced by the table parser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub mean_temp: Option<f64>,
}

impl DayRecord {
    pub fn new(
        date: NaiveDate,
        max_temp: Option<f64>,
        min_temp: Option<f64>,
        mean_temp: Option<f64>,
    ) -> Self {
        Self {
            date,
            max_temp,
            min_temp,
            mean_temp,
        }
    }

    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn temperatures(&self) -> DailyTemperatures {
        DailyTemperatures::new(self.max_temp, self.min_temp, self.mean_temp)
    }
}

impl From<(NaiveDate, DailyTemperatures)> for DayRecord {
    fn from((date, temps): (NaiveDate, DailyTemperatures)) -> Self {
        Self::new(date, temps.max, temps.min, temps.mean)
    }
}
