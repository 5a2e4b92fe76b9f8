//! Runtime settings: built-in defaults, overridden by an optional TOML file and
//! then by `WEATHER_*` environment variables.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::utils::constants::{
    DEFAULT_BASE_URL, DEFAULT_DATABASE, DEFAULT_EARLIEST_YEAR, DEFAULT_LOCATION,
    DEFAULT_STATION_ID, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, MAX_COLUMN, MEAN_COLUMN,
    MIN_COLUMN,
};

/// How a data cell with no parseable number is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// Store `0.0`. Lossy, but what downstream consumers have always received.
    #[default]
    Zero,
    /// Store no value.
    Null,
}

impl MissingValuePolicy {
    pub fn resolve(self, parsed: Option<f64>) -> Option<f64> {
        match (parsed, self) {
            (Some(value), _) => Some(value),
            (None, MissingValuePolicy::Zero) => Some(0.0),
            (None, MissingValuePolicy::Null) => None,
        }
    }
}

/// Which zero-based data-cell of a day row carries each temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_distinct_columns"))]
pub struct ColumnMap {
    #[validate(range(max = 32))]
    pub max: usize,
    #[validate(range(max = 32))]
    pub min: usize,
    #[validate(range(max = 32))]
    pub mean: usize,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            max: MAX_COLUMN,
            min: MIN_COLUMN,
            mean: MEAN_COLUMN,
        }
    }
}

fn validate_distinct_columns(columns: &ColumnMap) -> std::result::Result<(), ValidationError> {
    if columns.max == columns.min || columns.max == columns.mean || columns.min == columns.mean {
        return Err(ValidationError::new("columns_not_distinct"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    pub station_id: u32,

    #[validate(length(min = 1))]
    pub base_url: String,

    #[validate(length(min = 1))]
    pub location: String,

    pub database: PathBuf,

    #[validate(range(min = 1800, max = 2100))]
    pub earliest_year: i32,

    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,

    #[validate(length(min = 1))]
    pub user_agent: String,

    #[validate(nested)]
    pub columns: ColumnMap,

    pub missing_values: MissingValuePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            station_id: DEFAULT_STATION_ID,
            base_url: DEFAULT_BASE_URL.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            database: PathBuf::from(DEFAULT_DATABASE),
            earliest_year: DEFAULT_EARLIEST_YEAR,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            columns: ColumnMap::default(),
            missing_values: MissingValuePolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the environment, then validate.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("WEATHER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
