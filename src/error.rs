use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Logging setup error: {0}")]
    Logging(String),

    #[error("Chart rendering error: {0}")]
    Chart(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Walk stopped after {pages} pages ({days} days collected); nothing was written")]
    IncompleteWalk {
        pages: usize,
        days: usize,
        #[source]
        source: FetchError,
    },
}

/// Failure to obtain one month page. Fatal to the walk that issued it.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed for {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request for {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("HTTP request failed for {url} with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// For [`PageSource`](crate::readers::PageSource) implementors backed by a
    /// fixed set of pages, such as a local cache. The HTTP fetcher reports an
    /// absent month through `Status`.
    #[error("No page available for {year}-{month:02}")]
    Missing { year: i32, month: u32 },
}

/// Diagnostics recovered inside the table parser. Never propagated out of a page.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unrecognized date marker '{value}': {source}")]
    MarkerDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Non-numeric text '{text}' in data column {column}")]
    Cell { column: usize, text: String },
}
