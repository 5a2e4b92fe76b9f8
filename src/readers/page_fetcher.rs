use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::models::YearMonth;
use crate::settings::Settings;

/// Anything that can hand over the raw markup of one month page.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch(&self, month: YearMonth) -> Result<String, FetchError>;
}

/// Fetches month pages over HTTP, one GET per page.
pub struct HttpPageFetcher {
    client: Client,
    base_url: String,
    station_id: u32,
    start_year: i32,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|source| FetchError::Request {
                url: settings.base_url.clone(),
                source,
            })?;

        Ok(Self::with_client(client, settings))
    }

    /// Use a preconfigured client. The client's own timeout is what bounds
    /// each request; `settings` only supplies the value reported on expiry.
    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.base_url.clone(),
            station_id: settings.station_id,
            start_year: settings.earliest_year,
            timeout: settings.request_timeout(),
        }
    }

    pub fn query(&self, month: YearMonth) -> Vec<(&'static str, String)> {
        vec![
            ("StationID", self.station_id.to_string()),
            ("timeframe", "2".to_string()),
            ("StartYear", self.start_year.to_string()),
            ("EndYear", month.year.to_string()),
            ("Day", "1".to_string()),
            ("Year", month.year.to_string()),
            ("Month", month.month.to_string()),
        ]
    }

    fn request_error(&self, url: String, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                url,
                timeout: self.timeout,
            }
        } else {
            FetchError::Request { url, source }
        }
    }
}

impl PageSource for HttpPageFetcher {
    async fn fetch(&self, month: YearMonth) -> Result<String, FetchError> {
        let request = self
            .client
            .get(&self.base_url)
            .query(&self.query(month))
            .build()
            .map_err(|source| FetchError::Request {
                url: self.base_url.clone(),
                source,
            })?;
        let url = request.url().to_string();
        debug!(%url, "Fetching page");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.request_error(url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "HTTP error");
            return Err(FetchError::Status { url, status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.request_error(url.clone(), e))?;
        debug!(%url, bytes = body.len(), "Fetched page");

        Ok(body)
    }
}
