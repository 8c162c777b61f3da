//! Forecast feed client.
//!
//! One GET per run, with an explicit timeout and no retry. Transport errors,
//! non-2xx answers and undecodable bodies are all reported as [`FetchError`].

use reqwest::Client;
use tracing::{info, instrument, warn};

use crate::config::FeedConfig;
use crate::error::FetchError;
use crate::feed::ForecastFeed;

/// Longest slice of an error body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 512;

pub struct FeedClient {
    client: Client,
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self, FetchError> {
        if config.accept_invalid_certs {
            warn!(url = %config.url, "TLS certificate validation disabled for forecast feed");
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, config })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Retrieve and decode the feed.
    #[instrument(skip(self), fields(url = %self.config.url))]
    pub async fn fetch(&self) -> Result<ForecastFeed, FetchError> {
        let mut request = self.client.get(&self.config.url);
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("Authorization", key)]);
        }

        let response = request.send().await.map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        let body = response.bytes().await.map_err(FetchError::Request)?;
        let feed: ForecastFeed = serde_json::from_slice(&body)?;

        info!(
            bytes = body.len(),
            locations = feed.locations().len(),
            "Fetched forecast feed"
        );
        Ok(feed)
    }
}

fn truncate(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_string();
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
