//! Brokerage chain API client.
//!
//! Thin fetch layer: one rate-limited GET per symbol returning the raw
//! chain document. Parsing and screening happen elsewhere, so a slow or
//! failing symbol costs the batch nothing but a log line.

use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use thiserror::Error;

use super::raw::RawOptionChain;

/// Minimum interval between requests. The API allows 120 calls/minute;
/// 600ms keeps a full watchlist well under it.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(600);

/// Per-request timeout so one slow symbol cannot stall a batch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Chain API errors.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Rate-limited option-chain client.
pub struct ChainClient {
    client: Client,
    base_url: String,
    token: String,
    last_request: Instant,
    request_count: u64,
}

impl ChainClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
            last_request: Instant::now() - MIN_REQUEST_INTERVAL,
            request_count: 0,
        }
    }

    /// Requests issued over this client's lifetime.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Fetch the raw chain document for one symbol, with expirations up to
    /// `horizon_days` ahead.
    pub async fn get_option_chain(
        &mut self,
        symbol: &str,
        horizon_days: i64,
    ) -> Result<RawOptionChain, ClientError> {
        let elapsed = self.last_request.elapsed();
        if elapsed < MIN_REQUEST_INTERVAL {
            tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
        }

        let to_date = (Utc::now() + ChronoDuration::days(horizon_days))
            .format("%Y-%m-%d")
            .to_string();

        let url = format!("{}/marketdata/chains", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("symbol", symbol),
                ("strategy", "SINGLE"),
                ("range", "OTM"),
                ("toDate", &to_date),
                ("includeQuotes", "TRUE"),
            ])
            .send()
            .await?;

        self.last_request = Instant::now();
        self.request_count += 1;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}
