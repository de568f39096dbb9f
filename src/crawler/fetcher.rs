//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Bounded retry with exponential backoff for transient failures
//! - Error classification

use crate::config::UserAgentConfig;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Upper bound on a single retry wait
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// Page body content
        body: String,
    },

    /// Non-transient HTTP error status; not retried
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Transient failures persisted through every retry
    Exhausted {
        /// Total attempts made
        attempts: u32,
        /// Description of the last failure
        last_error: String,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use bead_harvest::config::UserAgentConfig;
/// use bead_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "BeadHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Statuses worth another attempt
fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

/// One attempt's verdict
enum Attempt {
    Done(FetchOutcome),
    Retry(String),
}

/// Sequential fetcher with bounded retries
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx | Success |
/// | 408, 429, any 5xx | Retry with backoff |
/// | Timeout, connection failure | Retry with backoff |
/// | Other status | Immediate HttpError |
///
/// The wait before retry `n` is `backoff * 2^(n-1)`.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    backoff: Duration,
}

impl Fetcher {
    pub fn new(client: Client, max_retries: u32, backoff: Duration) -> Self {
        Self {
            client,
            max_retries,
            backoff,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Wait before attempt `attempt` (2-based), capped at [`MAX_BACKOFF`]
    fn retry_wait(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(2)))
            .min(MAX_BACKOFF)
    }

    /// Fetches a URL, retrying transient failures
    pub async fn fetch(&self, url: &Url) -> FetchOutcome {
        let attempts = self.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                let wait = self.retry_wait(attempt);
                warn!(
                    url = %url,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %last_error,
                    "Retrying fetch"
                );
                tokio::time::sleep(wait).await;
            }

            match self.attempt(url).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retry(error) => last_error = error,
            }
        }

        FetchOutcome::Exhausted {
            attempts,
            last_error,
        }
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Attempt::Retry("request timeout".to_string()),
            Err(e) if e.is_connect() => return Attempt::Retry(format!("connection failed: {}", e)),
            Err(e) => return Attempt::Retry(e.to_string()),
        };

        let status = response.status();
        if is_transient_status(status) {
            return Attempt::Retry(format!("HTTP {}", status.as_u16()));
        }
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Permanent HTTP error");
            return Attempt::Done(FetchOutcome::HttpError {
                status_code: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        match response.text().await {
            Ok(body) => Attempt::Done(FetchOutcome::Success { final_url, body }),
            Err(e) => Attempt::Retry(format!("body read failed: {}", e)),
        }
    }
}
