//! HTTP transport shared by all harvesters.
//!
//! Harvesters never construct their own client. They receive an
//! [`HttpClient`], which in production is a [`ReqwestClient`] with automatic
//! retry and exponential backoff for transient failures (timeouts,
//! connection resets, HTTP 429, HTTP 5xx).
//!
//! Non-success statuses that remain after retrying are handed back as an
//! [`HttpResponse`] rather than an error, because every caller has its own
//! policy for them (stop paginating, skip one record, abort a set).

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderValue, RETRY_AFTER};

use crate::HarvestError;

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With exponential backoff (2s, 4s, 8s, 16s, 32s) the total wait before
/// giving up is 62 seconds.
const MAX_RETRIES: u32 = 5;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_mins(2);

/// Upper bound for a server-provided `Retry-After` delay.
const MAX_RETRY_AFTER: Duration = Duration::from_mins(1);

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A blocking-per-call GET transport.
///
/// Calls are awaited one at a time by the harvesters; implementations do
/// not need to support concurrent use beyond `Send + Sync`.
pub trait HttpClient: Send + Sync {
    /// Issues `GET url?query` and returns the final status and body.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] if no response could be obtained at all
    /// (connection failure, timeout) after any retries.
    fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> impl Future<Output = Result<HttpResponse, HarvestError>> + Send;
}

/// [`HttpClient`] backed by [`reqwest::Client`] with retry.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    max_retries: u32,
}

impl ReqwestClient {
    /// Builds a client that identifies itself with `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Http`] if the TLS backend cannot be
    /// initialized.
    pub fn new(user_agent: &str) -> Result<Self, HarvestError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Overrides the number of retries for transient failures.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, HarvestError> {
        let mut attempt: u32 = 0;

        loop {
            let result = self.client.get(url).query(query).send().await;
            attempt += 1;
            let can_retry = attempt <= self.max_retries;

            let response = match result {
                Ok(response) => response,
                Err(e) if can_retry && is_transient(&e) => {
                    let delay = backoff(attempt);
                    log::warn!(
                        "  transient error: {e}; retry {attempt}/{} in {delay:?}...",
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(HarvestError::Http(e)),
            };

            let status = response.status();
            if let Some(delay) = retry_delay(
                status,
                response.headers().get(RETRY_AFTER),
                attempt,
                self.max_retries,
            ) {
                log::warn!(
                    "  HTTP {status} from {url}; retry {attempt}/{} in {delay:?}...",
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            match response.text().await {
                Ok(body) => {
                    return Ok(HttpResponse {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) if can_retry => {
                    let delay = backoff(attempt);
                    log::warn!(
                        "  body read failed: {e}; retry {attempt}/{} in {delay:?}...",
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(HarvestError::Http(e)),
            }
        }
    }
}

/// Exponential backoff: 2s, 4s, 8s, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(6))
}

/// Delay before retrying a response with `status` after `attempt`
/// requests, or `None` if the response should be handed back as-is.
///
/// Only HTTP 429 and 5xx are retried. A `Retry-After` header in seconds
/// (OAI-PMH providers send it with 503) replaces the backoff, capped at
/// [`MAX_RETRY_AFTER`].
fn retry_delay(
    status: StatusCode,
    retry_after: Option<&HeaderValue>,
    attempt: u32,
    max_retries: u32,
) -> Option<Duration> {
    if attempt > max_retries
        || !(status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
    {
        return None;
    }
    Some(
        retry_after
            .and_then(parse_retry_after)
            .unwrap_or_else(|| backoff(attempt)),
    )
}

fn parse_retry_after(value: &HeaderValue) -> Option<Duration> {
    let seconds = value.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}
