//! Blocking HTTP client shared by the data providers
//!
//! Wraps `reqwest::blocking::Client` with a per-request timeout, a descriptive
//! `User-Agent` (api.weather.gov rejects anonymous clients) and a retry loop
//! with exponential backoff for transport errors, HTTP 429 and 5xx responses.
//! A `Retry-After` on HTTP 429 replaces the backoff, capped at the timeout.
//! Every failure is reported as `DataUnavailable` for the named source.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use crate::config::HttpConfig;
use crate::{FlightCheckError, Result};

/// Longest response excerpt included in parse error messages
const BODY_EXCERPT_LEN: usize = 120;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
    /// Upper bound for a server-requested `Retry-After` wait
    max_retry_after: Duration,
}

impl HttpClient {
    /// Create a new client from the `[http]` configuration section
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/geo+json, application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| FlightCheckError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            max_retry_after: Duration::from_secs(config.timeout_seconds.into()),
        })
    }

    /// GET `url` and deserialize the JSON body into `T`.
    ///
    /// Unparseable bodies become `DataUnavailable`, never a raw parse error.
    #[instrument(skip(self), fields(source = source_name))]
    pub fn get_json<T: DeserializeOwned>(&self, source_name: &str, url: &str) -> Result<T> {
        let start_time = Instant::now();
        let response = self.make_request(source_name, url)?;

        let body = response.text().map_err(|e| {
            FlightCheckError::data_unavailable(source_name, format!("failed to read response body: {e}"))
        })?;

        let parsed = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse {} response: {}", source_name, e);
            let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
            FlightCheckError::data_unavailable(
                source_name,
                format!("invalid response ({e}): {excerpt}"),
            )
        })?;

        debug!(
            "Parsed {} response ({} bytes) in {:.3}s",
            source_name,
            body.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(parsed)
    }

    /// Make a request with retry logic
    fn make_request(&self, source_name: &str, url: &str) -> Result<Response> {
        let max_attempts = self.max_retries + 1;
        let request_start = Instant::now();
        let mut last_failure = String::new();
        let mut server_wait: Option<Duration> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let wait = server_wait
                    .take()
                    .unwrap_or_else(|| self.retry_backoff * 2u32.saturating_pow(attempt - 1));
                warn!(
                    "Retrying {} request in {:.1}s after: {}",
                    source_name,
                    wait.as_secs_f64(),
                    last_failure
                );
                thread::sleep(wait);
            }

            debug!(
                "Making HTTP request to {} (attempt {}/{})",
                url,
                attempt + 1,
                max_attempts
            );

            match self.client.get(url).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        info!(
                            "Successful {} request in {:.3}s (attempt {})",
                            source_name,
                            request_start.elapsed().as_secs_f64(),
                            attempt + 1
                        );
                        return Ok(response);
                    }
                    if !is_retryable(status) {
                        warn!("{} request failed with HTTP {}", source_name, status);
                        return Err(FlightCheckError::data_unavailable(
                            source_name,
                            describe_status(status),
                        ));
                    }
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        server_wait = retry_after(response.headers(), self.max_retry_after);
                    }
                    last_failure = describe_status(status);
                }
                Err(e) => {
                    last_failure = if e.is_timeout() {
                        "request timed out".to_string()
                    } else {
                        format!("request failed: {e}")
                    };
                }
            }
        }

        error!(
            "{} unreachable after {} attempts: {}",
            source_name, max_attempts, last_failure
        );
        Err(FlightCheckError::data_unavailable(
            source_name,
            format!("{last_failure} (after {max_attempts} attempts)"),
        ))
    }
}

/// Delay requested by a `Retry-After: <seconds>` header, capped at `cap`
fn retry_after(headers: &HeaderMap, cap: Duration) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(cap))
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn describe_status(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "no data for this location (HTTP 404)".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "rate limited (HTTP 429)".to_string(),
        s if s.is_server_error() => format!("service error (HTTP {})", s.as_u16()),
        s => format!("request rejected (HTTP {})", s.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, true)]
    #[case(StatusCode::SERVICE_UNAVAILABLE, true)]
    #[case(StatusCode::NOT_FOUND, false)]
    #[case(StatusCode::BAD_REQUEST, false)]
    #[case(StatusCode::FORBIDDEN, false)]
    fn test_retryable_statuses(#[case] status: StatusCode, #[case] retryable: bool) {
        assert_eq!(is_retryable(status), retryable);
    }

    #[test]
    fn test_describe_status() {
        assert!(describe_status(StatusCode::NOT_FOUND).contains("404"));
        assert!(describe_status(StatusCode::BAD_GATEWAY).starts_with("service error"));
        assert_eq!(
            describe_status(StatusCode::FORBIDDEN),
            "request rejected (HTTP 403)"
        );
    }

    #[test]
    fn test_client_builds_from_default_config() {
        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        assert_eq!(client.max_retries, HttpConfig::default().max_retries);
        assert_eq!(
            client.max_retry_after,
            Duration::from_secs(HttpConfig::default().timeout_seconds.into())
        );
    }

    #[rstest]
    #[case(Some("3"), Some(3))]
    #[case(Some(" 7 "), Some(7))]
    #[case(Some("600"), Some(15))]
    #[case(Some("Wed, 21 Oct 2015 07:28:00 GMT"), None)]
    #[case(Some("-1"), None)]
    #[case(None, None)]
    fn test_retry_after_header(#[case] value: Option<&str>, #[case] expected_secs: Option<u64>) {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
        }
        assert_eq!(
            retry_after(&headers, Duration::from_secs(15)),
            expected_secs.map(Duration::from_secs)
        );
    }
}
