//! Retry policy and rate-limit detection.

use crate::NetworkError;
use crate::config::Config;
use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// GraphQL error type used when the point budget is exhausted.
pub const GRAPHQL_RATE_LIMITED: &str = "RATE_LIMITED";

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_rate_limit_wait: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
            max_rate_limit_wait: config.max_rate_limit_wait(),
        }
    }

    /// `base_delay * 2^attempt`, saturating.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// How long to sleep before retrying after `error`, or `None` when the
    /// server asks for a longer wait than the policy allows.
    #[must_use]
    pub fn delay_for(&self, error: &NetworkError, attempt: u32) -> Option<Duration> {
        let backoff = self.backoff(attempt);
        match error {
            NetworkError::RateLimited { wait } if *wait > self.max_rate_limit_wait => None,
            NetworkError::RateLimited { wait } => Some((*wait).max(backoff)),
            NetworkError::Transport(_) | NetworkError::Status { .. } => Some(backoff),
        }
    }
}

/// Detect a rate-limited HTTP response and work out how long the server wants us to wait.
///
/// GitHub signals primary limits with `403`/`429` and `x-ratelimit-remaining: 0`,
/// and secondary limits with a `403`/`429` whose body mentions the rate limit.
#[must_use]
pub fn rate_limit_wait(status: StatusCode, headers: &HeaderMap, body: &str, now: DateTime<Utc>) -> Option<Duration> {
    let limited = match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => remaining(headers) == Some(0) || body.to_ascii_lowercase().contains("rate limit"),
        _ => false,
    };

    limited.then(|| requested_wait(headers, now))
}

/// Wait requested by `retry-after` or `x-ratelimit-reset`, or zero when neither is present.
#[must_use]
pub fn requested_wait(headers: &HeaderMap, now: DateTime<Utc>) -> Duration {
    if let Some(secs) = header_u64(headers, RETRY_AFTER.as_str()) {
        return Duration::from_secs(secs);
    }

    header_u64(headers, RATE_LIMIT_RESET)
        .and_then(|reset| i64::try_from(reset).ok())
        .and_then(|reset| DateTime::from_timestamp(reset, 0))
        .and_then(|reset| (reset - now).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

fn remaining(headers: &HeaderMap) -> Option<u64> {
    header_u64(headers, RATE_LIMIT_REMAINING)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
