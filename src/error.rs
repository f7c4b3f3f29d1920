//! Error types shared across the crate.

use core::time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// GraphQL error type reported for nodes that do not exist or are not visible.
const NOT_FOUND: &str = "NOT_FOUND";

#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("giving up after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: NetworkError },

    #[error("GraphQL error: {message}")]
    GraphQl { kind: Option<String>, message: String },

    #[error("invalid input: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failures talking to the remote API. Every variant is considered transient.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limit exceeded, retry in {}s", wait.as_secs())]
    RateLimited { wait: Duration },
}

impl Error {
    /// Returns `true` if the remote API reported that the requested object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GraphQl { kind: Some(kind), .. } if kind == NOT_FOUND)
    }

    /// Returns `true` for errors caused by bad user input rather than a runtime failure.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}
