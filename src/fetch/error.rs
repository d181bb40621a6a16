use std::time::Duration;
use thiserror::Error;

/// Typed outcomes of the fetch layer.
///
/// A wait that runs out is a value, not a panic: callers that can degrade to
/// a sentinel check `is_wait_timeout` and keep going.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {waited:?} waiting for `{selector}`")]
    WaitTimeout { selector: String, waited: Duration },

    #[error("script evaluation failed: {0}")]
    Eval(String),

    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("HTTP {status} for {url}")]
    BadStatus { status: u16, url: String },
}

impl FetchError {
    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, FetchError::WaitTimeout { .. })
    }
}
