//! Error types for catalog fetches and the local cache.

use std::path::PathBuf;

/// Failure of a remote catalog request
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The catalog host could not be reached
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The request did not complete within the client timeout
    #[error("request timed out")]
    Timeout,

    /// The response body was not a catalog document
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The catalog answered with a non-success status
    #[error("server error: HTTP {0}")]
    ServerError(u16),
}

impl FetchError {
    /// Classify a transport-level failure from the HTTP client
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = error.status() {
            FetchError::ServerError(status.as_u16())
        } else if error.is_decode() {
            FetchError::MalformedResponse(error.to_string())
        } else {
            FetchError::NetworkUnavailable(error.to_string())
        }
    }

    /// Classify a failure while streaming a response body.
    ///
    /// Bodies are read as raw bytes, so anything but a timeout here is a
    /// broken connection; bad JSON is reported later by the parser.
    pub fn from_body_read(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::NetworkUnavailable(error.to_string())
        }
    }
}

/// Failure of the local catalog store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing medium could not be read or written
    #[error("storage unavailable at {}: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored catalog exists but cannot be decoded
    #[error("corrupt catalog cache at {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
