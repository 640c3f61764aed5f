use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityStoreError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize identity document for {path}: {source}")]
    JsonSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to format slot expiry as RFC3339: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl IdentityStoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn json_serialize(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonSerialize {
            path: path.into(),
            source,
        }
    }
}

/// Failure to reach the remote authority or to read its answer.
///
/// A well-formed negative answer (unknown code, expired session) is not an
/// error; it arrives as a response with `success: false`.
#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("auth request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("auth server returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("auth response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid auth base URL: {0}")]
    InvalidBaseUrl(String),

    /// For [`AuthAuthority`](crate::AuthAuthority) adapters with no HTTP
    /// transport, such as an offline or disabled backend, that cannot reach
    /// any authority. The controller treats it like a transport failure.
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] IdentityStoreError),
}
