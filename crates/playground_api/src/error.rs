use std::fmt;

use reqwest::StatusCode;
use serde_json::{Error as JsonError, Value};

#[derive(Debug)]
pub enum PlaygroundApiError {
    InvalidBaseUrl(String),
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Transport(String),
    Serde(JsonError),
    Cancelled,
}

impl PlaygroundApiError {
    /// Normalized, human-readable failure text handed to message sinks.
    ///
    /// Server-reported failures carry the text extracted by
    /// [`parse_error_message`]; everything else is the stringified error.
    pub fn message(&self) -> String {
        match self {
            Self::Status(_, message) | Self::Transport(message) => message.clone(),
            Self::Request(error) => error.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for PlaygroundApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::Cancelled => write!(f, "request was cancelled"),
        }
    }
}

impl std::error::Error for PlaygroundApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PlaygroundApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for PlaygroundApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extract the failure message from a non-success response body.
///
/// A JSON body with a `detail` field yields that field (strings as-is, other
/// values serialized). Any other non-empty body is returned raw; an empty body
/// falls back to the status reason phrase.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        match fields.get("detail") {
            Some(Value::String(detail)) => return detail.clone(),
            Some(Value::Null) | None => {}
            Some(detail) => return detail.to_string(),
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
