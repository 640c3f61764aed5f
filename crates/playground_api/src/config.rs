use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_PLAYGROUND_BASE_URL;

/// Transport configuration for playground requests.
#[derive(Debug, Clone)]
pub struct PlaygroundApiConfig {
    /// Base URL of the playground server.
    pub base_url: String,
    /// Additional headers merged into every request.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional whole-request timeout, enforced by the transport.
    pub timeout: Option<Duration>,
}

impl Default for PlaygroundApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PLAYGROUND_BASE_URL.to_string(),
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl PlaygroundApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}
