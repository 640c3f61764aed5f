//! Authority and credential settings.

use std::env;
use std::time::Duration;

pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:8001";
pub const AUTH_URL_ENV_VAR: &str = "AGENT_UI_AUTH_URL";
pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    /// Lifetime of each persisted identity slot.
    pub credential_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            timeout: None,
            credential_ttl: DEFAULT_CREDENTIAL_TTL,
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults, with the base URL taken from `AGENT_UI_AUTH_URL` when set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`AuthConfig::from_env`], reading settings through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match read_setting(&lookup, AUTH_URL_ENV_VAR) {
            Some(base_url) => Self::new(base_url),
            None => Self::default(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_credential_ttl(mut self, ttl: Duration) -> Self {
        self.credential_ttl = ttl;
        self
    }
}

/// Trimmed value of `key`; blank values read as unset.
pub fn read_setting(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
