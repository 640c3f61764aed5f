//! Environment configuration.

use std::env;
use std::path::{Path, PathBuf};

use auth_session::{default_identity_path, read_setting, AuthConfig, FileIdentityStore};
use playground_api::PlaygroundApiConfig;

pub const PLAYGROUND_URL_ENV_VAR: &str = "AGENT_UI_PLAYGROUND_URL";
pub const AGENT_ID_ENV_VAR: &str = "AGENT_UI_AGENT_ID";
pub const IDENTITY_PATH_ENV_VAR: &str = "AGENT_UI_IDENTITY_PATH";
pub const DEFAULT_AGENT_ID: &str = "web_agent";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub playground: PlaygroundApiConfig,
    pub auth: AuthConfig,
    pub agent_id: String,
    /// Explicit identity file; otherwise one is placed under the caller's root.
    pub identity_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`AppConfig::from_env`], reading settings through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut playground = PlaygroundApiConfig::default();
        if let Some(base_url) = read_setting(&lookup, PLAYGROUND_URL_ENV_VAR) {
            playground = playground.with_base_url(base_url);
        }

        Self {
            playground,
            auth: AuthConfig::from_lookup(&lookup),
            agent_id: read_setting(&lookup, AGENT_ID_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_AGENT_ID.to_owned()),
            identity_path: read_setting(&lookup, IDENTITY_PATH_ENV_VAR).map(PathBuf::from),
        }
    }

    pub fn identity_path_under(&self, root: &Path) -> PathBuf {
        self.identity_path
            .clone()
            .unwrap_or_else(|| default_identity_path(root))
    }

    /// File-backed identity store whose slots live for `auth.credential_ttl`.
    pub fn open_identity_store(&self, root: &Path) -> FileIdentityStore {
        FileIdentityStore::open(self.identity_path_under(root)).with_ttl(self.auth.credential_ttl)
    }
}
