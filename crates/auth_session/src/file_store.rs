use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::DEFAULT_CREDENTIAL_TTL;
use crate::error::IdentityStoreError;
use crate::principal::Principal;
use crate::store::{lock_unpoisoned, IdentityStore};

pub const SLOT_SESSION_TOKEN: &str = "auth_session";
pub const SLOT_USERNAME: &str = "auth_user";
pub const SLOT_USER_ID: &str = "auth_user_id";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Slot {
    value: String,
    expires_at: String,
    #[serde(default)]
    same_site: SameSite,
    #[serde(default)]
    secure: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SlotDocument {
    #[serde(rename = "auth_session", default, skip_serializing_if = "Option::is_none")]
    session_token: Option<Slot>,
    #[serde(rename = "auth_user", default, skip_serializing_if = "Option::is_none")]
    username: Option<Slot>,
    #[serde(rename = "auth_user_id", default, skip_serializing_if = "Option::is_none")]
    user_id: Option<Slot>,
}

/// Identity persisted as three named slots in one JSON document.
///
/// Each slot carries its own expiry; an expired slot reads as absent. The
/// document is rewritten through a temporary file and a rename, so the three
/// slots always change together. Every read goes back to disk, which lets
/// another client sharing the file take over the identity.
#[derive(Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
    ttl: Duration,
    same_site: SameSite,
    secure: bool,
    io: Mutex<()>,
}

impl FileIdentityStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_CREDENTIAL_TTL,
            same_site: SameSite::Lax,
            secure: false,
            io: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_scope(mut self, same_site: SameSite, secure: bool) -> Self {
        self.same_site = same_site;
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> SlotDocument {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return SlotDocument::default(),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "failed to read identity file");
                return SlotDocument::default();
            }
        };

        match serde_json::from_str::<SlotDocument>(&raw) {
            Ok(document) => document,
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "ignoring malformed identity file");
                SlotDocument::default()
            }
        }
    }

    fn write_document(&self, document: &SlotDocument) -> Result<(), IdentityStoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                IdentityStoreError::io("creating identity directory", parent, source)
            })?;
        }

        let encoded = serde_json::to_vec_pretty(document)
            .map_err(|source| IdentityStoreError::json_serialize(&self.path, source))?;
        let staging = self.staging_path();
        fs::write(&staging, encoded).map_err(|source| {
            IdentityStoreError::io("writing staged identity file", &staging, source)
        })?;
        fs::rename(&staging, &self.path)
            .map_err(|source| IdentityStoreError::io("replacing identity file", &self.path, source))
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn slot(&self, value: String, now: OffsetDateTime) -> Result<Slot, IdentityStoreError> {
        let expires_at = (now + self.ttl)
            .format(&Rfc3339)
            .map_err(IdentityStoreError::ClockFormat)?;
        Ok(Slot {
            value,
            expires_at,
            same_site: self.same_site,
            secure: self.secure,
        })
    }
}

impl IdentityStore for FileIdentityStore {
    fn get(&self) -> Principal {
        let _guard = lock_unpoisoned(&self.io);
        let document = self.read_document();
        let now = OffsetDateTime::now_utc();

        Principal {
            username: live_value(document.username.as_ref(), now),
            user_id: live_value(document.user_id.as_ref(), now)
                .and_then(|value| value.trim().parse::<u64>().ok()),
            session_token: live_value(document.session_token.as_ref(), now),
        }
    }

    fn set(&self, principal: &Principal) -> Result<(), IdentityStoreError> {
        let _guard = lock_unpoisoned(&self.io);
        let now = OffsetDateTime::now_utc();

        let document = SlotDocument {
            session_token: principal
                .session_token
                .clone()
                .map(|value| self.slot(value, now))
                .transpose()?,
            username: principal
                .username
                .clone()
                .map(|value| self.slot(value, now))
                .transpose()?,
            user_id: principal
                .user_id
                .map(|value| self.slot(value.to_string(), now))
                .transpose()?,
        };

        if document == SlotDocument::default() {
            return remove_file(&self.path);
        }
        self.write_document(&document)
    }

    fn set_user_id(&self, user_id: u64) -> Result<(), IdentityStoreError> {
        let _guard = lock_unpoisoned(&self.io);
        let mut document = self.read_document();
        document.user_id = Some(self.slot(user_id.to_string(), OffsetDateTime::now_utc())?);
        self.write_document(&document)
    }

    fn clear(&self) -> Result<(), IdentityStoreError> {
        let _guard = lock_unpoisoned(&self.io);
        remove_file(&self.path)
    }

    fn refresh_user_id_if(
        &self,
        session_token: &str,
        user_id: Option<u64>,
    ) -> Result<bool, IdentityStoreError> {
        let _guard = lock_unpoisoned(&self.io);
        let now = OffsetDateTime::now_utc();
        let mut document = self.read_document();
        if live_value(document.session_token.as_ref(), now).as_deref() != Some(session_token) {
            return Ok(false);
        }
        if let Some(user_id) = user_id {
            document.user_id = Some(self.slot(user_id.to_string(), now)?);
            self.write_document(&document)?;
        }
        Ok(true)
    }

    fn clear_if(&self, session_token: &str) -> Result<bool, IdentityStoreError> {
        let _guard = lock_unpoisoned(&self.io);
        let document = self.read_document();
        if live_value(document.session_token.as_ref(), OffsetDateTime::now_utc()).as_deref()
            != Some(session_token)
        {
            return Ok(false);
        }
        remove_file(&self.path)?;
        Ok(true)
    }
}

fn live_value(slot: Option<&Slot>, now: OffsetDateTime) -> Option<String> {
    let slot = slot?;
    let expires_at = OffsetDateTime::parse(&slot.expires_at, &Rfc3339).ok()?;
    if expires_at <= now || slot.value.is_empty() {
        return None;
    }
    Some(slot.value.clone())
}

fn remove_file(path: &Path) -> Result<(), IdentityStoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(IdentityStoreError::io("removing identity file", path, source)),
    }
}

#[cfg(test)]
mod tests {
    use super::{live_value, Slot, SameSite};
    use time::macros::datetime;

    fn slot(expires_at: &str) -> Slot {
        Slot {
            value: "v".to_owned(),
            expires_at: expires_at.to_owned(),
            same_site: SameSite::Lax,
            secure: false,
        }
    }

    #[test]
    fn slot_is_live_until_expiry() {
        let now = datetime!(2026-02-14 00:00 UTC);
        assert_eq!(live_value(Some(&slot("2026-03-01T00:00:00Z")), now).as_deref(), Some("v"));
        assert_eq!(live_value(Some(&slot("2026-02-14T00:00:00Z")), now), None);
        assert_eq!(live_value(Some(&slot("2026-01-01T00:00:00Z")), now), None);
    }

    #[test]
    fn unparseable_expiry_reads_as_absent() {
        let now = datetime!(2026-02-14 00:00 UTC);
        assert_eq!(live_value(Some(&slot("next month")), now), None);
        assert_eq!(live_value(None, now), None);
    }
}
