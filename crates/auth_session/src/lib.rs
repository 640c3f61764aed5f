//! Authenticated-session identity for the agent UI client.
//!
//! The [`SessionController`] is the only writer of the current [`Principal`].
//! It persists it through an injected [`IdentityStore`], verifies credentials
//! against an [`AuthAuthority`], and announces changes on an
//! [`IdentityNotifier`]. Subsystems that cache per-principal data hold an
//! [`IdentityWatcher`] and run [`IdentityWatcher::check`] before reading that
//! data, so nothing cached for one principal is ever served to another.

mod authority;
mod config;
mod controller;
mod error;
mod file_store;
mod notifier;
mod paths;
mod principal;
mod store;
mod watcher;

pub use authority::{
    AuthAuthority, HttpAuthAuthority, InvitationResponse, SessionResponse, LOGOUT_PATH,
    VERIFY_INVITATION_PATH, VERIFY_SESSION_PATH,
};
pub use config::{
    read_setting, AuthConfig, AUTH_URL_ENV_VAR, DEFAULT_AUTH_BASE_URL, DEFAULT_CREDENTIAL_TTL,
};
pub use controller::{normalize_invitation_code, SessionController};
pub use error::{AuthorityError, IdentityStoreError, SessionError};
pub use file_store::{FileIdentityStore, SameSite, SLOT_SESSION_TOKEN, SLOT_USERNAME, SLOT_USER_ID};
pub use notifier::{IdentityChange, IdentityNotifier, IdentitySubscription, SubscriptionId};
pub use paths::{default_identity_path, IDENTITY_DIR, IDENTITY_FILE};
pub use principal::{InvitationOutcome, Principal, SessionState, SessionVerification};
pub use store::{IdentityStore, MemoryIdentityStore};
pub use watcher::{IdentityWatcher, PrincipalScoped};
