//! Streaming client core for agent playgrounds.
//!
//! # Public API Overview
//! - Decode back-to-back JSON objects from arbitrary fragments with [`JsonObjectDecoder`].
//! - Stream agent runs into a [`MessageSink`] with [`PlaygroundApiClient`].
//! - Manage the authenticated principal with [`SessionController`] over an [`IdentityStore`].
//! - Keep per-user client data consistent across identity changes with [`PlaygroundState`].

pub mod config;
pub mod response;
pub mod state;

pub use crate::config::AppConfig;
pub use crate::response::RunResponse;
pub use crate::state::PlaygroundState;

/// Incremental decoding of concatenated JSON objects.
pub use json_stream::{JsonObjectDecoder, Utf8Carry};

/// Agent run streaming and session listings.
pub use playground_api::{
    drive_stream, CallbackSink, CancellationSignal, MessageSink, PlaygroundApiClient,
    PlaygroundApiConfig, PlaygroundApiError, RunBody, RunRequest, SessionEntry, StreamOutcome,
};

/// Authenticated identity and change detection.
pub use auth_session::{
    AuthAuthority, AuthConfig, FileIdentityStore, HttpAuthAuthority, IdentityChange,
    IdentityNotifier, IdentityStore, IdentitySubscription, IdentityWatcher, InvitationOutcome,
    MemoryIdentityStore, Principal, PrincipalScoped, SessionController, SessionState,
    SessionVerification,
};
