#![allow(unused_imports)]

use agent_ui::{
    drive_stream, AppConfig, AuthAuthority, AuthConfig, CallbackSink, CancellationSignal,
    FileIdentityStore, HttpAuthAuthority, IdentityChange, IdentityNotifier, IdentityStore,
    IdentitySubscription, IdentityWatcher, InvitationOutcome, JsonObjectDecoder,
    MemoryIdentityStore, MessageSink, PlaygroundApiClient, PlaygroundApiConfig,
    PlaygroundApiError, PlaygroundState, Principal, PrincipalScoped, RunBody, RunRequest,
    RunResponse, SessionController, SessionEntry, SessionState, SessionVerification,
    StreamOutcome, Utf8Carry,
};

#[test]
fn public_api_exports_compile() {}
