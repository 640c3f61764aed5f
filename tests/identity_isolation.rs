use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use agent_ui::{
    drive_stream, AuthAuthority, FileIdentityStore, IdentityChange, IdentityStore,
    MemoryIdentityStore, PlaygroundApiError, PlaygroundState, SessionController, SessionEntry,
    StreamOutcome,
};
use auth_session::{default_identity_path, AuthorityError, InvitationResponse, SessionResponse};
use futures_util::stream;
use pretty_assertions::assert_eq;

#[derive(Default)]
struct InvitationDesk {
    codes: HashMap<String, (u64, String)>,
}

impl InvitationDesk {
    fn with(mut self, code: &str, user_id: u64, username: &str) -> Self {
        self.codes
            .insert(code.to_owned(), (user_id, username.to_owned()));
        self
    }
}

impl AuthAuthority for InvitationDesk {
    fn verify_invitation(
        &self,
        invitation_code: &str,
    ) -> impl Future<Output = Result<InvitationResponse, AuthorityError>> + Send {
        let answer = match self.codes.get(invitation_code) {
            Some((user_id, username)) => InvitationResponse {
                success: true,
                session_token: Some(format!("tok-{username}")),
                user_id: Some(*user_id),
                username: Some(username.clone()),
                ..InvitationResponse::default()
            },
            None => InvitationResponse::default(),
        };
        async move { Ok(answer) }
    }

    fn verify_session(
        &self,
        _session_token: &str,
    ) -> impl Future<Output = Result<SessionResponse, AuthorityError>> + Send {
        async move {
            Ok(SessionResponse {
                success: true,
                ..SessionResponse::default()
            })
        }
    }

    fn logout(&self, _session_token: &str) -> impl Future<Output = Result<(), AuthorityError>> + Send {
        async move { Ok(()) }
    }
}

fn fragments(parts: &[&str]) -> Vec<Result<Vec<u8>, PlaygroundApiError>> {
    parts.iter().map(|part| Ok(part.as_bytes().to_vec())).collect()
}

async fn stream_into(state: &mut PlaygroundState, parts: &[&str]) -> StreamOutcome {
    drive_stream(stream::iter(fragments(parts)), state, None).await
}

#[tokio::test]
async fn switching_users_purges_history_listing_and_selection() {
    let store: Arc<dyn IdentityStore> = Arc::new(MemoryIdentityStore::new());
    let controller = SessionController::new(
        InvitationDesk::default()
            .with("ALPHA", 1, "alpha")
            .with("BRAVO", 2, "bravo"),
        Arc::clone(&store),
    );
    let mut subscription = controller.subscribe();
    let mut state = PlaygroundState::with_notifier(Arc::clone(&store), controller.notifier().clone());

    assert!(controller.verify_invitation("alpha").await.success);
    assert!(state.apply_changes(&mut subscription));

    state.set_sessions(vec![SessionEntry::new("alpha-1").with_user_id("1")]);
    assert!(state.select_session("alpha-1"));
    state.begin_run("what did I ask yesterday?");
    let outcome = stream_into(
        &mut state,
        &[
            r#"{"event":"RunStarted","session_id":"alpha-1"}{"event":"RunRes"#,
            r#"ponse","content":"private to alpha"}"#,
        ],
    )
    .await;
    assert_eq!(outcome, StreamOutcome::Completed);
    assert_eq!(state.messages().len(), 2);

    assert!(controller.verify_invitation("bravo").await.success);

    assert!(state.messages().is_empty());
    assert_eq!(state.sessions(), None);
    assert_eq!(state.selected_session(), None);
    assert_eq!(state.user_id(), Some(2));

    let changes = subscription.drain();
    assert!(changes.contains(&IdentityChange::Login { user_id: Some(2) }));
    assert!(changes.contains(&IdentityChange::Changed {
        from: Some(1),
        to: Some(2)
    }));
}

#[tokio::test]
async fn logout_purges_dependent_exactly_once() {
    let store: Arc<dyn IdentityStore> = Arc::new(MemoryIdentityStore::new());
    let controller =
        SessionController::new(InvitationDesk::default().with("ALPHA", 1, "alpha"), Arc::clone(&store));
    controller.verify_invitation("alpha").await;

    let mut state = PlaygroundState::new(Arc::clone(&store));
    state.set_sessions(vec![SessionEntry::new("alpha-1")]);

    controller.logout().await.expect("memory store never fails");

    assert!(controller.current_principal().is_empty());
    assert!(state.sync_identity());
    assert!(!state.sync_identity());
    assert_eq!(state.sessions(), None);
}

#[tokio::test]
async fn another_client_taking_over_the_identity_file_is_detected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = default_identity_path(temp.path());

    let ours: Arc<dyn IdentityStore> = Arc::new(FileIdentityStore::open(&path));
    let theirs: Arc<dyn IdentityStore> = Arc::new(FileIdentityStore::open(&path));
    let our_controller =
        SessionController::new(InvitationDesk::default().with("ALPHA", 1, "alpha"), Arc::clone(&ours));
    let their_controller =
        SessionController::new(InvitationDesk::default().with("BRAVO", 2, "bravo"), theirs);

    our_controller.verify_invitation("alpha").await;
    let mut state = PlaygroundState::new(Arc::clone(&ours));
    state.set_sessions(vec![SessionEntry::new("alpha-1")]);
    assert!(state.select_session("alpha-1"));

    their_controller.verify_invitation("bravo").await;

    assert_eq!(state.selected_session(), None);
    assert_eq!(state.sessions(), None);
    assert_eq!(our_controller.current_principal().username.as_deref(), Some("bravo"));
}

#[tokio::test]
async fn prose_without_objects_yields_no_messages() {
    let mut state = PlaygroundState::new(Arc::new(MemoryIdentityStore::new()));
    state.begin_run("sum it up");

    let outcome = stream_into(&mut state, &["The sum of (", "123", " + 34) equals ", "157."]).await;

    assert_eq!(outcome, StreamOutcome::Completed);
    assert!(state.messages().is_empty());
    assert!(!state.is_streaming());
    assert_eq!(state.stream_error(), None);
}
