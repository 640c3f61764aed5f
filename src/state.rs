//! Client-side state owned by one principal.

use std::sync::Arc;

use auth_session::{
    IdentityNotifier, IdentityStore, IdentitySubscription, IdentityWatcher, PrincipalScoped,
};
use playground_api::{MessageSink, PlaygroundApiClient, PlaygroundApiError, RunRequest, SessionEntry};
use serde_json::Value;

use crate::response::RunResponse;

#[derive(Debug, Default)]
struct ScopedData {
    messages: Vec<RunResponse>,
    sessions_data: Option<Vec<SessionEntry>>,
    selected_session: Option<String>,
    stream_error: Option<String>,
    streaming: bool,
    /// Bumped on every purge so in-flight runs can tell they are stale.
    epoch: u64,
}

impl PrincipalScoped for ScopedData {
    fn purge_principal_data(&mut self) {
        self.messages.clear();
        self.sessions_data = None;
        self.selected_session = None;
        self.stream_error = None;
        self.streaming = false;
        self.epoch += 1;
    }
}

/// Message history, session listing and session selection for the current
/// principal.
///
/// Every read goes through [`PlaygroundState::sync_identity`] first, so data
/// cached for one user is gone before anything is read under another.
pub struct PlaygroundState {
    store: Arc<dyn IdentityStore>,
    watcher: IdentityWatcher,
    scoped: ScopedData,
    run_epoch: Option<u64>,
}

impl PlaygroundState {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self::from_watcher(store, IdentityWatcher::new())
    }

    /// Like [`PlaygroundState::new`], announcing detected takeovers on `notifier`.
    pub fn with_notifier(store: Arc<dyn IdentityStore>, notifier: IdentityNotifier) -> Self {
        Self::from_watcher(store, IdentityWatcher::with_notifier(notifier))
    }

    fn from_watcher(store: Arc<dyn IdentityStore>, watcher: IdentityWatcher) -> Self {
        let mut state = Self {
            store,
            watcher,
            scoped: ScopedData::default(),
            run_epoch: None,
        };
        state.sync_identity();
        state
    }

    /// Purge principal-scoped data if the stored user changed since the last
    /// check. Returns whether a purge happened.
    pub fn sync_identity(&mut self) -> bool {
        self.watcher.check(self.store.as_ref(), &mut self.scoped)
    }

    /// Drain queued identity changes; any change triggers a check.
    pub fn apply_changes(&mut self, subscription: &mut IdentitySubscription) -> bool {
        if subscription.drain().is_empty() {
            return false;
        }
        self.sync_identity()
    }

    pub fn user_id(&mut self) -> Option<u64> {
        self.sync_identity();
        self.store.user_id()
    }

    pub fn messages(&mut self) -> &[RunResponse] {
        self.sync_identity();
        &self.scoped.messages
    }

    pub fn sessions(&mut self) -> Option<&[SessionEntry]> {
        self.sync_identity();
        self.scoped.sessions_data.as_deref()
    }

    pub fn selected_session(&mut self) -> Option<&str> {
        self.sync_identity();
        self.scoped.selected_session.as_deref()
    }

    pub fn stream_error(&mut self) -> Option<&str> {
        self.sync_identity();
        self.scoped.stream_error.as_deref()
    }

    pub fn is_streaming(&mut self) -> bool {
        self.sync_identity();
        self.scoped.streaming
    }

    /// Open `session_id` for the current user. With a listing loaded, only
    /// ids in it are accepted; without one, ownership is left to the server's
    /// session lookup. Without a stored user, or for an id missing from the
    /// listing, the selection is reset and `false` is returned.
    pub fn select_session(&mut self, session_id: &str) -> bool {
        self.sync_identity();
        let accepted = self.store.user_id().is_some()
            && self.scoped.sessions_data.as_deref().map_or(true, |sessions| {
                sessions.iter().any(|entry| entry.session_id == session_id)
            });

        if accepted {
            if self.scoped.selected_session.as_deref() != Some(session_id) {
                self.scoped.messages.clear();
            }
            self.scoped.selected_session = Some(session_id.to_owned());
        } else {
            tracing::debug!(session_id, "ignoring session selection");
            self.scoped.selected_session = None;
        }
        accepted
    }

    /// Start over without a session; the next run opens a new one.
    pub fn new_session(&mut self) {
        self.sync_identity();
        self.scoped.selected_session = None;
        self.scoped.messages.clear();
        self.scoped.stream_error = None;
    }

    pub fn set_sessions(&mut self, sessions: Vec<SessionEntry>) {
        self.sync_identity();
        self.scoped.sessions_data = Some(sessions);
    }

    /// Fetch the current user's session listing. A listing that arrives after
    /// the identity changed is dropped and `false` is returned.
    pub async fn load_sessions(
        &mut self,
        client: &PlaygroundApiClient,
        agent_id: &str,
    ) -> Result<bool, PlaygroundApiError> {
        self.sync_identity();
        let epoch = self.scoped.epoch;
        let user_id = self.store.user_id();

        let sessions = client.list_sessions(agent_id, user_id).await?;

        self.sync_identity();
        if self.scoped.epoch != epoch {
            tracing::info!(agent_id, "dropping session listing fetched for a previous user");
            return Ok(false);
        }
        self.scoped.sessions_data = Some(sessions);
        Ok(true)
    }

    /// Request for the next run in the selected session, tagged with the
    /// current user. Messages from the run are accepted only while that user
    /// stays current.
    pub fn begin_run(&mut self, message: &str) -> RunRequest {
        self.sync_identity();
        self.scoped.stream_error = None;
        self.scoped.streaming = true;
        self.run_epoch = Some(self.scoped.epoch);
        RunRequest::agent_message(
            message,
            self.scoped.selected_session.as_deref(),
            self.store.user_id(),
        )
    }

    fn run_is_current(&mut self) -> bool {
        self.sync_identity();
        match self.run_epoch {
            Some(epoch) => epoch == self.scoped.epoch,
            None => true,
        }
    }
}

impl PrincipalScoped for PlaygroundState {
    fn purge_principal_data(&mut self) {
        self.scoped.purge_principal_data();
    }
}

impl MessageSink for PlaygroundState {
    fn on_message(&mut self, message: Value) {
        if !self.run_is_current() {
            tracing::debug!("dropping run event for a previous user");
            return;
        }
        let response = RunResponse::from_message(message);
        if self.scoped.selected_session.is_none() {
            self.scoped.selected_session = response.session_id.clone();
        }
        self.scoped.messages.push(response);
    }

    fn on_error(&mut self, error: PlaygroundApiError) {
        if !self.run_is_current() {
            return;
        }
        self.scoped.stream_error = Some(error.message());
        self.scoped.streaming = false;
    }

    fn on_complete(&mut self) {
        if !self.run_is_current() {
            return;
        }
        self.scoped.streaming = false;
    }
}

#[cfg(test)]
mod tests {
    use super::PlaygroundState;
    use auth_session::{IdentityStore, MemoryIdentityStore, Principal};
    use playground_api::{MessageSink, PlaygroundApiError, RunBody, SessionEntry};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn store_for(user_id: u64) -> Arc<MemoryIdentityStore> {
        Arc::new(MemoryIdentityStore::with_principal(Principal::new(
            Some(format!("user{user_id}")),
            Some(user_id),
            Some(format!("tok{user_id}")),
        )))
    }

    #[test]
    fn run_session_is_adopted_from_first_event() {
        let store = store_for(1);
        let mut state = PlaygroundState::new(store);
        let request = state.begin_run("hi");
        let RunBody::Form(fields) = &request.body else {
            panic!("agent runs are sent as form data");
        };
        assert!(fields.iter().all(|(key, _)| key != "session_id"));
        assert!(fields.contains(&("user_id".to_owned(), "1".to_owned())));

        state.on_message(json!({"event": "RunStarted", "session_id": "s-1"}));
        state.on_message(json!({"event": "RunResponse", "content": "hello", "session_id": "s-1"}));
        state.on_complete();

        assert_eq!(state.selected_session(), Some("s-1"));
        assert_eq!(state.messages().len(), 2);
        assert!(!state.is_streaming());
    }

    #[test]
    fn error_is_recorded_and_stops_streaming() {
        let mut state = PlaygroundState::new(store_for(1));
        state.begin_run("hi");

        state.on_error(PlaygroundApiError::Transport("network down".to_owned()));

        assert_eq!(state.stream_error(), Some("network down"));
        assert!(!state.is_streaming());
    }

    #[test]
    fn selecting_unknown_session_resets_selection() {
        let mut state = PlaygroundState::new(store_for(1));
        state.set_sessions(vec![SessionEntry::new("s-1"), SessionEntry::new("s-2")]);

        assert!(state.select_session("s-2"));
        assert_eq!(state.selected_session(), Some("s-2"));
        assert!(!state.select_session("s-9"));
        assert_eq!(state.selected_session(), None);
    }

    #[test]
    fn selection_without_a_listing_is_accepted_for_a_stored_user() {
        let mut state = PlaygroundState::new(store_for(1));

        assert!(state.select_session("s-1"));
        assert_eq!(state.selected_session(), Some("s-1"));
        assert_eq!(state.sessions(), None);
    }

    #[test]
    fn selection_without_a_user_resets() {
        let store = Arc::new(MemoryIdentityStore::new());
        let mut state = PlaygroundState::new(store);

        assert!(!state.select_session("s-1"));
        assert_eq!(state.selected_session(), None);
    }

    #[test]
    fn events_of_a_run_started_by_previous_user_are_dropped() {
        let store = store_for(1);
        let mut state = PlaygroundState::new(store.clone());
        state.begin_run("question from user 1");
        state.on_message(json!({"event": "RunStarted", "session_id": "s-1"}));

        store
            .set(&Principal::new(Some("user2".to_owned()), Some(2), Some("tok2".to_owned())))
            .expect("memory store");
        state.on_message(json!({"event": "RunResponse", "content": "for user 1"}));
        state.on_complete();

        assert!(state.messages().is_empty());
        assert_eq!(state.selected_session(), None);
        assert_eq!(state.user_id(), Some(2));
    }
}
