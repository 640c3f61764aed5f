use std::sync::{Arc, Mutex};

use crate::authority::AuthAuthority;
use crate::error::SessionError;
use crate::notifier::{IdentityChange, IdentityNotifier, IdentitySubscription};
use crate::principal::{InvitationOutcome, Principal, SessionState, SessionVerification};
use crate::store::{lock_unpoisoned, IdentityStore};

const INVALID_INVITATION: &str = "Invalid invitation code";
const INVITATION_TRANSPORT_FAILURE: &str = "Failed to verify invitation code. Please try again.";
const NO_SESSION: &str = "No session found";
const SESSION_TRANSPORT_FAILURE: &str = "Failed to verify session";
const SESSION_REJECTED: &str = "Invalid or expired session";
const SESSION_SUPERSEDED: &str = "Session changed during verification";

/// Invitation codes are compared case-insensitively by the authority's issuer.
#[must_use]
pub fn normalize_invitation_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Owns the login lifecycle: invitation exchange, session re-validation and
/// logout, keeping the identity store and subscribers in step.
pub struct SessionController<A> {
    authority: A,
    store: Arc<dyn IdentityStore>,
    notifier: IdentityNotifier,
    state: Mutex<SessionState>,
}

impl<A: AuthAuthority> SessionController<A> {
    pub fn new(authority: A, store: Arc<dyn IdentityStore>) -> Self {
        Self::with_notifier(authority, store, IdentityNotifier::new())
    }

    pub fn with_notifier(
        authority: A,
        store: Arc<dyn IdentityStore>,
        notifier: IdentityNotifier,
    ) -> Self {
        Self {
            authority,
            store,
            notifier,
            state: Mutex::new(SessionState::Unauthenticated),
        }
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    pub fn notifier(&self) -> &IdentityNotifier {
        &self.notifier
    }

    pub fn subscribe(&self) -> IdentitySubscription {
        self.notifier.subscribe()
    }

    pub fn state(&self) -> SessionState {
        *lock_unpoisoned(&self.state)
    }

    pub fn current_principal(&self) -> Principal {
        self.store.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_principal().is_authenticated()
    }

    fn set_state(&self, next: SessionState) -> SessionState {
        std::mem::replace(&mut *lock_unpoisoned(&self.state), next)
    }

    /// Exchange an invitation code for a session. The returned principal
    /// replaces whatever was stored before.
    pub async fn verify_invitation(&self, code: &str) -> InvitationOutcome {
        let code = normalize_invitation_code(code);
        let previous = self.set_state(SessionState::Verifying);

        let response = match self.authority.verify_invitation(&code).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, "invitation verification failed");
                self.set_state(previous);
                return InvitationOutcome::rejected(INVITATION_TRANSPORT_FAILURE);
            }
        };

        let token = response
            .session_token
            .filter(|token| response.success && !token.is_empty());
        let Some(token) = token else {
            tracing::info!("invitation code rejected");
            self.set_state(previous);
            return InvitationOutcome::rejected(
                response.error.unwrap_or_else(|| INVALID_INVITATION.to_string()),
            );
        };

        let principal = Principal::new(response.username, response.user_id, Some(token));
        if let Err(error) = self.store.set(&principal) {
            tracing::warn!(%error, "failed to persist principal after invitation");
            self.set_state(previous);
            return InvitationOutcome::rejected(INVITATION_TRANSPORT_FAILURE);
        }

        self.set_state(SessionState::Authenticated);
        tracing::info!(user_id = ?principal.user_id, "invitation accepted");
        self.notifier.publish(IdentityChange::Login {
            user_id: principal.user_id,
        });
        InvitationOutcome::accepted(principal, response.expires_at)
    }

    /// Re-validate the stored credential. Without one, the authority is not contacted.
    ///
    /// The answer only applies to the credential that was checked: if a login
    /// or logout replaced it while the authority was answering, the store,
    /// state and subscribers are left to the newer operation.
    pub async fn verify_session(&self) -> SessionVerification {
        let Some(token) = self.store.get().session_token else {
            self.set_state(SessionState::Unauthenticated);
            return SessionVerification::invalid(NO_SESSION);
        };

        self.set_state(SessionState::Verifying);
        let error = match self.authority.verify_session(&token).await {
            Ok(response) if response.is_valid() => {
                match self.store.refresh_user_id_if(&token, response.user_id) {
                    Ok(true) => {}
                    Ok(false) => return self.superseded(),
                    Err(error) => tracing::warn!(%error, "failed to refresh stored user id"),
                }
                self.set_state(SessionState::Authenticated);
                let principal = self.store.get();
                tracing::info!(user_id = ?principal.user_id, "session verified");
                return SessionVerification::valid(principal);
            }
            Ok(response) => {
                tracing::info!(error = ?response.error, "session rejected by authority");
                response.error.unwrap_or_else(|| SESSION_REJECTED.to_string())
            }
            Err(error) => {
                tracing::warn!(%error, "session verification failed");
                SESSION_TRANSPORT_FAILURE.to_string()
            }
        };

        match self.store.clear_if(&token) {
            Ok(true) => {}
            Ok(false) => return self.superseded(),
            Err(error) => tracing::warn!(%error, "failed to clear rejected session"),
        }
        self.set_state(SessionState::Unauthenticated);
        self.notifier.publish(IdentityChange::Expired);
        SessionVerification::invalid(error)
    }

    fn superseded(&self) -> SessionVerification {
        tracing::info!("stored session changed during verification; answer discarded");
        let mut state = lock_unpoisoned(&self.state);
        if *state == SessionState::Verifying {
            *state = if self.store.get().is_authenticated() {
                SessionState::Authenticated
            } else {
                SessionState::Unauthenticated
            };
        }
        SessionVerification::invalid(SESSION_SUPERSEDED)
    }

    /// Tell the authority (best effort), then forget the principal.
    pub async fn logout(&self) -> Result<(), SessionError> {
        if let Some(token) = self.store.get().session_token {
            if let Err(error) = self.authority.logout(&token).await {
                tracing::warn!(%error, "logout notification failed");
            }
        }

        let cleared = self.store.clear();
        self.set_state(SessionState::Unauthenticated);
        self.notifier.publish(IdentityChange::Logout);
        cleared.map_err(SessionError::from)
    }
}
