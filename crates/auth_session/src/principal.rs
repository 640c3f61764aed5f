use serde::{Deserialize, Serialize};

/// The current authenticated identity. All fields empty means nobody is logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: Option<String>,
    pub user_id: Option<u64>,
    pub session_token: Option<String>,
}

impl Principal {
    #[must_use]
    pub fn new(
        username: Option<String>,
        user_id: Option<u64>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            username,
            user_id,
            session_token,
        }
    }

    /// A session credential is present. It may still be rejected by the authority.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session_token.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.user_id.is_none() && self.session_token.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Verifying,
    Authenticated,
}

/// Result of [`crate::SessionController::verify_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionVerification {
    pub success: bool,
    pub valid: bool,
    pub principal: Option<Principal>,
    pub error: Option<String>,
}

impl SessionVerification {
    pub(crate) fn valid(principal: Principal) -> Self {
        Self {
            success: true,
            valid: true,
            principal: Some(principal),
            error: None,
        }
    }

    pub(crate) fn invalid(error: impl Into<String>) -> Self {
        Self {
            success: false,
            valid: false,
            principal: None,
            error: Some(error.into()),
        }
    }
}

/// Result of [`crate::SessionController::verify_invitation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationOutcome {
    pub success: bool,
    pub principal: Option<Principal>,
    /// Server-side session expiry, as reported by the authority.
    pub expires_at: Option<String>,
    pub error: Option<String>,
}

impl InvitationOutcome {
    pub(crate) fn accepted(principal: Principal, expires_at: Option<String>) -> Self {
        Self {
            success: true,
            principal: Some(principal),
            expires_at,
            error: None,
        }
    }

    pub(crate) fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            principal: None,
            expires_at: None,
            error: Some(error.into()),
        }
    }
}
