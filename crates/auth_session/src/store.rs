use std::sync::{Mutex, MutexGuard};

use crate::error::IdentityStoreError;
use crate::principal::Principal;

/// Persisted holder of the current [`Principal`].
///
/// Every write replaces the stored field group as one unit; readers observe
/// either the previous or the new tuple, never a mix.
pub trait IdentityStore: Send + Sync {
    /// Latest stored principal, or an empty one.
    fn get(&self) -> Principal;

    /// Replace the whole principal. Fields set to `None` are removed.
    fn set(&self, principal: &Principal) -> Result<(), IdentityStoreError>;

    /// Refresh only the numeric user id, keeping the rest of the tuple.
    fn set_user_id(&self, user_id: u64) -> Result<(), IdentityStoreError>;

    /// Remove every field together.
    fn clear(&self) -> Result<(), IdentityStoreError>;

    /// Refresh the user id only while `session_token` is still the stored
    /// credential. `None` writes nothing. Returns whether the token matched.
    fn refresh_user_id_if(
        &self,
        session_token: &str,
        user_id: Option<u64>,
    ) -> Result<bool, IdentityStoreError>;

    /// Clear only while `session_token` is still the stored credential.
    /// Returns whether the token matched.
    fn clear_if(&self, session_token: &str) -> Result<bool, IdentityStoreError>;

    fn user_id(&self) -> Option<u64> {
        self.get().user_id
    }
}

/// Process-local store; identity does not survive restarts.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    principal: Mutex<Principal>,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_principal(principal: Principal) -> Self {
        Self {
            principal: Mutex::new(principal),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Principal> {
        lock_unpoisoned(&self.principal)
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get(&self) -> Principal {
        self.lock().clone()
    }

    fn set(&self, principal: &Principal) -> Result<(), IdentityStoreError> {
        *self.lock() = principal.clone();
        Ok(())
    }

    fn set_user_id(&self, user_id: u64) -> Result<(), IdentityStoreError> {
        self.lock().user_id = Some(user_id);
        Ok(())
    }

    fn clear(&self) -> Result<(), IdentityStoreError> {
        *self.lock() = Principal::default();
        Ok(())
    }

    fn refresh_user_id_if(
        &self,
        session_token: &str,
        user_id: Option<u64>,
    ) -> Result<bool, IdentityStoreError> {
        let mut principal = self.lock();
        if principal.session_token.as_deref() != Some(session_token) {
            return Ok(false);
        }
        if let Some(user_id) = user_id {
            principal.user_id = Some(user_id);
        }
        Ok(true)
    }

    fn clear_if(&self, session_token: &str) -> Result<bool, IdentityStoreError> {
        let mut principal = self.lock();
        if principal.session_token.as_deref() != Some(session_token) {
            return Ok(false);
        }
        *principal = Principal::default();
        Ok(true)
    }
}

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
