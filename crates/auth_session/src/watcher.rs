use crate::notifier::{IdentityChange, IdentityNotifier};
use crate::store::IdentityStore;

/// State that belongs to one principal and must not outlive a switch to another.
pub trait PrincipalScoped {
    fn purge_principal_data(&mut self);
}

/// The identity a dependent last saw. Principals without a user id are told
/// apart by their session token.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Observed {
    user_id: Option<u64>,
    anonymous_token: Option<String>,
}

impl Observed {
    fn of<S: IdentityStore + ?Sized>(store: &S) -> Self {
        let principal = store.get();
        Self {
            user_id: principal.user_id,
            anonymous_token: principal.session_token.filter(|_| principal.user_id.is_none()),
        }
    }
}

/// Detects that the stored principal moved away from the one a dependent last saw.
#[derive(Debug, Default)]
pub struct IdentityWatcher {
    observed: Option<Observed>,
    notifier: Option<IdentityNotifier>,
}

impl IdentityWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_notifier(notifier: IdentityNotifier) -> Self {
        Self {
            observed: None,
            notifier: Some(notifier),
        }
    }

    /// `None` until the first check; afterwards the user id seen by it.
    #[must_use]
    pub fn last_observed(&self) -> Option<Option<u64>> {
        self.observed.as_ref().map(|observed| observed.user_id)
    }

    /// Compare the store against the last observation, purging `dependent` on a
    /// mismatch. Returns whether a purge happened. The first call only records.
    pub fn check<S, D>(&mut self, store: &S, dependent: &mut D) -> bool
    where
        S: IdentityStore + ?Sized,
        D: PrincipalScoped + ?Sized,
    {
        let current = Observed::of(store);
        let Some(previous) = self.observed.replace(current.clone()) else {
            return false;
        };
        if previous == current {
            return false;
        }

        tracing::info!(
            from = ?previous.user_id,
            to = ?current.user_id,
            "identity changed; purging principal data"
        );
        dependent.purge_principal_data();
        if let Some(notifier) = &self.notifier {
            notifier.publish(IdentityChange::Changed {
                from: previous.user_id,
                to: current.user_id,
            });
        }
        true
    }
}
