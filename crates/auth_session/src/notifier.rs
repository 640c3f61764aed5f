use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::store::lock_unpoisoned;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityChange {
    Login { user_id: Option<u64> },
    Logout,
    Expired,
    /// A watcher saw the stored user id move away from the one it last observed.
    Changed { from: Option<u64>, to: Option<u64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, UnboundedSender<IdentityChange>)>,
}

/// Fan-out of identity changes to an explicit list of subscribers.
///
/// Cloning shares the same list.
#[derive(Debug, Clone, Default)]
pub struct IdentityNotifier {
    inner: Arc<Mutex<Subscribers>>,
}

impl IdentityNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> IdentitySubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = lock_unpoisoned(&self.inner);
        subscribers.next_id += 1;
        let id = SubscriptionId(subscribers.next_id);
        subscribers.entries.push((id, tx));

        IdentitySubscription {
            id,
            receiver: rx,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        remove_entry(&self.inner, id)
    }

    /// Deliver `change` to every live subscriber and return how many received it.
    pub fn publish(&self, change: IdentityChange) -> usize {
        let mut subscribers = lock_unpoisoned(&self.inner);
        subscribers
            .entries
            .retain(|(_, tx)| tx.send(change.clone()).is_ok());
        let delivered = subscribers.entries.len();
        tracing::debug!(?change, delivered, "published identity change");
        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock_unpoisoned(&self.inner).entries.len()
    }
}

fn remove_entry(inner: &Mutex<Subscribers>, id: SubscriptionId) -> bool {
    let mut subscribers = lock_unpoisoned(inner);
    let before = subscribers.entries.len();
    subscribers.entries.retain(|(entry_id, _)| *entry_id != id);
    subscribers.entries.len() != before
}

/// Receiving end of [`IdentityNotifier::subscribe`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct IdentitySubscription {
    id: SubscriptionId,
    receiver: UnboundedReceiver<IdentityChange>,
    registry: Weak<Mutex<Subscribers>>,
}

impl IdentitySubscription {
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn try_next(&mut self) -> Option<IdentityChange> {
        match self.receiver.try_recv() {
            Ok(change) => Some(change),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next change. `None` once the notifier is gone.
    pub async fn next(&mut self) -> Option<IdentityChange> {
        self.receiver.recv().await
    }

    /// Every change queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<IdentityChange> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

impl Drop for IdentitySubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            remove_entry(&registry, self.id);
        }
    }
}
