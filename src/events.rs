use crate::models::RecordKind;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

/// How long a `/api/changes` request parks before answering with no change.
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RefreshEvent {
    pub revision: u64,
    /// Kind of the most recent insert, if any.
    pub kind: Option<RecordKind>,
}

/// Notification channel from completed inserts to dashboard consumers.
///
/// Publishers bump a revision counter; subscribers compare revisions and
/// refetch when theirs is stale. Intermediate revisions may be skipped.
#[derive(Clone)]
pub struct RefreshBus {
    tx: Arc<watch::Sender<RefreshEvent>>,
}

impl Default for RefreshBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshBus {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RefreshEvent::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn publish(&self, kind: RecordKind) -> RefreshEvent {
        let mut published = RefreshEvent::default();
        self.tx.send_modify(|event| {
            event.revision = event.revision.wrapping_add(1);
            event.kind = Some(kind);
            published = *event;
        });
        published
    }

    pub fn current(&self) -> RefreshEvent {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshEvent> {
        self.tx.subscribe()
    }

    /// Returns as soon as the revision differs from `since`, or after
    /// `timeout` with the unchanged current event.
    pub async fn wait_for_change(&self, since: u64, timeout: Duration) -> RefreshEvent {
        let mut rx = self.subscribe();
        let current = *rx.borrow_and_update();
        if current.revision != since {
            return current;
        }

        let _ = tokio::time::timeout(timeout, rx.changed()).await;
        *rx.borrow()
    }
}
