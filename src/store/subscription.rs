use futures::Stream;
use parking_lot::Mutex;
use pin_project::pin_project;
use serde::Serialize;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::{watch, OwnedMutexGuard};
use tokio_stream::wrappers::WatchStream;

use crate::models::{Event, TodoItem};

type Channels = Mutex<HashMap<String, watch::Sender<Arc<Snapshot>>>>;

/// The owner's complete collection at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub events: Vec<Event>,
    pub todos: Vec<TodoItem>,
}

/// Removes the owner's channel once its last receiver is gone.
#[derive(Debug)]
struct ChannelRelease {
    owner_id: String,
    channels: Weak<Channels>,
}

impl Drop for ChannelRelease {
    fn drop(&mut self) {
        let Some(channels) = self.channels.upgrade() else {
            return;
        };
        let mut channels = channels.lock();
        if channels
            .get(&self.owner_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(&self.owner_id);
            tracing::debug!(owner_id = %self.owner_id, "Dropped idle snapshot channel");
        }
    }
}

/// Receiving end of an owner feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    // Field order matters: the receiver must be gone before the release runs.
    rx: watch::Receiver<Arc<Snapshot>>,
    release: ChannelRelease,
}

impl Subscription {
    pub fn current(&self) -> Arc<Snapshot> {
        self.rx.borrow().clone()
    }

    /// Waits for the next change. Returns `None` once the store has gone away.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Stream that yields the current snapshot first, then one item per change.
    pub fn into_stream(self) -> SnapshotStream {
        SnapshotStream {
            inner: WatchStream::new(self.rx),
            _release: self.release,
        }
    }
}

#[pin_project]
pub struct SnapshotStream {
    #[pin]
    inner: WatchStream<Arc<Snapshot>>,
    _release: ChannelRelease,
}

impl Stream for SnapshotStream {
    type Item = Arc<Snapshot>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

/// Held while a store reads and publishes an owner's snapshot, so publishes
/// for one owner land in the order their reads happened.
pub struct OwnerLock<'a> {
    hub: &'a SnapshotHub,
    owner_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut gates = self.hub.gates.lock();
        if gates
            .get(&self.owner_id)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            gates.remove(&self.owner_id);
        }
    }
}

/// Per-owner broadcast of snapshots.
///
/// A channel exists only while someone subscribes to that owner; publishing
/// to an owner without subscribers is a no-op.
#[derive(Default)]
pub struct SnapshotHub {
    channels: Arc<Channels>,
    gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock_owner(&self, owner_id: &str) -> OwnerLock<'_> {
        let gate = self
            .gates
            .lock()
            .entry(owner_id.to_string())
            .or_default()
            .clone();
        let guard = gate.lock_owned().await;

        OwnerLock {
            hub: self,
            owner_id: owner_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Whether a snapshot for this owner would reach anyone.
    pub fn is_watched(&self, owner_id: &str) -> bool {
        self.channels
            .lock()
            .get(owner_id)
            .is_some_and(|tx| tx.receiver_count() > 0)
    }

    /// Joins the owner's live feed, if there is one. Its value is already current.
    pub fn join(&self, owner_id: &str) -> Option<Subscription> {
        let channels = self.channels.lock();
        let tx = channels.get(owner_id).filter(|tx| tx.receiver_count() > 0)?;
        Some(self.subscription(owner_id, tx))
    }

    /// Joins the live feed or starts a new one at `current`. Existing
    /// subscribers are not notified.
    pub fn subscribe(&self, owner_id: &str, current: Snapshot) -> Subscription {
        let mut channels = self.channels.lock();
        let tx = channels
            .entry(owner_id.to_string())
            .or_insert_with(|| watch::channel(Arc::new(Snapshot::default())).0);
        if tx.receiver_count() == 0 {
            tx.send_replace(Arc::new(current));
        }

        self.subscription(owner_id, tx)
    }

    pub fn publish(&self, owner_id: &str, snapshot: Snapshot) {
        let mut channels = self.channels.lock();
        let Some(tx) = channels.get(owner_id) else {
            return;
        };
        if tx.receiver_count() == 0 {
            channels.remove(owner_id);
            tracing::debug!(owner_id, "Dropped idle snapshot channel");
            return;
        }
        tx.send_replace(Arc::new(snapshot));
    }

    fn subscription(&self, owner_id: &str, tx: &watch::Sender<Arc<Snapshot>>) -> Subscription {
        Subscription {
            rx: tx.subscribe(),
            release: ChannelRelease {
                owner_id: owner_id.to_string(),
                channels: Arc::downgrade(&self.channels),
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn open_channels(&self) -> usize {
        self.channels.lock().len()
    }
}
