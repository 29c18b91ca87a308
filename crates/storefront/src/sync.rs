//! Shared state machine for locally mirrored remote state.
//!
//! ```text
//! Uninitialized -> Loading -> Ready -> Mutating -> Ready
//!                     |
//!                     +-> Error  (left only by an explicit retry)
//! ```
//!
//! Every transition publishes a [`Snapshot`] on a `watch` channel, so any
//! number of views can observe the latest value without polling. An
//! operation lock keeps each mutate-then-reconcile sequence strictly ordered.

use tokio::sync::{Mutex, MutexGuard, watch};

/// Lifecycle of a mirrored resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Never fetched, or reset on sign-out.
    #[default]
    Uninitialized,
    /// First (or retried) fetch in flight.
    Loading,
    /// Data reflects the last successful fetch.
    Ready,
    /// A mutation and its reconciling fetch are in flight.
    Mutating,
    /// The last fetch failed; carries the user-facing message.
    Error(String),
}

impl SyncState {
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Loading | Self::Mutating)
    }
}

/// State plus the data it describes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot<T> {
    pub state: SyncState,
    pub data: T,
}

/// Owned mirror of one remote resource.
pub(crate) struct Mirror<T> {
    tx: watch::Sender<Snapshot<T>>,
    op_lock: Mutex<()>,
}

impl<T: Clone + Default> Mirror<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Snapshot::default());
        Self {
            tx,
            op_lock: Mutex::new(()),
        }
    }

    /// Serialize an operation against this mirror.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.op_lock.lock().await
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }

    pub fn data(&self) -> T {
        self.tx.borrow().data.clone()
    }

    pub fn set_state(&self, state: SyncState) {
        self.tx.send_modify(|snapshot| snapshot.state = state);
    }

    /// Replace the data and mark it current.
    pub fn ready(&self, data: T) {
        self.tx.send_replace(Snapshot {
            state: SyncState::Ready,
            data,
        });
    }

    /// Adjust the data in place and mark it current.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(|snapshot| {
            f(&mut snapshot.data);
            snapshot.state = SyncState::Ready;
        });
    }

    /// Put back a snapshot taken before a failed mutation.
    pub fn restore(&self, previous: Snapshot<T>) {
        self.tx.send_replace(previous);
    }

    /// Back to `Uninitialized` with default data.
    pub fn reset(&self) {
        self.tx.send_replace(Snapshot::default());
    }
}
