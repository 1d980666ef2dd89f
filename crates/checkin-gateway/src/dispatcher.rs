use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use checkin_types::events::{ChangeKind, DirectoryEvent};
use checkin_types::models::Guest;

/// Fans directory events out to every open check-in view.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel for directory events; every viewer receives every event
    broadcast_tx: broadcast::Sender<DirectoryEvent>,

    /// Open gateway connections, by connection id
    viewers: RwLock<HashSet<Uuid>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                viewers: RwLock::new(HashSet::new()),
            }),
        }
    }

    /// Subscribe to directory events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all viewers. No viewers is not an error.
    pub fn broadcast(&self, event: DirectoryEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Tell viewers their listings and directory cache are stale.
    /// `guest` is the row after the change, or `None` once deleted.
    pub fn guests_changed(&self, kind: ChangeKind, guest_id: &str, guest: Option<&Guest>) {
        self.broadcast(DirectoryEvent::GuestsChanged {
            kind,
            guest_id: guest_id.to_string(),
            bucket: guest.map(Guest::bucket),
        });
    }

    pub async fn viewer_connected(&self) -> Uuid {
        let conn_id = Uuid::new_v4();
        self.inner.viewers.write().await.insert(conn_id);
        conn_id
    }

    pub async fn viewer_disconnected(&self, conn_id: Uuid) {
        self.inner.viewers.write().await.remove(&conn_id);
    }

    pub async fn viewer_count(&self) -> usize {
        self.inner.viewers.read().await.len()
    }
}
