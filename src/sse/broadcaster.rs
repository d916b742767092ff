//! Broadcast group membership and event fan-out
//!
//! Explicit per-connection membership registry: a connection is registered
//! when its event stream opens, joins/leaves named groups via control
//! requests, and is removed when the stream drops. Delivery is at-most-once
//! best-effort; a slow or closed subscriber loses events rather than
//! blocking the write path.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::SongChange;

/// Broadcast group carrying song change events
pub const SONGS_GROUP: &str = "songs";

/// Events buffered per connection before drops set in
const CONNECTION_BUFFER: usize = 64;

#[derive(Default)]
struct Registry {
    connections: HashMap<Uuid, mpsc::Sender<SongChange>>,
    groups: HashMap<String, HashSet<Uuid>>,
}

/// Connection registry and group fan-out
#[derive(Default)]
pub struct Broadcaster {
    inner: RwLock<Registry>,
}

/// A registered connection's receiving end
///
/// Dropping the handle deregisters the connection and removes it from every
/// group it joined.
pub struct ConnectionHandle {
    id: Uuid,
    rx: mpsc::Receiver<SongChange>,
    broadcaster: Arc<Broadcaster>,
}

impl ConnectionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event delivered to this connection
    pub async fn recv(&mut self) -> Option<SongChange> {
        self.rx.recv().await
    }

    /// Non-blocking receive (tests)
    pub fn try_recv(&mut self) -> Option<SongChange> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.broadcaster.deregister(self.id);
    }
}

impl Broadcaster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new connection and hand back its event receiver
    pub fn register(self: &Arc<Self>) -> ConnectionHandle {
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        let id = Uuid::new_v4();

        {
            let mut registry = self.inner.write().expect("registry lock poisoned");
            registry.connections.insert(id, tx);
            info!(
                "Event stream client {} connected ({} total)",
                id,
                registry.connections.len()
            );
        }

        ConnectionHandle {
            id,
            rx,
            broadcaster: Arc::clone(self),
        }
    }

    /// Remove a connection and all of its group memberships
    pub fn deregister(&self, connection_id: Uuid) {
        let mut registry = self.inner.write().expect("registry lock poisoned");
        if registry.connections.remove(&connection_id).is_some() {
            info!("Event stream client {} disconnected", connection_id);
        }
        for members in registry.groups.values_mut() {
            members.remove(&connection_id);
        }
    }

    /// Add a connection to a broadcast group (idempotent)
    ///
    /// Returns false when the connection is not registered.
    pub fn join(&self, group: &str, connection_id: Uuid) -> bool {
        let mut registry = self.inner.write().expect("registry lock poisoned");
        if !registry.connections.contains_key(&connection_id) {
            return false;
        }
        let added = registry
            .groups
            .entry(group.to_string())
            .or_default()
            .insert(connection_id);
        if added {
            info!("Client {} joined group '{}'", connection_id, group);
        }
        true
    }

    /// Remove a connection from a broadcast group (idempotent)
    ///
    /// Returns false when the connection is not registered.
    pub fn leave(&self, group: &str, connection_id: Uuid) -> bool {
        let mut registry = self.inner.write().expect("registry lock poisoned");
        if !registry.connections.contains_key(&connection_id) {
            return false;
        }
        if let Some(members) = registry.groups.get_mut(group) {
            if members.remove(&connection_id) {
                info!("Client {} left group '{}'", connection_id, group);
            }
        }
        true
    }

    /// Publish an event to every current member of a group
    ///
    /// Returns the number of members the event was handed to. Members whose
    /// receiving end has gone away are pruned.
    pub fn broadcast(&self, group: &str, event: SongChange) -> usize {
        let targets: Vec<(Uuid, mpsc::Sender<SongChange>)> = {
            let registry = self.inner.read().expect("registry lock poisoned");
            let Some(members) = registry.groups.get(group) else {
                return 0;
            };
            members
                .iter()
                .filter_map(|id| {
                    registry
                        .connections
                        .get(id)
                        .map(|tx| (*id, tx.clone()))
                })
                .collect()
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Best-effort: a lagging client misses this event
                    warn!("Client {} lagging, dropped {}", id, event.event_name());
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(id),
            }
        }

        for id in dead {
            self.deregister(id);
        }

        debug!(
            "Broadcast {} to {} member(s) of '{}'",
            event.event_name(),
            delivered,
            group
        );
        delivered
    }

    /// Current number of registered connections
    pub fn connection_count(&self) -> usize {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .connections
            .len()
    }

    /// Current number of members in a group
    pub fn member_count(&self, group: &str) -> usize {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .groups
            .get(group)
            .map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateSong, Song};

    fn sample_event() -> SongChange {
        let payload = CreateSong {
            title: Some("T".to_string()),
            artist: Some("A".to_string()),
            genre: Some("G".to_string()),
            ..Default::default()
        };
        SongChange::created(Song::new(payload.validate().unwrap()))
    }

    #[test]
    fn test_member_receives_event() {
        let broadcaster = Broadcaster::new();
        let mut conn = broadcaster.register();
        assert!(broadcaster.join(SONGS_GROUP, conn.id()));

        let delivered = broadcaster.broadcast(SONGS_GROUP, sample_event());
        assert_eq!(delivered, 1);
        assert!(conn.try_recv().is_some());
        assert!(conn.try_recv().is_none());
    }

    #[test]
    fn test_non_member_receives_nothing() {
        let broadcaster = Broadcaster::new();
        let mut joined = broadcaster.register();
        let mut bystander = broadcaster.register();
        broadcaster.join(SONGS_GROUP, joined.id());

        broadcaster.broadcast(SONGS_GROUP, sample_event());
        assert!(joined.try_recv().is_some());
        assert!(bystander.try_recv().is_none());
    }

    #[test]
    fn test_join_is_idempotent() {
        let broadcaster = Broadcaster::new();
        let mut conn = broadcaster.register();
        assert!(broadcaster.join(SONGS_GROUP, conn.id()));
        assert!(broadcaster.join(SONGS_GROUP, conn.id()));
        assert_eq!(broadcaster.member_count(SONGS_GROUP), 1);

        // Joining twice must not duplicate delivery
        broadcaster.broadcast(SONGS_GROUP, sample_event());
        assert!(conn.try_recv().is_some());
        assert!(conn.try_recv().is_none());
    }

    #[test]
    fn test_leave_is_idempotent() {
        let broadcaster = Broadcaster::new();
        let mut conn = broadcaster.register();
        broadcaster.join(SONGS_GROUP, conn.id());
        assert!(broadcaster.leave(SONGS_GROUP, conn.id()));
        assert!(broadcaster.leave(SONGS_GROUP, conn.id()));

        broadcaster.broadcast(SONGS_GROUP, sample_event());
        assert!(conn.try_recv().is_none());
    }

    #[test]
    fn test_join_unknown_connection() {
        let broadcaster = Broadcaster::new();
        assert!(!broadcaster.join(SONGS_GROUP, Uuid::new_v4()));
        assert!(!broadcaster.leave(SONGS_GROUP, Uuid::new_v4()));
    }

    #[test]
    fn test_drop_deregisters_connection() {
        let broadcaster = Broadcaster::new();
        let conn = broadcaster.register();
        let id = conn.id();
        broadcaster.join(SONGS_GROUP, id);
        assert_eq!(broadcaster.connection_count(), 1);

        drop(conn);
        assert_eq!(broadcaster.connection_count(), 0);
        assert_eq!(broadcaster.member_count(SONGS_GROUP), 0);
    }

    #[test]
    fn test_broadcast_to_empty_group() {
        let broadcaster = Broadcaster::new();
        assert_eq!(broadcaster.broadcast(SONGS_GROUP, sample_event()), 0);
    }
}
