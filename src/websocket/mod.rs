use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::ParticipantRole;

pub mod message_types;
pub mod router;

use message_types::OutboundFrame;

/// Channel end through which frames reach one connection's session.
pub type FrameSender = UnboundedSender<OutboundFrame>;

/// Registry key: a participant can hold at most one live connection per role.
pub type ConnectionKey = (ParticipantRole, i64);

/// A live connection as the registry sees it: the frame channel plus an id
/// that lets the owning session remove exactly its own entry on disconnect.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub conn_id: Uuid,
    sender: FrameSender,
}

impl ConnectionHandle {
    pub fn new(sender: FrameSender) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            sender,
        }
    }

    /// Best-effort send. `false` means the receiving session is gone; the
    /// frame is dropped and the caller does not retry.
    pub fn send(&self, frame: OutboundFrame) -> bool {
        self.sender.send(frame).is_ok()
    }
}

/// In-memory directory of live connections keyed by `(role, participant_id)`.
///
/// The most recent registration for a key replaces any prior one; dropping
/// the replaced sender closes the evicted session's channel, which shuts
/// that session down. All operations are safe under concurrent access from
/// independent connection handlers.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<ConnectionKey, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `(role, participant_id)`.
    pub async fn register(&self, role: ParticipantRole, participant_id: i64, handle: ConnectionHandle) {
        let mut guard = self.inner.write().await;
        if guard.insert((role, participant_id), handle).is_some() {
            debug!(%role, participant_id, "replaced existing connection for key");
        }
    }

    /// Remove the entry for the key, but only if it still belongs to
    /// `conn_id`. A disconnect of an already-evicted session is a no-op and
    /// can never remove a newer connection. Returns whether an entry was
    /// removed.
    pub async fn unregister(
        &self,
        role: ParticipantRole,
        participant_id: i64,
        conn_id: Uuid,
    ) -> bool {
        let mut guard = self.inner.write().await;
        match guard.get(&(role, participant_id)) {
            Some(handle) if handle.conn_id == conn_id => {
                guard.remove(&(role, participant_id));
                true
            }
            _ => false,
        }
    }

    /// Current handle for the key, if any.
    pub async fn lookup(&self, role: ParticipantRole, participant_id: i64) -> Option<ConnectionHandle> {
        let guard = self.inner.read().await;
        guard.get(&(role, participant_id)).cloned()
    }

    pub async fn is_connected(&self, role: ParticipantRole, participant_id: i64) -> bool {
        let guard = self.inner.read().await;
        guard.contains_key(&(role, participant_id))
    }

    /// Unicast to one participant. `false` covers both "not registered" and
    /// "registered but the connection is gone"; neither is an error.
    pub async fn send_to(
        &self,
        role: ParticipantRole,
        participant_id: i64,
        frame: OutboundFrame,
    ) -> bool {
        let guard = self.inner.read().await;
        match guard.get(&(role, participant_id)) {
            Some(handle) => handle.send(frame),
            None => false,
        }
    }

    /// Send to every registered connection of `role`. Failures are
    /// per-target and do not abort the remaining sends. Returns the number
    /// of successful deliveries.
    pub async fn broadcast_role(&self, role: ParticipantRole, frame: OutboundFrame) -> usize {
        let guard = self.inner.read().await;
        let mut delivered = 0;
        for ((entry_role, participant_id), handle) in guard.iter() {
            if *entry_role != role {
                continue;
            }
            if handle.send(frame.clone()) {
                delivered += 1;
            } else {
                debug!(%role, participant_id, "broadcast target no longer reachable");
            }
        }
        delivered
    }

    /// Send to every registered connection of both roles.
    pub async fn broadcast_all(&self, frame: OutboundFrame) -> usize {
        let guard = self.inner.read().await;
        guard
            .values()
            .filter(|handle| handle.send(frame.clone()))
            .count()
    }

    pub async fn connection_count(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn role_count(&self, role: ParticipantRole) -> usize {
        let guard = self.inner.read().await;
        guard.keys().filter(|(entry_role, _)| *entry_role == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn frame() -> OutboundFrame {
        OutboundFrame::pong()
    }

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        registry
            .register(ParticipantRole::Staff, 7, ConnectionHandle::new(tx))
            .await;

        assert!(registry.is_connected(ParticipantRole::Staff, 7).await);
        assert!(!registry.is_connected(ParticipantRole::Requester, 7).await);
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn second_registration_replaces_first() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let second = ConnectionHandle::new(tx2);
        let second_id = second.conn_id;

        registry
            .register(ParticipantRole::Requester, 123, ConnectionHandle::new(tx1))
            .await;
        registry
            .register(ParticipantRole::Requester, 123, second)
            .await;

        assert_eq!(registry.connection_count().await, 1);
        let current = registry
            .lookup(ParticipantRole::Requester, 123)
            .await
            .unwrap();
        assert_eq!(current.conn_id, second_id);

        // the replaced sender was dropped, so its channel is now closed
        assert!(rx1.recv().await.is_none());

        // sends reach only the most recent connection
        assert!(
            registry
                .send_to(ParticipantRole::Requester, 123, frame())
                .await
        );
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn unregister_requires_matching_connection_id() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let old = ConnectionHandle::new(tx1);
        let old_id = old.conn_id;
        let new = ConnectionHandle::new(tx2);
        let new_id = new.conn_id;

        registry.register(ParticipantRole::Staff, 789, old).await;
        registry.register(ParticipantRole::Staff, 789, new).await;

        // the evicted session's disconnect must not remove the newer entry
        assert!(!registry.unregister(ParticipantRole::Staff, 789, old_id).await);
        assert!(registry.is_connected(ParticipantRole::Staff, 789).await);

        assert!(registry.unregister(ParticipantRole::Staff, 789, new_id).await);
        assert!(!registry.is_connected(ParticipantRole::Staff, 789).await);
    }

    #[tokio::test]
    async fn send_to_unknown_key_reports_failure() {
        let registry = ConnectionRegistry::new();
        assert!(
            !registry
                .send_to(ParticipantRole::Requester, 404, frame())
                .await
        );
    }

    #[tokio::test]
    async fn send_to_closed_handle_reports_failure_without_panic() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        registry
            .register(ParticipantRole::Staff, 7, ConnectionHandle::new(tx))
            .await;
        drop(rx);

        assert!(!registry.send_to(ParticipantRole::Staff, 7, frame()).await);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_handle_of_the_role() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for id in 1..=3 {
            let (tx, rx) = mpsc::unbounded_channel();
            registry
                .register(ParticipantRole::Staff, id, ConnectionHandle::new(tx))
                .await;
            receivers.push(rx);
        }
        let (req_tx, mut req_rx) = mpsc::unbounded_channel();
        registry
            .register(ParticipantRole::Requester, 123, ConnectionHandle::new(req_tx))
            .await;

        let delivered = registry.broadcast_role(ParticipantRole::Staff, frame()).await;
        assert_eq!(delivered, 3);
        for rx in &mut receivers {
            assert!(rx.recv().await.is_some());
        }
        assert!(req_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_tolerates_per_target_failure() {
        let registry = ConnectionRegistry::new();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry
            .register(ParticipantRole::Staff, 1, ConnectionHandle::new(tx1))
            .await;
        registry
            .register(ParticipantRole::Staff, 2, ConnectionHandle::new(tx2))
            .await;
        drop(rx1);

        let delivered = registry.broadcast_role(ParticipantRole::Staff, frame()).await;
        assert_eq!(delivered, 1);
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn broadcast_all_spans_both_roles() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry
            .register(ParticipantRole::Staff, 1, ConnectionHandle::new(tx1))
            .await;
        registry
            .register(ParticipantRole::Requester, 123, ConnectionHandle::new(tx2))
            .await;

        assert_eq!(registry.broadcast_all(frame()).await, 2);
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
        assert_eq!(registry.role_count(ParticipantRole::Staff).await, 1);
    }
}
