use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::UserId;

/// Delivery endpoint of one live session. The websocket task holds the
/// receiving half and forwards payloads into the socket.
pub type SessionSender = mpsc::UnboundedSender<String>;

/// Process-unique handle identity, so unregistering one of a user's
/// sessions cannot remove a sibling carrying an identical sender.
pub type SessionId = u64;

struct SessionSlot {
    id: SessionId,
    tx: SessionSender,
}

/// Tracks which realtime sessions are open per user and pushes payloads
/// to all of them. Cloneable; lives in `AppState` and is injected into
/// the router and the aggregator. One coarse lock guards the map —
/// mutations are cheap and never held across an await of the transport.
#[derive(Clone)]
pub struct ConnectionRegistry {
    sessions: Arc<Mutex<HashMap<UserId, Vec<SessionSlot>>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The session becomes a delivery target immediately.
    pub async fn register(&self, user_id: UserId, tx: SessionSender) -> SessionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.lock().await;
        sessions.entry(user_id).or_default().push(SessionSlot { id, tx });
        info!(user_id, session_id = id, "session registered");
        id
    }

    /// Removes one session; dropping the last one removes the user entry
    /// entirely. Safe to call for a session that is already gone.
    pub async fn unregister(&self, user_id: UserId, session_id: SessionId) {
        let mut sessions = self.sessions.lock().await;
        if let Some(slots) = sessions.get_mut(&user_id) {
            slots.retain(|slot| slot.id != session_id);
            if slots.is_empty() {
                sessions.remove(&user_id);
            }
            debug!(user_id, session_id, "session unregistered");
        }
    }

    /// Best-effort, at-most-once push to every live session of a user.
    /// A push to a gone peer unregisters that session on the spot and is
    /// otherwise swallowed; an unknown user is a silent no-op.
    pub async fn send_to_user(&self, user_id: UserId, payload: String) {
        let mut sessions = self.sessions.lock().await;
        let Some(slots) = sessions.get_mut(&user_id) else {
            return;
        };
        slots.retain(|slot| {
            if slot.tx.send(payload.clone()).is_ok() {
                true
            } else {
                warn!(user_id, session_id = slot.id, "pruning dead session");
                false
            }
        });
        if slots.is_empty() {
            sessions.remove(&user_id);
        }
    }

    pub async fn session_count(&self, user_id: UserId) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.get(&user_id).map_or(0, Vec::len)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn one_send_reaches_every_device() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        registry.register(1, tx_a).await;
        registry.register(1, tx_b).await;

        registry.send_to_user(1, "ping".to_owned()).await;

        assert_eq!(rx_a.recv().await.unwrap(), "ping");
        assert_eq!(rx_b.recv().await.unwrap(), "ping");
    }

    #[tokio::test]
    async fn last_unregister_drops_the_user_entry() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session_id = registry.register(1, tx).await;

        registry.unregister(1, session_id).await;
        assert_eq!(registry.session_count(1).await, 0);

        // repeat unregister and a send to the gone user are silent no-ops
        registry.unregister(1, session_id).await;
        registry.send_to_user(1, "ping".to_owned()).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_only_removes_the_named_session() {
        let registry = ConnectionRegistry::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let id_a = registry.register(1, tx_a).await;
        registry.register(1, tx_b).await;

        registry.unregister(1, id_a).await;
        assert_eq!(registry.session_count(1).await, 1);

        registry.send_to_user(1, "ping".to_owned()).await;
        assert_eq!(rx_b.recv().await.unwrap(), "ping");
    }

    #[tokio::test]
    async fn dead_sessions_are_pruned_on_send() {
        let registry = ConnectionRegistry::new();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        registry.register(1, tx_dead).await;
        registry.register(1, tx_live).await;
        drop(rx_dead);

        registry.send_to_user(1, "ping".to_owned()).await;

        assert_eq!(rx_live.recv().await.unwrap(), "ping");
        assert_eq!(registry.session_count(1).await, 1);
    }
}
