use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};

use crate::websocket::ConnectionId;

/// Member entry with connection id and delivery channel
struct Member {
    id: ConnectionId,
    sender: UnboundedSender<String>,
}

/// Group broadcaster: per-chat membership sets plus fan-out
///
/// Groups are created lazily on first join and reclaimed when their member
/// set becomes empty. Delivery to a member whose channel has closed is
/// best-effort: the dead member is dropped from the group during the same
/// broadcast and the remaining members still receive the frame.
#[derive(Default, Clone)]
pub struct GroupBroadcaster {
    // chat_id -> list of members
    inner: Arc<RwLock<HashMap<String, Vec<Member>>>>,
}

impl GroupBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a chat group.
    ///
    /// Returns the receiving end of the member's delivery channel; frames
    /// broadcast to the group after this call arrive on it in order.
    pub async fn join(&self, chat_id: &str, conn_id: ConnectionId) -> UnboundedReceiver<String> {
        let (tx, rx) = unbounded_channel();

        let mut guard = self.inner.write().await;
        let members = guard.entry(chat_id.to_string()).or_default();
        members.push(Member {
            id: conn_id,
            sender: tx,
        });

        tracing::debug!(
            %conn_id,
            chat_id,
            members = members.len(),
            "connection joined chat group"
        );

        rx
    }

    /// Remove a connection from a chat group. Idempotent.
    pub async fn leave(&self, chat_id: &str, conn_id: ConnectionId) {
        let mut guard = self.inner.write().await;

        if let Some(members) = guard.get_mut(chat_id) {
            let before = members.len();
            members.retain(|m| m.id != conn_id);

            if members.len() != before {
                tracing::debug!(
                    %conn_id,
                    chat_id,
                    remaining = members.len(),
                    "connection left chat group"
                );
            }

            if members.is_empty() {
                guard.remove(chat_id);
                tracing::debug!(chat_id, "reclaimed empty chat group");
            }
        }
    }

    /// Deliver a frame to every member of a chat group.
    ///
    /// `exclude` skips the originating connection when a caller wants
    /// sender-exclusive delivery. Dead members are cleaned up in place; one
    /// failed delivery never aborts fan-out to the rest.
    pub async fn broadcast(&self, chat_id: &str, frame: String, exclude: Option<ConnectionId>) {
        let mut guard = self.inner.write().await;
        let Some(members) = guard.get_mut(chat_id) else {
            return;
        };

        let before = members.len();
        members.retain(|m| {
            if Some(m.id) == exclude {
                return true;
            }
            m.sender.send(frame.clone()).is_ok()
        });
        let after = members.len();

        if before != after {
            tracing::debug!(
                chat_id,
                dead = before - after,
                active = after,
                "cleaned up dead members during broadcast"
            );
        }

        if members.is_empty() {
            guard.remove(chat_id);
        }
    }

    pub async fn member_count(&self, chat_id: &str) -> usize {
        let guard = self.inner.read().await;
        guard.get(chat_id).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_member() {
        let broadcaster = GroupBroadcaster::new();
        let mut rx_a = broadcaster.join("42", ConnectionId::new()).await;
        let mut rx_b = broadcaster.join("42", ConnectionId::new()).await;
        let mut rx_c = broadcaster.join("42", ConnectionId::new()).await;

        broadcaster.broadcast("42", "hello".into(), None).await;

        assert_eq!(rx_a.try_recv().unwrap(), "hello");
        assert_eq!(rx_b.try_recv().unwrap(), "hello");
        assert_eq!(rx_c.try_recv().unwrap(), "hello");
    }

    #[tokio::test]
    async fn broadcast_can_exclude_the_sender() {
        let broadcaster = GroupBroadcaster::new();
        let sender = ConnectionId::new();
        let mut rx_sender = broadcaster.join("42", sender).await;
        let mut rx_peer = broadcaster.join("42", ConnectionId::new()).await;

        broadcaster.broadcast("42", "hello".into(), Some(sender)).await;

        assert!(rx_sender.try_recv().is_err());
        assert_eq!(rx_peer.try_recv().unwrap(), "hello");
    }

    #[tokio::test]
    async fn dead_member_is_dropped_but_peers_still_receive() {
        let broadcaster = GroupBroadcaster::new();
        let dead = ConnectionId::new();
        let rx_dead = broadcaster.join("42", dead).await;
        let mut rx_live = broadcaster.join("42", ConnectionId::new()).await;
        drop(rx_dead);

        broadcaster.broadcast("42", "hello".into(), None).await;

        assert_eq!(rx_live.try_recv().unwrap(), "hello");
        assert_eq!(broadcaster.member_count("42").await, 1);
    }

    #[tokio::test]
    async fn leave_is_idempotent_and_reclaims_empty_groups() {
        let broadcaster = GroupBroadcaster::new();
        let conn = ConnectionId::new();
        let _rx = broadcaster.join("42", conn).await;

        broadcaster.leave("42", conn).await;
        broadcaster.leave("42", conn).await;
        assert_eq!(broadcaster.member_count("42").await, 0);

        // Broadcasting to a reclaimed group is a no-op.
        broadcaster.broadcast("42", "hello".into(), None).await;
    }

    #[tokio::test]
    async fn frames_arrive_in_broadcast_order() {
        let broadcaster = GroupBroadcaster::new();
        let mut rx = broadcaster.join("42", ConnectionId::new()).await;

        broadcaster.broadcast("42", "e1".into(), None).await;
        broadcaster.broadcast("42", "e2".into(), None).await;
        broadcaster.broadcast("42", "e3".into(), None).await;

        assert_eq!(rx.try_recv().unwrap(), "e1");
        assert_eq!(rx.try_recv().unwrap(), "e2");
        assert_eq!(rx.try_recv().unwrap(), "e3");
    }

    #[tokio::test]
    async fn groups_are_isolated() {
        let broadcaster = GroupBroadcaster::new();
        let mut rx_42 = broadcaster.join("42", ConnectionId::new()).await;
        let mut rx_7 = broadcaster.join("7", ConnectionId::new()).await;

        broadcaster.broadcast("42", "hello".into(), None).await;

        assert_eq!(rx_42.try_recv().unwrap(), "hello");
        assert!(rx_7.try_recv().is_err());
    }
}
