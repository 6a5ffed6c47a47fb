use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::AppResult;
use crate::storage::DurabilityGateway;
use crate::websocket::broadcaster::GroupBroadcaster;
use crate::websocket::events::{InboundEvent, OutboundEvent};
use crate::websocket::registry::ConnectionRegistry;
use crate::websocket::ConnectionId;

/// Relay session: the state machine for one connection
///
/// Lifecycle is `Connecting -> Joined -> Closed`. [`RelaySession::join`] is
/// the `Connecting -> Joined` transition; a constructed session is in the
/// `Joined` state and [`RelaySession::close`] is the terminal transition.
/// Frames must be fed to [`RelaySession::handle_frame`] one at a time so
/// broadcasts from the same session keep their order.
pub struct RelaySession {
    conn_id: ConnectionId,
    chat_id: String,
    username: String,
    registry: ConnectionRegistry,
    broadcaster: GroupBroadcaster,
    gateway: Arc<dyn DurabilityGateway>,
}

impl RelaySession {
    /// Join the registry and the chat's broadcast group.
    ///
    /// Returns the session plus the receiver carrying frames broadcast to
    /// this connection. Any failure leaves nothing registered: registration
    /// happens first and is the only fallible step.
    pub async fn join(
        registry: ConnectionRegistry,
        broadcaster: GroupBroadcaster,
        gateway: Arc<dyn DurabilityGateway>,
        chat_id: String,
        username: String,
    ) -> AppResult<(Self, UnboundedReceiver<String>)> {
        let conn_id = ConnectionId::new();
        registry.register(conn_id, &chat_id, &username).await?;
        let rx = broadcaster.join(&chat_id, conn_id).await;

        tracing::info!(%conn_id, chat_id, username, "relay session joined");

        Ok((
            Self {
                conn_id,
                chat_id,
                username,
                registry,
                broadcaster,
                gateway,
            },
            rx,
        ))
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Handle one raw inbound frame.
    ///
    /// Typing events are broadcast directly and never persisted. Chat
    /// messages are persisted first; the broadcast happens only after the
    /// gateway reports success. Returns an error-ack frame for the
    /// originating connection when the frame is rejected; other members
    /// never observe rejected frames.
    pub async fn handle_frame(&self, raw: &str) -> Option<String> {
        let event = match InboundEvent::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(conn_id = %self.conn_id, error = %e, "dropping malformed frame");
                return Some(
                    OutboundEvent::Error {
                        reason: "malformed frame".into(),
                    }
                    .to_frame(),
                );
            }
        };

        match event {
            InboundEvent::Typing { .. } => {
                let notice = OutboundEvent::Typing {
                    username: self.username.clone(),
                };
                // Sender-inclusive: the sender's own UI renders from the
                // broadcast as well.
                self.broadcaster
                    .broadcast(&self.chat_id, notice.to_frame(), None)
                    .await;
                None
            }
            InboundEvent::Message { message, iv } => {
                match self
                    .gateway
                    .persist(&self.chat_id, &self.username, &message, &iv)
                    .await
                {
                    Ok(stored) => {
                        tracing::debug!(
                            conn_id = %self.conn_id,
                            chat_id = %self.chat_id,
                            sequence = stored.sequence_number,
                            "message persisted, broadcasting"
                        );
                        let notice = OutboundEvent::Message {
                            message,
                            iv: Some(iv),
                            username: self.username.clone(),
                        };
                        self.broadcaster
                            .broadcast(&self.chat_id, notice.to_frame(), None)
                            .await;
                        None
                    }
                    Err(e) => {
                        tracing::error!(
                            conn_id = %self.conn_id,
                            chat_id = %self.chat_id,
                            error = %e,
                            "persist failed, message dropped"
                        );
                        Some(
                            OutboundEvent::Error {
                                reason: "message not delivered".into(),
                            }
                            .to_frame(),
                        )
                    }
                }
            }
        }
    }

    /// `Joined -> Closed`: leave the broadcast group, then the registry.
    ///
    /// Both steps are idempotent, so racing a transport failure against an
    /// explicit shutdown is harmless.
    pub async fn close(&self) {
        self.broadcaster.leave(&self.chat_id, self.conn_id).await;
        self.registry.unregister(self.conn_id).await;
        tracing::info!(conn_id = %self.conn_id, chat_id = %self.chat_id, "relay session closed");
    }
}
