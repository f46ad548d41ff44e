//! Recipient-set decisions for the two-role ticket topology.
//!
//! Requester-originated events fan out to every connected staff member;
//! staff-originated events reach the one requester the ticket belongs to.
//! The hub is constructed once at startup and injected wherever events are
//! emitted, so "hub not wired up" is a compile error rather than a runtime
//! global check.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{ChatMessage, MessageStatus, ParticipantRole};
use crate::services::message_store::MessageStore;

use super::message_types::OutboundFrame;
use super::ConnectionRegistry;

/// What a `new_message` push actually reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewMessageOutcome {
    /// Peers that received `new_message`.
    pub recipients: usize,
    /// Whether the sender's `message_sent` acknowledgement was delivered.
    pub acked_sender: bool,
}

#[derive(Clone)]
pub struct NotificationHub {
    registry: ConnectionRegistry,
    store: Arc<dyn MessageStore>,
}

impl NotificationHub {
    pub fn new(registry: ConnectionRegistry, store: Arc<dyn MessageStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Push a freshly persisted message to its recipient set and ack the
    /// sender. A disconnected recipient just misses the push; the message
    /// is already in the store and shows up on the next history fetch.
    pub async fn notify_new_message(&self, message: &ChatMessage) -> NewMessageOutcome {
        let frame = OutboundFrame::NewMessage {
            message: message.clone(),
        };

        let recipients = match message.sender_role {
            ParticipantRole::Requester => {
                self.registry
                    .broadcast_role(ParticipantRole::Staff, frame)
                    .await
            }
            ParticipantRole::Staff => match self.requester_for(message.ticket_id).await {
                Some(requester_id) => {
                    if self
                        .registry
                        .send_to(ParticipantRole::Requester, requester_id, frame)
                        .await
                    {
                        1
                    } else {
                        debug!(
                            ticket_id = message.ticket_id,
                            requester_id, "requester not connected, new_message dropped"
                        );
                        0
                    }
                }
                None => 0,
            },
        };

        let acked_sender = self
            .registry
            .send_to(
                message.sender_role,
                message.sender_id,
                OutboundFrame::message_sent(message.id, message.ticket_id),
            )
            .await;

        NewMessageOutcome {
            recipients,
            acked_sender,
        }
    }

    /// Unicast a status change to the message's original sender. No-op when
    /// the sender is not connected.
    pub async fn notify_status_update(&self, message: &ChatMessage, status: MessageStatus) -> bool {
        self.registry
            .send_to(
                message.sender_role,
                message.sender_id,
                OutboundFrame::status_update(message.id, message.ticket_id, status),
            )
            .await
    }

    /// Route a typing signal to the opposite role only; the sender never
    /// sees its own indicator.
    pub async fn notify_typing(
        &self,
        ticket_id: i64,
        sender_id: i64,
        sender_role: ParticipantRole,
        is_typing: bool,
    ) -> bool {
        let frame = OutboundFrame::TypingIndicator {
            ticket_id,
            user_id: sender_id,
            user_type: sender_role,
            is_typing,
        };

        match sender_role {
            ParticipantRole::Requester => {
                self.registry
                    .broadcast_role(ParticipantRole::Staff, frame)
                    .await
                    > 0
            }
            ParticipantRole::Staff => match self.requester_for(ticket_id).await {
                Some(requester_id) => {
                    self.registry
                        .send_to(ParticipantRole::Requester, requester_id, frame)
                        .await
                }
                None => false,
            },
        }
    }

    async fn requester_for(&self, ticket_id: i64) -> Option<i64> {
        match self.store.requester_for_ticket(ticket_id).await {
            Ok(requester) => requester,
            Err(e) => {
                warn!(error = %e, ticket_id, "requester lookup failed, notification dropped");
                None
            }
        }
    }
}
