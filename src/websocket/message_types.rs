//! Wire frames exchanged over a hub connection.
//!
//! Both directions are closed tagged enums: an inbound frame either parses
//! into a known variant with all required fields present, or it is dropped
//! at the boundary. Field names follow the client protocol, which mixes
//! snake_case payloads with camelCase handshake/typing keys.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{ChatMessage, MessageStatus, ParticipantRole};

/// Frames a client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundFrame {
    /// A chat message to persist and route to the opposite side.
    #[serde(rename = "chat_message")]
    ChatMessage {
        ticket_id: i64,
        #[serde(default)]
        content: String,
        sender_id: i64,
        sender_type: ParticipantRole,
        #[serde(default)]
        attachments: Vec<i64>,
    },

    /// Transient typing signal; never persisted.
    #[serde(rename = "typing")]
    Typing {
        ticket_id: i64,
        sender_id: i64,
        sender_type: ParticipantRole,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },

    /// Request to advance a message's delivery status.
    #[serde(rename = "message_status")]
    MessageStatus {
        message_id: i64,
        status: MessageStatus,
    },

    /// Application-level liveness probe; answered with `pong`. Clients send
    /// whatever clock representation they have; it is echoed nowhere.
    #[serde(rename = "ping")]
    Ping {
        #[serde(default)]
        timestamp: Option<serde_json::Value>,
    },
}

/// Frames the hub may push.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    /// Handshake acknowledgement echoing the connection's identity.
    #[serde(rename = "connection_established")]
    ConnectionEstablished {
        #[serde(rename = "userId")]
        user_id: i64,
        #[serde(rename = "userType")]
        user_type: ParticipantRole,
        #[serde(rename = "ticketId", default, skip_serializing_if = "Option::is_none")]
        ticket_id: Option<i64>,
        timestamp: String,
    },

    #[serde(rename = "new_message")]
    NewMessage { message: ChatMessage },

    /// Write acknowledgement unicast to the message's sender.
    #[serde(rename = "message_sent")]
    MessageSent {
        message_id: i64,
        ticket_id: i64,
        timestamp: String,
    },

    #[serde(rename = "typing_indicator")]
    TypingIndicator {
        ticket_id: i64,
        user_id: i64,
        user_type: ParticipantRole,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },

    /// Status change unicast to the message's original sender.
    #[serde(rename = "status_update")]
    StatusUpdate {
        message_id: i64,
        ticket_id: i64,
        status: MessageStatus,
        timestamp: String,
    },

    #[serde(rename = "pong")]
    Pong { timestamp: String },
}

impl OutboundFrame {
    pub fn connection_established(
        user_id: i64,
        user_type: ParticipantRole,
        ticket_id: Option<i64>,
    ) -> Self {
        OutboundFrame::ConnectionEstablished {
            user_id,
            user_type,
            ticket_id,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn message_sent(message_id: i64, ticket_id: i64) -> Self {
        OutboundFrame::MessageSent {
            message_id,
            ticket_id,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn status_update(message_id: i64, ticket_id: i64, status: MessageStatus) -> Self {
        OutboundFrame::StatusUpdate {
            message_id,
            ticket_id,
            status,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn pong() -> Self {
        OutboundFrame::Pong {
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl InboundFrame {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
