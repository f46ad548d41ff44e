use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of a ticket conversation a participant belongs to.
///
/// A connection's role is fixed for its lifetime; the two populations are
/// disjoint and addressed separately by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Requester,
    Staff,
}

impl ParticipantRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantRole::Requester => "requester",
            ParticipantRole::Staff => "staff",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "requester" => Some(ParticipantRole::Requester),
            "staff" => Some(ParticipantRole::Staff),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            ParticipantRole::Requester => ParticipantRole::Staff,
            ParticipantRole::Staff => ParticipantRole::Requester,
        }
    }
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-message delivery lifecycle. Ordering of the variants is meaningful:
/// `Sent < Delivered < Read`, and a message's status never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(MessageStatus::Sent),
            "delivered" => Some(MessageStatus::Delivered),
            "read" => Some(MessageStatus::Read),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file reference linked to a ticket message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub file_name: String,
    pub file_path: String,
}

/// The hub's view of a persisted ticket message.
///
/// The row itself is owned by the external store; the hub reads it back to
/// notify peers and only ever writes the status fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub ticket_id: i64,
    #[serde(rename = "sender_type")]
    pub sender_role: ParticipantRole,
    pub sender_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Input to the message write path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub ticket_id: i64,
    pub sender_role: ParticipantRole,
    pub sender_id: i64,
    pub content: String,
    #[serde(default)]
    pub attachment_ids: Vec<i64>,
}
