//! Shared test fixtures: an in-memory `MessageStore` with the same guarded
//! status semantics as the relational implementation.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use helpdesk_chat_service::error::AppError;
use helpdesk_chat_service::models::{
    Attachment, ChatMessage, MessageStatus, NewMessage, ParticipantRole,
};
use helpdesk_chat_service::services::message_store::MessageStore;

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    next_id: i64,
    messages: HashMap<i64, ChatMessage>,
    tickets: HashMap<i64, i64>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Associate a ticket with its requester, as the CRUD layer would have.
    pub async fn put_ticket(&self, ticket_id: i64, requester_id: i64) {
        let mut inner = self.inner.lock().await;
        inner.tickets.insert(ticket_id, requester_id);
    }

    pub async fn get(&self, message_id: i64) -> Option<ChatMessage> {
        let inner = self.inner.lock().await;
        inner.messages.get(&message_id).cloned()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn create_message(&self, new: NewMessage) -> Result<ChatMessage, AppError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = inner.next_id;
        let message = ChatMessage {
            id,
            ticket_id: new.ticket_id,
            sender_role: new.sender_role,
            sender_id: new.sender_id,
            sender_name: None,
            sender_email: None,
            content: new.content,
            attachments: new
                .attachment_ids
                .iter()
                .map(|&attachment_id| Attachment {
                    id: attachment_id,
                    file_name: format!("attachment-{attachment_id}"),
                    file_path: format!("/uploads/attachment-{attachment_id}"),
                })
                .collect(),
            status: MessageStatus::Sent,
            created_at: Utc::now(),
            delivered_at: None,
            read_at: None,
        };
        inner.messages.insert(id, message.clone());
        Ok(message)
    }

    async fn mark_delivered(&self, message_id: i64) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        match inner.messages.get_mut(&message_id) {
            Some(message) if message.delivered_at.is_none() => {
                message.delivered_at = Some(Utc::now());
                message.status = MessageStatus::Delivered;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_read(&self, message_id: i64) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        match inner.messages.get_mut(&message_id) {
            Some(message) if message.read_at.is_none() => {
                let now = Utc::now();
                message.read_at = Some(now);
                if message.delivered_at.is_none() {
                    message.delivered_at = Some(now);
                }
                message.status = MessageStatus::Read;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn message(&self, message_id: i64) -> Result<Option<ChatMessage>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.messages.get(&message_id).cloned())
    }

    async fn requester_for_ticket(&self, ticket_id: i64) -> Result<Option<i64>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.tickets.get(&ticket_id).copied())
    }
}

/// Seed a persisted message the way the write path would.
pub async fn persisted_message(
    store: &InMemoryStore,
    ticket_id: i64,
    sender_role: ParticipantRole,
    sender_id: i64,
) -> ChatMessage {
    store
        .create_message(NewMessage {
            ticket_id,
            sender_role,
            sender_id,
            content: "hello".into(),
            attachment_ids: Vec::new(),
        })
        .await
        .unwrap()
}
