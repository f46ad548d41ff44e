//! The hub's only path to persistence.
//!
//! Messages of record live in the ticket database; the hub creates rows on
//! behalf of connected clients, reads them back to notify peers, and
//! advances the status columns. Nothing else in the schema is touched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::AppError;
use crate::models::{Attachment, ChatMessage, MessageStatus, NewMessage, ParticipantRole};

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a message with status `sent`, link any uploaded attachments
    /// to it, and return the stored row enriched with sender details.
    async fn create_message(&self, new: NewMessage) -> Result<ChatMessage, AppError>;

    /// Advance to `delivered` if the message has not been delivered yet.
    /// Returns whether a row actually changed.
    async fn mark_delivered(&self, message_id: i64) -> Result<bool, AppError>;

    /// Advance to `read` if the message has not been read yet, backfilling
    /// the delivery timestamp when it was skipped. Returns whether a row
    /// actually changed.
    async fn mark_read(&self, message_id: i64) -> Result<bool, AppError>;

    async fn message(&self, message_id: i64) -> Result<Option<ChatMessage>, AppError>;

    async fn requester_for_ticket(&self, ticket_id: i64) -> Result<Option<i64>, AppError>;
}

const SELECT_MESSAGE_SQL: &str = "\
SELECT tm.id, tm.ticket_id, tm.sender_type, tm.sender_id, tm.content, tm.status, \
       tm.created_at, tm.delivered_at, tm.read_at, \
       CASE \
         WHEN tm.sender_type = 'requester' THEN r.full_name \
         WHEN tm.sender_type = 'staff' THEN u.first_name \
       END AS sender_name, \
       CASE \
         WHEN tm.sender_type = 'requester' THEN r.email \
         WHEN tm.sender_type = 'staff' THEN u.email \
       END AS sender_email \
FROM ticket_messages tm \
LEFT JOIN requesters r ON tm.sender_type = 'requester' AND tm.sender_id = r.id \
LEFT JOIN users u ON tm.sender_type = 'staff' AND tm.sender_id = u.id \
WHERE tm.id = $1";

pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attachments_for(&self, message_id: i64) -> Result<Vec<Attachment>, AppError> {
        let rows = sqlx::query(
            "SELECT id, file_name, file_path FROM ticket_attachments \
             WHERE message_id = $1 ORDER BY id",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Attachment {
                    id: row.try_get("id")?,
                    file_name: row.try_get("file_name")?,
                    file_path: row.try_get("file_path")?,
                })
            })
            .collect()
    }
}

fn map_message_row(row: &PgRow) -> Result<ChatMessage, AppError> {
    let sender_type: String = row.try_get("sender_type")?;
    let sender_role = ParticipantRole::parse(&sender_type).ok_or(AppError::Internal)?;
    let status: String = row.try_get("status")?;
    let status = MessageStatus::parse(&status).ok_or(AppError::Internal)?;

    Ok(ChatMessage {
        id: row.try_get("id")?,
        ticket_id: row.try_get("ticket_id")?,
        sender_role,
        sender_id: row.try_get("sender_id")?,
        sender_name: row.try_get("sender_name")?,
        sender_email: row.try_get("sender_email")?,
        content: row.try_get("content")?,
        attachments: Vec::new(),
        status,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        delivered_at: row.try_get::<Option<DateTime<Utc>>, _>("delivered_at")?,
        read_at: row.try_get::<Option<DateTime<Utc>>, _>("read_at")?,
    })
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn create_message(&self, new: NewMessage) -> Result<ChatMessage, AppError> {
        let row = sqlx::query(
            "INSERT INTO ticket_messages \
               (ticket_id, sender_type, sender_id, content, content_type, status) \
             VALUES ($1, $2, $3, $4, 'text', 'sent') \
             RETURNING id",
        )
        .bind(new.ticket_id)
        .bind(new.sender_role.as_str())
        .bind(new.sender_id)
        .bind(&new.content)
        .fetch_one(&self.pool)
        .await?;
        let message_id: i64 = row.try_get("id")?;

        // attachments are uploaded ahead of the message; claim them for it
        for attachment_id in &new.attachment_ids {
            sqlx::query(
                "UPDATE ticket_attachments SET message_id = $1 \
                 WHERE id = $2 AND ticket_id = $3",
            )
            .bind(message_id)
            .bind(attachment_id)
            .bind(new.ticket_id)
            .execute(&self.pool)
            .await?;
        }

        sqlx::query("UPDATE tickets SET updated_at = NOW() WHERE id = $1")
            .bind(new.ticket_id)
            .execute(&self.pool)
            .await?;

        self.message(message_id).await?.ok_or(AppError::NotFound)
    }

    async fn mark_delivered(&self, message_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE ticket_messages \
             SET status = 'delivered', delivered_at = NOW() \
             WHERE id = $1 AND delivered_at IS NULL",
        )
        .bind(message_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_read(&self, message_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE ticket_messages \
             SET status = 'read', read_at = NOW(), \
                 delivered_at = COALESCE(delivered_at, NOW()) \
             WHERE id = $1 AND read_at IS NULL",
        )
        .bind(message_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn message(&self, message_id: i64) -> Result<Option<ChatMessage>, AppError> {
        let row = sqlx::query(SELECT_MESSAGE_SQL)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut message = map_message_row(&row)?;
                message.attachments = self.attachments_for(message.id).await?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    async fn requester_for_ticket(&self, ticket_id: i64) -> Result<Option<i64>, AppError> {
        let row = sqlx::query("SELECT requester_id FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get::<Option<i64>, _>("requester_id")?),
            None => Ok(None),
        }
    }
}
