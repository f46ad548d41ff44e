//! Forward-only message-status state machine.
//!
//! Clients may request `delivered` or `read`; `sent` is the implicit
//! initial state and is never re-entered. The store's guarded updates make
//! repeats and out-of-order requests no-ops, so the tracker only notifies
//! when a row actually changed.

use std::sync::Arc;

use tracing::warn;

use crate::error::AppError;
use crate::models::MessageStatus;
use crate::services::message_store::MessageStore;
use crate::websocket::router::NotificationHub;

/// Result of an externally-requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The requested state was already reached (or was `sent`); nothing
    /// persisted, nothing pushed.
    NoOp,
    /// The row advanced; `notified` reports whether the original sender was
    /// connected to receive the `status_update` push.
    Applied { notified: bool },
}

#[derive(Clone)]
pub struct StatusTracker {
    store: Arc<dyn MessageStore>,
    hub: NotificationHub,
}

impl StatusTracker {
    pub fn new(store: Arc<dyn MessageStore>, hub: NotificationHub) -> Self {
        Self { store, hub }
    }

    pub async fn apply(
        &self,
        message_id: i64,
        target: MessageStatus,
    ) -> Result<StatusChange, AppError> {
        let changed = match target {
            MessageStatus::Sent => {
                warn!(message_id, "ignoring request to re-enter initial status");
                false
            }
            MessageStatus::Delivered => self.store.mark_delivered(message_id).await?,
            MessageStatus::Read => self.store.mark_read(message_id).await?,
        };

        if !changed {
            return Ok(StatusChange::NoOp);
        }

        match self.store.message(message_id).await? {
            Some(message) => {
                let notified = self.hub.notify_status_update(&message, target).await;
                Ok(StatusChange::Applied { notified })
            }
            None => {
                // the row changed but vanished before read-back; nothing to push
                warn!(message_id, "status advanced but message no longer readable");
                Ok(StatusChange::Applied { notified: false })
            }
        }
    }
}
