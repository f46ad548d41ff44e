//! HTTP write path: the CRUD layer posts a message here after validating
//! the request; the handler persists it and hands the committed row to the
//! hub. A persistence failure becomes the request failure and no push is
//! attempted.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{NewMessage, ParticipantRole};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub sender_id: i64,
    pub sender_type: ParticipantRole,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<i64>,
}

pub async fn create_message(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CreateMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let ticket_id = path.into_inner();
    let body = body.into_inner();

    if body.content.is_empty() && body.attachments.is_empty() {
        return Err(AppError::BadRequest(
            "message needs content or attachments".into(),
        ));
    }

    let message = state
        .store
        .create_message(NewMessage {
            ticket_id,
            sender_role: body.sender_type,
            sender_id: body.sender_id,
            content: body.content,
            attachment_ids: body.attachments,
        })
        .await?;

    let outcome = state.hub.notify_new_message(&message).await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": message,
        "recipients": outcome.recipients,
    })))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/tickets")
            .route("/{ticket_id}/messages", web::post().to(create_message)),
    );
}
