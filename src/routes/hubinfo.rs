//! Connection introspection for the rest of the platform: the CRUD layer
//! asks whether a participant is reachable before deciding between a live
//! push and the email fallback.

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::AppError;
use crate::models::ParticipantRole;
use crate::state::AppState;

pub async fn ws_status(
    state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, AppError> {
    let (user_type, user_id) = path.into_inner();
    let role = ParticipantRole::parse(&user_type)
        .ok_or_else(|| AppError::BadRequest("userType must be requester or staff".into()))?;

    let connected = state.registry.is_connected(role, user_id).await;

    Ok(HttpResponse::Ok().json(json!({
        "user_id": user_id,
        "user_type": role,
        "connected": connected,
    })))
}

pub async fn ws_metrics(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let total = state.registry.connection_count().await;
    let staff = state.registry.role_count(ParticipantRole::Staff).await;
    let requesters = state.registry.role_count(ParticipantRole::Requester).await;

    Ok(HttpResponse::Ok().json(json!({
        "total_connections": total,
        "staff_connections": staff,
        "requester_connections": requesters,
    })))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/ws")
            .route("/status/{user_type}/{user_id}", web::get().to(ws_status))
            .route("/metrics", web::get().to(ws_metrics)),
    );
}
