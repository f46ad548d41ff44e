use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use helpdesk_chat_service::services::message_store::{MessageStore, PgMessageStore};
use helpdesk_chat_service::{config::Config, db, error::AppError, logging, routes, state::AppState};

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();
    let cfg = Arc::new(Config::from_env()?);

    let pool = db::init_pool(&cfg.database.url, cfg.database.max_connections)
        .await
        .map_err(|e| AppError::StartServer(format!("db: {e}")))?;
    tracing::info!("connected to ticket message store");

    let store: Arc<dyn MessageStore> = Arc::new(PgMessageStore::new(pool));
    let state = AppState::new(store, cfg.clone());

    let bind_addr = format!("0.0.0.0:{}", cfg.app.port);
    tracing::info!(%bind_addr, "starting helpdesk-chat-service");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure_routes)
    })
    .bind(&bind_addr)
    .map_err(|e| AppError::StartServer(e.to_string()))?
    .run()
    .await
    .map_err(|e| AppError::StartServer(e.to_string()))
}
