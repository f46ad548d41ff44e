use actix_web::web;

pub mod hubinfo;
pub mod messages;
pub mod wsroute;

async fn health() -> &'static str {
    "OK"
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(wsroute::ws_handler)
        .configure(messages::register_routes)
        .configure(hubinfo::register_routes);
}
