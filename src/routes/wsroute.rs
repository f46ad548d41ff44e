//! The hub's WebSocket endpoint and per-connection session actor.
//!
//! One `WsSession` actor owns one socket: it registers the connection,
//! acknowledges the handshake, dispatches inbound frames, keeps the
//! heartbeat, and removes its registry entry when the socket goes away.

use std::time::Instant;

use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{NewMessage, ParticipantRole};
use crate::state::AppState;
use crate::websocket::message_types::{InboundFrame, OutboundFrame};
use crate::websocket::ConnectionHandle;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
    #[serde(rename = "ticketId")]
    pub ticket_id: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
struct ConnectionIdentity {
    user_id: i64,
    role: ParticipantRole,
    ticket_id: Option<i64>,
}

/// Frame pushed to this session through the registry.
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct PushFrame(OutboundFrame);

/// The registry replaced this session's entry with a newer connection.
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Evicted;

pub struct WsSession {
    identity: ConnectionIdentity,
    conn_id: Uuid,
    state: AppState,
    hb: Instant,
    rx: Option<UnboundedReceiver<OutboundFrame>>,
}

impl WsSession {
    fn new(
        identity: ConnectionIdentity,
        conn_id: Uuid,
        state: AppState,
        rx: UnboundedReceiver<OutboundFrame>,
    ) -> Self {
        Self {
            identity,
            conn_id,
            state,
            hb: Instant::now(),
            rx: Some(rx),
        }
    }

    fn push(&self, frame: OutboundFrame, ctx: &mut ws::WebsocketContext<Self>) {
        match frame.to_json() {
            Ok(text) => ctx.text(text),
            Err(e) => error!(error = %e, "failed to serialize outbound frame"),
        }
    }

    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let interval = self.state.config.websocket.heartbeat_interval();
        ctx.run_interval(interval, |act, ctx| {
            let timeout = act.state.config.websocket.client_timeout();
            if Instant::now().duration_since(act.hb) > timeout {
                warn!(
                    user_id = act.identity.user_id,
                    role = %act.identity.role,
                    "websocket heartbeat timed out, disconnecting"
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn dispatch(&mut self, frame: InboundFrame, ctx: &mut ws::WebsocketContext<Self>) {
        match frame {
            InboundFrame::ChatMessage {
                ticket_id,
                content,
                sender_id,
                sender_type,
                attachments,
            } => {
                if sender_id != self.identity.user_id || sender_type != self.identity.role {
                    warn!(
                        user_id = self.identity.user_id,
                        sender_id, "dropping chat_message with mismatched sender identity"
                    );
                    return;
                }
                let store = self.state.store.clone();
                let hub = self.state.hub.clone();
                actix::spawn(async move {
                    let new = NewMessage {
                        ticket_id,
                        sender_role: sender_type,
                        sender_id,
                        content,
                        attachment_ids: attachments,
                    };
                    // persist first; a message that failed to persist must
                    // never be announced
                    match store.create_message(new).await {
                        Ok(message) => {
                            hub.notify_new_message(&message).await;
                        }
                        Err(e) => {
                            error!(
                                error = %e,
                                ticket_id, "failed to persist chat message, notification skipped"
                            );
                        }
                    }
                });
            }

            InboundFrame::Typing {
                ticket_id,
                sender_id,
                sender_type,
                is_typing,
            } => {
                if sender_id != self.identity.user_id || sender_type != self.identity.role {
                    warn!(
                        user_id = self.identity.user_id,
                        sender_id, "dropping typing frame with mismatched sender identity"
                    );
                    return;
                }
                let hub = self.state.hub.clone();
                actix::spawn(async move {
                    hub.notify_typing(ticket_id, sender_id, sender_type, is_typing)
                        .await;
                });
            }

            InboundFrame::MessageStatus { message_id, status } => {
                let tracker = self.state.tracker.clone();
                actix::spawn(async move {
                    if let Err(e) = tracker.apply(message_id, status).await {
                        error!(error = %e, message_id, "failed to apply message status update");
                    }
                });
            }

            InboundFrame::Ping { .. } => {
                self.push(OutboundFrame::pong(), ctx);
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);

        // bridge registry pushes into the actor; a closed channel means a
        // newer connection took over this key
        if let Some(mut rx) = self.rx.take() {
            let addr = ctx.address();
            actix::spawn(async move {
                while let Some(frame) = rx.recv().await {
                    addr.do_send(PushFrame(frame));
                }
                addr.do_send(Evicted);
            });
        }

        self.push(
            OutboundFrame::connection_established(
                self.identity.user_id,
                self.identity.role,
                self.identity.ticket_id,
            ),
            ctx,
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(
            user_id = self.identity.user_id,
            role = %self.identity.role,
            "websocket client disconnected"
        );
        let registry = self.state.registry.clone();
        let identity = self.identity;
        let conn_id = self.conn_id;
        actix::spawn(async move {
            registry
                .unregister(identity.role, identity.user_id, conn_id)
                .await;
        });
    }
}

impl Handler<PushFrame> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: PushFrame, ctx: &mut Self::Context) {
        self.push(msg.0, ctx);
    }
}

impl Handler<Evicted> for WsSession {
    type Result = ();

    fn handle(&mut self, _msg: Evicted, ctx: &mut Self::Context) {
        info!(
            user_id = self.identity.user_id,
            role = %self.identity.role,
            "connection superseded by a newer session"
        );
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Policy,
            description: Some("superseded by a newer connection".into()),
        }));
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<InboundFrame>(&text) {
                Ok(frame) => self.dispatch(frame, ctx),
                Err(e) => {
                    warn!(
                        error = %e,
                        user_id = self.identity.user_id,
                        "dropping malformed websocket frame"
                    );
                }
            },
            Ok(ws::Message::Binary(_)) => {
                warn!(
                    user_id = self.identity.user_id,
                    "binary websocket frames not supported"
                );
            }
            Ok(ws::Message::Close(reason)) => {
                info!(
                    user_id = self.identity.user_id,
                    ?reason,
                    "websocket close received"
                );
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    error = %e,
                    user_id = self.identity.user_id,
                    "websocket protocol error, closing"
                );
                ctx.stop();
            }
        }
    }
}

#[get("/ws")]
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsParams>,
) -> Result<HttpResponse, Error> {
    let params = query.into_inner();

    let user_id = match params.user_id {
        Some(id) => id,
        None => {
            warn!("websocket connection rejected: missing userId");
            return Ok(HttpResponse::BadRequest().body("userId is required"));
        }
    };
    let role = match params.user_type.as_deref().and_then(ParticipantRole::parse) {
        Some(role) => role,
        None => {
            warn!(user_id, "websocket connection rejected: missing or invalid userType");
            return Ok(HttpResponse::BadRequest().body("userType must be requester or staff"));
        }
    };

    let identity = ConnectionIdentity {
        user_id,
        role,
        ticket_id: params.ticket_id,
    };

    let (tx, rx) = unbounded_channel();
    let handle = ConnectionHandle::new(tx);
    let conn_id = handle.conn_id;
    state.registry.register(role, user_id, handle).await;

    info!(user_id, %role, ticket_id = ?identity.ticket_id, "websocket client connected");

    let session = WsSession::new(identity, conn_id, state.get_ref().clone(), rx);
    match ws::start(session, &req, stream) {
        Ok(resp) => Ok(resp),
        Err(e) => {
            state.registry.unregister(role, user_id, conn_id).await;
            Err(e)
        }
    }
}
