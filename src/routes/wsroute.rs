use crate::state::AppState;
use crate::websocket::session::RelaySession;
use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub chat_id: String,
    pub user_id: Uuid,
    pub token: Option<String>,
}

// Frame headed for this client's socket (broadcasts and error acks alike)
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct OutboundFrame(String);

/// WebSocket actor: a thin bridge between the transport and the relay
/// session. Inbound text frames go through a per-session queue drained by a
/// single task, which keeps same-session broadcasts ordered; frames from the
/// broadcast group are forwarded straight to the socket.
struct WsConn {
    session: Arc<RelaySession>,
    inbound_tx: UnboundedSender<String>,
    inbound_rx: Option<UnboundedReceiver<String>>,
    broadcast_rx: Option<UnboundedReceiver<String>>,
    hb: Instant,
    heartbeat_interval: Duration,
    client_timeout: Duration,
}

impl WsConn {
    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let timeout = self.client_timeout;
        ctx.run_interval(self.heartbeat_interval, move |act, ctx| {
            if Instant::now().duration_since(act.hb) > timeout {
                tracing::warn!(
                    conn_id = %act.session.conn_id(),
                    "WebSocket heartbeat failed, disconnecting"
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for WsConn {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);

        // Drain inbound frames strictly one at a time.
        if let Some(mut inbound_rx) = self.inbound_rx.take() {
            let session = self.session.clone();
            let addr = ctx.address();
            tokio::spawn(async move {
                while let Some(raw) = inbound_rx.recv().await {
                    if let Some(ack) = session.handle_frame(&raw).await {
                        addr.do_send(OutboundFrame(ack));
                    }
                }
            });
        }

        // Forward group broadcasts to the socket. Ends when the broadcaster
        // drops this member's sender.
        if let Some(mut broadcast_rx) = self.broadcast_rx.take() {
            let addr = ctx.address();
            tokio::spawn(async move {
                while let Some(frame) = broadcast_rx.recv().await {
                    addr.do_send(OutboundFrame(frame));
                }
            });
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let session = self.session.clone();
        actix::spawn(async move {
            session.close().await;
        });
    }
}

impl Handler<OutboundFrame> for WsConn {
    type Result = ();

    fn handle(&mut self, msg: OutboundFrame, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsConn {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                // Queue closed means the drain task is gone; nothing left to do.
                if self.inbound_tx.send(text.to_string()).is_err() {
                    ctx.stop();
                }
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary WebSocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!(
                    conn_id = %self.session.conn_id(),
                    "WebSocket close message received: {:?}",
                    reason
                );
                ctx.stop();
            }
            Err(e) => {
                tracing::warn!(conn_id = %self.session.conn_id(), error = %e, "WebSocket protocol error");
                ctx.stop();
            }
            _ => {}
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

    // Authentication: the identity collaborator vouches for the caller.
    let username = match state
        .identity
        .resolve_identity(params.user_id, params.token.as_deref())
        .await
    {
        Ok(username) => username,
        Err(e) => {
            error!(user_id = %params.user_id, error = %e, "WebSocket connection rejected: identity");
            return Ok(HttpResponse::Unauthorized().finish());
        }
    };

    // Authorization: chat directory membership check.
    match state.directory.is_member(&params.chat_id, params.user_id).await {
        Ok(true) => {}
        Ok(false) => {
            error!(
                user_id = %params.user_id,
                chat_id = %params.chat_id,
                "WebSocket connection rejected: not a chat member"
            );
            return Ok(HttpResponse::Forbidden().finish());
        }
        Err(e) => {
            error!(error = %e, "WebSocket connection rejected: membership check failed");
            return Ok(HttpResponse::InternalServerError().finish());
        }
    }

    let (session, broadcast_rx) = RelaySession::join(
        state.registry.clone(),
        state.broadcaster.clone(),
        state.gateway.clone(),
        params.chat_id,
        username,
    )
    .await?;
    let session = Arc::new(session);

    let (inbound_tx, inbound_rx) = unbounded_channel();
    let conn = WsConn {
        session: session.clone(),
        inbound_tx,
        inbound_rx: Some(inbound_rx),
        broadcast_rx: Some(broadcast_rx),
        hb: Instant::now(),
        heartbeat_interval: state.config.heartbeat_interval,
        client_timeout: state.config.client_timeout,
    };

    // A rejected handshake never starts the actor, so `stopped()` will not
    // run; the session has already joined and must be torn down here.
    match ws::start(conn, &req, stream) {
        Ok(resp) => Ok(resp),
        Err(e) => {
            session.close().await;
            Err(e)
        }
    }
}
