use crate::adapters::api::server::ApiState;
use crate::core::domain::aggregate::AggregateRecord;
use crate::messaging::fanout::{FanoutManager, SubscriberStream};
use crate::messaging::BroadcastMessage;
use crate::utils::error::AggregatorError;
use actix::prelude::*;
use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use futures::StreamExt;
use serde_json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use web::Data;

/// A message used to send JSON strings over the WebSocket.
///
/// This message is sent internally by the actor to relay formatted JSON data to the client.
#[derive(Message)]
#[rtype(result = "()")]
pub struct WsEvent(String);

/// A WebSocket actor streaming bus messages to one client.
///
/// On connect the client first receives a summary of the current aggregate
/// state, then every live message its fan-out subscription yields. The
/// actor owns the connection's cancellation token; stopping the actor (client
/// close, protocol error, server shutdown) cancels the token, which ends the
/// subscriber stream and releases the bus subscription.
pub struct WsSubscription {
    /// Aggregate state at connect time, sent before any live message.
    initial_snapshot: Option<Vec<AggregateRecord>>,
    /// The connection's live message stream, consumed by a relay task.
    live_stream: Option<SubscriberStream>,
    /// Cancellation signal for this connection.
    conn_token: CancellationToken,
}

impl WsSubscription {
    pub fn new(
        initial_snapshot: Vec<AggregateRecord>,
        live_stream: SubscriberStream,
        conn_token: CancellationToken,
    ) -> Self {
        Self {
            initial_snapshot: Some(initial_snapshot),
            live_stream: Some(live_stream),
            conn_token,
        }
    }
}

impl Actor for WsSubscription {
    type Context = ws::WebsocketContext<Self>;

    /// Sends the connect-time summary, then spawns the relay draining the
    /// live stream into the socket.
    fn started(&mut self, ctx: &mut Self::Context) {
        info!("WsSubscription started");

        if let Some(records) = self.initial_snapshot.take() {
            let json = serde_json::to_string(&BroadcastMessage::Summary { records })
                .unwrap_or_else(|_| "{}".into());
            ctx.text(json);
        }

        let addr = ctx.address();
        if let Some(mut stream) = self.live_stream.take() {
            actix_web::rt::spawn(async move {
                while let Some(message) = stream.next().await {
                    let json = serde_json::to_string(&message).unwrap_or_else(|_| "{}".into());
                    addr.do_send(WsEvent(json));
                }
                info!("Live stream ended, connection closing");
            });
        }
    }

    /// Tears down the connection's bus subscription.
    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.conn_token.cancel();
    }
}

impl Handler<WsEvent> for WsSubscription {
    type Result = ();

    fn handle(&mut self, msg: WsEvent, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSubscription {
    /// Processes incoming WebSocket messages.
    ///
    /// Responds to pings with a pong and closes the connection when a close
    /// message or protocol error arrives; clients have nothing to send us.
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(_)) => {}
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(_) => ctx.stop(),
            _ => (),
        }
    }
}

/// HTTP handler for upgrading an HTTP request to a WebSocket subscription.
///
/// The handler snapshots the aggregate store, attaches a new fan-out
/// subscription scoped under the process shutdown token, and starts a
/// `WsSubscription` actor streaming both to the client.
#[get("/subscribe")]
pub async fn subscribe_ws(
    req: HttpRequest,
    stream: web::Payload,
    fanout: Data<FanoutManager>,
    shutdown_token: Data<CancellationToken>,
    state: Data<Arc<ApiState>>,
) -> Result<HttpResponse, AggregatorError> {
    let snapshot = state.store.snapshot().await?;
    let conn_token = shutdown_token.child_token();
    let live_stream = fanout.attach(&conn_token);

    let ws = WsSubscription::new(snapshot, live_stream, conn_token);
    ws::start(ws, &req, stream).map_err(|e| AggregatorError::ApiError(e.to_string()))
}
