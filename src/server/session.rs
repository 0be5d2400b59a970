/// WebSocket session handler for one client connection.
///
/// This actor owns the transport end of a connection: it splits inbound
/// frames into newline-delimited messages, decodes each into a typed
/// request for the hub, delivers outbound actions, and runs the
/// per-connection keepalive timers. All game state lives in the hub; the
/// session never touches it directly.
use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::game::player::PlayerId;
use crate::protocol::{ClientRequest, ProtocolError, ServerAction};
use crate::server::hub::messages::{Connect, Disconnect, Inbound};
use crate::server::hub::Hub;
use crate::server::keepalive::{KeepAlive, Timeout};

/// Command from the hub to this session.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub enum SessionCommand {
    Deliver(ServerAction),
}

pub struct ClientSession {
    pub id: PlayerId,
    hub: Addr<Hub>,
    keepalive: KeepAlive,
    timer: Option<SpawnHandle>,
}

impl ClientSession {
    pub fn new(id: PlayerId, hub: Addr<Hub>) -> Self {
        Self {
            id,
            hub,
            keepalive: KeepAlive::new(),
            timer: None,
        }
    }

    fn arm_timer(&mut self, ctx: &mut ws::WebsocketContext<Self>, delay: std::time::Duration) {
        if let Some(handle) = self.timer.take() {
            ctx.cancel_future(handle);
        }
        self.timer = Some(ctx.run_later(delay, |act, ctx| act.on_timeout(ctx)));
    }

    /// Inbound bytes: liveness resets and the probe cycle starts over.
    fn on_activity(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let delay = self.keepalive.on_activity();
        self.arm_timer(ctx, delay);
    }

    fn on_timeout(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.timer = None;
        match self.keepalive.on_timeout() {
            Timeout::Probe { rearm } => {
                ctx.text(ServerAction::KeepAlive.to_line());
                self.arm_timer(ctx, rearm);
            }
            Timeout::Expire => {
                ctx.text(ServerAction::KeepAlive.to_line());
                info!("[Session] {} unresponsive; closing", self.id);
                ctx.stop();
            }
        }
    }

    /// Decode one wire line and forward it to the hub.
    fn handle_line(&mut self, line: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match ClientRequest::parse_line(line) {
            Ok(request) => {
                if !request.is_keepalive() {
                    info!("[Session] {} -> {}", self.id, request.name());
                }
                self.hub.do_send(Inbound {
                    id: self.id,
                    request,
                });
            }
            Err(ProtocolError::UnknownAction(name)) => {
                // Well-formed but unhandled; ignore like any forward-compat server.
                debug!("[Session] {} sent unknown action `{name}`", self.id);
            }
            Err(err) => {
                warn!("[Session] {} sent malformed line: {err}", self.id);
                ctx.text(
                    ServerAction::Error {
                        message: "Failed to parse message".to_string(),
                    }
                    .to_line(),
                );
            }
        }
    }
}

impl Actor for ClientSession {
    type Context = ws::WebsocketContext<Self>;

    /// Register with the hub and start the silence timer.
    fn started(&mut self, ctx: &mut Self::Context) {
        self.hub.do_send(Connect {
            id: self.id,
            addr: ctx.address(),
        });
        let delay = self.keepalive.on_activity();
        self.arm_timer(ctx, delay);
    }

    /// An implicit leave-lobby for this player; per-connection timers die
    /// with the context.
    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.hub.do_send(Disconnect { id: self.id });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ClientSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                self.on_activity(ctx);
                // One frame may carry several newline-delimited messages.
                for line in text.split('\n').filter(|l| !l.is_empty()) {
                    self.handle_line(line, ctx);
                }
            }
            Ok(ws::Message::Ping(payload)) => {
                self.on_activity(ctx);
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => self.on_activity(ctx),
            Ok(ws::Message::Close(_)) => ctx.stop(),
            Err(_) => {
                // Transport failure: treated as an implicit leave via stop.
                ctx.stop();
            }
            _ => (),
        }
    }
}

impl Handler<SessionCommand> for ClientSession {
    type Result = ();

    fn handle(&mut self, msg: SessionCommand, ctx: &mut Self::Context) {
        let SessionCommand::Deliver(action) = msg;
        if !action.is_keepalive() {
            debug!("[Session] {} <- {}", self.id, action.name());
        }
        ctx.text(action.to_line());
    }
}

/// WebSocket endpoint: one persistent connection per client, identity is a
/// fresh random id for the connection's lifetime.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<crate::server::state::AppState>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4();
    ws::start(ClientSession::new(id, data.hub.clone()), &req, stream)
}
