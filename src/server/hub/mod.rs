//! Hub actor: the single owner of all game state.
//!
//! Session actors decode and forward; this actor processes one message at a
//! time against the [`World`], which realizes the cooperative no-locking
//! model — no two handlers ever mutate lobby/team/player state in parallel.
//! The only timers here are the fixed-delay deck-sync retries.

pub mod handlers;
pub mod messages;

use actix::prelude::*;
use log::warn;

use crate::config::game::DECK_SYNC_RETRY;
use crate::game::player::Connection;
use crate::game::{team, world::World};
use crate::protocol::ServerAction;
use crate::server::session::{ClientSession, SessionCommand};
use messages::{Connect, Disconnect, Inbound};

/// Live [`Connection`] backed by a session actor.
struct WsConnection {
    addr: Addr<ClientSession>,
}

impl Connection for WsConnection {
    fn deliver(&self, action: &ServerAction) {
        self.addr.do_send(SessionCommand::Deliver(action.clone()));
    }
}

#[derive(Default)]
pub struct Hub {
    world: World,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            world: World::new(),
        }
    }

    /// Poll teams whose sync point was waiting on deck chunks; each retry
    /// re-checks readiness and may schedule a further poll.
    fn schedule_deck_retries(&mut self, ctx: &mut Context<Self>) {
        for (code, team_id) in self.world.drain_deck_retries() {
            ctx.run_later(DECK_SYNC_RETRY, move |act, ctx| {
                team::check_all_ready(&mut act.world, &code, &team_id);
                act.schedule_deck_retries(ctx);
            });
        }
    }
}

impl Actor for Hub {
    type Context = Context<Self>;
}

impl Handler<Connect> for Hub {
    type Result = ();

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) {
        self.world
            .connect(msg.id, Box::new(WsConnection { addr: msg.addr }));
    }
}

impl Handler<Disconnect> for Hub {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, ctx: &mut Self::Context) {
        self.world.disconnect(msg.id);
        self.schedule_deck_retries(ctx);
    }
}

impl Handler<Inbound> for Hub {
    type Result = ();

    /// Exactly one handler per request kind; every handler failure becomes
    /// one targeted error notification and never propagates further.
    fn handle(&mut self, msg: Inbound, ctx: &mut Self::Context) {
        let kind = msg.request.name();
        if let Err(err) = handlers::dispatch(&mut self.world, msg.id, msg.request) {
            warn!("[Hub] {} failed `{kind}`: {err}", msg.id);
            self.world.send_to(msg.id, err.to_action());
        }
        self.schedule_deck_retries(ctx);
    }
}
