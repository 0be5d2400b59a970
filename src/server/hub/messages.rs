use actix::prelude::*;

use crate::game::player::PlayerId;
use crate::protocol::ClientRequest;
use crate::server::session::ClientSession;

/// Message: a connection opened and registered its session actor.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub id: PlayerId,
    pub addr: Addr<ClientSession>,
}

/// Message: a connection closed (clean or not).
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: PlayerId,
}

/// Message: one decoded request from a connection.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Inbound {
    pub id: PlayerId,
    pub request: ClientRequest,
}
