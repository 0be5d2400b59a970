// src/server/state.rs

//! Application state for the session server.
//!
//! Holds the hub actor address. Used to share state between the WebSocket
//! endpoint and the actor system.

use actix::Addr;

use crate::server::hub::Hub;

/// Shared application state, injected into the WebSocket handler.
pub struct AppState {
    /// Address of the hub actor (owns all lobby/player/team state).
    pub hub: Addr<Hub>,
}

impl AppState {
    pub fn new(hub: Addr<Hub>) -> Self {
        AppState { hub }
    }
}
