//! HTTP and WebSocket routing configuration.
//!
//! A single endpoint: clients hold one persistent WebSocket connection for
//! their whole session, carrying newline-delimited flat-string messages.

use actix_web::web;

use crate::server::session::ws_connect;

/// Configure the application's routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").to(ws_connect));
}
