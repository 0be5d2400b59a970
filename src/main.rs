//! Main entry point for the session server.
//!
//! Initializes the actor system, starts the hub, and launches the HTTP
//! server with the WebSocket endpoint.

use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::info;

use card_royale::config::server::{BIND_ADDR, BIND_PORT};
use card_royale::server::hub::Hub;
use card_royale::server::{router, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger from environment variable (default to info level).
    env_logger::init();

    // Start the hub actor (owns all lobby/player/team state).
    let hub = Hub::new().start();

    // Shared application state for the WebSocket handler.
    let state = web::Data::new(AppState::new(hub));

    info!("[Main] listening on {BIND_ADDR}:{BIND_PORT}");
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(router::config)
    })
    .bind((BIND_ADDR, BIND_PORT))?
    .run()
    .await
}
