/// Main configuration module.
///
/// Re-exports submodules for server, keepalive, lobby and game configuration.
pub mod game;
pub mod keepalive;
pub mod lobby;
pub mod server;
