//! Session server for multiplayer boss-fight matches layered on a
//! single-player card game.
//!
//! Clients hold a persistent WebSocket connection, host or join a lobby by
//! five-letter code, and the server arbitrates rounds: who beats whom,
//! lives and score tracking, opponent pairing, and shared-deck
//! synchronization when teammates play as one. Round resolution is
//! pluggable — head-to-head, pairwise battle royale, house-target races and
//! team play — selected per lobby through its options.
//!
//! Module overview:
//! - `config`:   tunable constants, split by concern
//! - `protocol`: flat-string wire codec and the typed action surface
//! - `game`:     scores, decks, players, teams, lobbies and modes
//! - `server`:   actix actors — sessions, hub, routing

pub mod config;
pub mod game;
pub mod protocol;
pub mod server;
