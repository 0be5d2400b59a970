//! Game domain: scores, decks, players, teams, lobbies and the
//! battle-royale round-resolution modes.
//!
//! Everything here is plain state mutated through the [`world::World`]
//! container; the actor layer in `crate::server` only decodes requests and
//! forwards them. Outbound traffic flows through the [`player::Connection`]
//! seam so the whole module is exercisable without a running actor system.

pub mod deck;
pub mod lobby;
pub mod modes;
pub mod player;
pub mod score;
pub mod team;
pub mod world;

use std::fmt;
use std::str::FromStr;

/// The underlying card game's mode tag, chosen at lobby creation.
///
/// Concrete per-mode rule tables (ante/blind definitions) live with the
/// clients; the server only keeps a default-lives constant per tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    Attrition,
    Showdown,
}

impl GameMode {
    pub fn default_starting_lives(self) -> u32 {
        match self {
            GameMode::Attrition => crate::config::game::STARTING_LIVES_ATTRITION,
            GameMode::Showdown => crate::config::game::STARTING_LIVES_SHOWDOWN,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Attrition => write!(f, "attrition"),
            GameMode::Showdown => write!(f, "showdown"),
        }
    }
}

impl FromStr for GameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attrition" => Ok(GameMode::Attrition),
            "showdown" => Ok(GameMode::Showdown),
            _ => Err(()),
        }
    }
}
