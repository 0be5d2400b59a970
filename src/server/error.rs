/// Centralized handler-level errors.
///
/// Every failure a request handler can produce maps to exactly one targeted
/// `error` notification for the offending connection; no handler failure is
/// allowed to crash the process or mutate state it already rejected.
use thiserror::Error;

use crate::game::deck::ParseCardError;
use crate::protocol::ServerAction;

/// An operation that is invalid for the current lobby/player state.
#[derive(Debug, Error, PartialEq)]
pub enum HandlerError {
    #[error("Lobby does not exist.")]
    LobbyNotFound,

    #[error("Lobby is full, has already started, or does not exist.")]
    LobbyUnjoinable,

    #[error("You are not in a lobby.")]
    NotInLobby,

    #[error("Only the host can do that.")]
    NotHost,

    #[error("This lobby does not use teams.")]
    TeamsNotEnabled,

    #[error(transparent)]
    MalformedCard(#[from] ParseCardError),
}

impl HandlerError {
    /// The targeted notification sent back to the offending connection.
    pub fn to_action(&self) -> ServerAction {
        ServerAction::Error {
            message: self.to_string(),
        }
    }
}
