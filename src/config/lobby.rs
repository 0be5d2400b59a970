/// Lobby configuration constants.
///
/// This module defines parameters for lobby creation and capacity, such as
/// code generation and player limits per mode.
/// Alphabet lobby codes are drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Fixed length of a lobby code.
pub const CODE_LENGTH: usize = 5;

/// Minimum number of players required for a match.
pub const MIN_PLAYERS: usize = 2;

/// Maximum number of players in a battle-royale lobby.
pub const MAX_PLAYERS: usize = 16;

/// Maximum number of players when battle royale is disabled (head-to-head).
pub const MAX_PLAYERS_HEAD_TO_HEAD: usize = 2;
