/// Game configuration constants.
///
/// This module defines the main gameplay parameters such as hand counts,
/// starting lives per game mode, and deck synchronization timing.
use std::time::Duration;

/// Hands each player may play per round.
pub const HANDS_PER_ROUND: u32 = 4;

/// Default starting lives in the attrition game mode.
pub const STARTING_LIVES_ATTRITION: u32 = 4;

/// Default starting lives in the showdown game mode.
pub const STARTING_LIVES_SHOWDOWN: u32 = 2;

/// Default lives for a freshly reset team.
pub const TEAM_LIVES: u32 = 4;

/// Deck id announced to clients at match start.
pub const STARTING_DECK: &str = "d_standard";

/// Alphabet run seeds are drawn from.
pub const SEED_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated run seed.
pub const SEED_LENGTH: usize = 5;

/// Floor for the potluck house target.
pub const POTLUCK_MIN_TARGET: f64 = 100.0;

/// Delay before re-polling a team whose deck chunks have not arrived yet.
pub const DECK_SYNC_RETRY: Duration = Duration::from_millis(500);
