//! Legacy two-player head-to-head (battle royale disabled).
//!
//! Caps the lobby at two players, kicking any pre-existing overflow on
//! construction. Pairing is fixed to the first two seats and never
//! re-rolled into anything else.

use crate::config::lobby::MAX_PLAYERS_HEAD_TO_HEAD;
use crate::game::lobby;
use crate::game::world::World;
use crate::protocol::ServerAction;

/// Kick everyone beyond the head-to-head seat limit.
pub fn enforce_player_cap(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    let overflow: Vec<_> = lobby
        .player_ids
        .iter()
        .skip(MAX_PLAYERS_HEAD_TO_HEAD)
        .copied()
        .collect();
    for pid in overflow {
        world.send_to(pid, ServerAction::KickedFromLobby);
        lobby::remove_player_from_game(world, pid, true);
        world.send_to(
            pid,
            ServerAction::Error {
                message: "You have been removed from the lobby due to player limit changing."
                    .to_string(),
            },
        );
    }
}

/// Fixed pairing: seat 0 against seat 1.
pub fn reroll_enemies(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    if lobby.player_count() < 2 {
        return;
    }
    let first = lobby.player_ids[0];
    let second = lobby.player_ids[1];
    world.set_enemy(first, second);
    world.set_enemy(second, first);
}
