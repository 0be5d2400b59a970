//! N-player pairwise mode.
//!
//! Living players are paired into disjoint random opponents each round (the
//! odd one out sits the round unpaired). A lost exchange costs the loser a
//! life; a fresh pairing pass runs once every living player is unpaired.

use log::debug;
use rand::Rng;

use crate::game::lobby;
use crate::game::player::PlayerId;
use crate::game::world::World;
use crate::protocol::ServerAction;

/// Draw a uniformly random near-perfect matching over the living players.
/// Tolerates 0 or 1 eligible participants.
pub fn reroll_enemies(world: &mut World, code: &str) {
    debug!("[Mode] rerolling opponents in {code}");
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    let mut pool: Vec<PlayerId> = lobby
        .player_ids
        .iter()
        .filter(|pid| world.player(**pid).is_some_and(|p| p.lives > 0))
        .copied()
        .collect();

    let mut rng = rand::rng();
    while pool.len() >= 2 {
        let first = pool.swap_remove(rng.random_range(0..pool.len()));
        let second = pool.swap_remove(rng.random_range(0..pool.len()));
        world.set_enemy(first, second);
        world.set_enemy(second, first);
    }
    if let [leftover] = pool[..] {
        world.clear_enemy(leftover);
    }

    lobby::broadcast_lobby_info(world, code);
}

/// Resolve one pairwise exchange after `id` reported a played hand.
///
/// The exchange completes once either side has exhausted its hands while
/// behind, or both are out of hands; the lower score loses a life (a tie
/// costs no one), both sides are unpaired and notified.
pub fn resolve_exchange(world: &mut World, id: PlayerId) {
    let Some(player) = world.player(id) else {
        return;
    };
    let Some(enemy_id) = player.enemy else {
        // Let them play one hand against no one.
        if let Some(player) = world.player_mut(id) {
            player.first_ready = false;
            player.in_pvp_battle = false;
        }
        world.send_to(
            id,
            ServerAction::Message {
                loc_key: "msg_no_enemy".to_string(),
            },
        );
        world.send_to(id, ServerAction::EndPvP { lost: false });
        return;
    };

    world.broadcast_player_stats(id);

    let Some(player) = world.player(id) else {
        return;
    };
    let (own_score, own_hands) = (player.score, player.hands_left);
    let Some(enemy) = world.player(enemy_id) else {
        return;
    };
    let (enemy_score, enemy_hands) = (enemy.score, enemy.hands_left);

    let exchange_over = (own_hands == 0 && enemy_score > own_score)
        || (enemy_hands == 0 && own_score > enemy_score)
        || (enemy_hands == 0 && own_hands == 0);
    if !exchange_over {
        return;
    }

    let (winner, loser) = if enemy_score > own_score {
        (enemy_id, id)
    } else {
        (id, enemy_id)
    };
    let decisive = own_score != enemy_score;

    if decisive {
        world.lose_life(loser);
    }

    for pid in [winner, loser] {
        if let Some(player) = world.player_mut(pid) {
            player.first_ready = false;
            player.in_pvp_battle = false;
        }
        world.clear_enemy(pid);
    }

    world.send_to(winner, ServerAction::EndPvP { lost: false });
    world.send_to(loser, ServerAction::EndPvP { lost: decisive });
}
