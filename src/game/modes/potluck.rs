//! House-based mode: every player races a computed target.
//!
//! The "house" is a virtual opponent whose score is the average of the other
//! living players' current scores, floored at a configured minimum and
//! divided by the configurable multiplier option. The round ends once every
//! player has exhausted its hands or met the target; missing it costs a
//! life.

use log::debug;

use crate::config::game::POTLUCK_MIN_TARGET;
use crate::game::lobby::keys;
use crate::game::player::PlayerId;
use crate::game::score::ExtendedScore;
use crate::game::world::World;
use crate::protocol::ServerAction;

use super::HOUSE_ID;

/// Recompute each player's house target and send the updated opponent info.
pub fn recalculate_score_to_beat(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    let members = lobby.player_ids.clone();
    let multiplier = lobby
        .options
        .str(keys::POTLUCK_SCORE_MULTIPLIER)
        .map(str::to_string);

    let living = members
        .iter()
        .filter(|pid| world.player(**pid).is_some_and(|p| p.lives > 0))
        .count();
    let floor = ExtendedScore::new(0, POTLUCK_MIN_TARGET, 0);

    for pid in &members {
        let mut target = ExtendedScore::zero();
        let mut hands = 0u32;
        for other in &members {
            if other == pid {
                continue;
            }
            let Some(other) = world.player(*other) else {
                continue;
            };
            if other.lives == 0 {
                continue;
            }
            target = target.add(other.score);
            hands += other.hands_left;
        }

        let divisor = living.saturating_sub(1).max(1);
        if let Ok(split) = target.div(ExtendedScore::new(0, divisor as f64, 0)) {
            target = split;
        }
        if target < floor {
            target = floor;
        }
        if let Some(raw) = &multiplier {
            match raw.parse::<ExtendedScore>().map(|m| target.div(m)) {
                Ok(Ok(scaled)) => target = scaled,
                _ => debug!("[Mode] ignoring bad potluck multiplier `{raw}`"),
            }
        }

        if let Some(player) = world.player_mut(*pid) {
            player.score_to_beat = target;
        }
        world.send_to(
            *pid,
            ServerAction::EnemyInfo {
                player_id: HOUSE_ID.to_string(),
                enemy_id: None,
                score: target,
                hands_left: hands,
                skips: 0,
                lives: 0,
            },
        );
    }
}

fn all_done_with_pvp(world: &World, code: &str) -> bool {
    let Some(lobby) = world.lobby(code) else {
        return false;
    };
    lobby.player_ids.iter().all(|pid| {
        let Some(player) = world.player(*pid) else {
            return true;
        };
        if player.lives == 0 || !player.in_match {
            return true;
        }
        if !player.in_pvp_battle {
            return false;
        }
        player.hands_left == 0 || player.score >= player.score_to_beat
    })
}

/// Once everyone is done, settle the round: whoever missed its target loses
/// a life, and every survivor is told how the round went.
pub fn check_pvp_done(world: &mut World, code: &str) {
    if !all_done_with_pvp(world, code) {
        return;
    }
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    for pid in lobby.player_ids.clone() {
        settle_player(world, pid);
    }
}

fn settle_player(world: &mut World, pid: PlayerId) {
    let Some(player) = world.player(pid) else {
        return;
    };
    if player.lives == 0 {
        return;
    }
    let lost = player.score < player.score_to_beat;
    if lost {
        world.lose_life(pid);
    }
    world.send_to(pid, ServerAction::EndPvP { lost });
    if let Some(player) = world.player_mut(pid) {
        player.first_ready = false;
        player.in_pvp_battle = false;
        player.score_to_beat = ExtendedScore::zero();
    }
    world.clear_enemy(pid);
}
