//! Team-based mode: teammates share one deck, score and life pool.
//!
//! Teams are paired against each other the way players are in the pairwise
//! mode. A team's round score is the sum of its members' per-hand deltas; a
//! team behind its paired opponent at round end loses a pooled life.

use log::debug;
use rand::Rng;

use crate::config::game::{POTLUCK_MIN_TARGET, TEAM_LIVES};
use crate::game::lobby;
use crate::game::player::PlayerId;
use crate::game::score::ExtendedScore;
use crate::game::team;
use crate::game::world::World;
use crate::protocol::ServerAction;

use super::{DEFAULT_TEAM_ID, HOUSE_ID};

/// Everyone starts on the default team when the mode is installed.
pub fn assign_default_team(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    for pid in lobby.player_ids.clone() {
        team::add_player(world, code, DEFAULT_TEAM_ID, pid);
    }
}

/// A joiner lands on the default team and learns everyone's assignment.
pub fn on_join_lobby(world: &mut World, code: &str, id: PlayerId) {
    team::set_player_team(world, id, DEFAULT_TEAM_ID);

    let Some(lobby) = world.lobby(code) else {
        return;
    };
    for pid in lobby.player_ids.clone() {
        let Some(team_id) = world.player(pid).and_then(|p| p.team.clone()) else {
            continue;
        };
        world.send_to(
            id,
            ServerAction::SetPlayerTeam {
                player_id: pid.to_string(),
                team_id,
            },
        );
    }
}

/// Assemble and push any freshly transferred decks before a PvP blind.
pub fn prepare_decks(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    for team_id in lobby.team_ids() {
        team::ensure_deck(world, code, &team_id);
    }
}

/// Reset team pools as the PvP blind opens.
pub fn enter_pvp_blind(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    for team_id in lobby.team_ids() {
        team::reset_score(world, code, &team_id);
        if let Some(team) = world.lobby_mut(code).and_then(|l| l.team_mut(&team_id)) {
            team.in_pvp_blind = true;
        }
    }
}

/// Pair living, non-empty teams into disjoint random opponents; a leftover
/// team sits the round against the house floor.
pub fn reroll_enemy_teams(world: &mut World, code: &str) {
    debug!("[Mode] rerolling team opponents in {code}");
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    let mut pool: Vec<String> = lobby
        .teams
        .iter()
        .filter(|t| t.lives > 0 && !t.player_ids.is_empty())
        .map(|t| t.id.clone())
        .collect();

    let mut rng = rand::rng();
    while pool.len() >= 2 {
        let first = pool.swap_remove(rng.random_range(0..pool.len()));
        let second = pool.swap_remove(rng.random_range(0..pool.len()));
        set_enemy_teams(world, code, &first, &second);
    }
    if let [leftover] = &pool[..] {
        clear_enemy_team(world, code, leftover);
    }
}

/// Symmetrically pair two teams and show each side the other's stats.
fn set_enemy_teams(world: &mut World, code: &str, first: &str, second: &str) {
    for (team_id, enemy_id) in [(first, second), (second, first)] {
        sever_enemy(world, code, team_id);
        if let Some(team) = world.lobby_mut(code).and_then(|l| l.team_mut(team_id)) {
            team.enemy_team = Some(enemy_id.to_string());
        }
    }
    team::broadcast_stats_to_enemies(world, code, first);
    team::broadcast_stats_to_enemies(world, code, second);
}

/// Unpair a team; its members face the house floor for the round.
fn clear_enemy_team(world: &mut World, code: &str, team_id: &str) {
    sever_enemy(world, code, team_id);
    let Some(team) = world.lobby(code).and_then(|l| l.team(team_id)) else {
        return;
    };
    world.send_many(
        &team.player_ids.clone(),
        ServerAction::EnemyInfo {
            player_id: HOUSE_ID.to_string(),
            enemy_id: None,
            score: ExtendedScore::new(0, POTLUCK_MIN_TARGET, 0),
            hands_left: 0,
            skips: 0,
            lives: TEAM_LIVES,
        },
    );
}

/// Drop both directions of an existing pairing so it stays symmetric.
fn sever_enemy(world: &mut World, code: &str, team_id: &str) {
    let old_enemy = world
        .lobby(code)
        .and_then(|l| l.team(team_id))
        .and_then(|t| t.enemy_team.clone());
    if let Some(old_enemy) = old_enemy {
        if let Some(other) = world.lobby_mut(code).and_then(|l| l.team_mut(&old_enemy)) {
            other.enemy_team = None;
        }
    }
    if let Some(team) = world.lobby_mut(code).and_then(|l| l.team_mut(team_id)) {
        team.enemy_team = None;
    }
}

fn all_teams_done(world: &World, code: &str) -> bool {
    let Some(lobby) = world.lobby(code) else {
        return false;
    };
    lobby
        .teams
        .iter()
        .all(|t| team::all_done_with_pvp(world, code, &t.id))
}

/// Once every team is done, settle the round: a team behind its paired
/// opponent loses a pooled life, everyone is notified, and fresh pairings
/// are drawn.
pub fn check_pvp_done(world: &mut World, code: &str) {
    if !all_teams_done(world, code) {
        return;
    }
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    for team_id in lobby.team_ids() {
        settle_team(world, code, &team_id);
    }
    reroll_enemy_teams(world, code);
}

fn settle_team(world: &mut World, code: &str, team_id: &str) {
    let Some(team) = world.lobby(code).and_then(|l| l.team(team_id)) else {
        return;
    };
    if team.lives == 0 {
        return;
    }
    let enemy_score = team
        .enemy_team
        .as_ref()
        .and_then(|eid| world.lobby(code).and_then(|l| l.team(eid)))
        .map(|e| e.score)
        .unwrap_or_else(ExtendedScore::zero);
    let lost = team.score < enemy_score;
    let members = team.player_ids.clone();

    if let Some(team) = world.lobby_mut(code).and_then(|l| l.team_mut(team_id)) {
        team.in_pvp_blind = false;
    }
    for pid in members {
        world.send_to(pid, ServerAction::EndPvP { lost });
        if let Some(player) = world.player_mut(pid) {
            player.is_ready = false;
            player.is_ready_pvp = false;
            player.first_ready = false;
            player.in_pvp_battle = false;
        }
    }
    if lost {
        team::lose_life(world, code, team_id);
    }
}

/// The sole surviving team (one team standing, or the only team left).
fn winning_team(world: &World, code: &str) -> Option<String> {
    let lobby = world.lobby(code)?;
    if lobby.teams.is_empty() {
        return None;
    }
    if lobby.teams.len() == 1 {
        return Some(lobby.teams[0].id.clone());
    }
    let mut potential: Option<String> = None;
    for team in &lobby.teams {
        if team.lives > 0 && !team.player_ids.is_empty() {
            if potential.is_some() {
                return None;
            }
            potential = Some(team.id.clone());
        }
    }
    potential
}

/// Team-mode game over: the winning team's members are announced and the
/// beaten opponents surrender their end-of-run jokers.
pub fn check_game_over(world: &mut World, code: &str) {
    let Some(winner_id) = winning_team(world, code) else {
        return;
    };
    let Some(winner) = world.lobby(code).and_then(|l| l.team(&winner_id)) else {
        return;
    };
    let members = winner.player_ids.clone();
    let beaten: Vec<PlayerId> = winner
        .enemy_team
        .as_ref()
        .and_then(|eid| world.lobby(code).and_then(|l| l.team(eid)))
        .map(|t| t.player_ids.clone())
        .unwrap_or_default();

    for pid in &members {
        world.send_to(*pid, ServerAction::WinGame);
        for enemy in &beaten {
            world.request_end_game_jokers(*enemy, *pid);
        }
    }

    lobby::reset_players(world, code);
    if let Some(lobby) = world.lobby_mut(code) {
        lobby.is_started = false;
    }
    lobby::broadcast_lobby_info(world, code);
    debug!("[Mode] {code} team game over; {winner_id} wins");
}
