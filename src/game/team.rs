//! Teams: groups of players sharing one life pool, score and deck.
//!
//! A player belongs to at most one team; adding a player detaches it from
//! any prior team and announces the assignment to the whole lobby. The last
//! player leaving destroys the team.
//!
//! Deck transfer is chunked: a full deck may exceed one message, so chunks
//! accumulate in a buffer owned by the first sender per empty-deck period.
//! The deck is assembled only when gameplay first requires it.

use std::collections::HashMap;

use log::{debug, warn};

use crate::config::game::{HANDS_PER_ROUND, POTLUCK_MIN_TARGET, TEAM_LIVES};
use crate::game::deck::Deck;
use crate::game::modes;
use crate::game::player::PlayerId;
use crate::game::score::ExtendedScore;
use crate::game::world::World;
use crate::protocol::ServerAction;

pub struct Team {
    pub id: String,
    pub player_ids: Vec<PlayerId>,
    pub lives: u32,
    pub skips: u32,
    pub score: ExtendedScore,
    /// Paired opposing team; always symmetric or absent on both sides.
    pub enemy_team: Option<String>,
    pub deck: Option<Deck>,
    /// Hand-type name to level.
    pub hand_levels: HashMap<String, i64>,
    pub in_pvp_blind: bool,
    /// Ordered deck chunks awaiting assembly.
    pub deck_chunks: Vec<String>,
    /// Owner of the in-flight transfer; other senders are rejected.
    pub deck_sender: Option<PlayerId>,
}

impl Team {
    pub fn new(id: String) -> Self {
        Self {
            id,
            player_ids: Vec::new(),
            lives: TEAM_LIVES,
            skips: 0,
            score: ExtendedScore::zero(),
            enemy_team: None,
            deck: None,
            hand_levels: HashMap::new(),
            in_pvp_blind: false,
            deck_chunks: Vec::new(),
            deck_sender: None,
        }
    }

    /// Reset to pre-game defaults; membership survives.
    pub fn reset_stats(&mut self) {
        self.lives = TEAM_LIVES;
        self.skips = 0;
        self.deck = None;
        self.hand_levels.clear();
        self.enemy_team = None;
        self.in_pvp_blind = false;
        self.deck_chunks.clear();
        self.deck_sender = None;
    }
}

/// Put `id` on `team_id` within its lobby, creating the team on first use.
/// Detaches from any prior team first.
pub fn set_player_team(world: &mut World, id: PlayerId, team_id: &str) {
    let Some(code) = world.lobby_of(id) else {
        return;
    };
    add_player(world, &code, team_id, id);
}

pub fn add_player(world: &mut World, code: &str, team_id: &str, id: PlayerId) {
    if world.player(id).is_some_and(|p| p.team.is_some()) {
        remove_player_from_team(world, id);
    }

    let Some(lobby) = world.lobby_mut(code) else {
        return;
    };
    if lobby.team(team_id).is_none() {
        lobby.teams.push(Team::new(team_id.to_string()));
    }
    if let Some(team) = lobby.team_mut(team_id) {
        team.player_ids.push(id);
    }
    if let Some(player) = world.player_mut(id) {
        player.team = Some(team_id.to_string());
    }
    world.broadcast(
        code,
        ServerAction::SetPlayerTeam {
            player_id: id.to_string(),
            team_id: team_id.to_string(),
        },
    );
}

/// Detach `id` from its team; the last player leaving destroys the team.
pub fn remove_player_from_team(world: &mut World, id: PlayerId) {
    let Some(player) = world.player(id) else {
        return;
    };
    let (Some(code), Some(team_id)) = (player.lobby.clone(), player.team.clone()) else {
        return;
    };

    if let Some(player) = world.player_mut(id) {
        player.team = None;
    }
    let Some(lobby) = world.lobby_mut(&code) else {
        return;
    };
    let mut destroyed = false;
    if let Some(team) = lobby.team_mut(&team_id) {
        team.player_ids.retain(|pid| *pid != id);
        destroyed = team.player_ids.is_empty();
    }
    if destroyed {
        lobby.teams.retain(|t| t.id != team_id);
        debug!("[Team] {team_id} destroyed in {code}");
    }
}

/// Team of a player, as (lobby code, team id).
pub fn team_of(world: &World, id: PlayerId) -> Option<(String, String)> {
    let player = world.player(id)?;
    Some((player.lobby.clone()?, player.team.clone()?))
}

/// Sum of the members' remaining hands.
pub fn hands_left(world: &World, code: &str, team_id: &str) -> u32 {
    let Some(team) = world.lobby(code).and_then(|l| l.team(team_id)) else {
        return 0;
    };
    team.player_ids
        .iter()
        .filter_map(|pid| world.player(*pid))
        .map(|p| p.hands_left)
        .sum()
}

// Deck transfer --------------------------------------------------------------

/// Accept one deck chunk from `id`'s team transfer. The first sender owns
/// the transfer; chunks from anyone else are rejected until the buffer is
/// consumed. Arrival re-checks the sync point in case the team was waiting.
pub fn accept_deck_chunk(world: &mut World, id: PlayerId, chunk: String) {
    let Some((code, team_id)) = team_of(world, id) else {
        return;
    };
    let Some(team) = world.lobby_mut(&code).and_then(|l| l.team_mut(&team_id)) else {
        return;
    };
    if team.deck.is_some() {
        // Deck already assembled this period; late chunks are dropped.
        return;
    }
    match team.deck_sender {
        Some(owner) if owner != id => {
            debug!("[Team] rejecting deck chunk from {id}; transfer owned by {owner}");
            return;
        }
        _ => team.deck_sender = Some(id),
    }
    team.deck_chunks.push(chunk);

    check_all_ready(world, &code, &team_id);
}

/// Assemble the buffered chunks into the team deck if gameplay needs it.
/// Returns whether a deck is present afterwards.
pub fn ensure_deck(world: &mut World, code: &str, team_id: &str) -> bool {
    let Some(team) = world.lobby_mut(code).and_then(|l| l.team_mut(team_id)) else {
        return false;
    };
    if team.deck.is_some() {
        return true;
    }
    if team.deck_chunks.is_empty() {
        return false;
    }

    let wire = team.deck_chunks.join("|");
    team.deck_chunks.clear();
    team.deck_sender = None;
    match Deck::from_wire(&wire) {
        Ok(deck) => {
            team.deck = Some(deck);
            broadcast_deck(world, code, team_id);
            true
        }
        Err(err) => {
            // Bad transfer; release ownership so a fresh one can start.
            warn!("[Team] discarding unparsable deck for {team_id} in {code}: {err}");
            false
        }
    }
}

/// Send the current deck to every member.
pub fn broadcast_deck(world: &World, code: &str, team_id: &str) {
    let Some(team) = world.lobby(code).and_then(|l| l.team(team_id)) else {
        return;
    };
    let Some(deck) = &team.deck else {
        return;
    };
    world.send_many(
        &team.player_ids.clone(),
        ServerAction::SetDeck {
            deck: deck.to_wire(),
        },
    );
}

/// Queue a structural edit against the team deck. While a round is in
/// progress edits are merged at the next synchronization point, not applied
/// immediately, because several teammates may edit concurrently.
pub fn queue_deck_edit<F>(world: &mut World, id: PlayerId, edit: F)
where
    F: FnOnce(&mut Deck),
{
    let Some((code, team_id)) = team_of(world, id) else {
        return;
    };
    if !ensure_deck(world, &code, &team_id) {
        debug!("[Team] deck edit from {id} dropped; no deck assembled yet");
        return;
    }
    if let Some(team) = world.lobby_mut(&code).and_then(|l| l.team_mut(&team_id)) {
        if let Some(deck) = team.deck.as_mut() {
            edit(deck);
        }
    }
}

/// Relay deck cosmetics to the whole team.
pub fn set_deck_type(world: &mut World, id: PlayerId, back: String, sleeve: String, stake: String) {
    let Some((code, team_id)) = team_of(world, id) else {
        return;
    };
    let Some(team) = world.lobby(&code).and_then(|l| l.team(&team_id)) else {
        return;
    };
    world.send_many(
        &team.player_ids.clone(),
        ServerAction::SetDeckType { back, sleeve, stake },
    );
}

// Shared state ---------------------------------------------------------------

/// Adjust a shared hand-type level and announce the new value.
pub fn change_hand_level(world: &mut World, id: PlayerId, hand: String, amount: i64) {
    let Some((code, team_id)) = team_of(world, id) else {
        return;
    };
    let Some(team) = world.lobby_mut(&code).and_then(|l| l.team_mut(&team_id)) else {
        return;
    };
    let level = team.hand_levels.entry(hand.clone()).or_insert(1);
    *level += amount;
    let level = *level;
    let members = team.player_ids.clone();
    world.send_many(&members, ServerAction::SetHandLevel { hand, level });
}

/// Accumulate a per-hand delta into the team score. A negative delta, or a
/// negative running total, resets the score to zero. Outside a PvP blind a
/// completed accumulation ends the blind for the team.
pub fn add_score(world: &mut World, code: &str, team_id: &str, delta: ExtendedScore) {
    let Some(team) = world.lobby_mut(code).and_then(|l| l.team_mut(team_id)) else {
        return;
    };
    debug!(
        "[Team] {team_id} score {} + {delta}",
        team.score
    );
    if delta.is_negative() {
        reset_score(world, code, team_id);
        return;
    }

    team.score = team.score.add(delta);
    let negative = team.score.is_negative();
    let in_pvp_blind = team.in_pvp_blind;
    let members = team.player_ids.clone();

    if negative {
        reset_score(world, code, team_id);
        return;
    }
    broadcast_score(world, code, team_id);
    if !in_pvp_blind {
        world.send_many(&members, ServerAction::EndBlind);
    }
}

pub fn reset_score(world: &mut World, code: &str, team_id: &str) {
    if let Some(team) = world.lobby_mut(code).and_then(|l| l.team_mut(team_id)) {
        team.score = ExtendedScore::zero();
    }
    broadcast_score(world, code, team_id);
}

fn broadcast_score(world: &World, code: &str, team_id: &str) {
    let Some(team) = world.lobby(code).and_then(|l| l.team(team_id)) else {
        return;
    };
    world.send_many(
        &team.player_ids.clone(),
        ServerAction::SetScore { score: team.score },
    );
    broadcast_stats_to_enemies(world, code, team_id);
}

/// Show this team's pooled stats to its paired opponents as their "house".
pub fn broadcast_stats_to_enemies(world: &World, code: &str, team_id: &str) {
    let Some(team) = world.lobby(code).and_then(|l| l.team(team_id)) else {
        return;
    };
    let Some(enemy_team) = team
        .enemy_team
        .as_ref()
        .and_then(|eid| world.lobby(code).and_then(|l| l.team(eid)))
    else {
        return;
    };
    let floor = ExtendedScore::new(0, POTLUCK_MIN_TARGET, 0);
    let shown = if team.score < floor { floor } else { team.score };
    world.send_many(
        &enemy_team.player_ids.clone(),
        ServerAction::EnemyInfo {
            player_id: modes::HOUSE_ID.to_string(),
            enemy_id: None,
            score: shown,
            hands_left: hands_left(world, code, team_id),
            skips: team.skips,
            lives: team.lives,
        },
    );
}

/// Announce every member's stats (with pooled score/lives) to the lobby.
fn broadcast_members(world: &World, code: &str, team_id: &str) {
    let Some(team) = world.lobby(code).and_then(|l| l.team(team_id)) else {
        return;
    };
    for pid in &team.player_ids {
        let Some(player) = world.player(*pid) else {
            continue;
        };
        world.broadcast(
            code,
            ServerAction::EnemyInfo {
                player_id: player.id.to_string(),
                enemy_id: None,
                score: team.score,
                hands_left: player.hands_left,
                skips: team.skips,
                lives: team.lives,
            },
        );
    }
}

/// Count a shared skip and notify the rest of the team.
pub fn skip_blind(world: &mut World, id: PlayerId) {
    let Some((code, team_id)) = team_of(world, id) else {
        return;
    };
    let Some(team) = world.lobby_mut(&code).and_then(|l| l.team_mut(&team_id)) else {
        return;
    };
    if team.lives == 0 {
        return;
    }
    team.skips += 1;
    let members = team.player_ids.clone();
    for pid in members {
        if pid != id {
            world.send_to(pid, ServerAction::SkipBlind);
        }
    }
    broadcast_score(world, &code, &team_id);
}

/// Deduct one pooled life; when it hits zero the whole team is out and the
/// end-game joker exchange with the opposing team runs.
pub fn lose_life(world: &mut World, code: &str, team_id: &str) {
    let Some(team) = world.lobby_mut(code).and_then(|l| l.team_mut(team_id)) else {
        return;
    };
    if team.lives == 0 {
        return;
    }
    team.lives -= 1;
    let lives = team.lives;
    let members = team.player_ids.clone();

    world.send_many(&members, ServerAction::PlayerInfo { lives });
    broadcast_members(world, code, team_id);

    if lives == 0 {
        let enemy_members: Vec<PlayerId> = world
            .lobby(code)
            .and_then(|l| l.team(team_id))
            .and_then(|t| t.enemy_team.clone())
            .and_then(|eid| world.lobby(code).and_then(|l| l.team(&eid)))
            .map(|t| t.player_ids.clone())
            .unwrap_or_default();
        for pid in &members {
            world.send_to(*pid, ServerAction::LoseGame);
            for enemy in &enemy_members {
                world.request_end_game_jokers(*enemy, *pid);
            }
        }
        modes::check_game_over(world, code);
    }
}

/// Per-team sync point: once the lobby is started, the team lives, and every
/// member is ready, merge pending deck edits and start the next blind.
///
/// If the deck transfer has not arrived yet the hub is asked to poll again
/// after a fixed delay rather than blocking the round.
pub fn check_all_ready(world: &mut World, code: &str, team_id: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    if !lobby.is_started {
        return;
    }
    let Some(team) = lobby.team(team_id) else {
        return;
    };
    if team.lives == 0 {
        return;
    }
    let all_ready = team
        .player_ids
        .iter()
        .all(|pid| world.player(*pid).is_some_and(|p| p.is_ready));
    if !all_ready {
        return;
    }
    let members = team.player_ids.clone();
    let transfer_pending = team.deck.is_none();

    if transfer_pending && !ensure_deck(world, code, team_id) {
        world.request_deck_retry(code, team_id);
        return;
    }

    reset_score(world, code, team_id);

    // Give everyone an updated deck.
    if let Some(team) = world.lobby_mut(code).and_then(|l| l.team_mut(team_id)) {
        if let Some(deck) = team.deck.as_mut() {
            deck.merge_pending();
        }
    }
    broadcast_deck(world, code, team_id);

    for pid in members {
        if let Some(player) = world.player_mut(pid) {
            player.is_ready = false;
            player.score = ExtendedScore::zero();
            player.hands_left = HANDS_PER_ROUND;
        }
        world.send_to(pid, ServerAction::StartBlind);
    }
}

/// Whether this team is done with the current PvP exchange: out of hands,
/// or ahead of an opponent that has exhausted its own.
pub fn all_done_with_pvp(world: &World, code: &str, team_id: &str) -> bool {
    let Some(team) = world.lobby(code).and_then(|l| l.team(team_id)) else {
        return true;
    };
    if team.lives == 0 {
        return true;
    }
    let Some(enemy_id) = team.enemy_team.clone() else {
        return true;
    };
    let Some(enemy) = world.lobby(code).and_then(|l| l.team(&enemy_id)) else {
        return true;
    };
    let own_hands = hands_left(world, code, team_id);
    own_hands == 0 || (team.score >= enemy.score && hands_left(world, code, &enemy_id) == 0)
}
