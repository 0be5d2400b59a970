//! Lobbies: creation, membership, options and roster broadcasts.
//!
//! A lobby is identified by a five-letter code, unique among live lobbies
//! (regenerate-on-collision against the world's registry). The player list
//! is ordered; index 0 is the host. The active battle-royale mode lives on
//! the lobby and is reconstructed wholesale when the relevant options
//! change.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, info};
use rand::Rng;

use crate::config::game::{SEED_ALPHABET, SEED_LENGTH};
use crate::config::lobby::{CODE_ALPHABET, CODE_LENGTH};
use crate::game::modes::{self, BattleRoyaleMode};
use crate::game::player::PlayerId;
use crate::game::team::{self, Team};
use crate::game::world::World;
use crate::game::GameMode;
use crate::protocol::escape::escape;
use crate::protocol::fields::{join_list, Fields};
use crate::protocol::ServerAction;
use crate::server::error::HandlerError;

/// Well-known lobby option keys.
pub mod keys {
    /// Battle-royale toggle; changing it reconstructs the active mode.
    pub const BATTLE_ROYALE: &str = "battle_royale";
    /// Battle-royale sub-mode; changing it reconstructs the active mode.
    pub const BR_MODE: &str = "br_mode";
    pub const STARTING_LIVES: &str = "starting_lives";
    /// When set, every player rolls its own run seed.
    pub const INDEPENDENT_SEEDS: &str = "independent_seeds";
    pub const DEATH_ON_ROUND_LOSS: &str = "death_on_round_loss";
    pub const POTLUCK_SCORE_MULTIPLIER: &str = "potluck_score_multiplier";
}

/// A lobby option value: booleans are coerced on merge, everything else
/// stays text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Open string-keyed lobby options map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    values: BTreeMap<String, OptionValue>,
}

impl Options {
    pub fn defaults() -> Self {
        let mut options = Self::default();
        options
            .values
            .insert(keys::BATTLE_ROYALE.to_string(), OptionValue::Bool(true));
        options
    }

    /// Merge raw key/value pairs, coercing `"true"`/`"false"` to booleans.
    pub fn merge(&mut self, pairs: Vec<(String, String)>) {
        for (key, value) in pairs {
            let value = match value.as_str() {
                "true" => OptionValue::Bool(true),
                "false" => OptionValue::Bool(false),
                _ => OptionValue::Text(value),
            };
            self.values.insert(key, value);
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(OptionValue::Bool(b)) => *b,
            Some(OptionValue::Text(_)) | None => default,
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(OptionValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn u32(&self, key: &str) -> Option<u32> {
        self.str(key).and_then(|s| s.parse().ok())
    }

    /// Flat entries for the `lobbyOptions` broadcast.
    pub fn wire_entries(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

pub struct Lobby {
    pub code: String,
    pub game_mode: GameMode,
    /// Ordered; index 0 is the host.
    pub player_ids: Vec<PlayerId>,
    pub mode: BattleRoyaleMode,
    /// Owned teams; only team-based modes populate this.
    pub teams: Vec<Team>,
    pub options: Options,
    pub is_started: bool,
}

impl Lobby {
    pub fn new(code: String, game_mode: GameMode) -> Self {
        Self {
            code,
            game_mode,
            player_ids: Vec::new(),
            mode: BattleRoyaleMode::Nemesis,
            teams: Vec::new(),
            options: Options::defaults(),
            is_started: false,
        }
    }

    pub fn player_count(&self) -> usize {
        self.player_ids.len()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player_ids.contains(&id)
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.player_ids.first().copied()
    }

    pub fn is_host(&self, id: PlayerId) -> bool {
        self.host() == Some(id)
    }

    pub fn is_joinable(&self) -> bool {
        self.player_count() < self.mode.max_players() && !self.is_started
    }

    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    pub fn team_mut(&mut self, team_id: &str) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == team_id)
    }

    pub fn team_ids(&self) -> Vec<String> {
        self.teams.iter().map(|t| t.id.clone()).collect()
    }
}

/// Uniform random code over the lobby alphabet, regenerated until it misses
/// every live lobby.
fn generate_code(world: &World) -> String {
    let mut rng = rand::rng();
    loop {
        let code: String = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        if !world.lobby_exists(&code) {
            return code;
        }
    }
}

/// Shared run seed announced at match start.
pub fn generate_seed() -> String {
    let mut rng = rand::rng();
    (0..SEED_LENGTH)
        .map(|_| SEED_ALPHABET[rng.random_range(0..SEED_ALPHABET.len())] as char)
        .collect()
}

/// Create a lobby with `host` attached and registered under a fresh code.
pub fn create(world: &mut World, host: PlayerId, game_mode: GameMode) -> Option<String> {
    world.player(host)?;
    // A member of another lobby would leave a ghost roster entry behind;
    // detach first.
    if world.lobby_of(host).is_some() {
        debug!("[Lobby] {host} creates a lobby while still in one; detaching");
        remove_player_from_game(world, host, true);
    }

    let code = generate_code(world);
    let mut lobby = Lobby::new(code.clone(), game_mode);
    lobby.player_ids.push(host);
    world.insert_lobby(lobby);

    if let Some(player) = world.player_mut(host) {
        player.lobby = Some(code.clone());
    }
    world.send_to(
        host,
        ServerAction::JoinedLobby {
            code: code.clone(),
            game_mode,
        },
    );
    info!("[Lobby] {code} created by {host}");
    Some(code)
}

/// Join an existing lobby; rejected if started or at mode capacity.
pub fn join(world: &mut World, id: PlayerId, code: &str) -> Result<(), HandlerError> {
    let Some(lobby) = world.lobby(code) else {
        return Err(HandlerError::LobbyNotFound);
    };
    if lobby.contains(id) {
        // Already a member; nothing to do.
        return Ok(());
    }
    if !lobby.is_joinable() {
        return Err(HandlerError::LobbyUnjoinable);
    }
    let game_mode = lobby.game_mode;

    if world.lobby_of(id).is_some() {
        debug!("[Lobby] {id} joins {code} while still in another lobby; detaching");
        remove_player_from_game(world, id, true);
    }

    let Some(lobby) = world.lobby_mut(code) else {
        return Err(HandlerError::LobbyNotFound);
    };
    lobby.player_ids.push(id);
    let options = lobby.options.wire_entries();
    if let Some(player) = world.player_mut(id) {
        player.lobby = Some(code.to_string());
    }

    world.send_to(
        id,
        ServerAction::JoinedLobby {
            code: code.to_string(),
            game_mode,
        },
    );
    world.send_to(
        id,
        ServerAction::LobbyOptions { game_mode, options },
    );
    broadcast_lobby_info(world, code);
    modes::on_join_lobby(world, code, id);
    info!("[Lobby] {id} joined {code}");
    Ok(())
}

/// Pull a player out of the running match, optionally out of the lobby too.
///
/// The removed player is always told to stop any in-progress match. When the
/// lobby empties its code is released; otherwise the active mode re-checks
/// readiness, rescores and re-checks game over, and the match is force-ended
/// if fewer than two competitors retain lives.
pub fn remove_player_from_game(world: &mut World, id: PlayerId, also_leave_lobby: bool) {
    let Some(code) = world.lobby_of(id) else {
        return;
    };

    world.send_to(id, ServerAction::StopGame);
    if let Some(player) = world.player_mut(id) {
        player.in_match = false;
        player.in_pvp_battle = false;
    }

    if also_leave_lobby {
        team::remove_player_from_team(world, id);
        if let Some(lobby) = world.lobby_mut(&code) {
            lobby.player_ids.retain(|pid| *pid != id);
        }
        if let Some(player) = world.player_mut(id) {
            player.lobby = None;
            player.team = None;
        }
    }

    let Some(lobby) = world.lobby(&code) else {
        return;
    };
    if lobby.player_ids.is_empty() {
        world.remove_lobby(&code);
        info!("[Lobby] {code} destroyed");
        return;
    }

    if lobby.is_started {
        // Handle the abandoned nemesis.
        if let Some(enemy_id) = world.player(id).and_then(|p| p.enemy) {
            if let Some(in_pvp) = world.player(enemy_id).map(|e| e.in_pvp_battle) {
                if in_pvp {
                    world.send_to(enemy_id, ServerAction::EndPvP { lost: false });
                }
                world.clear_enemy(enemy_id);
            }
        }

        modes::check_all_ready(world, &code);
        modes::recalculate_score_to_beat(world, &code);
        modes::check_pvp_done(world, &code);
        modes::check_game_over(world, &code);

        if let Some(player) = world.player_mut(id) {
            player.reset_stats();
        }
        world.broadcast_player_stats(id);

        let alive = alive_count(world, &code);
        if alive < crate::config::lobby::MIN_PLAYERS {
            // No one is left to fight; end the match without evicting anyone.
            world.broadcast(&code, ServerAction::StopGame);
            reset_players(world, &code);
            if let Some(lobby) = world.lobby_mut(&code) {
                lobby.is_started = false;
            }
        }
    }

    broadcast_lobby_info(world, &code);
    modes::on_leave_lobby(world, &code, id);
}

/// Number of lobby members with lives remaining.
pub fn alive_count(world: &World, code: &str) -> usize {
    let Some(lobby) = world.lobby(code) else {
        return 0;
    };
    lobby
        .player_ids
        .iter()
        .filter(|pid| world.player(**pid).is_some_and(|p| p.lives > 0))
        .count()
}

/// Recompute and send each member a roster snapshot, plus that member's
/// current opponent if the match is running and one is assigned.
pub fn broadcast_lobby_info(world: &World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    if lobby.player_ids.is_empty() {
        return;
    }

    let mut roster = Vec::with_capacity(lobby.player_count());
    for pid in &lobby.player_ids {
        let Some(player) = world.player(*pid) else {
            continue;
        };
        let mut element = Fields::new();
        element
            .push("id", escape(&player.id.to_string()))
            .push("username", escape(&player.username))
            .push("hash", escape(&player.mod_hash))
            .push("isHost", lobby.is_host(*pid));
        roster.push(element.serialize_list_element());
    }
    let roster = join_list(&roster);

    for pid in &lobby.player_ids {
        let enemy_id = if lobby.is_started {
            world
                .player(*pid)
                .and_then(|p| p.enemy)
                .map(|e| e.to_string())
        } else {
            None
        };
        world.send_to(
            *pid,
            ServerAction::LobbyInfo {
                player_id: pid.to_string(),
                players: roster.clone(),
                is_started: lobby.is_started,
                enemy_id,
            },
        );
    }
}

/// Merge option changes; a change to the battle-royale toggle or sub-mode
/// reconstructs the active mode, discarding all mode-specific round state.
/// The new options go to everyone except the host.
pub fn set_options(world: &mut World, code: &str, pairs: Vec<(String, String)>) {
    let Some(lobby) = world.lobby_mut(code) else {
        return;
    };
    let was_enabled = lobby.options.bool_or(keys::BATTLE_ROYALE, false);
    let last_mode = lobby.options.str(keys::BR_MODE).unwrap_or("").to_string();

    lobby.options.merge(pairs);

    let now_enabled = lobby.options.bool_or(keys::BATTLE_ROYALE, false);
    let now_mode = lobby.options.str(keys::BR_MODE).unwrap_or("").to_string();
    let next = BattleRoyaleMode::from_options(&lobby.options);

    if was_enabled != now_enabled {
        modes::install(world, code, next);
    } else if last_mode != now_mode {
        modes::install(world, code, next);
    }

    let Some(lobby) = world.lobby(code) else {
        return;
    };
    let host = lobby.host();
    let game_mode = lobby.game_mode;
    let options = lobby.options.wire_entries();
    for pid in lobby.player_ids.clone() {
        if Some(pid) != host {
            world.send_to(
                pid,
                ServerAction::LobbyOptions {
                    game_mode,
                    options: options.clone(),
                },
            );
        }
    }
}

/// Set every member's lives and announce the new count.
pub fn set_players_lives(world: &mut World, code: &str, lives: u32) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    for pid in lobby.player_ids.clone() {
        if let Some(player) = world.player_mut(pid) {
            player.lives = lives;
        }
    }
    world.broadcast(code, ServerAction::PlayerInfo { lives });
}

/// Reset every member (and the mode's own state) to pre-game defaults.
pub fn reset_players(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    for pid in lobby.player_ids.clone() {
        if let Some(player) = world.player_mut(pid) {
            player.reset();
        }
        world.broadcast_player_stats(pid);
    }
    modes::reset_mode_state(world, code);
}

/// Run a fresh pairing pass once every living member is unpaired.
pub fn check_reroll_enemies(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    if !lobby.is_started
        || lobby.mode == BattleRoyaleMode::Hivemind
        || lobby.player_count() < crate::config::lobby::MIN_PLAYERS
    {
        return;
    }
    let all_unpaired = lobby.player_ids.iter().all(|pid| {
        world
            .player(*pid)
            .is_none_or(|p| p.lives == 0 || p.enemy.is_none())
    });
    if all_unpaired {
        modes::reroll_enemies(world, code);
    }
}
