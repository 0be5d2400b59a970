//! Battle-royale round-resolution policies.
//!
//! One mode is active per lobby; switching the battle-royale toggle or
//! sub-mode replaces it wholesale and discards all mode-specific round
//! state. The four policies share a common contract (`start_game`,
//! `check_all_ready`, `check_game_over`, `reroll_enemies`, and the
//! post-hand hooks `check_pvp_done` / `recalculate_score_to_beat`); each
//! variant overrides the parts it changes, dispatched here.
//!
//! - `disabled`: legacy two-player head-to-head, fixed pairing
//! - `nemesis`:  N-player pairwise random matching, loser drops a life
//! - `potluck`:  every player races a computed "house" target
//! - `hivemind`: teams share one deck/score/life pool, paired like players

pub mod disabled;
pub mod hivemind;
pub mod nemesis;
pub mod potluck;

use log::info;

use crate::config::game::HANDS_PER_ROUND;
use crate::config::lobby::{MAX_PLAYERS, MAX_PLAYERS_HEAD_TO_HEAD};
use crate::game::lobby::{self, keys, Options};
use crate::game::player::PlayerId;
use crate::game::score::ExtendedScore;
use crate::game::team;
use crate::game::world::World;
use crate::protocol::ServerAction;

/// Virtual-opponent id used by house-based modes.
pub const HOUSE_ID: &str = "house";

/// Default team every player lands on in a team-based mode.
pub const DEFAULT_TEAM_ID: &str = "RED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleRoyaleMode {
    Disabled,
    Nemesis,
    Potluck,
    Hivemind,
}

impl BattleRoyaleMode {
    /// Mode selected by the current lobby options.
    pub fn from_options(options: &Options) -> Self {
        if !options.bool_or(keys::BATTLE_ROYALE, false) {
            return Self::Disabled;
        }
        match options.str(keys::BR_MODE) {
            Some("nemesis") => Self::Nemesis,
            Some("potluck") => Self::Potluck,
            Some("hivemind") => Self::Hivemind,
            _ => Self::Disabled,
        }
    }

    pub fn max_players(self) -> usize {
        match self {
            Self::Disabled => MAX_PLAYERS_HEAD_TO_HEAD,
            _ => MAX_PLAYERS,
        }
    }

    pub fn is_team_based(self) -> bool {
        self == Self::Hivemind
    }

    /// Whether opponents are abstracted behind a computed house target.
    pub fn uses_house(self) -> bool {
        matches!(self, Self::Potluck | Self::Hivemind)
    }
}

/// Install a freshly constructed mode on the lobby, discarding all
/// mode-specific round state (hard reset on switch).
pub fn install(world: &mut World, code: &str, kind: BattleRoyaleMode) {
    let Some(lobby) = world.lobby_mut(code) else {
        return;
    };
    lobby.mode = kind;
    lobby.teams.clear();
    let members = lobby.player_ids.clone();
    for pid in &members {
        if let Some(player) = world.player_mut(*pid) {
            player.enemy = None;
            player.score_to_beat = ExtendedScore::zero();
            player.in_pvp_battle = false;
        }
    }

    match kind {
        BattleRoyaleMode::Disabled => disabled::enforce_player_cap(world, code),
        BattleRoyaleMode::Hivemind => hivemind::assign_default_team(world, code),
        _ => {}
    }
    info!("[Mode] {code} switched to {kind:?}");
}

/// Common `startGame`: lives from the lobby option or the game-mode
/// default, one shared seed unless independent seeds are requested, initial
/// pairings, and the started flag.
pub fn start_game(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    let kind = lobby.mode;
    let lives = lobby
        .options
        .u32(keys::STARTING_LIVES)
        .unwrap_or_else(|| lobby.game_mode.default_starting_lives());
    let seed = if lobby.options.bool_or(keys::INDEPENDENT_SEEDS, false) {
        None
    } else {
        Some(lobby::generate_seed())
    };

    world.broadcast(
        code,
        ServerAction::StartGame {
            deck: crate::config::game::STARTING_DECK.to_string(),
            seed,
        },
    );
    lobby::set_players_lives(world, code, lives);
    reroll_enemies(world, code);

    if let Some(lobby) = world.lobby_mut(code) {
        lobby.is_started = true;
        for team in &mut lobby.teams {
            team.lives = lives;
        }
    }
    lobby::broadcast_lobby_info(world, code);

    let members = world.lobby(code).map(|l| l.player_ids.clone()).unwrap_or_default();
    for pid in members {
        if let Some(player) = world.player_mut(pid) {
            player.in_match = true;
            player.is_ready = false;
            player.is_ready_pvp = false;
        }
    }

    if kind.uses_house() {
        // Introduce the house before it has a target.
        world.broadcast(
            code,
            ServerAction::EnemyInfo {
                player_id: HOUSE_ID.to_string(),
                enemy_id: None,
                score: ExtendedScore::zero(),
                hands_left: 0,
                skips: 0,
                lives: 0,
            },
        );
    }
    info!("[Mode] {code} started as {kind:?} with {lives} lives");
}

/// Whether every eligible (alive, in-match) participant is ready for PvP.
fn all_players_ready_pvp(world: &World, code: &str) -> bool {
    let Some(lobby) = world.lobby(code) else {
        return false;
    };
    if !lobby.is_started {
        return false;
    }
    lobby.player_ids.iter().all(|pid| {
        world
            .player(*pid)
            .is_none_or(|p| !p.in_match || p.lives == 0 || p.is_ready_pvp)
    })
}

/// Idempotent readiness check: a no-op unless every eligible participant is
/// ready, in which case per-round counters reset and the next round starts.
/// Team-based modes additionally run each team's own sync point.
pub fn check_all_ready(world: &mut World, code: &str) {
    if all_players_ready_pvp(world, code) {
        start_pvp_blind(world, code);
    }
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    if lobby.mode.is_team_based() {
        for team_id in lobby.team_ids() {
            team::check_all_ready(world, code, &team_id);
        }
    }
}

/// Start the next PvP round for every eligible participant.
fn start_pvp_blind(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    let kind = lobby.mode;
    let members = lobby.player_ids.clone();

    if kind.is_team_based() {
        hivemind::prepare_decks(world, code);
    }

    for pid in members {
        let Some(player) = world.player_mut(pid) else {
            continue;
        };
        if player.lives == 0 || !player.in_match {
            continue;
        }
        player.is_ready = false;
        player.is_ready_pvp = false;
        player.score = ExtendedScore::zero();
        player.hands_left = HANDS_PER_ROUND;
        player.send(ServerAction::StartBlind);
        player.in_pvp_battle = true;
    }

    if kind.uses_house() {
        recalculate_score_to_beat(world, code);
    }
    if kind.is_team_based() {
        hivemind::enter_pvp_blind(world, code);
    }
}

/// Post-hand hook: refresh each participant's target where the mode uses one.
pub fn recalculate_score_to_beat(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    match lobby.mode {
        BattleRoyaleMode::Potluck => potluck::recalculate_score_to_beat(world, code),
        // Team stats flow through the team broadcasts instead.
        _ => {}
    }
}

/// Post-hand hook: resolve the round once every participant is done.
pub fn check_pvp_done(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    match lobby.mode {
        BattleRoyaleMode::Potluck => potluck::check_pvp_done(world, code),
        BattleRoyaleMode::Hivemind => hivemind::check_pvp_done(world, code),
        // Pairwise modes resolve each exchange as the hands come in.
        _ => {}
    }
}

/// The sole surviving player, or None while the game is still contested.
pub fn winner(world: &World, code: &str) -> Option<PlayerId> {
    let lobby = world.lobby(code)?;
    let mut potential: Option<PlayerId> = None;
    for pid in &lobby.player_ids {
        if world.player(*pid).is_some_and(|p| p.lives > 0) {
            if potential.is_some() {
                return None;
            }
            potential = Some(*pid);
        }
    }
    potential
}

/// Detect a finished game: announce the winner, run the end-of-game side
/// effects tied to the loser, and reset the lobby to pre-game state without
/// evicting anyone.
pub fn check_game_over(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    if lobby.mode.is_team_based() {
        hivemind::check_game_over(world, code);
        return;
    }

    let Some(winner_id) = winner(world, code) else {
        return;
    };
    world.send_to(winner_id, ServerAction::WinGame);
    if let Some(beaten) = world.player(winner_id).and_then(|p| p.enemy) {
        world.request_end_game_jokers(beaten, winner_id);
    }

    lobby::reset_players(world, code);
    if let Some(lobby) = world.lobby_mut(code) {
        lobby.is_started = false;
    }
    lobby::broadcast_lobby_info(world, code);
    info!("[Mode] {code} game over; {winner_id} wins");
}

/// Draw fresh opponents for the living participants.
pub fn reroll_enemies(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    match lobby.mode {
        BattleRoyaleMode::Disabled => disabled::reroll_enemies(world, code),
        BattleRoyaleMode::Hivemind => hivemind::reroll_enemy_teams(world, code),
        BattleRoyaleMode::Nemesis | BattleRoyaleMode::Potluck => {
            nemesis::reroll_enemies(world, code)
        }
    }
}

/// Mode hook on a player joining the lobby.
pub fn on_join_lobby(world: &mut World, code: &str, id: PlayerId) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    if lobby.mode.is_team_based() {
        hivemind::on_join_lobby(world, code, id);
    }
}

/// Mode hook after a player left (or returned to) the lobby.
pub fn on_leave_lobby(world: &mut World, code: &str, _id: PlayerId) {
    let Some(lobby) = world.lobby(code) else {
        return;
    };
    if lobby.mode.is_team_based() {
        // The departure may have been the last unready member.
        for team_id in lobby.team_ids() {
            team::check_all_ready(world, code, &team_id);
        }
        hivemind::check_pvp_done(world, code);
    }
}

/// Reset mode-owned state (team pools) to pre-game defaults.
pub fn reset_mode_state(world: &mut World, code: &str) {
    let Some(lobby) = world.lobby_mut(code) else {
        return;
    };
    for team in &mut lobby.teams {
        team.reset_stats();
    }
}
