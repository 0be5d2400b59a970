//! Per-connection player state.
//!
//! A player exists for exactly the lifetime of its connection; its id is
//! random, assigned at connect, and is the only identity the server knows.
//! All references to other objects (lobby, team, opponent) are id-based —
//! the lobby owns the objects themselves.

use uuid::Uuid;

use crate::config::game::HANDS_PER_ROUND;
use crate::game::score::ExtendedScore;
use crate::protocol::ServerAction;

pub type PlayerId = Uuid;

/// Outbound delivery seam between game state and the session actor.
///
/// The live implementation forwards to a WebSocket session; tests substitute
/// a recording implementation so scenarios run without an actor system.
pub trait Connection {
    fn deliver(&self, action: &ServerAction);
}

/// Location reported while no round is active.
pub const LOCATION_SELECTING: &str = "loc_selecting";

pub struct Player {
    pub id: PlayerId,
    conn: Box<dyn Connection>,

    pub username: String,
    pub mod_hash: String,
    /// Code of the lobby this player is in, if any (non-owning).
    pub lobby: Option<String>,
    /// Id of the team this player is on, if any (non-owning).
    pub team: Option<String>,

    /// Ready for the next (solo) blind.
    pub is_ready: bool,
    /// Ready for the next PvP exchange.
    pub is_ready_pvp: bool,
    /// Whether this player readied first this round (drives the speedrun notice).
    pub first_ready: bool,
    pub in_match: bool,
    pub in_pvp_battle: bool,

    pub lives: u32,
    pub score: ExtendedScore,
    /// Current house/virtual-opponent target, where the mode uses one.
    pub score_to_beat: ExtendedScore,
    pub hands_left: u32,
    pub ante: u32,
    pub skips: u32,

    /// Opponent within the same lobby, if paired (non-owning).
    pub enemy: Option<PlayerId>,
    /// Transient-effect keys currently projected onto the opponent.
    pub phantom_keys: Vec<String>,

    /// Debounce guard against a double life loss within one tick.
    pub lives_blocker: bool,
    pub location: String,
}

impl Player {
    pub fn new(id: PlayerId, conn: Box<dyn Connection>) -> Self {
        Self {
            id,
            conn,
            username: "Guest".to_string(),
            mod_hash: "NULL".to_string(),
            lobby: None,
            team: None,
            is_ready: false,
            is_ready_pvp: false,
            first_ready: false,
            in_match: false,
            in_pvp_battle: false,
            lives: 0,
            score: ExtendedScore::zero(),
            score_to_beat: ExtendedScore::zero(),
            hands_left: HANDS_PER_ROUND,
            ante: 1,
            skips: 0,
            enemy: None,
            phantom_keys: Vec::new(),
            lives_blocker: false,
            location: LOCATION_SELECTING.to_string(),
        }
    }

    pub fn send(&self, action: ServerAction) {
        self.conn.deliver(&action);
    }

    /// Snapshot of this player's public stats as an `enemyInfo` payload.
    pub fn enemy_info(&self, enemy_id: Option<String>) -> ServerAction {
        ServerAction::EnemyInfo {
            player_id: self.id.to_string(),
            enemy_id,
            score: self.score,
            hands_left: self.hands_left,
            skips: self.skips,
            lives: self.lives,
        }
    }

    /// Soft reset between matches: clears score/hands/opponent/phantoms,
    /// keeps identity and team.
    pub fn reset_stats(&mut self) {
        self.lives = 0;
        self.score = ExtendedScore::zero();
        self.hands_left = HANDS_PER_ROUND;
        self.ante = 1;
        self.skips = 0;
        self.enemy = None;
        self.in_pvp_battle = false;
        self.score_to_beat = ExtendedScore::zero();
        self.phantom_keys.clear();
    }

    /// Full reset to the pre-game state.
    pub fn reset(&mut self) {
        self.is_ready = false;
        self.is_ready_pvp = false;
        self.first_ready = false;
        self.in_match = false;
        self.reset_stats();
        self.lives_blocker = false;
        self.location = LOCATION_SELECTING.to_string();
    }
}
