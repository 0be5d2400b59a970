//! The single-owner state container.
//!
//! One `World` holds every connected player and every live lobby; the hub
//! actor owns it and processes one request at a time, which is what makes
//! the no-locking model of this server sound. The lobby map doubles as the
//! process-wide lobby-code registry: it is mutated only on lobby creation
//! and final-player departure, so no two live lobbies ever share a code.

use std::collections::HashMap;

use log::{debug, info};

use crate::game::lobby::{self, Lobby};
use crate::game::modes;
use crate::game::player::{Connection, Player, PlayerId};
use crate::protocol::ServerAction;

#[derive(Default)]
pub struct World {
    players: HashMap<PlayerId, Player>,
    lobbies: HashMap<String, Lobby>,
    /// (lobby code, team id) pairs whose deck sync should be re-polled.
    deck_retries: Vec<(String, String)>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // Connection lifecycle ---------------------------------------------------

    /// Register a fresh connection and greet it.
    pub fn connect(&mut self, id: PlayerId, conn: Box<dyn Connection>) {
        let player = Player::new(id, conn);
        player.send(ServerAction::Connected);
        player.send(ServerAction::VersionRequest);
        self.players.insert(id, player);
        info!("[World] player {id} connected");
    }

    /// Drop a connection: an implicit leave-lobby, then forget the player.
    pub fn disconnect(&mut self, id: PlayerId) {
        lobby::remove_player_from_game(self, id, true);
        self.players.remove(&id);
        info!("[World] player {id} disconnected");
    }

    // Lookups ----------------------------------------------------------------

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn lobby(&self, code: &str) -> Option<&Lobby> {
        self.lobbies.get(code)
    }

    pub fn lobby_mut(&mut self, code: &str) -> Option<&mut Lobby> {
        self.lobbies.get_mut(code)
    }

    pub fn lobby_exists(&self, code: &str) -> bool {
        self.lobbies.contains_key(code)
    }

    pub fn insert_lobby(&mut self, lobby: Lobby) {
        self.lobbies.insert(lobby.code.clone(), lobby);
    }

    pub fn remove_lobby(&mut self, code: &str) {
        self.lobbies.remove(code);
    }

    /// Code of the lobby this player is in, if any.
    pub fn lobby_of(&self, id: PlayerId) -> Option<String> {
        self.players.get(&id).and_then(|p| p.lobby.clone())
    }

    // Delivery helpers -------------------------------------------------------

    pub fn send_to(&self, id: PlayerId, action: ServerAction) {
        if let Some(player) = self.players.get(&id) {
            player.send(action);
        }
    }

    pub fn send_many(&self, ids: &[PlayerId], action: ServerAction) {
        for id in ids {
            self.send_to(*id, action.clone());
        }
    }

    /// Synchronous fan-out to every player in a lobby.
    pub fn broadcast(&self, code: &str, action: ServerAction) {
        if let Some(lobby) = self.lobbies.get(code) {
            self.send_many(&lobby.player_ids.clone(), action);
        }
    }

    /// Broadcast this player's public stats to its lobby.
    pub fn broadcast_player_stats(&self, id: PlayerId) {
        if let Some(player) = self.players.get(&id) {
            if let Some(code) = &player.lobby {
                self.broadcast(code, player.enemy_info(None));
            }
        }
    }

    // Opponent management ----------------------------------------------------

    /// Pair `id` against `enemy_id`: moves any projected phantoms from the
    /// old opponent to the new one and announces the pairing.
    pub fn set_enemy(&mut self, id: PlayerId, enemy_id: PlayerId) {
        let Some(player) = self.players.get(&id) else {
            return;
        };
        if player.lobby.is_none() {
            return;
        }
        if player.enemy.is_some() {
            self.remove_phantoms_from_enemy(id);
        }

        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        player.enemy = Some(enemy_id);
        let info = player.enemy_info(Some(enemy_id.to_string()));
        let code = player.lobby.clone();
        let keys = player.phantom_keys.clone();

        if let Some(code) = &code {
            self.broadcast(code, info);
        }
        for key in keys {
            self.send_to(enemy_id, ServerAction::SendPhantom { key });
        }
    }

    /// Unpair `id`, announcing the cleared slot as the literal "None".
    pub fn clear_enemy(&mut self, id: PlayerId) {
        self.remove_phantoms_from_enemy(id);

        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        player.enemy = None;
        let info = player.enemy_info(Some("None".to_string()));
        if let Some(code) = player.lobby.clone() {
            self.broadcast(&code, info);
        }
    }

    /// Withdraw every phantom this player projected onto its opponent.
    pub fn remove_phantoms_from_enemy(&self, id: PlayerId) {
        let Some(player) = self.players.get(&id) else {
            return;
        };
        let Some(enemy_id) = player.enemy else {
            return;
        };
        for key in player.phantom_keys.clone() {
            self.send_to(enemy_id, ServerAction::RemovePhantom { key });
        }
    }

    /// Ask `asked` to surrender its end-of-run jokers to `receiver`.
    pub fn request_end_game_jokers(&self, asked: PlayerId, receiver: PlayerId) {
        self.send_to(
            asked,
            ServerAction::GetEndGameJokers {
                receiver_id: receiver.to_string(),
            },
        );
    }

    // Lives ------------------------------------------------------------------

    /// Deduct one life, debounced by the per-tick blocker, and run the
    /// death bookkeeping once the player is out.
    pub fn lose_life(&mut self, id: PlayerId) {
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        if !player.lives_blocker && player.lives > 0 {
            player.lives -= 1;
            player.lives_blocker = true;
            let lives = player.lives;
            player.send(ServerAction::PlayerInfo { lives });
            self.broadcast_player_stats(id);
        }

        let Some(player) = self.players.get(&id) else {
            return;
        };
        if player.lives > 0 {
            return;
        }
        player.send(ServerAction::LoseGame);
        let Some(code) = player.lobby.clone() else {
            return;
        };

        // Capture before checkGameOver resets the lobby.
        let potential_winner = modes::winner(self, &code);
        modes::check_game_over(self, &code);

        if let Some(winner) = potential_winner {
            self.request_end_game_jokers(winner, id);
        }

        // Handle the abandoned nemesis.
        if let Some(enemy_id) = self.players.get(&id).and_then(|p| p.enemy) {
            if self.players.contains_key(&enemy_id) {
                self.request_end_game_jokers(enemy_id, id);
                self.clear_enemy(enemy_id);
            }
        }

        modes::check_all_ready(self, &code);
        debug!("[World] player {id} is out of lives");
    }

    // Deck sync retry --------------------------------------------------------

    /// Note a team whose sync point is waiting on deck chunks; the hub polls
    /// it again after a fixed delay.
    pub fn request_deck_retry(&mut self, code: &str, team_id: &str) {
        let pair = (code.to_string(), team_id.to_string());
        if !self.deck_retries.contains(&pair) {
            self.deck_retries.push(pair);
        }
    }

    pub fn drain_deck_retries(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.deck_retries)
    }
}
