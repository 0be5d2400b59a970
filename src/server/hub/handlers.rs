//! Per-request handlers behind the dispatch boundary.
//!
//! `dispatch` consumes one decoded request plus the originating player id
//! and invokes exactly one core operation. Handlers that find the request
//! invalid for the current state return a [`HandlerError`]; requests the
//! original protocol treats as fire-and-forget fail silently instead.

use log::debug;
use uuid::Uuid;

use crate::game::deck::{Card, CardField};
use crate::game::lobby::{self, keys};
use crate::game::modes::{self, BattleRoyaleMode};
use crate::game::player::PlayerId;
use crate::game::team;
use crate::game::world::World;
use crate::protocol::{ClientRequest, ServerAction};
use crate::server::error::HandlerError;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn dispatch(world: &mut World, id: PlayerId, request: ClientRequest) -> Result<(), HandlerError> {
    match request {
        ClientRequest::Username { username, mod_hash } => {
            if let Some(player) = world.player_mut(id) {
                player.username = username;
                player.mod_hash = mod_hash;
            }
            if let Some(code) = world.lobby_of(id) {
                lobby::broadcast_lobby_info(world, &code);
            }
            Ok(())
        }

        ClientRequest::CreateLobby { game_mode } => {
            lobby::create(world, id, game_mode);
            Ok(())
        }

        ClientRequest::JoinLobby { code } => lobby::join(world, id, &code),

        ClientRequest::LobbyInfo => {
            let code = world.lobby_of(id).ok_or(HandlerError::NotInLobby)?;
            lobby::broadcast_lobby_info(world, &code);
            Ok(())
        }

        ClientRequest::LeaveLobby => {
            lobby::remove_player_from_game(world, id, true);
            Ok(())
        }

        ClientRequest::ReturnToLobby => {
            lobby::remove_player_from_game(world, id, false);
            Ok(())
        }

        ClientRequest::KickPlayer { player_id } => {
            let code = world.lobby_of(id).ok_or(HandlerError::NotInLobby)?;
            if !world.lobby(&code).is_some_and(|l| l.is_host(id)) {
                return Err(HandlerError::NotHost);
            }
            let Some(target) = lobby_member(world, &code, &player_id) else {
                return Ok(());
            };
            lobby::remove_player_from_game(world, target, true);
            world.send_to(target, ServerAction::KickedFromLobby);
            Ok(())
        }

        ClientRequest::SendMoneyToPlayer { player_id, amount } => {
            let Some(code) = world.lobby_of(id) else {
                return Ok(());
            };
            if let Some(target) = lobby_member(world, &code, &player_id) {
                world.send_to(target, ServerAction::GiveMoney { amount });
            }
            Ok(())
        }

        ClientRequest::StartGame => {
            let code = world.lobby_of(id).ok_or(HandlerError::NotInLobby)?;
            if !world.lobby(&code).is_some_and(|l| l.is_host(id)) {
                return Err(HandlerError::NotHost);
            }
            modes::start_game(world, &code);
            Ok(())
        }

        ClientRequest::StopGame => {
            world.lobby_of(id).ok_or(HandlerError::NotInLobby)?;
            world.send_to(id, ServerAction::StopGame);
            Ok(())
        }

        ClientRequest::ReadyBlind { is_pvp } => {
            if let Some(player) = world.player_mut(id) {
                player.is_ready = true;
                if is_pvp {
                    player.is_ready_pvp = true;
                }
            }

            // First to ready up this round gets the speedrun notice.
            let first_already = world.player(id).map(|p| p.first_ready).unwrap_or(true);
            let enemy_readied = world
                .player(id)
                .and_then(|p| p.enemy)
                .and_then(|e| world.player(e))
                .map(|e| e.is_ready || e.first_ready)
                .unwrap_or(false);
            if !first_already && !enemy_readied {
                if let Some(player) = world.player_mut(id) {
                    player.first_ready = true;
                }
                world.send_to(id, ServerAction::Speedrun);
            }

            if let Some(code) = world.lobby_of(id) {
                modes::check_all_ready(world, &code);
            }
            Ok(())
        }

        ClientRequest::UnreadyBlind => {
            if let Some(player) = world.player_mut(id) {
                player.is_ready = false;
                player.is_ready_pvp = false;
            }
            Ok(())
        }

        ClientRequest::PlayHand {
            score,
            score_delta,
            hands_left,
        } => {
            let Some(code) = world.lobby_of(id) else {
                world.send_to(id, ServerAction::StopGame);
                return Ok(());
            };
            let member_count = world.lobby(&code).map(|l| l.player_count()).unwrap_or(0);
            if member_count < crate::config::lobby::MIN_PLAYERS {
                world.send_to(id, ServerAction::StopGame);
                return Ok(());
            }

            if let Some(player) = world.player_mut(id) {
                player.score = score;
                player.hands_left = hands_left;
            }
            if !world.player(id).is_some_and(|p| p.in_pvp_battle) {
                return Ok(());
            }

            let Some(kind) = world.lobby(&code).map(|l| l.mode) else {
                return Ok(());
            };
            match kind {
                BattleRoyaleMode::Disabled | BattleRoyaleMode::Nemesis => {
                    modes::nemesis::resolve_exchange(world, id);
                }
                BattleRoyaleMode::Potluck => {
                    world.broadcast_player_stats(id);
                    modes::recalculate_score_to_beat(world, &code);
                    modes::check_pvp_done(world, &code);
                }
                BattleRoyaleMode::Hivemind => {
                    if let Some((team_code, team_id)) = team::team_of(world, id) {
                        team::add_score(world, &team_code, &team_id, score_delta);
                    }
                    modes::check_pvp_done(world, &code);
                }
            }

            lobby::check_reroll_enemies(world, &code);
            Ok(())
        }

        ClientRequest::FailRound => {
            let Some(code) = world.lobby_of(id) else {
                return Ok(());
            };
            let death_on_loss = world
                .lobby(&code)
                .is_some_and(|l| l.options.bool_or(keys::DEATH_ON_ROUND_LOSS, false));
            if death_on_loss {
                world.lose_life(id);
            }
            Ok(())
        }

        ClientRequest::FailTimer => {
            world.lose_life(id);
            Ok(())
        }

        ClientRequest::SetAnte { ante } => {
            if let Some(player) = world.player_mut(id) {
                player.ante = ante.max(1);
            }
            Ok(())
        }

        ClientRequest::Skip { skips } => {
            if let Some(player) = world.player_mut(id) {
                player.skips = skips;
            }
            if world.player(id).is_some_and(|p| p.team.is_some()) {
                team::skip_blind(world, id);
            }
            world.broadcast_player_stats(id);
            Ok(())
        }

        ClientRequest::NewRound => {
            if let Some(player) = world.player_mut(id) {
                player.lives_blocker = false;
            }
            Ok(())
        }

        ClientRequest::SetLocation { location } => {
            if let Some(player) = world.player_mut(id) {
                player.location = location.clone();
            }
            if let Some(code) = world.lobby_of(id) {
                world.broadcast(
                    &code,
                    ServerAction::EnemyLocation {
                        player_id: id.to_string(),
                        location,
                    },
                );
            }
            Ok(())
        }

        ClientRequest::Version { version } => {
            check_client_version(world, id, &version);
            Ok(())
        }

        ClientRequest::SetOptions { options } => {
            let code = world.lobby_of(id).ok_or(HandlerError::NotInLobby)?;
            lobby::set_options(world, &code, options);
            Ok(())
        }

        ClientRequest::SetTeam { team_id } => {
            let code = world.lobby_of(id).ok_or(HandlerError::NotInLobby)?;
            if !world.lobby(&code).is_some_and(|l| l.mode.is_team_based()) {
                return Err(HandlerError::TeamsNotEnabled);
            }
            team::set_player_team(world, id, &team_id);
            Ok(())
        }

        ClientRequest::SendDeckType { back, sleeve, stake } => {
            team::set_deck_type(world, id, back, sleeve, stake);
            Ok(())
        }

        ClientRequest::SendDeck { deck } => {
            team::accept_deck_chunk(world, id, deck);
            Ok(())
        }

        ClientRequest::AddCard { card } => {
            let card = Card::from_wire(&card)?;
            team::queue_deck_edit(world, id, |deck| deck.queue_add(card));
            Ok(())
        }

        ClientRequest::RemoveCard { card } => {
            let card = Card::from_wire(&card)?;
            team::queue_deck_edit(world, id, |deck| deck.queue_remove(card));
            Ok(())
        }

        ClientRequest::SetCardSuit { card, suit } => {
            queue_card_change(world, id, &card, CardField::Suit, suit)
        }

        ClientRequest::SetCardRank { card, rank } => {
            queue_card_change(world, id, &card, CardField::Rank, rank)
        }

        ClientRequest::SetCardEnhancement { card, enhancement } => {
            queue_card_change(world, id, &card, CardField::Enhancement, enhancement)
        }

        ClientRequest::SetCardEdition { card, edition } => {
            queue_card_change(world, id, &card, CardField::Edition, edition)
        }

        ClientRequest::SetCardSeal { card, seal } => {
            queue_card_change(world, id, &card, CardField::Seal, seal)
        }

        ClientRequest::ChangeHandLevel { hand, amount } => {
            team::change_hand_level(world, id, hand, amount);
            Ok(())
        }

        ClientRequest::SendPhantom { key } => {
            let Some(enemy) = enemy_of(world, id) else {
                return Ok(());
            };
            if let Some(player) = world.player_mut(id) {
                player.phantom_keys.push(key.clone());
            }
            world.send_to(enemy, ServerAction::SendPhantom { key });
            Ok(())
        }

        ClientRequest::RemovePhantom { key } => {
            let Some(enemy) = enemy_of(world, id) else {
                return Ok(());
            };
            if let Some(player) = world.player_mut(id) {
                player.phantom_keys.retain(|k| *k != key);
            }
            world.send_to(enemy, ServerAction::RemovePhantom { key });
            Ok(())
        }

        ClientRequest::Magnet => {
            if let Some(enemy) = enemy_of(world, id) {
                world.send_to(enemy, ServerAction::Magnet);
            }
            Ok(())
        }

        ClientRequest::MagnetResponse { key } => {
            if let Some(enemy) = enemy_of(world, id) {
                world.send_to(enemy, ServerAction::MagnetResponse { key });
            }
            Ok(())
        }

        ClientRequest::ReceiveEndGameJokers { receiver_id, keys } => {
            let Some(code) = world.lobby_of(id) else {
                return Ok(());
            };
            if let Some(receiver) = lobby_member(world, &code, &receiver_id) {
                world.send_to(receiver, ServerAction::ReceiveEndGameJokers { keys });
            }
            Ok(())
        }

        ClientRequest::StartAnteTimer { time } => {
            if let Some(code) = world.lobby_of(id) {
                world.broadcast(&code, ServerAction::StartAnteTimer { time });
            }
            Ok(())
        }

        ClientRequest::SpentLastShop { amount } => {
            if let Some(code) = world.lobby_of(id) {
                world.broadcast(
                    &code,
                    ServerAction::SpentLastShop {
                        player_id: id.to_string(),
                        amount,
                    },
                );
            }
            Ok(())
        }

        ClientRequest::KeepAlive => {
            world.send_to(id, ServerAction::KeepAliveAck);
            Ok(())
        }

        ClientRequest::KeepAliveAck => Ok(()),
    }
}

/// Resolve a wire player id to a member of the given lobby.
fn lobby_member(world: &World, code: &str, raw_id: &str) -> Option<PlayerId> {
    let target: Uuid = raw_id.parse().ok()?;
    world
        .lobby(code)
        .filter(|l| l.contains(target))
        .map(|_| target)
}

fn enemy_of(world: &World, id: PlayerId) -> Option<PlayerId> {
    let player = world.player(id)?;
    player.lobby.as_ref()?;
    let enemy = player.enemy?;
    world.player(enemy).map(|e| e.id)
}

fn queue_card_change(
    world: &mut World,
    id: PlayerId,
    card: &str,
    field: CardField,
    value: String,
) -> Result<(), HandlerError> {
    let card = Card::from_wire(card)?;
    team::queue_deck_edit(world, id, |deck| deck.queue_change(card, field, value));
    Ok(())
}

/// Warn clients running behind the server's protocol version.
fn check_client_version(world: &World, id: PlayerId, reported: &str) {
    let Some(client) = version_triple(reported) else {
        debug!("[Hub] {id} reported unparsable version `{reported}`");
        return;
    };
    let Some(server) = version_triple(SERVER_VERSION) else {
        return;
    };
    if client < server {
        world.send_to(
            id,
            ServerAction::Error {
                message: format!("[WARN] Server expecting version {SERVER_VERSION}"),
            },
        );
    }
}

/// Leading `major.minor.patch` triple of a version string; trailing
/// qualifiers on the patch segment are ignored.
fn version_triple(s: &str) -> Option<(u32, u32, u32)> {
    let mut parts = s.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch: String = parts
        .next()?
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    Some((major, minor, patch.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn version_triples_tolerate_qualifiers() {
        assert_eq!(version_triple("0.2.0"), Some((0, 2, 0)));
        assert_eq!(version_triple("1.4.7-beta"), Some((1, 4, 7)));
        assert_eq!(version_triple("nonsense"), None);
        assert_eq!(version_triple("1.2"), None);
    }

    #[test]
    fn version_ordering_is_lexicographic_on_triples() {
        assert!(version_triple("0.1.9").unwrap() < version_triple("0.2.0").unwrap());
        assert!(version_triple("1.0.0").unwrap() > version_triple("0.9.9").unwrap());
    }
}
