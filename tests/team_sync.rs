//! Hivemind teams: shared pools, chunked deck transfer and the merge point.

mod common;

use pretty_assertions::assert_eq;

use card_royale::game::world::World;
use card_royale::protocol::{ClientRequest, ServerAction};
use common::*;

/// Two players, two single-member teams (host on RED, guest on BLU).
fn setup_hivemind(world: &mut World, starting_lives: &str) -> (String, Vec<TestClient>) {
    let (code, clients) = setup_lobby(world, 1);
    set_options(
        world,
        &clients[0],
        &[("br_mode", "hivemind"), ("starting_lives", starting_lives)],
    );
    ok(
        world,
        &clients[1],
        ClientRequest::SetTeam {
            team_id: "BLU".to_string(),
        },
    );
    (code, clients)
}

fn send_deck(world: &mut World, client: &TestClient, deck: &str) {
    ok(
        world,
        client,
        ClientRequest::SendDeck {
            deck: deck.to_string(),
        },
    );
}

#[test]
fn everyone_lands_on_the_default_team_and_switches_are_broadcast() {
    let mut world = World::new();
    let (code, clients) = setup_lobby(&mut world, 1);
    set_options(&mut world, &clients[0], &[("br_mode", "hivemind")]);

    for client in &clients {
        assert_eq!(
            world.player(client.id).unwrap().team.as_deref(),
            Some("RED")
        );
    }

    ok(
        &mut world,
        &clients[1],
        ClientRequest::SetTeam {
            team_id: "BLU".to_string(),
        },
    );
    assert_eq!(
        world.player(clients[1].id).unwrap().team.as_deref(),
        Some("BLU")
    );
    // The whole lobby hears the assignment.
    assert!(clients[0].received(|a| matches!(
        a,
        ServerAction::SetPlayerTeam { team_id, .. } if team_id == "BLU"
    )));
    let lobby = world.lobby(&code).unwrap();
    assert!(lobby.team("RED").is_some());
    assert!(lobby.team("BLU").is_some());
}

#[test]
fn last_player_leaving_destroys_the_team() {
    let mut world = World::new();
    let (code, clients) = setup_hivemind(&mut world, "4");
    ok(&mut world, &clients[1], ClientRequest::LeaveLobby);
    let lobby = world.lobby(&code).unwrap();
    assert!(lobby.team("BLU").is_none(), "empty team must be destroyed");
    assert!(lobby.team("RED").is_some());
}

#[test]
fn set_team_outside_a_team_mode_is_rejected() {
    let mut world = World::new();
    let (_code, clients) = setup_lobby(&mut world, 1);
    let err = request(
        &mut world,
        &clients[1],
        ClientRequest::SetTeam {
            team_id: "BLU".to_string(),
        },
    );
    assert!(err.is_err(), "nemesis lobbies have no teams");
}

#[test]
fn chunked_deck_transfer_is_owned_by_the_first_sender() {
    let mut world = World::new();
    let (code, clients) = setup_lobby(&mut world, 2);
    set_options(&mut world, &clients[0], &[("br_mode", "hivemind")]);
    // clients[0] and clients[1] share RED; clients[2] moves away.
    ok(
        &mut world,
        &clients[2],
        ClientRequest::SetTeam {
            team_id: "BLU".to_string(),
        },
    );
    ok(&mut world, &clients[0], ClientRequest::StartGame);

    send_deck(&mut world, &clients[1], "S-A-none-none-none");
    // A second contributor is rejected until the buffer is consumed.
    send_deck(&mut world, &clients[0], "H-2-none-none-none");

    let lobby = world.lobby(&code).unwrap();
    let red = lobby.team("RED").unwrap();
    assert_eq!(red.deck_chunks.len(), 1);
    assert_eq!(red.deck_sender, Some(clients[1].id));
}

#[test]
fn deck_chunks_assemble_at_the_sync_point_and_broadcast_to_the_team() {
    let mut world = World::new();
    let (code, clients) = setup_hivemind(&mut world, "4");
    ok(&mut world, &clients[0], ClientRequest::StartGame);

    send_deck(&mut world, &clients[0], "S-A-none-none-none|H-T-none-none-none");
    send_deck(&mut world, &clients[0], "D-7-none-none-none");
    send_deck(&mut world, &clients[1], "C-2-none-none-none");
    clients[0].clear();

    ok(&mut world, &clients[0], ClientRequest::ReadyBlind { is_pvp: false });

    let deck = clients[0]
        .last_matching(|a| matches!(a, ServerAction::SetDeck { .. }))
        .expect("assembled deck goes to the team");
    let ServerAction::SetDeck { deck } = deck else {
        unreachable!();
    };
    assert_eq!(
        deck,
        "S-A-none-none-none|H-T-none-none-none|D-7-none-none-none"
    );
    assert!(clients[0].received(|a| matches!(a, ServerAction::StartBlind)));

    // The transfer buffer was consumed.
    let red = world.lobby(&code).unwrap().team("RED").unwrap();
    assert!(red.deck_chunks.is_empty());
    assert_eq!(red.deck_sender, None);
}

#[test]
fn ready_team_without_deck_chunks_polls_instead_of_blocking() {
    let mut world = World::new();
    let (code, clients) = setup_hivemind(&mut world, "4");
    ok(&mut world, &clients[0], ClientRequest::StartGame);
    clients[0].clear();

    ok(&mut world, &clients[0], ClientRequest::ReadyBlind { is_pvp: false });
    assert!(
        !clients[0].received(|a| matches!(a, ServerAction::StartBlind)),
        "round must not start before the deck arrives"
    );
    let retries = world.drain_deck_retries();
    assert!(retries.contains(&(code.clone(), "RED".to_string())));

    // The chunk arriving re-checks the sync point immediately.
    send_deck(&mut world, &clients[0], "S-A-none-none-none");
    assert!(clients[0].received(|a| matches!(a, ServerAction::StartBlind)));
}

#[test]
fn queued_edits_merge_once_per_sync_point() {
    let mut world = World::new();
    let (_code, clients) = setup_hivemind(&mut world, "4");
    ok(&mut world, &clients[0], ClientRequest::StartGame);
    send_deck(&mut world, &clients[0], "S-A-none-none-none|H-T-none-foil-none");
    ok(&mut world, &clients[0], ClientRequest::ReadyBlind { is_pvp: false });

    // Edits during the round queue rather than apply.
    ok(
        &mut world,
        &clients[0],
        ClientRequest::AddCard {
            card: "D-7-none-none-none".to_string(),
        },
    );
    ok(
        &mut world,
        &clients[0],
        ClientRequest::SetCardSeal {
            card: "S-A-none-none-none".to_string(),
            seal: "gold".to_string(),
        },
    );
    clients[0].clear();

    ok(&mut world, &clients[0], ClientRequest::ReadyBlind { is_pvp: false });
    let deck = clients[0]
        .last_matching(|a| matches!(a, ServerAction::SetDeck { .. }))
        .expect("merged deck rebroadcast");
    let ServerAction::SetDeck { deck } = deck else {
        unreachable!();
    };
    assert_eq!(
        deck,
        "S-A-none-none-gold|H-T-none-foil-none|D-7-none-none-none"
    );
}

#[test]
fn team_round_sums_deltas_and_the_trailing_team_loses_a_pooled_life() {
    let mut world = World::new();
    let (code, clients) = setup_hivemind(&mut world, "2");
    ok(&mut world, &clients[0], ClientRequest::StartGame);
    ready_all(&mut world, &clients);

    ok(
        &mut world,
        &clients[0],
        ClientRequest::PlayHand {
            score: "100".parse().unwrap(),
            score_delta: "100".parse().unwrap(),
            hands_left: 0,
        },
    );
    ok(
        &mut world,
        &clients[1],
        ClientRequest::PlayHand {
            score: "60".parse().unwrap(),
            score_delta: "60".parse().unwrap(),
            hands_left: 0,
        },
    );

    let lobby = world.lobby(&code).unwrap();
    assert_eq!(lobby.team("RED").unwrap().lives, 2);
    assert_eq!(lobby.team("BLU").unwrap().lives, 1);
    assert!(clients[0].received(|a| matches!(a, ServerAction::EndPvP { lost: false })));
    assert!(clients[1].received(|a| matches!(a, ServerAction::EndPvP { lost: true })));
}

#[test]
fn team_game_over_announces_the_surviving_team() {
    let mut world = World::new();
    let (code, clients) = setup_hivemind(&mut world, "1");
    ok(&mut world, &clients[0], ClientRequest::StartGame);
    ready_all(&mut world, &clients);

    ok(
        &mut world,
        &clients[0],
        ClientRequest::PlayHand {
            score: "100".parse().unwrap(),
            score_delta: "100".parse().unwrap(),
            hands_left: 0,
        },
    );
    ok(
        &mut world,
        &clients[1],
        ClientRequest::PlayHand {
            score: "60".parse().unwrap(),
            score_delta: "60".parse().unwrap(),
            hands_left: 0,
        },
    );

    assert!(clients[1].received(|a| matches!(a, ServerAction::LoseGame)));
    assert!(clients[0].received(|a| matches!(a, ServerAction::WinGame)));
    assert!(!world.lobby(&code).unwrap().is_started);
}

#[test]
fn hand_levels_are_shared_and_broadcast() {
    let mut world = World::new();
    let (_code, clients) = setup_hivemind(&mut world, "4");
    ok(
        &mut world,
        &clients[0],
        ClientRequest::ChangeHandLevel {
            hand: "flush".to_string(),
            amount: 2,
        },
    );
    let action = clients[0]
        .last_matching(|a| matches!(a, ServerAction::SetHandLevel { .. }))
        .expect("level change broadcast to the team");
    assert_eq!(
        action,
        ServerAction::SetHandLevel {
            hand: "flush".to_string(),
            level: 3,
        }
    );
}
