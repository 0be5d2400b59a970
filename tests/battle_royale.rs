//! Round resolution across the battle-royale modes.

mod common;

use pretty_assertions::assert_eq;

use card_royale::game::score::ExtendedScore;
use card_royale::game::world::World;
use card_royale::protocol::{ClientRequest, ServerAction};
use common::*;

fn play_hand(world: &mut World, client: &TestClient, score: &str, hands_left: u32) {
    ok(
        world,
        client,
        ClientRequest::PlayHand {
            score: score.parse().unwrap(),
            score_delta: score.parse().unwrap(),
            hands_left,
        },
    );
}

#[test]
fn nemesis_round_loser_drops_a_life_and_both_sides_hear_the_result() {
    let mut world = World::new();
    let (_code, clients) = setup_lobby(&mut world, 1);
    set_options(
        &mut world,
        &clients[0],
        &[("br_mode", "nemesis"), ("starting_lives", "2")],
    );
    ok(&mut world, &clients[0], ClientRequest::StartGame);

    // Two players pair against each other on start.
    let host_enemy = world.player(clients[0].id).unwrap().enemy;
    assert_eq!(host_enemy, Some(clients[1].id));
    assert_eq!(
        world.player(clients[1].id).unwrap().enemy,
        Some(clients[0].id)
    );
    assert_eq!(world.player(clients[0].id).unwrap().lives, 2);

    ready_all(&mut world, &clients);
    for client in &clients {
        assert!(client.received(|a| matches!(a, ServerAction::StartBlind)));
        assert!(world.player(client.id).unwrap().in_pvp_battle);
        client.clear();
    }

    play_hand(&mut world, &clients[0], "100", 0);
    play_hand(&mut world, &clients[1], "50", 0);

    assert_eq!(world.player(clients[0].id).unwrap().lives, 2);
    assert_eq!(world.player(clients[1].id).unwrap().lives, 1);
    assert!(clients[0].received(|a| matches!(a, ServerAction::EndPvP { lost: false })));
    assert!(clients[1].received(|a| matches!(a, ServerAction::EndPvP { lost: true })));
}

#[test]
fn nemesis_tied_exchange_costs_no_one_a_life() {
    let mut world = World::new();
    let (_code, clients) = setup_lobby(&mut world, 1);
    set_options(
        &mut world,
        &clients[0],
        &[("br_mode", "nemesis"), ("starting_lives", "2")],
    );
    ok(&mut world, &clients[0], ClientRequest::StartGame);
    ready_all(&mut world, &clients);

    play_hand(&mut world, &clients[0], "75", 0);
    play_hand(&mut world, &clients[1], "75", 0);

    assert_eq!(world.player(clients[0].id).unwrap().lives, 2);
    assert_eq!(world.player(clients[1].id).unwrap().lives, 2);
    assert!(clients[0].received(|a| matches!(a, ServerAction::EndPvP { lost: false })));
    assert!(clients[1].received(|a| matches!(a, ServerAction::EndPvP { lost: false })));
}

#[test]
fn nemesis_game_over_announces_the_winner_and_resets_the_lobby() {
    let mut world = World::new();
    let (code, clients) = setup_lobby(&mut world, 1);
    set_options(
        &mut world,
        &clients[0],
        &[("br_mode", "nemesis"), ("starting_lives", "1")],
    );
    ok(&mut world, &clients[0], ClientRequest::StartGame);
    ready_all(&mut world, &clients);

    play_hand(&mut world, &clients[0], "100", 0);
    play_hand(&mut world, &clients[1], "50", 0);

    assert!(clients[1].received(|a| matches!(a, ServerAction::LoseGame)));
    assert!(clients[0].received(|a| matches!(a, ServerAction::WinGame)));
    let lobby = world.lobby(&code).unwrap();
    assert!(!lobby.is_started, "lobby resets to pre-game state");
    assert_eq!(lobby.player_count(), 2, "no one is evicted by game over");
}

#[test]
fn reroll_pairs_even_sets_symmetrically_and_leaves_one_odd_player_out() {
    for (count, expect_unpaired) in [(6usize, 0usize), (5, 1)] {
        let mut world = World::new();
        let (_code, clients) = setup_lobby(&mut world, count - 1);
        set_options(&mut world, &clients[0], &[("br_mode", "nemesis")]);
        ok(&mut world, &clients[0], ClientRequest::StartGame);

        let mut unpaired = 0;
        for client in &clients {
            let player = world.player(client.id).unwrap();
            match player.enemy {
                None => unpaired += 1,
                Some(enemy) => {
                    assert_ne!(enemy, client.id, "no self-pairing");
                    let reverse = world.player(enemy).unwrap().enemy;
                    assert_eq!(reverse, Some(client.id), "pairing must be symmetric");
                }
            }
        }
        assert_eq!(unpaired, expect_unpaired, "with {count} players");
    }
}

#[test]
fn potluck_target_is_the_average_of_other_living_players_floored() {
    let mut world = World::new();
    let (_code, clients) = setup_lobby(&mut world, 2);
    set_options(&mut world, &clients[0], &[("br_mode", "potluck")]);
    ok(&mut world, &clients[0], ClientRequest::StartGame);
    ready_all(&mut world, &clients);

    // Before anyone scores, the target sits at the configured floor.
    let floor = last_house_info(&clients[2]).expect("house info broadcast");
    let ServerAction::EnemyInfo { score, .. } = floor else {
        unreachable!();
    };
    assert_eq!(score, ExtendedScore::new(0, 100.0, 0));

    play_hand(&mut world, &clients[0], "300", 2);
    play_hand(&mut world, &clients[1], "100", 3);

    // The third player's recomputed target: (300 + 100) / 2 = 200.
    let info = last_house_info(&clients[2]).expect("house info rebroadcast");
    let ServerAction::EnemyInfo { score, hands_left, .. } = info else {
        unreachable!();
    };
    assert_eq!(score, ExtendedScore::new(0, 200.0, 0));
    assert_eq!(hands_left, 5, "house shows the others' remaining hands");
    assert_eq!(
        world.player(clients[2].id).unwrap().score_to_beat,
        ExtendedScore::new(0, 200.0, 0)
    );
}

#[test]
fn potluck_round_settles_once_everyone_is_done_and_misses_cost_a_life() {
    let mut world = World::new();
    let (_code, clients) = setup_lobby(&mut world, 2);
    set_options(
        &mut world,
        &clients[0],
        &[("br_mode", "potluck"), ("starting_lives", "2")],
    );
    ok(&mut world, &clients[0], ClientRequest::StartGame);
    ready_all(&mut world, &clients);

    // Everyone exhausts their hands; the lowest scorer misses its target.
    play_hand(&mut world, &clients[0], "500", 0);
    play_hand(&mut world, &clients[1], "400", 0);
    play_hand(&mut world, &clients[2], "10", 0);

    assert_eq!(world.player(clients[0].id).unwrap().lives, 2);
    assert_eq!(world.player(clients[1].id).unwrap().lives, 2);
    assert_eq!(world.player(clients[2].id).unwrap().lives, 1);
    assert!(clients[2].received(|a| matches!(a, ServerAction::EndPvP { lost: true })));
    assert!(clients[0].received(|a| matches!(a, ServerAction::EndPvP { lost: false })));
}

#[test]
fn leaving_mid_match_force_ends_when_fewer_than_two_remain_alive() {
    let mut world = World::new();
    let (code, clients) = setup_lobby(&mut world, 1);
    set_options(&mut world, &clients[0], &[("br_mode", "nemesis")]);
    ok(&mut world, &clients[0], ClientRequest::StartGame);
    assert!(world.lobby(&code).unwrap().is_started);

    ok(&mut world, &clients[1], ClientRequest::LeaveLobby);

    let lobby = world.lobby(&code).unwrap();
    assert!(!lobby.is_started, "one competitor cannot carry a match");
    assert!(clients[0].received(|a| matches!(a, ServerAction::StopGame)));
    assert_eq!(lobby.player_count(), 1);
}

#[test]
fn fail_round_only_costs_a_life_when_the_option_is_set() {
    let mut world = World::new();
    let (_code, clients) = setup_lobby(&mut world, 1);
    set_options(
        &mut world,
        &clients[0],
        &[("br_mode", "nemesis"), ("starting_lives", "3")],
    );
    ok(&mut world, &clients[0], ClientRequest::StartGame);

    ok(&mut world, &clients[1], ClientRequest::FailRound);
    assert_eq!(world.player(clients[1].id).unwrap().lives, 3);

    set_options(&mut world, &clients[0], &[("death_on_round_loss", "true")]);
    ok(&mut world, &clients[1], ClientRequest::FailRound);
    assert_eq!(world.player(clients[1].id).unwrap().lives, 2);
}

#[test]
fn lives_blocker_debounces_double_losses_until_new_round() {
    let mut world = World::new();
    let (_code, clients) = setup_lobby(&mut world, 1);
    set_options(
        &mut world,
        &clients[0],
        &[("br_mode", "nemesis"), ("starting_lives", "3")],
    );
    ok(&mut world, &clients[0], ClientRequest::StartGame);

    ok(&mut world, &clients[1], ClientRequest::FailTimer);
    ok(&mut world, &clients[1], ClientRequest::FailTimer);
    assert_eq!(
        world.player(clients[1].id).unwrap().lives,
        2,
        "second loss in the same tick is debounced"
    );

    ok(&mut world, &clients[1], ClientRequest::NewRound);
    ok(&mut world, &clients[1], ClientRequest::FailTimer);
    assert_eq!(world.player(clients[1].id).unwrap().lives, 1);
}
