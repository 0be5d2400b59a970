//! Shared test harness: a recording [`Connection`] and helpers that drive
//! the dispatcher the same way the hub actor does, without an actor system.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use uuid::Uuid;

use card_royale::game::player::{Connection, PlayerId};
use card_royale::game::world::World;
use card_royale::game::GameMode;
use card_royale::protocol::{ClientRequest, ServerAction};
use card_royale::server::error::HandlerError;
use card_royale::server::hub::handlers::dispatch;

/// Records everything the server delivers to one connection.
struct RecordingConnection {
    actions: Rc<RefCell<Vec<ServerAction>>>,
}

impl Connection for RecordingConnection {
    fn deliver(&self, action: &ServerAction) {
        self.actions.borrow_mut().push(action.clone());
    }
}

pub struct TestClient {
    pub id: PlayerId,
    actions: Rc<RefCell<Vec<ServerAction>>>,
}

impl TestClient {
    /// Everything delivered so far, oldest first.
    pub fn sent(&self) -> Vec<ServerAction> {
        self.actions.borrow().clone()
    }

    pub fn clear(&self) {
        self.actions.borrow_mut().clear();
    }

    pub fn received(&self, pred: impl Fn(&ServerAction) -> bool) -> bool {
        self.actions.borrow().iter().any(|a| pred(a))
    }

    pub fn last_matching(&self, pred: impl Fn(&ServerAction) -> bool) -> Option<ServerAction> {
        self.actions.borrow().iter().rev().find(|a| pred(a)).cloned()
    }
}

/// Open a recorded connection.
pub fn connect(world: &mut World) -> TestClient {
    let id = Uuid::new_v4();
    let actions = Rc::new(RefCell::new(Vec::new()));
    world.connect(
        id,
        Box::new(RecordingConnection {
            actions: Rc::clone(&actions),
        }),
    );
    TestClient { id, actions }
}

/// Drive one request through the dispatch boundary.
pub fn request(world: &mut World, client: &TestClient, req: ClientRequest) -> Result<(), HandlerError> {
    dispatch(world, client.id, req)
}

/// Dispatch and assert success.
pub fn ok(world: &mut World, client: &TestClient, req: ClientRequest) {
    let kind = req.name();
    if let Err(err) = dispatch(world, client.id, req) {
        panic!("`{kind}` failed unexpectedly: {err}");
    }
}

/// The code of the lobby the client was last confirmed into.
pub fn joined_code(client: &TestClient) -> String {
    match client.last_matching(|a| matches!(a, ServerAction::JoinedLobby { .. })) {
        Some(ServerAction::JoinedLobby { code, .. }) => code,
        _ => panic!("client never joined a lobby"),
    }
}

/// Create a lobby with `extra` additional members; returns the code and all
/// clients, host first.
pub fn setup_lobby(world: &mut World, extra: usize) -> (String, Vec<TestClient>) {
    let host = connect(world);
    ok(
        world,
        &host,
        ClientRequest::CreateLobby {
            game_mode: GameMode::Attrition,
        },
    );
    let code = joined_code(&host);

    let mut clients = vec![host];
    for _ in 0..extra {
        let guest = connect(world);
        ok(world, &guest, ClientRequest::JoinLobby { code: code.clone() });
        clients.push(guest);
    }
    (code, clients)
}

/// Merge lobby options as the host.
pub fn set_options(world: &mut World, host: &TestClient, pairs: &[(&str, &str)]) {
    ok(
        world,
        host,
        ClientRequest::SetOptions {
            options: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        },
    );
}

/// Ready every client for a PvP round.
pub fn ready_all(world: &mut World, clients: &[TestClient]) {
    for client in clients {
        ok(world, client, ClientRequest::ReadyBlind { is_pvp: true });
    }
}

/// The latest house target shown to this client, as (score, hands).
pub fn last_house_info(client: &TestClient) -> Option<ServerAction> {
    client.last_matching(
        |a| matches!(a, ServerAction::EnemyInfo { player_id, .. } if player_id == "house"),
    )
}
