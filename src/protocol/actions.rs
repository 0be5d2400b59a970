//! Typed protocol actions.
//!
//! `ServerAction` is everything the server can push to a client;
//! `ClientRequest` is everything a client can ask of the server. The session
//! actor decodes each inbound line into a `ClientRequest` and the hub invokes
//! exactly one handler per request kind; handlers never see raw field maps.

use crate::game::score::ExtendedScore;
use crate::game::GameMode;
use crate::protocol::escape::escape;
use crate::protocol::fields::Fields;
use crate::protocol::ProtocolError;

/// Server-to-client message.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerAction {
    Connected,
    /// Asks the client to report its version.
    VersionRequest,
    Error { message: String },
    /// A localizable notice, referenced by key.
    Message { loc_key: String },
    JoinedLobby { code: String, game_mode: GameMode },
    LobbyInfo {
        player_id: String,
        /// Pre-built roster sub-list (`|`-joined escaped elements).
        players: String,
        is_started: bool,
        enemy_id: Option<String>,
    },
    LobbyOptions {
        game_mode: GameMode,
        options: Vec<(String, String)>,
    },
    KickedFromLobby,
    StopGame,
    StartGame { deck: String, seed: Option<String> },
    StartBlind,
    WinGame,
    LoseGame,
    PlayerInfo { lives: u32 },
    EnemyInfo {
        player_id: String,
        enemy_id: Option<String>,
        score: ExtendedScore,
        hands_left: u32,
        skips: u32,
        lives: u32,
    },
    EnemyLocation { player_id: String, location: String },
    SetPlayerTeam { player_id: String, team_id: String },
    EndPvP { lost: bool },
    SetDeckType { back: String, sleeve: String, stake: String },
    SetDeck { deck: String },
    SetHandLevel { hand: String, level: i64 },
    SetScore { score: ExtendedScore },
    GiveMoney { amount: i64 },
    SkipBlind,
    EndBlind,
    /// Sent to the first player to ready up a round.
    Speedrun,
    SendPhantom { key: String },
    RemovePhantom { key: String },
    Magnet,
    MagnetResponse { key: String },
    /// Asks the recipient to surrender its end-of-run jokers to `receiver_id`.
    GetEndGameJokers { receiver_id: String },
    ReceiveEndGameJokers { keys: String },
    StartAnteTimer { time: u32 },
    SpentLastShop { player_id: String, amount: i64 },
    KeepAlive,
    KeepAliveAck,
}

impl ServerAction {
    /// Wire name of the message kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::VersionRequest => "version",
            Self::Error { .. } => "error",
            Self::Message { .. } => "message",
            Self::JoinedLobby { .. } => "joinedLobby",
            Self::LobbyInfo { .. } => "lobbyInfo",
            Self::LobbyOptions { .. } => "lobbyOptions",
            Self::KickedFromLobby => "kickedFromLobby",
            Self::StopGame => "stopGame",
            Self::StartGame { .. } => "startGame",
            Self::StartBlind => "startBlind",
            Self::WinGame => "winGame",
            Self::LoseGame => "loseGame",
            Self::PlayerInfo { .. } => "playerInfo",
            Self::EnemyInfo { .. } => "enemyInfo",
            Self::EnemyLocation { .. } => "enemyLocation",
            Self::SetPlayerTeam { .. } => "setPlayerTeam",
            Self::EndPvP { .. } => "endPvP",
            Self::SetDeckType { .. } => "setDeckType",
            Self::SetDeck { .. } => "setDeck",
            Self::SetHandLevel { .. } => "setHandLevel",
            Self::SetScore { .. } => "setScore",
            Self::GiveMoney { .. } => "giveMoney",
            Self::SkipBlind => "skipBlind",
            Self::EndBlind => "endBlind",
            Self::Speedrun => "speedrun",
            Self::SendPhantom { .. } => "sendPhantom",
            Self::RemovePhantom { .. } => "removePhantom",
            Self::Magnet => "magnet",
            Self::MagnetResponse { .. } => "magnetResponse",
            Self::GetEndGameJokers { .. } => "getEndGameJokers",
            Self::ReceiveEndGameJokers { .. } => "receiveEndGameJokers",
            Self::StartAnteTimer { .. } => "startAnteTimer",
            Self::SpentLastShop { .. } => "spentLastShop",
            Self::KeepAlive => "keepAlive",
            Self::KeepAliveAck => "keepAliveAck",
        }
    }

    /// Liveness control traffic is exempt from logging and side effects.
    pub fn is_keepalive(&self) -> bool {
        matches!(self, Self::KeepAlive | Self::KeepAliveAck)
    }

    pub fn to_fields(&self) -> Fields {
        let mut f = Fields::action(self.name());
        match self {
            Self::Connected
            | Self::VersionRequest
            | Self::KickedFromLobby
            | Self::StopGame
            | Self::StartBlind
            | Self::WinGame
            | Self::LoseGame
            | Self::SkipBlind
            | Self::EndBlind
            | Self::Speedrun
            | Self::Magnet
            | Self::KeepAlive
            | Self::KeepAliveAck => {}
            Self::Error { message } => {
                f.push("message", escape(message));
            }
            Self::Message { loc_key } => {
                f.push("locKey", loc_key);
            }
            Self::JoinedLobby { code, game_mode } => {
                f.push("code", code).push("type", game_mode);
            }
            Self::LobbyInfo {
                player_id,
                players,
                is_started,
                enemy_id,
            } => {
                f.push("playerId", player_id)
                    .push("players", players)
                    .push("isStarted", is_started)
                    .push_opt("enemyId", enemy_id.as_ref());
            }
            Self::LobbyOptions { game_mode, options } => {
                f.push("gamemode", game_mode);
                for (key, value) in options {
                    f.push(key, value);
                }
            }
            Self::StartGame { deck, seed } => {
                f.push("deck", deck).push_opt("seed", seed.as_ref());
            }
            Self::PlayerInfo { lives } => {
                f.push("lives", lives);
            }
            Self::EnemyInfo {
                player_id,
                enemy_id,
                score,
                hands_left,
                skips,
                lives,
            } => {
                f.push("playerId", player_id)
                    .push_opt("enemyId", enemy_id.as_ref())
                    .push("score", score)
                    .push("handsLeft", hands_left)
                    .push("skips", skips)
                    .push("lives", lives);
            }
            Self::EnemyLocation {
                player_id,
                location,
            } => {
                f.push("playerId", player_id)
                    .push("location", escape(location));
            }
            Self::SetPlayerTeam { player_id, team_id } => {
                f.push("playerId", player_id).push("teamId", escape(team_id));
            }
            Self::EndPvP { lost } => {
                f.push("lost", lost);
            }
            Self::SetDeckType {
                back,
                sleeve,
                stake,
            } => {
                f.push("back", back).push("sleeve", sleeve).push("stake", stake);
            }
            Self::SetDeck { deck } => {
                f.push("deck", deck);
            }
            Self::SetHandLevel { hand, level } => {
                f.push("hand", hand).push("level", level);
            }
            Self::SetScore { score } => {
                f.push("score", score);
            }
            Self::GiveMoney { amount } => {
                f.push("amount", amount);
            }
            Self::SendPhantom { key } | Self::RemovePhantom { key } | Self::MagnetResponse { key } => {
                f.push("key", key);
            }
            Self::GetEndGameJokers { receiver_id } => {
                f.push("receiverId", receiver_id);
            }
            Self::ReceiveEndGameJokers { keys } => {
                f.push("keys", keys);
            }
            Self::StartAnteTimer { time } => {
                f.push("time", time);
            }
            Self::SpentLastShop { player_id, amount } => {
                f.push("playerId", player_id).push("amount", amount);
            }
        }
        f
    }

    /// One wire line, without the trailing newline.
    pub fn to_line(&self) -> String {
        self.to_fields().serialize()
    }
}

/// Client-to-server request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    Username { username: String, mod_hash: String },
    CreateLobby { game_mode: GameMode },
    JoinLobby { code: String },
    LobbyInfo,
    LeaveLobby,
    ReturnToLobby,
    KickPlayer { player_id: String },
    SendMoneyToPlayer { player_id: String, amount: i64 },
    StartGame,
    StopGame,
    ReadyBlind { is_pvp: bool },
    UnreadyBlind,
    PlayHand {
        score: ExtendedScore,
        score_delta: ExtendedScore,
        hands_left: u32,
    },
    FailRound,
    FailTimer,
    SetAnte { ante: u32 },
    Skip { skips: u32 },
    NewRound,
    SetLocation { location: String },
    Version { version: String },
    SetOptions { options: Vec<(String, String)> },
    SetTeam { team_id: String },
    SendDeckType { back: String, sleeve: String, stake: String },
    SendDeck { deck: String },
    AddCard { card: String },
    RemoveCard { card: String },
    SetCardSuit { card: String, suit: String },
    SetCardRank { card: String, rank: String },
    SetCardEnhancement { card: String, enhancement: String },
    SetCardEdition { card: String, edition: String },
    SetCardSeal { card: String, seal: String },
    ChangeHandLevel { hand: String, amount: i64 },
    SendPhantom { key: String },
    RemovePhantom { key: String },
    Magnet,
    MagnetResponse { key: String },
    ReceiveEndGameJokers { receiver_id: String, keys: String },
    StartAnteTimer { time: u32 },
    SpentLastShop { amount: i64 },
    KeepAlive,
    KeepAliveAck,
}

impl ClientRequest {
    /// Wire name of the request kind (for logging).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Username { .. } => "username",
            Self::CreateLobby { .. } => "createLobby",
            Self::JoinLobby { .. } => "joinLobby",
            Self::LobbyInfo => "lobbyInfo",
            Self::LeaveLobby => "leaveLobby",
            Self::ReturnToLobby => "returnToLobby",
            Self::KickPlayer { .. } => "kickPlayer",
            Self::SendMoneyToPlayer { .. } => "sendMoneyToPlayer",
            Self::StartGame => "startGame",
            Self::StopGame => "stopGame",
            Self::ReadyBlind { .. } => "readyBlind",
            Self::UnreadyBlind => "unreadyBlind",
            Self::PlayHand { .. } => "playHand",
            Self::FailRound => "failRound",
            Self::FailTimer => "failTimer",
            Self::SetAnte { .. } => "setAnte",
            Self::Skip { .. } => "skip",
            Self::NewRound => "newRound",
            Self::SetLocation { .. } => "setLocation",
            Self::Version { .. } => "version",
            Self::SetOptions { .. } => "lobbyOptions",
            Self::SetTeam { .. } => "setTeam",
            Self::SendDeckType { .. } => "sendDeckType",
            Self::SendDeck { .. } => "sendDeck",
            Self::AddCard { .. } => "addCard",
            Self::RemoveCard { .. } => "removeCard",
            Self::SetCardSuit { .. } => "setCardSuit",
            Self::SetCardRank { .. } => "setCardRank",
            Self::SetCardEnhancement { .. } => "setCardEnhancement",
            Self::SetCardEdition { .. } => "setCardEdition",
            Self::SetCardSeal { .. } => "setCardSeal",
            Self::ChangeHandLevel { .. } => "changeHandLevel",
            Self::SendPhantom { .. } => "sendPhantom",
            Self::RemovePhantom { .. } => "removePhantom",
            Self::Magnet => "magnet",
            Self::MagnetResponse { .. } => "magnetResponse",
            Self::ReceiveEndGameJokers { .. } => "receiveEndGameJokers",
            Self::StartAnteTimer { .. } => "startAnteTimer",
            Self::SpentLastShop { .. } => "spentLastShop",
            Self::KeepAlive => "keepAlive",
            Self::KeepAliveAck => "keepAliveAck",
        }
    }

    pub fn is_keepalive(&self) -> bool {
        matches!(self, Self::KeepAlive | Self::KeepAliveAck)
    }

    /// Decode one parsed record into a typed request.
    pub fn from_fields(fields: &Fields) -> Result<Self, ProtocolError> {
        let kind = fields.kind().ok_or(ProtocolError::MissingAction)?;
        let request = match kind {
            "username" => Self::Username {
                username: fields.text("username")?,
                mod_hash: fields.text("modHash")?,
            },
            "createLobby" => Self::CreateLobby {
                // Attrition is the default game mode.
                game_mode: fields
                    .get("gameMode")
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or_default(),
            },
            "joinLobby" => Self::JoinLobby {
                code: fields.str("code")?.to_string(),
            },
            "lobbyInfo" => Self::LobbyInfo,
            "leaveLobby" => Self::LeaveLobby,
            "returnToLobby" => Self::ReturnToLobby,
            "kickPlayer" => Self::KickPlayer {
                player_id: fields.str("playerId")?.to_string(),
            },
            "sendMoneyToPlayer" => Self::SendMoneyToPlayer {
                player_id: fields.str("playerId")?.to_string(),
                amount: fields.i64("amount")?,
            },
            "startGame" => Self::StartGame,
            "stopGame" => Self::StopGame,
            "readyBlind" => Self::ReadyBlind {
                is_pvp: fields.get("isPVP") == Some("true"),
            },
            "unreadyBlind" => Self::UnreadyBlind,
            "playHand" => Self::PlayHand {
                score: fields.score("score")?,
                score_delta: match fields.get("scoreDelta") {
                    Some(_) => fields.score("scoreDelta")?,
                    None => ExtendedScore::zero(),
                },
                hands_left: fields.u32("handsLeft")?,
            },
            "failRound" => Self::FailRound,
            "failTimer" => Self::FailTimer,
            "setAnte" => Self::SetAnte {
                ante: fields.u32("ante")?,
            },
            "skip" => Self::Skip {
                skips: fields.u32("skips")?,
            },
            "newRound" => Self::NewRound,
            "setLocation" => Self::SetLocation {
                location: fields.text("location")?,
            },
            "version" => Self::Version {
                version: fields.str("version")?.to_string(),
            },
            "lobbyOptions" => Self::SetOptions {
                options: fields
                    .iter()
                    .filter(|(key, _)| *key != "action")
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            },
            "setTeam" => Self::SetTeam {
                team_id: fields.text("teamId")?,
            },
            "sendDeckType" => Self::SendDeckType {
                back: fields.str("back")?.to_string(),
                sleeve: fields.str("sleeve")?.to_string(),
                stake: fields.str("stake")?.to_string(),
            },
            "sendDeck" => Self::SendDeck {
                deck: fields.str("deck")?.to_string(),
            },
            "addCard" => Self::AddCard {
                card: fields.str("card")?.to_string(),
            },
            "removeCard" => Self::RemoveCard {
                card: fields.str("card")?.to_string(),
            },
            "setCardSuit" => Self::SetCardSuit {
                card: fields.str("card")?.to_string(),
                suit: fields.str("suit")?.to_string(),
            },
            "setCardRank" => Self::SetCardRank {
                card: fields.str("card")?.to_string(),
                rank: fields.str("rank")?.to_string(),
            },
            "setCardEnhancement" => Self::SetCardEnhancement {
                card: fields.str("card")?.to_string(),
                enhancement: fields.str("enhancement")?.to_string(),
            },
            "setCardEdition" => Self::SetCardEdition {
                card: fields.str("card")?.to_string(),
                edition: fields.str("edition")?.to_string(),
            },
            "setCardSeal" => Self::SetCardSeal {
                card: fields.str("card")?.to_string(),
                seal: fields.str("seal")?.to_string(),
            },
            "changeHandLevel" => Self::ChangeHandLevel {
                hand: fields.str("hand")?.to_string(),
                amount: fields.i64("amount")?,
            },
            "sendPhantom" => Self::SendPhantom {
                key: fields.str("key")?.to_string(),
            },
            "removePhantom" => Self::RemovePhantom {
                key: fields.str("key")?.to_string(),
            },
            "magnet" => Self::Magnet,
            "magnetResponse" => Self::MagnetResponse {
                key: fields.str("key")?.to_string(),
            },
            "receiveEndGameJokers" => Self::ReceiveEndGameJokers {
                receiver_id: fields.str("receiverId")?.to_string(),
                keys: fields.str("keys")?.to_string(),
            },
            "startAnteTimer" => Self::StartAnteTimer {
                time: fields.u32("time")?,
            },
            "spentLastShop" => Self::SpentLastShop {
                amount: fields.i64("amount")?,
            },
            "keepAlive" => Self::KeepAlive,
            "keepAliveAck" => Self::KeepAliveAck,
            other => return Err(ProtocolError::UnknownAction(other.to_string())),
        };
        Ok(request)
    }

    /// Decode one raw wire line.
    pub fn parse_line(line: &str) -> Result<Self, ProtocolError> {
        Self::from_fields(&Fields::parse(line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_play_hand_with_extended_score() {
        let req = ClientRequest::parse_line("action:playHand,score:e1.5e10,scoreDelta:250,handsLeft:2").unwrap();
        assert_eq!(
            req,
            ClientRequest::PlayHand {
                score: ExtendedScore::new(1, 1.5, 10),
                score_delta: ExtendedScore::new(0, 250.0, 0),
                hands_left: 2,
            }
        );
    }

    #[test]
    fn missing_score_delta_defaults_to_zero() {
        let req = ClientRequest::parse_line("action:playHand,score:100,handsLeft:0").unwrap();
        match req {
            ClientRequest::PlayHand { score_delta, .. } => {
                assert_eq!(score_delta, ExtendedScore::zero())
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn unknown_actions_are_distinguished_from_malformed_lines() {
        assert_eq!(
            ClientRequest::parse_line("action:danceParty"),
            Err(ProtocolError::UnknownAction("danceParty".to_string()))
        );
        assert_eq!(ClientRequest::parse_line(""), Err(ProtocolError::Empty));
    }

    #[test]
    fn username_fields_are_unescaped() {
        let req =
            ClientRequest::parse_line("action:username,username:a{a}b,modHash:h{b}1").unwrap();
        assert_eq!(
            req,
            ClientRequest::Username {
                username: "a,b".to_string(),
                mod_hash: "h:1".to_string(),
            }
        );
    }

    #[test]
    fn lobby_options_collects_every_non_action_field() {
        let req = ClientRequest::parse_line(
            "action:lobbyOptions,battle_royale:true,br_mode:potluck,starting_lives:3",
        )
        .unwrap();
        assert_eq!(
            req,
            ClientRequest::SetOptions {
                options: vec![
                    ("battle_royale".into(), "true".into()),
                    ("br_mode".into(), "potluck".into()),
                    ("starting_lives".into(), "3".into()),
                ]
            }
        );
    }

    #[test]
    fn serialized_actions_omit_absent_fields() {
        let action = ServerAction::StartGame {
            deck: "d_standard".to_string(),
            seed: None,
        };
        assert_eq!(action.to_line(), "action:startGame,deck:d_standard");

        let action = ServerAction::EnemyInfo {
            player_id: "p1".to_string(),
            enemy_id: None,
            score: ExtendedScore::new(0, 50.0, 0),
            hands_left: 4,
            skips: 0,
            lives: 2,
        };
        assert_eq!(
            action.to_line(),
            "action:enemyInfo,playerId:p1,score:50,handsLeft:4,skips:0,lives:2"
        );
    }

    #[test]
    fn error_messages_are_escaped_on_the_wire() {
        let action = ServerAction::Error {
            message: "Lobby is full, has already started, or does not exist.".to_string(),
        };
        let line = action.to_line();
        // The payload keeps a single field; commas inside it are placeholders.
        assert_eq!(line.matches(',').count(), 1);
        let fields = Fields::parse(&line).unwrap();
        assert_eq!(
            fields.text("message").unwrap(),
            "Lobby is full, has already started, or does not exist."
        );
    }
}
