use std::fmt;

use crate::game::{Card, Color, GameError, Value};
use crate::room::RoomId;

/// Every reason the server can put after `ERROR;`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Game(GameError),
    NoUno,
    WaitForGame,
    UnknownCommand,
    SetNickFirst,
    InvalidNick,
    NotInRoom,
    AlreadyInRoom,
    InvalidRoomId,
    RoomNotFound,
    RoomFull,
    GameInProgress,
    NoRoomIds,
    PlayUsage,
    WildUsage,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Game(e) => e.reason_code(),
            ErrorCode::NoUno => "NO_UNO",
            ErrorCode::WaitForGame => "WAIT_FOR_GAME",
            ErrorCode::UnknownCommand => "UNKNOWN_COMMAND",
            ErrorCode::SetNickFirst => "SET_NICK_FIRST",
            ErrorCode::InvalidNick => "INVALID_NICK",
            ErrorCode::NotInRoom => "NOT_IN_ROOM",
            ErrorCode::AlreadyInRoom => "ALREADY_IN_ROOM",
            ErrorCode::InvalidRoomId => "INVALID_ROOM_ID",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::RoomFull => "ROOM_FULL",
            ErrorCode::GameInProgress => "GAME_IN_PROGRESS",
            ErrorCode::NoRoomIds => "NO_ROOM_IDS",
            ErrorCode::PlayUsage => "USE PLAY <COLOR> <VALUE>",
            ErrorCode::WildUsage => "USE WILD <COLOR|DRAW4> <COLOR>",
        }
    }
}

impl From<GameError> for ErrorCode {
    fn from(e: GameError) -> Self {
        ErrorCode::Game(e)
    }
}

/// What happened to a named player, rendered as `PLAYER;<nick>;<event>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Joined,
    Left,
    Ready,
    Draw,
    Uno,
    UnoWarning,
    Win,
    Played(Card),
    Wild { value: Value, chosen: Color },
}

impl fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerEvent::Joined => f.write_str("JOINED"),
            PlayerEvent::Left => f.write_str("LEFT"),
            PlayerEvent::Ready => f.write_str("READY"),
            PlayerEvent::Draw => f.write_str("DRAW"),
            PlayerEvent::Uno => f.write_str("UNO"),
            PlayerEvent::UnoWarning => f.write_str("UNO_WARNING"),
            PlayerEvent::Win => f.write_str("WIN"),
            PlayerEvent::Played(card) => write!(f, "PLAYED;{};{}", card.color, card.value),
            PlayerEvent::Wild { value, chosen } => write!(f, "WILD;{value};{chosen}"),
        }
    }
}

// Server to Client events, one line each
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerToClient {
    // Connection responses
    Welcome,
    Usage(&'static str),
    NickOk { nickname: String },
    Error(ErrorCode),

    // Room directory responses
    RoomCreated { room_id: RoomId },
    RoomJoined { room_id: RoomId },
    RoomInfo { room_id: RoomId, players: usize },
    NoRooms,

    // Game events
    Player { nickname: String, event: PlayerEvent },
    GameStarted,
    TopCard(Card),
    Hand(Vec<Card>),
    YourTurn,
    GameOver,
}

impl ServerToClient {
    pub fn player(nickname: &str, event: PlayerEvent) -> Self {
        Self::Player {
            nickname: nickname.to_string(),
            event,
        }
    }

    pub fn error(code: impl Into<ErrorCode>) -> Self {
        Self::Error(code.into())
    }

    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ServerToClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerToClient::Welcome => f.write_str("WELCOME;UNO"),
            ServerToClient::Usage(text) => write!(f, "USE;{text}"),
            ServerToClient::NickOk { nickname } => write!(f, "NICK_OK;{nickname}"),
            ServerToClient::Error(code) => write!(f, "ERROR;{}", code.as_str()),
            ServerToClient::RoomCreated { room_id } => write!(f, "ROOM_CREATED;{room_id}"),
            ServerToClient::RoomJoined { room_id } => write!(f, "ROOM_JOINED;{room_id}"),
            ServerToClient::RoomInfo { room_id, players } => write!(f, "ROOM;{room_id};{players}"),
            ServerToClient::NoRooms => f.write_str("NO_ROOMS"),
            ServerToClient::Player { nickname, event } => write!(f, "PLAYER;{nickname};{event}"),
            ServerToClient::GameStarted => f.write_str("GAME_STARTED"),
            ServerToClient::TopCard(card) => write!(f, "TOP_CARD;{};{}", card.color, card.value),
            ServerToClient::Hand(cards) => {
                let tokens: Vec<String> = cards.iter().map(Card::hand_token).collect();
                write!(f, "HAND;{}", tokens.join(","))
            }
            ServerToClient::YourTurn => f.write_str("YOUR_TURN"),
            ServerToClient::GameOver => f.write_str("GAME_OVER"),
        }
    }
}
