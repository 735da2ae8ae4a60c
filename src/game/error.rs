use thiserror::Error;

/// Rule violations and invariant failures raised by the game engine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("not the player's turn")]
    NotYourTurn,
    #[error("card is not in the player's hand")]
    CardNotInHand,
    #[error("card cannot be played on the current top card")]
    InvalidCard,
    #[error("a wild card needs a chosen colour")]
    ColorRequired,
    #[error("game is already over")]
    GameOver,
    #[error("a game needs at least {0} players")]
    NotEnoughPlayers(usize),
    #[error("draw and discard piles are both exhausted")]
    DeckExhausted,
}

impl GameError {
    /// Wire token sent back as `ERROR;<code>`.
    pub fn reason_code(&self) -> &'static str {
        match self {
            GameError::NotYourTurn => "NOT_YOUR_TURN",
            GameError::CardNotInHand => "CARD_NOT_IN_HAND",
            GameError::InvalidCard => "INVALID_CARD",
            GameError::ColorRequired => "COLOR_REQUIRED",
            GameError::GameOver => "GAME_OVER",
            GameError::NotEnoughPlayers(_) => "NOT_ENOUGH_PLAYERS",
            GameError::DeckExhausted => "GAME_ABORTED",
        }
    }

    /// Whether the room can keep going after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::DeckExhausted)
    }
}
