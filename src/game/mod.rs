pub mod card;
pub mod deck;
pub mod engine;
pub mod error;

pub use card::{Card, Color, Value};
pub use engine::{Game, PlayOutcome, PlayerId};
pub use error::GameError;
