use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Wild,
}

impl Color {
    /// The four colours a numbered or action card can carry.
    pub const PLAYABLE: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Green => "GREEN",
            Color::Blue => "BLUE",
            Color::Yellow => "YELLOW",
            Color::Wild => "WILD",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RED" => Ok(Color::Red),
            "GREEN" => Ok(Color::Green),
            "BLUE" => Ok(Color::Blue),
            "YELLOW" => Ok(Color::Yellow),
            "WILD" => Ok(Color::Wild),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Number(u8),
    Skip,
    Reverse,
    Draw2,
    /// Plain wild: only changes the colour in play.
    ChooseColor,
    Draw4,
}

impl Value {
    pub const WILD_VALUES: [Value; 2] = [Value::ChooseColor, Value::Draw4];

    pub fn colored_values() -> impl Iterator<Item = Value> {
        (0..=9)
            .map(Value::Number)
            .chain([Value::Skip, Value::Reverse, Value::Draw2])
    }

    pub fn is_wild_value(&self) -> bool {
        matches!(self, Value::ChooseColor | Value::Draw4)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Skip => f.write_str("SKIP"),
            Value::Reverse => f.write_str("REVERSE"),
            Value::Draw2 => f.write_str("DRAW2"),
            Value::ChooseColor => f.write_str("COLOR"),
            Value::Draw4 => f.write_str("DRAW4"),
        }
    }
}

impl FromStr for Value {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "SKIP" => Ok(Value::Skip),
            "REVERSE" => Ok(Value::Reverse),
            "DRAW2" => Ok(Value::Draw2),
            "COLOR" => Ok(Value::ChooseColor),
            "DRAW4" => Ok(Value::Draw4),
            digit if digit.len() == 1 => digit
                .parse::<u8>()
                .map(Value::Number)
                .map_err(|_| ()),
            _ => Err(()),
        }
    }
}

/// A card is nothing but its `(color, value)` pair; duplicates are
/// indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub color: Color,
    pub value: Value,
}

impl Card {
    pub const fn new(color: Color, value: Value) -> Self {
        Self { color, value }
    }

    pub const fn wild(value: Value) -> Self {
        Self::new(Color::Wild, value)
    }

    pub fn is_wild(&self) -> bool {
        self.color == Color::Wild
    }

    /// Wild cards go anywhere; otherwise colour or value must match the top card.
    pub fn is_playable_on(&self, top: &Card) -> bool {
        self.is_wild() || self.color == top.color || self.value == top.value
    }

    /// Undo the colour choice stamped on a played wild.
    pub fn unresolved(self) -> Self {
        if self.value.is_wild_value() {
            Card::wild(self.value)
        } else {
            self
        }
    }

    /// `HAND` listing form, e.g. `RED-5`.
    pub fn hand_token(&self) -> String {
        format!("{}-{}", self.color, self.value)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.value)
    }
}

pub const FULL_DECK_SIZE: usize = 112;
pub const COPIES_PER_COLORED_CARD: usize = 2;
pub const COPIES_PER_WILD_CARD: usize = 4;

/// Builds the fixed 112-card set in deterministic (unshuffled) order.
pub fn full_card_set() -> Vec<Card> {
    let mut cards = Vec::with_capacity(FULL_DECK_SIZE);
    for color in Color::PLAYABLE {
        for value in Value::colored_values() {
            cards.extend(std::iter::repeat_n(
                Card::new(color, value),
                COPIES_PER_COLORED_CARD,
            ));
        }
    }
    for value in Value::WILD_VALUES {
        cards.extend(std::iter::repeat_n(Card::wild(value), COPIES_PER_WILD_CARD));
    }
    cards
}
