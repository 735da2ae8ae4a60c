use super::card::{Card, full_card_set};
use super::error::GameError;
use rand::Rng;
use rand::seq::SliceRandom;

/// Draw pile plus discard pile. The last element of each vector is its top.
#[derive(Debug, Clone)]
pub struct Deck {
    draw_pile: Vec<Card>,
    discard: Vec<Card>,
}

impl Deck {
    /// A shuffled copy of the full card set, nothing discarded yet.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut draw_pile = full_card_set();
        draw_pile.shuffle(rng);
        Self {
            draw_pile,
            discard: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_piles(draw_pile: Vec<Card>, discard: Vec<Card>) -> Self {
        Self { draw_pile, discard }
    }

    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    #[cfg(test)]
    pub fn discard_len(&self) -> usize {
        self.discard.len()
    }

    pub fn top_card(&self) -> Option<&Card> {
        self.discard.last()
    }

    pub fn discard(&mut self, card: Card) {
        self.discard.push(card);
    }

    /// Puts a card at the bottom of the draw pile.
    pub fn put_under(&mut self, card: Card) {
        self.draw_pile.insert(0, card);
    }

    /// Takes the top card, recycling everything under the top discard first
    /// when the draw pile is empty.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Card, GameError> {
        if self.draw_pile.is_empty() {
            self.recycle_discard(rng);
        }
        self.draw_pile.pop().ok_or(GameError::DeckExhausted)
    }

    fn recycle_discard<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let Some(top) = self.discard.pop() else {
            return;
        };
        self.draw_pile = self.discard.drain(..).map(Card::unresolved).collect();
        self.draw_pile.shuffle(rng);
        self.discard.push(top);
    }

    #[cfg(test)]
    pub(crate) fn all_cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.draw_pile.iter().chain(self.discard.iter()).copied()
    }
}
