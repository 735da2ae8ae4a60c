use super::card::{Card, Color, Value};
use super::deck::Deck;
use super::error::GameError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

pub type PlayerId = Uuid;

pub const HAND_SIZE: usize = 7;
pub const MIN_PLAYERS: usize = 2;
const DRAW2_PENALTY: usize = 2;
const DRAW4_PENALTY: usize = 4;
const MISSED_UNO_PENALTY: usize = 2;

/// Result of a successful play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Ok,
    /// The player is down to one card and has not called it yet.
    UnoWarning,
    Win,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingUno {
    player: PlayerId,
    turn: usize,
}

/// Turn-based game state for one room. Not synchronised: the owning room
/// serialises every call.
#[derive(Debug)]
pub struct Game {
    players: Vec<PlayerId>,
    hands: HashMap<PlayerId, Vec<Card>>,
    turn: usize,
    direction: isize,
    deck: Deck,
    pending_uno: Option<PendingUno>,
    winner: Option<PlayerId>,
    rng: StdRng,
}

impl Game {
    pub fn new(players: Vec<PlayerId>) -> Result<Self, GameError> {
        Self::with_rng(players, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_seed(players: Vec<PlayerId>, seed: u64) -> Result<Self, GameError> {
        Self::with_rng(players, StdRng::seed_from_u64(seed))
    }

    fn with_rng(players: Vec<PlayerId>, mut rng: StdRng) -> Result<Self, GameError> {
        if players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers(MIN_PLAYERS));
        }

        let deck = Deck::shuffled(&mut rng);
        let hands = players.iter().map(|&p| (p, Vec::new())).collect();
        let mut game = Self {
            players,
            hands,
            turn: 0,
            direction: 1,
            deck,
            pending_uno: None,
            winner: None,
            rng,
        };
        game.deal()?;
        Ok(game)
    }

    fn deal(&mut self) -> Result<(), GameError> {
        for _ in 0..HAND_SIZE {
            for i in 0..self.players.len() {
                let player = self.players[i];
                self.give(player, 1)?;
            }
        }

        // Wilds found while looking for the opening card go back under the pile.
        for _ in 0..=self.deck.draw_pile_len() {
            let card = self.deck.draw(&mut self.rng)?;
            if card.is_wild() {
                self.deck.put_under(card);
            } else {
                self.deck.discard(card);
                return Ok(());
            }
        }
        Err(GameError::DeckExhausted)
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn current_player(&self) -> PlayerId {
        self.players[self.turn]
    }

    pub fn top_card(&self) -> Option<Card> {
        self.deck.top_card().copied()
    }

    pub fn hand(&self, player: PlayerId) -> Option<&[Card]> {
        self.hands.get(&player).map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn is_valid_play(&self, card: &Card) -> bool {
        self.deck
            .top_card()
            .is_some_and(|top| card.is_playable_on(top))
    }

    pub fn play_card(
        &mut self,
        player: PlayerId,
        card: Card,
        chosen_color: Option<Color>,
    ) -> Result<PlayOutcome, GameError> {
        self.ensure_running()?;
        if player != self.current_player() {
            return Err(GameError::NotYourTurn);
        }
        let position = self
            .hands
            .get(&player)
            .and_then(|hand| hand.iter().position(|c| *c == card))
            .ok_or(GameError::CardNotInHand)?;
        if !self.is_valid_play(&card) {
            return Err(GameError::InvalidCard);
        }
        let chosen_color = match chosen_color {
            Some(color) if color != Color::Wild => Some(color),
            _ if card.is_wild() => return Err(GameError::ColorRequired),
            _ => None,
        };

        if let Some(hand) = self.hands.get_mut(&player) {
            hand.swap_remove(position);
        }

        match (card.is_wild(), chosen_color) {
            (true, Some(color)) => {
                self.deck.discard(Card::new(color, card.value));
                if card.value == Value::Draw4 {
                    self.force_draw_on_next(DRAW4_PENALTY)?;
                }
                self.check_uno_timeout()?;
                self.next_turn(1);
            }
            _ => {
                self.deck.discard(card);
                match card.value {
                    Value::Skip => {
                        self.check_uno_timeout()?;
                        self.next_turn(2);
                    }
                    Value::Reverse if self.players.len() == 2 => {
                        self.check_uno_timeout()?;
                        self.next_turn(2);
                    }
                    Value::Reverse => {
                        self.direction = -self.direction;
                        self.check_uno_timeout()?;
                        self.next_turn(1);
                    }
                    Value::Draw2 => {
                        self.force_draw_on_next(DRAW2_PENALTY)?;
                        self.check_uno_timeout()?;
                        self.next_turn(1);
                    }
                    _ => {
                        self.check_uno_timeout()?;
                        self.next_turn(1);
                    }
                }
            }
        }

        let remaining = self.hands.get(&player).map_or(0, Vec::len);
        if remaining == 1 {
            self.pending_uno = Some(PendingUno {
                player,
                turn: self.turn,
            });
            return Ok(PlayOutcome::UnoWarning);
        }
        if remaining == 0 {
            self.winner = Some(player);
            return Ok(PlayOutcome::Win);
        }
        Ok(PlayOutcome::Ok)
    }

    pub fn draw_card(&mut self, player: PlayerId) -> Result<(), GameError> {
        self.ensure_running()?;
        if player != self.current_player() {
            return Err(GameError::NotYourTurn);
        }
        self.give(player, 1)?;
        self.check_uno_timeout()?;
        self.next_turn(1);
        Ok(())
    }

    /// Clears the pending penalty, but only for the player it names.
    pub fn call_uno(&mut self, player: PlayerId) -> bool {
        match self.pending_uno {
            Some(pending) if pending.player == player => {
                self.pending_uno = None;
                true
            }
            _ => false,
        }
    }

    fn ensure_running(&self) -> Result<(), GameError> {
        match self.winner {
            Some(_) => Err(GameError::GameOver),
            None => Ok(()),
        }
    }

    fn next_turn(&mut self, step: isize) {
        let len = self.players.len() as isize;
        self.turn = (self.turn as isize + step * self.direction).rem_euclid(len) as usize;
    }

    fn force_draw_on_next(&mut self, count: usize) -> Result<(), GameError> {
        self.next_turn(1);
        let target = self.current_player();
        self.give(target, count)
    }

    /// Penalises a pending UNO once the turn has moved off the recorded index.
    fn check_uno_timeout(&mut self) -> Result<Option<PlayerId>, GameError> {
        match self.pending_uno {
            Some(pending) if pending.turn != self.turn => {
                self.give(pending.player, MISSED_UNO_PENALTY)?;
                self.pending_uno = None;
                debug!("Player {} missed their UNO call", pending.player);
                Ok(Some(pending.player))
            }
            _ => Ok(None),
        }
    }

    fn give(&mut self, player: PlayerId, count: usize) -> Result<(), GameError> {
        for _ in 0..count {
            let card = self.deck.draw(&mut self.rng)?;
            self.hands.entry(player).or_default().push(card);
        }
        Ok(())
    }

    /// Builds a game from explicit hands and piles, bypassing the deal.
    #[cfg(test)]
    pub(crate) fn rigged(
        players: Vec<PlayerId>,
        hands: Vec<Vec<Card>>,
        draw_pile: Vec<Card>,
        discard: Vec<Card>,
    ) -> Self {
        let hands = players.iter().copied().zip(hands).collect();
        Self {
            players,
            hands,
            turn: 0,
            direction: 1,
            deck: Deck::from_piles(draw_pile, discard),
            pending_uno: None,
            winner: None,
            rng: StdRng::seed_from_u64(0),
        }
    }

    #[cfg(test)]
    pub(crate) fn total_cards(&self) -> usize {
        self.deck.draw_pile_len()
            + self.deck.discard_len()
            + self.hands.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{FULL_DECK_SIZE, full_card_set};
    use rand::Rng;
    use rand::seq::IndexedRandom;
    use rstest::rstest;

    fn ids(n: usize) -> Vec<PlayerId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn card(color: Color, value: Value) -> Card {
        Card::new(color, value)
    }

    fn red(n: u8) -> Card {
        card(Color::Red, Value::Number(n))
    }

    fn blue(n: u8) -> Card {
        card(Color::Blue, Value::Number(n))
    }

    /// Filler so no draw in these tests ever recycles the discard pile.
    fn filler() -> Vec<Card> {
        (0..20).map(|i| card(Color::Yellow, Value::Number(i % 10))).collect()
    }

    fn sorted_tokens(cards: impl Iterator<Item = Card>) -> Vec<String> {
        let mut tokens: Vec<String> = cards.map(|c| c.unresolved().hand_token()).collect();
        tokens.sort();
        tokens
    }

    #[test]
    fn new_game_deals_seven_each_and_opens_on_colored_card() {
        for seed in 0..20 {
            let players = ids(4);
            let game = Game::with_seed(players.clone(), seed).unwrap();
            for p in &players {
                assert_eq!(game.hand(*p).unwrap().len(), HAND_SIZE);
            }
            let top = game.top_card().unwrap();
            assert!(!top.is_wild());
            assert_eq!(game.deck.discard_len(), 1);
            assert_eq!(game.deck.draw_pile_len(), FULL_DECK_SIZE - HAND_SIZE * 4 - 1);
            assert_eq!(game.current_player(), players[0]);
            assert_eq!(game.total_cards(), FULL_DECK_SIZE);
        }
    }

    #[test]
    fn game_needs_two_players() {
        assert!(matches!(
            Game::with_seed(ids(1), 3),
            Err(GameError::NotEnoughPlayers(2))
        ));
    }

    #[test]
    fn rule_violations_leave_state_untouched() {
        let p = ids(2);
        let mut game = Game::rigged(
            p.clone(),
            vec![
                vec![blue(2), Card::wild(Value::ChooseColor), red(1)],
                vec![red(3), red(4)],
            ],
            filler(),
            vec![red(7)],
        );

        assert_eq!(game.play_card(p[1], red(3), None), Err(GameError::NotYourTurn));
        assert_eq!(game.play_card(p[0], red(5), None), Err(GameError::CardNotInHand));
        assert_eq!(game.play_card(p[0], blue(2), None), Err(GameError::InvalidCard));
        assert_eq!(
            game.play_card(p[0], Card::wild(Value::ChooseColor), None),
            Err(GameError::ColorRequired)
        );
        assert_eq!(
            game.play_card(p[0], Card::wild(Value::ChooseColor), Some(Color::Wild)),
            Err(GameError::ColorRequired)
        );
        assert_eq!(game.draw_card(p[1]), Err(GameError::NotYourTurn));

        assert_eq!(game.hand(p[0]).unwrap().len(), 3);
        assert_eq!(game.current_player(), p[0]);
        assert_eq!(game.top_card(), Some(red(7)));
    }

    #[rstest]
    #[case::numeric(3, card(Color::Red, Value::Number(5)), 1)]
    #[case::skip(3, card(Color::Red, Value::Skip), 2)]
    #[case::reverse_two_players(2, card(Color::Red, Value::Reverse), 0)]
    #[case::reverse_three_players(3, card(Color::Red, Value::Reverse), 2)]
    #[case::draw2(3, card(Color::Red, Value::Draw2), 2)]
    #[case::draw4(3, Card::wild(Value::Draw4), 2)]
    #[case::wild_color(3, Card::wild(Value::ChooseColor), 1)]
    fn effects_move_the_turn(
        #[case] player_count: usize,
        #[case] played: Card,
        #[case] expected_next: usize,
    ) {
        let p = ids(player_count);
        let mut hands = vec![vec![played, red(1), red(2)]];
        hands.extend((1..player_count).map(|_| vec![blue(1), blue(2), blue(3)]));
        let mut game = Game::rigged(p.clone(), hands, filler(), vec![red(7)]);
        let chosen = played.is_wild().then_some(Color::Green);

        let outcome = game.play_card(p[0], played, chosen).unwrap();

        assert_eq!(outcome, PlayOutcome::Ok);
        assert_eq!(game.current_player(), p[expected_next]);
    }

    #[test]
    fn draw_cards_land_on_the_next_player() {
        let p = ids(3);
        let mut game = Game::rigged(
            p.clone(),
            vec![
                vec![Card::wild(Value::Draw4), red(1), red(2)],
                vec![blue(1)],
                vec![blue(2), card(Color::Green, Value::Draw2)],
            ],
            filler(),
            vec![red(7)],
        );

        game.play_card(p[0], Card::wild(Value::Draw4), Some(Color::Green))
            .unwrap();
        assert_eq!(game.hand(p[1]).unwrap().len(), 5);
        assert_eq!(game.top_card(), Some(card(Color::Green, Value::Draw4)));

        game.play_card(p[2], card(Color::Green, Value::Draw2), None)
            .unwrap();
        assert_eq!(game.hand(p[0]).unwrap().len(), 4);
        assert_eq!(game.current_player(), p[1]);
    }

    #[test]
    fn reverse_with_three_players_runs_backwards() {
        let p = ids(3);
        let mut game = Game::rigged(
            p.clone(),
            vec![
                vec![card(Color::Red, Value::Reverse), red(1), red(2)],
                vec![blue(1), blue(2)],
                vec![red(3), red(4), red(5)],
            ],
            filler(),
            vec![red(7)],
        );

        game.play_card(p[0], card(Color::Red, Value::Reverse), None)
            .unwrap();
        assert_eq!(game.current_player(), p[2]);
        game.play_card(p[2], red(3), None).unwrap();
        assert_eq!(game.current_player(), p[1]);
    }

    #[test]
    fn two_player_reverse_returns_to_the_reverser() {
        let p = ids(2);
        let mut game = Game::rigged(
            p.clone(),
            vec![
                vec![card(Color::Red, Value::Reverse), red(1), red(2)],
                vec![blue(1), blue(2)],
            ],
            filler(),
            vec![red(7)],
        );

        game.play_card(p[0], card(Color::Red, Value::Reverse), None)
            .unwrap();
        assert_eq!(game.current_player(), p[0]);
        game.play_card(p[0], red(1), None).unwrap();
        assert_eq!(game.current_player(), p[1]);
    }

    #[test]
    fn draw_card_takes_one_and_passes() {
        let p = ids(2);
        let mut game = Game::rigged(
            p.clone(),
            vec![vec![blue(1), blue(2)], vec![blue(3), blue(4)]],
            filler(),
            vec![red(7)],
        );

        game.draw_card(p[0]).unwrap();
        assert_eq!(game.hand(p[0]).unwrap().len(), 3);
        assert_eq!(game.current_player(), p[1]);
    }

    #[test]
    fn missed_uno_call_is_penalised_once_turn_moves_on() {
        let p = ids(2);
        let mut game = Game::rigged(
            p.clone(),
            vec![vec![red(1), red(2)], vec![red(3), red(4), blue(5)]],
            filler(),
            vec![red(7)],
        );

        assert_eq!(game.play_card(p[0], red(1), None), Ok(PlayOutcome::UnoWarning));
        assert_eq!(
            game.pending_uno,
            Some(PendingUno {
                player: p[0],
                turn: 1
            })
        );

        // Still inside the window: the turn sits on the recorded index.
        game.play_card(p[1], red(3), None).unwrap();
        assert!(game.pending_uno.is_some());
        assert_eq!(game.hand(p[0]).unwrap().len(), 1);

        // A's own next action moves off the recorded index.
        game.draw_card(p[0]).unwrap();
        assert!(game.pending_uno.is_none());
        assert_eq!(game.hand(p[0]).unwrap().len(), 1 + 1 + MISSED_UNO_PENALTY);
    }

    #[test]
    fn calling_uno_cancels_the_penalty() {
        let p = ids(2);
        let mut game = Game::rigged(
            p.clone(),
            vec![vec![red(1), red(2)], vec![red(3), red(4), blue(5)]],
            filler(),
            vec![red(7)],
        );

        game.play_card(p[0], red(1), None).unwrap();
        assert!(!game.call_uno(p[1]));
        assert!(game.call_uno(p[0]));
        assert!(!game.call_uno(p[0]));

        game.play_card(p[1], red(3), None).unwrap();
        game.draw_card(p[0]).unwrap();
        assert_eq!(game.hand(p[0]).unwrap().len(), 2);
    }

    #[test]
    fn draw2_on_a_pending_player_stacks_the_penalty() {
        let p = ids(2);
        let mut game = Game::rigged(
            p.clone(),
            vec![
                vec![red(1), red(2)],
                vec![card(Color::Red, Value::Draw2), red(4), blue(5)],
            ],
            filler(),
            vec![red(7)],
        );

        game.play_card(p[0], red(1), None).unwrap();
        game.play_card(p[1], card(Color::Red, Value::Draw2), None)
            .unwrap();

        assert_eq!(game.hand(p[0]).unwrap().len(), 1 + DRAW2_PENALTY + MISSED_UNO_PENALTY);
        assert!(game.pending_uno.is_none());
        assert_eq!(game.current_player(), p[1]);
    }

    #[test]
    fn last_card_wins_and_freezes_the_game() {
        let p = ids(2);
        let mut game = Game::rigged(
            p.clone(),
            vec![vec![red(1)], vec![blue(3), blue(4)]],
            filler(),
            vec![red(7)],
        );

        assert_eq!(game.play_card(p[0], red(1), None), Ok(PlayOutcome::Win));
        assert_eq!(game.winner(), Some(p[0]));
        assert_eq!(game.draw_card(p[1]), Err(GameError::GameOver));
        assert_eq!(game.play_card(p[1], blue(3), None), Err(GameError::GameOver));
    }

    #[test]
    fn random_play_conserves_the_card_set() {
        let full = sorted_tokens(full_card_set().into_iter());

        for seed in 0..10u64 {
            let players = ids(3);
            let mut game = Game::with_seed(players.clone(), seed).unwrap();
            let mut rng = StdRng::seed_from_u64(seed + 100);

            for _ in 0..400 {
                let current = game.current_player();
                let playable: Vec<Card> = game
                    .hand(current)
                    .unwrap()
                    .iter()
                    .copied()
                    .filter(|c| game.is_valid_play(c))
                    .collect();

                let result = match playable.choose(&mut rng) {
                    Some(&c) => {
                        let chosen = c.is_wild().then(|| *Color::PLAYABLE.choose(&mut rng).unwrap());
                        game.play_card(current, c, chosen).map(Some)
                    }
                    None => game.draw_card(current).map(|_| None),
                };

                if rng.random_bool(0.5) {
                    game.call_uno(current);
                }

                assert_eq!(game.total_cards(), FULL_DECK_SIZE);
                let seen = sorted_tokens(
                    game.deck
                        .all_cards()
                        .chain(game.hands.values().flatten().copied()),
                );
                assert_eq!(seen, full);

                match result {
                    Ok(Some(PlayOutcome::Win)) | Err(_) => break,
                    _ => {}
                }
            }
        }
    }
}
