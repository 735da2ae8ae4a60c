use crate::game::{Game, GameError, PlayerId};
use crate::messages::ErrorCode;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

pub type RoomId = u32;

/// Room facts the registry reads without going through the room's mailbox.
#[derive(Debug)]
pub struct RoomStatus {
    running: AtomicBool,
    player_count: AtomicUsize,
}

impl RoomStatus {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            player_count: AtomicUsize::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Acquire)
    }

    /// Stopped and empty: nothing can ever happen in this room again.
    pub fn is_collectable(&self) -> bool {
        !self.is_running() && self.player_count() == 0
    }
}

/// State of one room. Only the room's own task touches it.
#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    participants: Vec<PlayerId>,
    nicknames: HashMap<PlayerId, String>,
    ready: HashSet<PlayerId>,
    game: Option<Game>,
    last_turn: Option<PlayerId>,
    max_players: usize,
    status: Arc<RoomStatus>,
}

impl Room {
    pub fn new(id: RoomId, max_players: usize, status: Arc<RoomStatus>) -> Self {
        Self {
            id,
            participants: Vec::new(),
            nicknames: HashMap::new(),
            ready: HashSet::new(),
            game: None,
            last_turn: None,
            max_players,
            status,
        }
    }

    #[cfg(test)]
    pub fn participants(&self) -> &[PlayerId] {
        &self.participants
    }

    pub fn is_participant(&self, player_id: PlayerId) -> bool {
        self.participants.contains(&player_id)
    }

    pub fn nickname(&self, player_id: PlayerId) -> &str {
        self.nicknames.get(&player_id).map_or("?", String::as_str)
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    pub fn add_participant(&mut self, player_id: PlayerId, nickname: String) -> Result<(), ErrorCode> {
        if !self.is_running() || self.game.is_some() {
            return Err(ErrorCode::GameInProgress);
        }
        if self.participants.len() >= self.max_players {
            return Err(ErrorCode::RoomFull);
        }
        self.participants.push(player_id);
        self.nicknames.insert(player_id, nickname);
        self.sync_status();
        Ok(())
    }

    /// Removes the participant and returns the nickname they joined with.
    /// An in-progress game keeps its turn order untouched.
    pub fn remove_participant(&mut self, player_id: PlayerId) -> Option<String> {
        let index = self.participants.iter().position(|p| *p == player_id)?;
        self.participants.remove(index);
        self.ready.remove(&player_id);
        let nickname = self.nicknames.remove(&player_id);

        // Nobody can rejoin a started game, so an empty one is dead.
        if self.participants.is_empty() && self.game.is_some() {
            debug!("Room {} abandoned mid-game", self.id);
            self.status.running.store(false, Ordering::Release);
        }
        self.sync_status();
        nickname
    }

    /// Returns false if the participant was already ready.
    pub fn mark_ready(&mut self, player_id: PlayerId) -> bool {
        self.ready.insert(player_id)
    }

    pub fn can_start(&self) -> bool {
        self.game.is_none()
            && self.participants.len() >= 2
            && self.participants.iter().all(|p| self.ready.contains(p))
    }

    pub fn start_game(&mut self) -> Result<&Game, GameError> {
        let game = Game::new(self.participants.clone())?;
        self.ready.clear();
        Ok(&*self.game.insert(game))
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut Game> {
        self.game.as_mut()
    }

    /// The current player, if they have not been told it is their turn yet.
    pub fn take_turn_notification(&mut self) -> Option<PlayerId> {
        let current = self.game.as_ref()?.current_player();
        if self.last_turn == Some(current) {
            return None;
        }
        self.last_turn = Some(current);
        Some(current)
    }

    /// Terminal transition: the session is over and everyone is gone.
    pub fn finish(&mut self) {
        self.status.running.store(false, Ordering::Release);
        self.participants.clear();
        self.nicknames.clear();
        self.ready.clear();
        self.sync_status();
    }

    fn sync_status(&self) {
        self.status
            .player_count
            .store(self.participants.len(), Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn install_game(&mut self, game: Game) {
        self.game = Some(game);
    }
}
