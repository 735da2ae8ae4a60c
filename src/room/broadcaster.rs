use crate::game::PlayerId;
use crate::messages::{Outbound, ServerToClient};
use tokio::sync::mpsc;

/// Outbound channels of a room's participants, in join order.
///
/// Sends never block. A failed send means the connection's writer is gone;
/// the participant is remembered so the room can remove them once the
/// current command has finished.
pub struct RoomBroadcaster {
    player_senders: Vec<(PlayerId, mpsc::UnboundedSender<Outbound>)>,
    dead: Vec<PlayerId>,
}

impl RoomBroadcaster {
    pub fn new() -> Self {
        Self {
            player_senders: Vec::new(),
            dead: Vec::new(),
        }
    }

    pub fn add_player(&mut self, player_id: PlayerId, sender: mpsc::UnboundedSender<Outbound>) {
        self.player_senders.push((player_id, sender));
    }

    pub fn remove_player(&mut self, player_id: PlayerId) {
        self.player_senders.retain(|(id, _)| *id != player_id);
    }

    pub fn send_to(&mut self, player_id: PlayerId, response: ServerToClient) {
        let message = Outbound::line(&response);
        self.send_filtered(message, |id| id == player_id);
    }

    pub fn broadcast(&mut self, response: ServerToClient) {
        let message = Outbound::line(&response);
        self.send_filtered(message, |_| true);
    }

    /// Sends a final event to everyone, then closes every connection and
    /// forgets all senders.
    pub fn close_all(&mut self, last: ServerToClient) {
        let message = Outbound::line(&last);
        for (_, sender) in self.player_senders.drain(..) {
            let _ = sender.send(message.clone());
            let _ = sender.send(Outbound::Close);
        }
        self.dead.clear();
    }

    /// Participants whose connection failed since the last call.
    pub fn take_dead(&mut self) -> Vec<PlayerId> {
        std::mem::take(&mut self.dead)
    }

    fn send_filtered<F>(&mut self, message: Outbound, filter: F)
    where
        F: Fn(PlayerId) -> bool,
    {
        for (player_id, sender) in &self.player_senders {
            if filter(*player_id)
                && sender.send(message.clone()).is_err()
                && !self.dead.contains(player_id)
            {
                self.dead.push(*player_id);
            }
        }
    }
}
