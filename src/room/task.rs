use super::{
    broadcaster::RoomBroadcaster,
    handlers::RoomHandlers,
    room::{Room, RoomId, RoomStatus},
};
use crate::messages::RoomMessage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Cheap, cloneable reference to a running room. The room task ends once
/// every handle has been dropped.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub id: RoomId,
    tx: mpsc::UnboundedSender<RoomMessage>,
    status: Arc<RoomStatus>,
}

impl RoomHandle {
    pub fn spawn(id: RoomId, max_players: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(RoomStatus::new());
        let room = Room::new(id, max_players, status.clone());
        tokio::spawn(room_task(room, rx));
        Self { id, tx, status }
    }

    pub fn send(
        &self,
        message: RoomMessage,
    ) -> Result<(), mpsc::error::SendError<RoomMessage>> {
        self.tx.send(message)
    }

    pub fn status(&self) -> &RoomStatus {
        &self.status
    }
}

/// Room actor: applies one message at a time, so every participant sees
/// effects in the order they were admitted.
pub async fn room_task(mut room: Room, mut rx: mpsc::UnboundedReceiver<RoomMessage>) {
    let mut broadcaster = RoomBroadcaster::new();

    info!("Room {} started", room.id);

    while let Some(msg) = rx.recv().await {
        dispatch(&mut room, &mut broadcaster, msg);
    }
    debug!("Room {} task ended", room.id);
}

pub fn dispatch(room: &mut Room, broadcaster: &mut RoomBroadcaster, msg: RoomMessage) {
    match msg {
        RoomMessage::Join {
            participant,
            nickname,
            outbound,
            reply,
        } => {
            RoomHandlers::handle_join(room, broadcaster, participant, nickname, outbound, reply);
        }
        RoomMessage::Leave { participant } => {
            RoomHandlers::handle_leave(room, broadcaster, participant);
        }
        RoomMessage::Command {
            participant,
            command,
        } => {
            debug!("Room {} <- {}: {:?}", room.id, participant, command);
            RoomHandlers::handle_command(room, broadcaster, participant, command);
        }
    }

    // Removing one dead connection broadcasts LEFT, which can surface another.
    loop {
        let dead = broadcaster.take_dead();
        if dead.is_empty() {
            break;
        }
        for participant in dead {
            warn!(
                "Dropping unreachable participant {} from room {}",
                participant, room.id
            );
            RoomHandlers::handle_leave(room, broadcaster, participant);
        }
    }
}
