use tokio::sync::oneshot;

use crate::room::{RoomHandle, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub players: usize,
}

#[derive(Debug)]
pub enum CoordinatorMessage {
    /// A client wants a fresh room; the reply carries its handle, or
    /// nothing once every room id has been handed out
    CreateRoom {
        reply: oneshot::Sender<Option<RoomHandle>>,
    },
    /// Look up an existing room by id
    FindRoom {
        room_id: RoomId,
        reply: oneshot::Sender<Option<RoomHandle>>,
    },
    ListRooms {
        reply: oneshot::Sender<Vec<RoomSummary>>,
    },
    /// Drop rooms that are stopped and empty
    Sweep,
}
