mod msg_client_to_server;
mod msg_coordinator;
mod msg_server_to_client;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

pub use self::msg_client_to_server::*;
pub use self::msg_coordinator::*;
pub use self::msg_server_to_client::*;

/// Items queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Line(String),
    /// Flush what is queued and close the connection
    Close,
}

impl Outbound {
    pub fn line(event: &ServerToClient) -> Self {
        Self::Line(event.to_line())
    }
}

#[derive(Debug)]
pub enum RoomMessage {
    Join {
        participant: Uuid,
        nickname: String,
        outbound: mpsc::UnboundedSender<Outbound>,
        reply: oneshot::Sender<Result<(), ErrorCode>>,
    },
    Leave {
        participant: Uuid,
    },
    Command {
        participant: Uuid,
        command: RoomCommand,
    },
}

impl RoomMessage {
    pub fn command(participant: Uuid, command: RoomCommand) -> Self {
        Self::Command {
            participant,
            command,
        }
    }

    pub fn leave(participant: Uuid) -> Self {
        Self::Leave { participant }
    }
}
