use crate::messages::{
    ClientToServer, CoordinatorMessage, ErrorCode, Outbound, RoomMessage, ServerToClient,
};
use crate::room::{RoomHandle, RoomId};
use anyhow::Context;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use uuid::Uuid;

const USAGE_NICK: &str = "nick <name>";
const USAGE_ROOMS: &str = "create | join <id> | list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Per-connection session state.
#[derive(Debug)]
pub struct Client {
    pub id: Uuid,
    pub nickname: Option<String>,
    pub room: Option<RoomHandle>,
    coordinator_channel: mpsc::UnboundedSender<CoordinatorMessage>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Client {
    pub fn new(
        coordinator_channel: mpsc::UnboundedSender<CoordinatorMessage>,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            nickname: None,
            room: None,
            coordinator_channel,
            outbound,
        }
    }

    fn reply(&self, event: ServerToClient) {
        let _ = self.outbound.send(Outbound::line(&event));
    }

    async fn ask<T>(
        &self,
        request: impl FnOnce(oneshot::Sender<T>) -> CoordinatorMessage,
    ) -> anyhow::Result<T> {
        let (tx, rx) = oneshot::channel();
        self.coordinator_channel
            .send(request(tx))
            .context("room coordinator is gone")?;
        rx.await.context("room coordinator dropped the request")
    }

    /// Join handshake. On success the room has already queued the JOINED
    /// broadcast on this connection.
    async fn enter(&mut self, handle: RoomHandle) -> Result<(), ErrorCode> {
        let (reply, reply_rx) = oneshot::channel();
        let join = RoomMessage::Join {
            participant: self.id,
            nickname: self.nickname.clone().unwrap_or_default(),
            outbound: self.outbound.clone(),
            reply,
        };
        if handle.send(join).is_err() {
            return Err(ErrorCode::RoomNotFound);
        }
        match reply_rx.await {
            Ok(Ok(())) => {
                info!("Client {} entered room {}", self.id, handle.id);
                self.room = Some(handle);
                Ok(())
            }
            Ok(Err(code)) => Err(code),
            Err(_) => Err(ErrorCode::RoomNotFound),
        }
    }

    fn leave_room(&mut self) {
        if let Some(room) = self.room.take() {
            let _ = room.send(RoomMessage::leave(self.id));
        }
    }
}

/// Drives one connection: greeting, then one command per line until the
/// peer goes away, asks to quit, or the room closes the connection.
pub async fn handle_client<R, W>(
    socket_reader: R,
    socket_writer: W,
    addr: SocketAddr,
    coordinator_tx: mpsc::UnboundedSender<CoordinatorMessage>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (writer_tx, writer_rx) = mpsc::unbounded_channel::<Outbound>();
    let mut client = Client::new(coordinator_tx, writer_tx.clone());

    info!("Client {} connected from {}", client.id, addr);

    client.reply(ServerToClient::Welcome);
    client.reply(ServerToClient::Usage(USAGE_NICK));
    client.reply(ServerToClient::Usage(USAGE_ROOMS));

    let mut write_task = tokio::spawn(handle_client_writer(socket_writer, writer_rx));

    let mut reader = BufReader::new(socket_reader);
    let mut line = String::new();

    loop {
        line.clear();
        tokio::select! {
            read = reader.read_line(&mut line) => match read {
                Ok(0) => {
                    info!("Client {} disconnected", client.id);
                    break;
                }
                Ok(_) => match handle_line(&mut client, line.trim()).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => {
                        info!("Client {} quit", client.id);
                        break;
                    }
                    Err(e) => error!("Error handling line for client {}: {:#}", client.id, e),
                },
                Err(e) => {
                    error!("Client {} read error: {}", addr, e);
                    break;
                }
            },
            _ = &mut write_task => {
                debug!("Client {} writer closed", client.id);
                break;
            }
        }
    }

    client.leave_room();
    // Flush whatever is queued, then shut the socket down.
    let _ = writer_tx.send(Outbound::Close);

    debug!("Client {} cleanup complete", client.id);
}

async fn handle_client_writer<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Outbound>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(item) = rx.recv().await {
        match item {
            Outbound::Line(line) => {
                let line_with_newline = format!("{}\n", line);
                if let Err(e) = writer.write_all(line_with_newline.as_bytes()).await {
                    error!("Failed to write to client: {}", e);
                    break;
                }
            }
            Outbound::Close => break,
        }
    }
    let _ = writer.shutdown().await;
}

async fn handle_line(client: &mut Client, line: &str) -> anyhow::Result<Flow> {
    let Some(keyword) = ClientToServer::keyword(line) else {
        return Ok(Flow::Continue);
    };
    if client.nickname.is_none() && !matches!(keyword.as_str(), "nick" | "quit" | "exit") {
        client.reply(ServerToClient::error(ErrorCode::SetNickFirst));
        return Ok(Flow::Continue);
    }

    let action = match ClientToServer::parse(line) {
        Ok(action) => action,
        Err(code) => {
            client.reply(ServerToClient::error(code));
            return Ok(Flow::Continue);
        }
    };

    match action {
        ClientToServer::Nick { nickname } => {
            debug!("Client {} is now {}", client.id, nickname);
            client.reply(ServerToClient::NickOk {
                nickname: nickname.clone(),
            });
            client.nickname = Some(nickname);
        }
        ClientToServer::Create => {
            if client.room.is_some() {
                client.reply(ServerToClient::error(ErrorCode::AlreadyInRoom));
                return Ok(Flow::Continue);
            }
            let created = client
                .ask(|reply| CoordinatorMessage::CreateRoom { reply })
                .await?;
            let Some(handle) = created else {
                client.reply(ServerToClient::error(ErrorCode::NoRoomIds));
                return Ok(Flow::Continue);
            };
            let room_id = handle.id;
            match client.enter(handle).await {
                Ok(()) => client.reply(ServerToClient::RoomCreated { room_id }),
                Err(code) => client.reply(ServerToClient::error(code)),
            }
        }
        ClientToServer::Join { room_id } => {
            if client.room.is_some() {
                client.reply(ServerToClient::error(ErrorCode::AlreadyInRoom));
                return Ok(Flow::Continue);
            }
            let Ok(room_id) = room_id.parse::<RoomId>() else {
                client.reply(ServerToClient::error(ErrorCode::InvalidRoomId));
                return Ok(Flow::Continue);
            };
            let found = client
                .ask(|reply| CoordinatorMessage::FindRoom { room_id, reply })
                .await?;
            let Some(handle) = found else {
                client.reply(ServerToClient::error(ErrorCode::RoomNotFound));
                return Ok(Flow::Continue);
            };
            match client.enter(handle).await {
                Ok(()) => client.reply(ServerToClient::RoomJoined { room_id }),
                Err(code) => client.reply(ServerToClient::error(code)),
            }
        }
        ClientToServer::List => {
            let rooms = client
                .ask(|reply| CoordinatorMessage::ListRooms { reply })
                .await?;
            if rooms.is_empty() {
                client.reply(ServerToClient::NoRooms);
            }
            for summary in rooms {
                client.reply(ServerToClient::RoomInfo {
                    room_id: summary.room_id,
                    players: summary.players,
                });
            }
        }
        ClientToServer::Quit => return Ok(Flow::Quit),
        ClientToServer::Room(command) => {
            let delivered = client
                .room
                .as_ref()
                .is_some_and(|room| room.send(RoomMessage::command(client.id, command)).is_ok());
            if !delivered {
                // The room task is gone once its session ended.
                client.room = None;
                client.reply(ServerToClient::error(ErrorCode::NotInRoom));
            }
        }
    }
    Ok(Flow::Continue)
}
