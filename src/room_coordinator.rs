use crate::messages::{CoordinatorMessage, RoomSummary};
use crate::room::{RoomHandle, RoomId};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Hands out room ids from 1 upwards. Ids are never reused, so the counter
/// stops at `RoomId::MAX` instead of wrapping onto a live room.
struct RoomIds {
    next: Option<RoomId>,
}

impl RoomIds {
    fn new() -> Self {
        Self { next: Some(1) }
    }

    fn allocate(&mut self) -> Option<RoomId> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(id)
    }
}

/// Registry of live rooms. Owns the id counter and the id → room map; never
/// waits on a room, so one busy room cannot stall lookups for the others.
pub async fn room_coordinator(
    mut rx: mpsc::UnboundedReceiver<CoordinatorMessage>,
    max_players_per_room: usize,
) {
    let mut rooms: BTreeMap<RoomId, RoomHandle> = BTreeMap::new();
    let mut room_ids = RoomIds::new();

    info!("Room coordinator started");

    while let Some(msg) = rx.recv().await {
        match msg {
            CoordinatorMessage::CreateRoom { reply } => {
                let Some(room_id) = room_ids.allocate() else {
                    warn!("Room ids exhausted, refusing to create a room");
                    let _ = reply.send(None);
                    continue;
                };

                let handle = RoomHandle::spawn(room_id, max_players_per_room);
                rooms.insert(room_id, handle.clone());
                info!("Room {} created", room_id);

                let _ = reply.send(Some(handle));
            }
            CoordinatorMessage::FindRoom { room_id, reply } => {
                let _ = reply.send(rooms.get(&room_id).cloned());
            }
            CoordinatorMessage::ListRooms { reply } => {
                let summaries = rooms
                    .values()
                    .map(|handle| RoomSummary {
                        room_id: handle.id,
                        players: handle.status().player_count(),
                    })
                    .collect();
                let _ = reply.send(summaries);
            }
            CoordinatorMessage::Sweep => {
                rooms.retain(|room_id, handle| {
                    let collect = handle.status().is_collectable();
                    if collect {
                        info!("Room {} removed", room_id);
                    }
                    !collect
                });
                debug!("Sweep done, {} rooms live", rooms.len());
            }
        }
    }
}

/// Periodically asks the coordinator to drop finished, empty rooms.
pub fn spawn_sweeper(
    coordinator_tx: mpsc::UnboundedSender<CoordinatorMessage>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if coordinator_tx.send(CoordinatorMessage::Sweep).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Outbound, RoomCommand, RoomMessage};
    use tokio::sync::oneshot;
    use uuid::Uuid;

    fn start() -> mpsc::UnboundedSender<CoordinatorMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(room_coordinator(rx, 4));
        tx
    }

    async fn create(tx: &mpsc::UnboundedSender<CoordinatorMessage>) -> RoomHandle {
        let (reply, rx) = oneshot::channel();
        tx.send(CoordinatorMessage::CreateRoom { reply }).unwrap();
        rx.await.unwrap().unwrap()
    }

    async fn list(tx: &mpsc::UnboundedSender<CoordinatorMessage>) -> Vec<RoomSummary> {
        let (reply, rx) = oneshot::channel();
        tx.send(CoordinatorMessage::ListRooms { reply }).unwrap();
        rx.await.unwrap()
    }

    async fn find(tx: &mpsc::UnboundedSender<CoordinatorMessage>, room_id: RoomId) -> Option<RoomHandle> {
        let (reply, rx) = oneshot::channel();
        tx.send(CoordinatorMessage::FindRoom { room_id, reply }).unwrap();
        rx.await.unwrap()
    }

    async fn join(handle: &RoomHandle, nickname: &str) -> (Uuid, mpsc::UnboundedReceiver<Outbound>) {
        let id = Uuid::new_v4();
        let (outbound, rx) = mpsc::unbounded_channel();
        let (reply, reply_rx) = oneshot::channel();
        handle
            .send(RoomMessage::Join {
                participant: id,
                nickname: nickname.into(),
                outbound,
                reply,
            })
            .unwrap();
        reply_rx.await.unwrap().unwrap();
        (id, rx)
    }

    #[tokio::test]
    async fn ids_count_up_and_rooms_are_listed_in_order() {
        let tx = start();
        assert!(list(&tx).await.is_empty());

        let first = create(&tx).await;
        let second = create(&tx).await;
        assert_eq!((first.id, second.id), (1, 2));

        let _ana = join(&second, "ana").await;
        assert_eq!(
            list(&tx).await,
            vec![
                RoomSummary { room_id: 1, players: 0 },
                RoomSummary { room_id: 2, players: 1 },
            ]
        );
        assert!(find(&tx, 2).await.is_some());
        assert!(find(&tx, 9).await.is_none());
    }

    #[tokio::test]
    async fn sweep_only_removes_stopped_empty_rooms() {
        let tx = start();
        let lobby = create(&tx).await;
        let abandoned = create(&tx).await;

        let (a, _a_rx) = join(&abandoned, "ana").await;
        let (b, _b_rx) = join(&abandoned, "bia").await;
        abandoned.send(RoomMessage::command(a, RoomCommand::Ready)).unwrap();
        abandoned.send(RoomMessage::command(b, RoomCommand::Ready)).unwrap();
        abandoned.send(RoomMessage::leave(a)).unwrap();
        abandoned.send(RoomMessage::leave(b)).unwrap();

        // The room applies these on its own task.
        for _ in 0..100 {
            if abandoned.status().is_collectable() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(abandoned.status().is_collectable());

        tx.send(CoordinatorMessage::Sweep).unwrap();
        assert!(find(&tx, abandoned.id).await.is_none());
        assert!(find(&tx, lobby.id).await.is_some());
    }

    #[test]
    fn room_ids_stop_at_the_last_one() {
        let mut ids = RoomIds::new();
        assert_eq!(ids.allocate(), Some(1));
        assert_eq!(ids.allocate(), Some(2));

        ids.next = Some(RoomId::MAX);
        assert_eq!(ids.allocate(), Some(RoomId::MAX));
        assert_eq!(ids.allocate(), None);
        assert_eq!(ids.allocate(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_ticks_on_the_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sweeper = spawn_sweeper(tx, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(25)).await;
        let mut sweeps = 0;
        while let Ok(CoordinatorMessage::Sweep) = rx.try_recv() {
            sweeps += 1;
        }
        assert_eq!(sweeps, 2);
        sweeper.abort();
    }
}
