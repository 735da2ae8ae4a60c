use super::{broadcaster::RoomBroadcaster, room::Room};
use crate::game::{Card, Color, GameError, PlayOutcome, PlayerId, Value};
use crate::messages::{ErrorCode, Outbound, PlayerEvent, RoomCommand, ServerToClient};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

pub struct RoomHandlers;

impl RoomHandlers {
    pub fn handle_join(
        room: &mut Room,
        broadcaster: &mut RoomBroadcaster,
        player_id: PlayerId,
        nickname: String,
        outbound: mpsc::UnboundedSender<Outbound>,
        reply: oneshot::Sender<Result<(), ErrorCode>>,
    ) {
        if let Err(code) = room.add_participant(player_id, nickname.clone()) {
            let _ = reply.send(Err(code));
            return;
        }
        broadcaster.add_player(player_id, outbound);
        broadcaster.broadcast(ServerToClient::player(&nickname, PlayerEvent::Joined));
        // The joiner's confirmation must queue behind the JOINED line.
        let _ = reply.send(Ok(()));
        debug!("Player {} joined room {}", player_id, room.id);
    }

    pub fn handle_leave(room: &mut Room, broadcaster: &mut RoomBroadcaster, player_id: PlayerId) {
        broadcaster.remove_player(player_id);
        if let Some(nickname) = room.remove_participant(player_id) {
            broadcaster.broadcast(ServerToClient::player(&nickname, PlayerEvent::Left));
            debug!("Player {} left room {}", player_id, room.id);
        }
    }

    pub fn handle_command(
        room: &mut Room,
        broadcaster: &mut RoomBroadcaster,
        player_id: PlayerId,
        command: RoomCommand,
    ) {
        if !room.is_participant(player_id) {
            debug!(
                "Dropping {:?} from non-participant {} in room {}",
                command, player_id, room.id
            );
            return;
        }

        if command == RoomCommand::Ready {
            Self::handle_ready(room, broadcaster, player_id);
            return;
        }

        let Some(current) = room.game().map(|game| game.current_player()) else {
            broadcaster.send_to(player_id, ServerToClient::error(ErrorCode::WaitForGame));
            return;
        };

        match command {
            RoomCommand::Uno => Self::handle_uno(room, broadcaster, player_id),
            RoomCommand::Hand => {
                let cards = room
                    .game()
                    .and_then(|game| game.hand(player_id))
                    .map(<[Card]>::to_vec)
                    .unwrap_or_default();
                broadcaster.send_to(player_id, ServerToClient::Hand(cards));
            }
            _ if current != player_id => {
                broadcaster.send_to(player_id, ServerToClient::error(GameError::NotYourTurn));
            }
            RoomCommand::Draw => Self::handle_draw(room, broadcaster, player_id),
            RoomCommand::Play { color, value } => {
                Self::handle_play(room, broadcaster, player_id, &color, &value)
            }
            RoomCommand::Wild { value, chosen } => {
                Self::handle_wild(room, broadcaster, player_id, &value, &chosen)
            }
            RoomCommand::Ready => {}
        }
    }

    fn handle_ready(room: &mut Room, broadcaster: &mut RoomBroadcaster, player_id: PlayerId) {
        if !room.mark_ready(player_id) {
            return;
        }
        broadcaster.broadcast(ServerToClient::player(
            room.nickname(player_id),
            PlayerEvent::Ready,
        ));

        if !room.can_start() {
            return;
        }
        let started = room
            .start_game()
            .map(|game| (game.players().len(), game.top_card()));
        match started {
            Ok((players, top)) => {
                info!("Room {} started a game with {} players", room.id, players);
                broadcaster.broadcast(ServerToClient::GameStarted);
                if let Some(top) = top {
                    broadcaster.broadcast(ServerToClient::TopCard(top));
                }
                Self::notify_turn(room, broadcaster);
            }
            Err(e) => Self::abort_game(room, broadcaster, e),
        }
    }

    fn handle_uno(room: &mut Room, broadcaster: &mut RoomBroadcaster, player_id: PlayerId) {
        let called = room
            .game_mut()
            .is_some_and(|game| game.call_uno(player_id));
        if called {
            broadcaster.broadcast(ServerToClient::player(
                room.nickname(player_id),
                PlayerEvent::Uno,
            ));
        } else {
            broadcaster.send_to(player_id, ServerToClient::error(ErrorCode::NoUno));
        }
    }

    fn handle_draw(room: &mut Room, broadcaster: &mut RoomBroadcaster, player_id: PlayerId) {
        let Some(game) = room.game_mut() else {
            return;
        };
        match game.draw_card(player_id) {
            Ok(()) => {
                broadcaster.broadcast(ServerToClient::player(
                    room.nickname(player_id),
                    PlayerEvent::Draw,
                ));
                Self::broadcast_table(room, broadcaster);
            }
            Err(e) => Self::reject(room, broadcaster, player_id, e),
        }
    }

    fn handle_play(
        room: &mut Room,
        broadcaster: &mut RoomBroadcaster,
        player_id: PlayerId,
        color: &str,
        value: &str,
    ) {
        let card = match (color.parse::<Color>(), value.parse::<Value>()) {
            (Ok(color), Ok(value)) => Card::new(color, value),
            _ => {
                Self::reject(room, broadcaster, player_id, GameError::CardNotInHand);
                return;
            }
        };
        Self::play(room, broadcaster, player_id, card, None, PlayerEvent::Played(card));
    }

    fn handle_wild(
        room: &mut Room,
        broadcaster: &mut RoomBroadcaster,
        player_id: PlayerId,
        value: &str,
        chosen: &str,
    ) {
        let value = match value.parse::<Value>() {
            Ok(value) if value.is_wild_value() => value,
            _ => {
                Self::reject(room, broadcaster, player_id, GameError::CardNotInHand);
                return;
            }
        };
        let chosen = chosen.parse::<Color>().ok();
        let event = PlayerEvent::Wild {
            value,
            chosen: chosen.unwrap_or(Color::Wild),
        };
        Self::play(room, broadcaster, player_id, Card::wild(value), chosen, event);
    }

    fn play(
        room: &mut Room,
        broadcaster: &mut RoomBroadcaster,
        player_id: PlayerId,
        card: Card,
        chosen: Option<Color>,
        event: PlayerEvent,
    ) {
        let Some(game) = room.game_mut() else {
            return;
        };
        let outcome = match game.play_card(player_id, card, chosen) {
            Ok(outcome) => outcome,
            Err(e) => {
                Self::reject(room, broadcaster, player_id, e);
                return;
            }
        };

        let nickname = room.nickname(player_id).to_string();
        match outcome {
            PlayOutcome::Win => {
                info!("Player {} ({}) won in room {}", nickname, player_id, room.id);
                broadcaster.broadcast(ServerToClient::player(&nickname, PlayerEvent::Win));
                broadcaster.close_all(ServerToClient::GameOver);
                room.finish();
            }
            PlayOutcome::UnoWarning | PlayOutcome::Ok => {
                if outcome == PlayOutcome::UnoWarning {
                    broadcaster
                        .broadcast(ServerToClient::player(&nickname, PlayerEvent::UnoWarning));
                }
                broadcaster.broadcast(ServerToClient::player(&nickname, event));
                Self::broadcast_table(room, broadcaster);
            }
        }
    }

    /// New top card, then the turn notification.
    fn broadcast_table(room: &mut Room, broadcaster: &mut RoomBroadcaster) {
        if let Some(top) = room.game().and_then(|game| game.top_card()) {
            broadcaster.broadcast(ServerToClient::TopCard(top));
        }
        Self::notify_turn(room, broadcaster);
    }

    fn notify_turn(room: &mut Room, broadcaster: &mut RoomBroadcaster) {
        if let Some(current) = room.take_turn_notification() {
            broadcaster.send_to(current, ServerToClient::YourTurn);
        }
    }

    fn reject(room: &mut Room, broadcaster: &mut RoomBroadcaster, player_id: PlayerId, e: GameError) {
        if e.is_fatal() {
            Self::abort_game(room, broadcaster, e);
        } else {
            broadcaster.send_to(player_id, ServerToClient::error(e));
        }
    }

    /// The engine lost track of its cards; end this room only.
    fn abort_game(room: &mut Room, broadcaster: &mut RoomBroadcaster, e: GameError) {
        error!("Room {} aborted: {}", room.id, e);
        broadcaster.broadcast(ServerToClient::error(e));
        broadcaster.close_all(ServerToClient::GameOver);
        room.finish();
    }
}
