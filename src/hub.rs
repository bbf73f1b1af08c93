//! C12: HTTP/WebSocket front door. Upgrades `/ws`, assigns a room, and runs
//! one read loop + one write loop per connection — splitting the socket the
//! same way the teacher's transport does (`futures::StreamExt`/`SinkExt`
//! over a split `WebSocket`), enriched with axum routing so `/health` can
//! live alongside `/ws` and with a bounded, drop-oldest-non-critical
//! outbound queue in place of the teacher's unbounded channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;

use crate::error::ConnectionError;
use crate::handlers;
use crate::message::{ClientMessage, Envelope, ServerMessage};
use crate::room_manager::RoomManager;

/// Bounded per-connection mailbox. Overflow policy: drop the oldest
/// non-critical message to make room; if every queued message is critical,
/// drop the oldest anyway rather than stall the tick driver (§4.12, §5).
pub struct OutboundQueue {
    inner: Mutex<VecDeque<ServerMessage>>,
    capacity: usize,
    notify: Notify,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
        })
    }

    pub fn push(&self, msg: ServerMessage, _now: u64) {
        let mut queue = self.inner.lock().expect("outbound queue lock poisoned");
        if queue.len() >= self.capacity {
            let drop_at = queue.iter().position(|m| !m.is_critical());
            match drop_at {
                Some(pos) => {
                    queue.remove(pos);
                }
                None => {
                    queue.pop_front();
                }
            }
        }
        queue.push_back(msg);
        drop(queue);
        self.notify.notify_one();
    }

    async fn recv(&self) -> ServerMessage {
        loop {
            if let Some(msg) = self.inner.lock().expect("outbound queue lock poisoned").pop_front() {
                return msg;
            }
            self.notify.notified().await;
        }
    }

    /// Test-only inspection hook so `room.rs`'s tests can assert on what a
    /// player's mailbox received without running a real write task.
    #[cfg(test)]
    pub(crate) fn drain(&self) -> Vec<ServerMessage> {
        self.inner.lock().expect("outbound queue lock poisoned").drain(..).collect()
    }
}

const OUTBOUND_QUEUE_CAPACITY: usize = 256;

pub fn build_router(room_manager: Arc<RoomManager>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_handler))
        .with_state(room_manager)
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn websocket_handler(ws: WebSocketUpgrade, State(room_manager): State<Arc<RoomManager>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, room_manager))
}

async fn handle_connection(socket: WebSocket, room_manager: Arc<RoomManager>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(room) = room_manager.assign_room() else {
        warn!("{}", ConnectionError::NoRoomAvailable);
        let _ = sender.send(Message::Close(None)).await;
        return;
    };

    let queue = OutboundQueue::new(OUTBOUND_QUEUE_CAPACITY);
    let player_name = format!("player-{}", short_id());
    let player_id = room.join(&player_name, queue.clone());
    room_manager.track_player(&player_id, room.clone());

    let idle_timeout = room_manager.idle_timeout();
    let clock = room_manager.clock();
    let write_task = tokio::spawn(async move {
        loop {
            let msg = queue.recv().await;
            let now = clock.now_ms();
            let bytes = msg.to_envelope_json(now);
            if sender.send(Message::Text(String::from_utf8_lossy(&bytes).into_owned().into())).await.is_err() {
                debug!("{}", ConnectionError::WriteFailed);
                break;
            }
        }
    });

    loop {
        let next = tokio::time::timeout(idle_timeout, receiver.next()).await;
        let frame = match next {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(err))) => {
                debug!("connection {player_id} read error: {err}");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                info!("connection {player_id} idle timeout");
                break;
            }
        };

        let text = match frame {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text.into(),
                Err(_) => continue,
            },
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        match serde_json::from_str::<Envelope<ClientMessage>>(&text) {
            Ok(envelope) => handlers::dispatch(&room, &player_id, envelope.data),
            Err(err) => {
                let err = ConnectionError::MalformedFrame(err);
                debug!("connection {player_id}: dropping malformed frame: {err}");
            }
        }
    }

    write_task.abort();
    room.leave(&player_id);
    room_manager.untrack_player(&player_id);
}

fn short_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

/// Convenience for `main.rs`: the idle timeout used above, exposed so
/// `RoomManager` doesn't need a second copy of the config.
pub fn idle_timeout_from_ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{RoomJoinedData, ServerMessage};

    #[tokio::test]
    async fn queue_drops_oldest_non_critical_when_full() {
        let queue = OutboundQueue::new(2);
        queue.push(ServerMessage::PlayerMove(crate::message::PlayerMoveData { players: vec![], last_processed_sequence: Default::default() }), 0);
        queue.push(ServerMessage::PlayerMove(crate::message::PlayerMoveData { players: vec![], last_processed_sequence: Default::default() }), 0);
        queue.push(
            ServerMessage::RoomJoined(RoomJoinedData { player_id: "p1".into() }),
            0,
        );

        let first = queue.recv().await;
        assert!(matches!(first, ServerMessage::PlayerMove(_)));
        let second = queue.recv().await;
        assert!(matches!(second, ServerMessage::RoomJoined(_)));
    }
}
