//! C11: assigns joining connections to a Room with capacity, or spins up a
//! fresh one. Keeps a `player_id -> Room` index so a disconnect can find
//! its room in O(1) without scanning every room's connection set.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::room::Room;

struct RoomManagerInner {
    rooms: Vec<Arc<Room>>,
    player_rooms: HashMap<String, Arc<Room>>,
}

pub struct RoomManager {
    config: ServerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<RoomManagerInner>,
}

impl RoomManager {
    pub fn new(config: ServerConfig, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            config,
            clock,
            inner: Mutex::new(RoomManagerInner { rooms: Vec::new(), player_rooms: HashMap::new() }),
        })
    }

    /// First room with a free seat wins; FIFO among rooms tried in
    /// insertion order keeps same-capacity rooms filling left to right.
    /// Creates a new room when none has room.
    pub fn assign_room(&self) -> Option<Arc<Room>> {
        let mut inner = self.inner.lock().expect("room manager lock poisoned");
        inner.rooms.retain(|r| !r.is_shut_down());

        if let Some(room) = inner.rooms.iter().find(|r| r.has_capacity()) {
            return Some(room.clone());
        }

        let room_id = format!("room-{}", Uuid::new_v4());
        info!("spinning up new room {room_id}");
        let room = Room::new(room_id, self.config.clone(), self.clock.clone());
        inner.rooms.push(room.clone());
        Some(room)
    }

    pub fn track_player(&self, player_id: &str, room: Arc<Room>) {
        self.inner.lock().expect("room manager lock poisoned").player_rooms.insert(player_id.to_string(), room);
    }

    pub fn untrack_player(&self, player_id: &str) {
        let mut inner = self.inner.lock().expect("room manager lock poisoned");
        if let Some(room) = inner.player_rooms.remove(player_id) {
            if room.player_count() == 0 {
                room.request_shutdown();
                inner.rooms.retain(|r| !Arc::ptr_eq(r, &room));
            }
        }
    }

    pub fn room_for(&self, player_id: &str) -> Option<Arc<Room>> {
        self.inner.lock().expect("room manager lock poisoned").player_rooms.get(player_id).cloned()
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.config.idle_timeout_ms)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().expect("room manager lock poisoned").rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn assign_room_reuses_room_with_capacity() {
        let mut config = ServerConfig::default();
        config.room_capacity = 2;
        let manager = RoomManager::new(config, Arc::new(ManualClock::new()));

        let room_a = manager.assign_room().unwrap();
        manager.track_player("p1", room_a.clone());
        let room_b = manager.assign_room().unwrap();
        assert!(Arc::ptr_eq(&room_a, &room_b));
        assert_eq!(manager.room_count(), 1);
    }

    #[test]
    fn assign_room_spins_up_new_room_once_full() {
        let mut config = ServerConfig::default();
        config.room_capacity = 1;
        let manager = RoomManager::new(config, Arc::new(ManualClock::new()));

        let room_a = manager.assign_room().unwrap();
        manager.track_player("p1", room_a.clone());
        let room_b = manager.assign_room().unwrap();
        assert!(!Arc::ptr_eq(&room_a, &room_b));
        assert_eq!(manager.room_count(), 2);
    }

    #[test]
    fn untrack_last_player_shuts_room_down_and_drops_it() {
        let mut config = ServerConfig::default();
        config.room_capacity = 2;
        let manager = RoomManager::new(config, Arc::new(ManualClock::new()));

        let room_a = manager.assign_room().unwrap();
        manager.track_player("p1", room_a.clone());
        manager.untrack_player("p1");
        assert_eq!(manager.room_count(), 0);
    }
}
