//! C10: one Room owns a World + a Match + its connection set, and runs a
//! dedicated tick thread (grounded in the same `thread::spawn` +
//! `recv_timeout` shape the teacher's `SyncRuntime` uses for a room's game
//! loop). Message handlers and the tick thread share `RoomInner` behind one
//! `std::sync::Mutex` — the "single per-room lock" the concurrency model
//! calls for — so neither ever observes a half-applied tick.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::engines::melee_engine::MeleeEngine;
use crate::engines::projectile_engine::ProjectileEngine;
use crate::engines::weapon_crate_manager::WeaponCrateManager;
use crate::error::RoomFatalError;
use crate::hub::OutboundQueue;
use crate::match_state::{EndReason, Match};
use crate::message::{
    FinalScore, MatchEndedData, MatchTimerData, PlayerDamagedData, PlayerDeathData, PlayerKillCreditData,
    PlayerLeftData, PlayerMoveData, PlayerRespawnData, PlayerSnapshot, ProjectileSnapshot, RollEndData,
    RollStartData, ServerMessage, ShootFailedData, StateDeltaData, StateSnapshotData,
};
use crate::model::player::{InputState, PlayerState};
use crate::model::vec2::Vec2;
use crate::model::wall::Wall;
use crate::model::weapon;
use crate::model::weapon_crate::WeaponCrate;
use crate::model::world::World;
use crate::physics;

const ARENA_WIDTH: f64 = 1600.0;
const ARENA_HEIGHT: f64 = 1000.0;

/// XP awarded to the attacker on a lethal hit (§4.6 step 4). Flat per-kill
/// award; the spec names no scaling by weapon or streak.
const KILL_XP: u64 = 100;

struct Connection {
    queue: Arc<OutboundQueue>,
}

struct RoomInner {
    world: World,
    match_state: Match,
    connections: std::collections::HashMap<String, Connection>,
    dirty_players: HashSet<String>,
    pending_respawns: std::collections::HashMap<String, u64>,
    pending_added_projectiles: Vec<ProjectileSnapshot>,
    pending_removed_projectile_ids: Vec<String>,
    last_delta_broadcast: u64,
    last_snapshot_broadcast: u64,
    last_timer_broadcast: u64,
}

/// Owns one arena. Shared as `Arc<Room>` between the connection layer and
/// the tick thread it spawns.
pub struct Room {
    pub id: String,
    config: ServerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<RoomInner>,
    shutting_down: AtomicBool,
}

impl Room {
    pub fn new(id: impl Into<String>, config: ServerConfig, clock: Arc<dyn Clock>) -> Arc<Self> {
        let id = id.into();
        let walls = default_walls();
        let mut world = World::new(ARENA_WIDTH, ARENA_HEIGHT, walls);
        for (i, crate_) in default_crates().into_iter().enumerate() {
            WeaponCrateManager::seed(&mut world, crate_);
            debug!("room {id}: seeded crate #{i}");
        }
        let now = clock.now_ms();
        let mut match_state = Match::new(id.clone(), config.kill_target, config.match_duration_ms());
        match_state.start(now);

        let room = Arc::new(Self {
            id,
            clock,
            inner: Mutex::new(RoomInner {
                world,
                match_state,
                connections: std::collections::HashMap::new(),
                dirty_players: HashSet::new(),
                pending_respawns: std::collections::HashMap::new(),
                pending_added_projectiles: Vec::new(),
                pending_removed_projectile_ids: Vec::new(),
                last_delta_broadcast: now,
                last_snapshot_broadcast: now,
                last_timer_broadcast: now,
            }),
            shutting_down: AtomicBool::new(false),
            config,
        });
        Room::spawn_tick_thread(room.clone());
        room
    }

    fn spawn_tick_thread(room: Arc<Room>) {
        let tick_interval = Duration::from_millis(room.config.tick_interval_ms());
        thread::spawn(move || {
            loop {
                thread::sleep(tick_interval);
                if room.shutting_down.load(Ordering::SeqCst) {
                    break;
                }
                let is_empty = {
                    let inner = room.inner.lock().expect("room lock poisoned");
                    inner.connections.is_empty()
                };
                if is_empty {
                    continue;
                }
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| room.tick())) {
                    let reason = panic_message(&payload);
                    let fatal = RoomFatalError { room_id: room.id.clone(), reason: reason.clone() };
                    error!("{fatal}");
                    room.handle_fatal_error(reason);
                    break;
                }
            }
            info!("room {} tick thread exiting", room.id);
        });
    }

    /// §7 Fatal path: a tick panic ends the Match with `server_error`,
    /// broadcasts `match:ended` with whatever scores the world still holds,
    /// and tears this room down. The panic already unwound out of `tick`
    /// before this runs, so the lock it held is released (and possibly
    /// poisoned) — recover it rather than propagate the poison into every
    /// other lock site.
    fn handle_fatal_error(&self, reason: String) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !inner.match_state.is_ended() {
            end_match(self, &mut inner, EndReason::ServerError, now);
        }
        for conn in inner.connections.values() {
            conn.queue.push(ServerMessage::RoomClosing, now);
        }
        warn!("room {}: torn down after fatal tick error: {reason}", self.id);
    }

    pub fn player_count(&self) -> usize {
        self.inner.lock().expect("room lock poisoned").connections.len()
    }

    pub fn has_capacity(&self) -> bool {
        self.player_count() < self.config.room_capacity
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let inner = self.inner.lock().expect("room lock poisoned");
        for conn in inner.connections.values() {
            conn.queue.push(ServerMessage::RoomClosing, self.clock.now_ms());
        }
    }

    /// C12 step 1: assigns a fresh player id, adds a PlayerState, registers
    /// the connection's outbound queue, and returns `room:joined` plus
    /// every existing player as a `player:move` snapshot for the new
    /// connection's own first render.
    pub fn join(&self, name: &str, queue: Arc<OutboundQueue>) -> String {
        let player_id = Uuid::new_v4().to_string();
        let now = self.clock.now_ms();
        let spawn_point = spawn_position(&player_id);

        let mut inner = self.inner.lock().expect("room lock poisoned");
        inner.world.add_player(PlayerState::new(&player_id, name, spawn_point));
        inner.match_state.register_participant(player_id.clone());
        inner.connections.insert(player_id.clone(), Connection { queue: queue.clone() });
        inner.dirty_players.insert(player_id.clone());

        queue.push(
            ServerMessage::RoomJoined(crate::message::RoomJoinedData {
                player_id: player_id.clone(),
            }),
            now,
        );
        info!("room {}: player {player_id} joined", self.id);
        player_id
    }

    pub fn leave(&self, player_id: &str) {
        let mut inner = self.inner.lock().expect("room lock poisoned");
        inner.world.remove_player(player_id);
        inner.connections.remove(player_id);
        broadcast(&mut inner, ServerMessage::PlayerLeft(PlayerLeftData { player_id: player_id.to_string() }), self.clock.now_ms());
        info!("room {}: player {player_id} left", self.id);
    }

    /// `input:state` is latest-wins, but only forward in time: a frame
    /// carrying a `sequence` at or behind the last one applied is dropped,
    /// so reordered or duplicated packets can never replay a stale input
    /// over a newer one already reflected in `last_processed_sequence`.
    pub fn handle_input(&self, player_id: &str, input: InputState) {
        let mut inner = self.inner.lock().expect("room lock poisoned");
        if let Some(player) = inner.world.get_player_mut(player_id) {
            let is_stale = player.latest_input.is_some() && input.sequence <= player.last_processed_sequence;
            if is_stale {
                return;
            }
            player.last_processed_sequence = input.sequence;
            player.latest_input = Some(input);
        }
    }

    pub fn handle_shoot(&self, player_id: &str, aim_angle: f64) {
        let now = self.clock.now_ms();
        let mut rng = rand::rng();
        let mut inner = self.inner.lock().expect("room lock poisoned");

        let Some(player) = inner.world.get_player_mut(player_id) else {
            return;
        };
        match weapon::can_fire(player, now) {
            Ok(()) => {
                let fan = weapon::apply_fire(player, aim_angle, now, &mut rng);
                let weapon_type = player.weapon_type;
                let current_ammo = player.current_ammo;
                let spawn_msgs = ProjectileEngine::spawn_from_fire(&mut inner.world, player_id, fan, now);
                let player_id_owned = player_id.to_string();
                for msg in spawn_msgs {
                    if let ServerMessage::ProjectileSpawn(snapshot) = &msg {
                        inner.pending_added_projectiles.push(snapshot.clone());
                    }
                    broadcast(&mut inner, msg, now);
                }
                broadcast(
                    &mut inner,
                    ServerMessage::WeaponState(crate::message::WeaponStateData {
                        player_id: player_id_owned,
                        weapon_type,
                        current_ammo,
                        is_reloading: false,
                    }),
                    now,
                );
            }
            Err(reason) => {
                send_to(&mut inner, player_id, ServerMessage::ShootFailed(ShootFailedData { reason }), now);
            }
        }
    }

    pub fn handle_reload(&self, player_id: &str) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().expect("room lock poisoned");
        let Some(player) = inner.world.get_player_mut(player_id) else {
            return;
        };
        if player.weapon_type.is_melee() || player.is_reloading || player.is_dead {
            return;
        }
        let magazine = player.weapon_type.config().magazine;
        if player.current_ammo >= magazine {
            return;
        }
        player.begin_reload(now);
        let weapon_type = player.weapon_type;
        let current_ammo = player.current_ammo;
        broadcast(
            &mut inner,
            ServerMessage::WeaponState(crate::message::WeaponStateData {
                player_id: player_id.to_string(),
                weapon_type,
                current_ammo,
                is_reloading: true,
            }),
            now,
        );
    }

    pub fn handle_melee(&self, player_id: &str, aim_angle: f64) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().expect("room lock poisoned");
        let Some(player) = inner.world.get_player_mut(player_id) else {
            return;
        };
        match weapon::can_melee(player, now) {
            Ok(()) => {
                let arc = weapon::apply_melee(player, aim_angle, now);
                let outcome = MeleeEngine::resolve(&mut inner.world, player_id, arc);
                if !outcome.victim_ids.is_empty() {
                    for dmg in &outcome.damages {
                        inner.dirty_players.insert(dmg.victim_id.clone());
                    }
                    let kill_events = apply_damage_outcomes(&mut inner, &outcome.damages, now);
                    broadcast(
                        &mut inner,
                        ServerMessage::MeleeHit(crate::message::MeleeHitData {
                            attacker_id: player_id.to_string(),
                            victims: outcome.victim_ids,
                            knockback_applied: outcome.knockback_applied,
                        }),
                        now,
                    );
                    emit_kill_events(self, &mut inner, kill_events, now);
                }
                inner.dirty_players.insert(player_id.to_string());
            }
            Err(_reason) => {
                // Melee rejections are silent no-ops (§7) — no failure message contract
                // exists for `player:melee_attack` (§4.13).
            }
        }
    }

    /// `player:dodge_roll` (§4.13): direction comes from current velocity,
    /// falling back to the player's aim if they're standing still.
    pub fn handle_dodge_roll(&self, player_id: &str) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().expect("room lock poisoned");
        let Some(player) = inner.world.get_player_mut(player_id) else {
            return;
        };
        if player.is_dead || player.is_rolling {
            return;
        }
        let cooldown_ms = 600u64;
        if now.saturating_sub(player.roll_end_time) < cooldown_ms && player.roll_end_time != 0 {
            return;
        }
        let direction = if player.velocity.length() > 1.0 {
            player.velocity.normalized()
        } else {
            Vec2::from_angle(player.rotation)
        };
        player.begin_roll(direction, now);
        broadcast(
            &mut inner,
            ServerMessage::RollStart(RollStartData { player_id: player_id.to_string(), direction }),
            now,
        );
        inner.dirty_players.insert(player_id.to_string());
    }

    pub fn handle_pickup_attempt(&self, player_id: &str, crate_id: &str) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock().expect("room lock poisoned");
        let result = WeaponCrateManager::attempt_pickup(
            &mut inner.world,
            player_id,
            crate_id,
            now,
            self.config.pickup_radius,
            self.config.crate_respawn_ms,
        );
        if let Ok(msgs) = result {
            for msg in msgs {
                broadcast(&mut inner, msg, now);
            }
            inner.dirty_players.insert(player_id.to_string());
        }
        // Unknown/unavailable/too-far/dead pickups are silently rejected (§4.13, §7).
    }

    /// Runs one fixed-rate tick (§4.10): input -> physics -> projectiles ->
    /// timers -> crate respawns -> match clock -> broadcasts.
    fn tick(&self) {
        let now = self.clock.now_ms();
        let dt_secs = 1.0 / self.config.tick_rate_hz as f64;
        let mut inner = self.inner.lock().expect("room lock poisoned");

        if inner.match_state.is_ended() {
            return;
        }

        let player_ids: Vec<String> = inner.world.players().map(|p| p.id.clone()).collect();
        let walls = inner.world.walls().to_vec();
        let arena = physics::Arena { walls: &walls, width: inner.world.width, height: inner.world.height };

        let mut roll_ends = Vec::new();
        for id in &player_ids {
            if let Some(player) = inner.world.get_player_mut(id) {
                if player.is_dead {
                    continue;
                }
                let roll_reason = physics::roll_end_reason(player, now);
                physics::step_player(player, arena, dt_secs, now);
                if let Some(reason) = roll_reason {
                    player.end_roll();
                    roll_ends.push((id.clone(), reason));
                }
            }
            inner.dirty_players.insert(id.clone());
        }
        for (id, reason) in roll_ends {
            inner.dirty_players.insert(id.clone());
            let reason_str = match reason {
                crate::model::player::RollEndReason::Timeout => "timeout",
                crate::model::player::RollEndReason::WallCollision => "wall_collision",
                crate::model::player::RollEndReason::Interrupted => "interrupted",
            };
            let msg = ServerMessage::RollEnd(RollEndData { player_id: id, reason: reason_str.to_string() });
            broadcast(&mut inner, msg, now);
        }

        let (proj_msgs, proj_damages) = ProjectileEngine::advance(&mut inner.world, dt_secs, now);
        for id in proj_damages.iter().map(|d| d.victim_id.clone()) {
            inner.dirty_players.insert(id);
        }
        let kill_events = apply_damage_outcomes(&mut inner, &proj_damages, now);
        for msg in proj_msgs {
            if let ServerMessage::ProjectileDestroy(destroy) = &msg {
                inner.pending_removed_projectile_ids.push(destroy.id.clone());
            }
            broadcast(&mut inner, msg, now);
        }
        emit_kill_events(self, &mut inner, kill_events, now);

        let crate_msgs = WeaponCrateManager::tick_respawns(&mut inner.world, now);
        for msg in crate_msgs {
            broadcast(&mut inner, msg, now);
        }

        let respawn_msgs = process_due_respawns(&mut inner, now);
        for msg in respawn_msgs {
            broadcast(&mut inner, msg, now);
        }

        if let Some(reason) = inner.match_state.check_time_limit(now) {
            end_match(self, &mut inner, reason, now);
        }

        if now.saturating_sub(inner.last_timer_broadcast) >= 1000 {
            inner.last_timer_broadcast = now;
            if !inner.match_state.is_ended() {
                let remaining = self
                    .config
                    .match_duration_ms()
                    .saturating_sub(now.saturating_sub(inner.match_state.start_time))
                    / 1000;
                broadcast(&mut inner, ServerMessage::MatchTimer(MatchTimerData { remaining_seconds: remaining }), now);
            }
        }

        emit_broadcast_cadences(self, &mut inner, now);
    }
}

/// Applies a batch of damage outcomes (from projectiles or melee) to
/// `player:damaged`/kill bookkeeping, returning the `(attacker, victim)`
/// pairs whose hit killed the victim this tick for the caller to turn into
/// `player:death` + `player:kill_credit` (§4.6 step 4, ordering per §5).
fn apply_damage_outcomes(
    inner: &mut RoomInner,
    damages: &[crate::engines::DamageOutcome],
    now: u64,
) -> Vec<(String, String)> {
    let mut kills = Vec::new();
    for dmg in damages {
        broadcast(
            inner,
            ServerMessage::PlayerDamaged(PlayerDamagedData {
                player_id: dmg.victim_id.clone(),
                attacker_id: dmg.attacker_id.clone(),
                damage: dmg.damage,
                health: dmg.victim_health_after,
            }),
            now,
        );
        if dmg.killed {
            if let Some(attacker) = inner.world.get_player(&dmg.attacker_id) {
                attacker.stats.increment_kills();
                attacker.stats.add_xp(KILL_XP);
            }
            if let Some(victim) = inner.world.get_player(&dmg.victim_id) {
                victim.stats.increment_deaths();
            }
            kills.push((dmg.attacker_id.clone(), dmg.victim_id.clone()));
        }
    }
    kills
}

fn emit_kill_events(room: &Room, inner: &mut RoomInner, kills: Vec<(String, String)>, now: u64) {
    for (attacker_id, victim_id) in kills {
        broadcast(
            inner,
            ServerMessage::PlayerDeath(PlayerDeathData { player_id: victim_id.clone(), attacker_id: attacker_id.clone() }),
            now,
        );
        let attacker_kills = inner.world.get_player(&attacker_id).map(|p| p.stats.kills()).unwrap_or(0);
        broadcast(
            inner,
            ServerMessage::PlayerKillCredit(PlayerKillCreditData {
                attacker_id: attacker_id.clone(),
                victim_id: victim_id.clone(),
                kills: attacker_kills,
            }),
            now,
        );

        if let Some(end_reason) = inner.match_state.record_kill(&attacker_id, &victim_id) {
            end_match(room, inner, end_reason, now);
        }

        schedule_respawn(inner, &victim_id, room.config.respawn_delay_ms, now);
    }
}

/// Queues a respawn for `respawn_delay_ms` from now; the player stays
/// dead (no inputs applied) until `process_due_respawns` picks it up on a
/// later tick.
fn schedule_respawn(inner: &mut RoomInner, victim_id: &str, respawn_delay_ms: u64, now: u64) {
    inner.pending_respawns.insert(victim_id.to_string(), now + respawn_delay_ms);
}

fn process_due_respawns(inner: &mut RoomInner, now: u64) -> Vec<ServerMessage> {
    let due: Vec<String> = inner
        .pending_respawns
        .iter()
        .filter(|(_, &at)| at <= now)
        .map(|(id, _)| id.clone())
        .collect();

    due.into_iter()
        .filter_map(|victim_id| {
            inner.pending_respawns.remove(&victim_id);
            let spawn_point = spawn_position(&victim_id);
            let player = inner.world.get_player_mut(&victim_id)?;
            player.respawn(spawn_point);
            inner.dirty_players.insert(victim_id.clone());
            Some(ServerMessage::PlayerRespawn(PlayerRespawnData { player_id: victim_id, position: spawn_point }))
        })
        .collect()
}

fn end_match(room: &Room, inner: &mut RoomInner, reason: EndReason, now: u64) {
    let winners = inner.match_state.determine_winners();
    let scores: Vec<FinalScore> = inner.match_state.get_final_scores(&inner.world);
    broadcast(
        inner,
        ServerMessage::MatchEnded(MatchEndedData { winners, final_scores: scores, reason: reason.as_str().to_string() }),
        now,
    );
    warn!("room {}: match ended ({})", room.id, reason.as_str());
}

fn emit_broadcast_cadences(room: &Room, inner: &mut RoomInner, now: u64) {
    if now.saturating_sub(inner.last_delta_broadcast) >= room.config.delta_interval_ms() {
        inner.last_delta_broadcast = now;
        let changed_players: Vec<PlayerSnapshot> = inner
            .dirty_players
            .drain()
            .filter_map(|id| inner.world.get_player(&id).map(player_snapshot))
            .collect();
        let added_projectiles: Vec<ProjectileSnapshot> = inner.pending_added_projectiles.drain(..).collect();
        let removed_projectile_ids: Vec<String> = inner.pending_removed_projectile_ids.drain(..).collect();

        if !changed_players.is_empty() {
            let last_processed_sequence = changed_players
                .iter()
                .map(|p| (p.id.clone(), inner.world.get_player(&p.id).map(|pl| pl.last_processed_sequence).unwrap_or(0)))
                .collect();
            broadcast(
                inner,
                ServerMessage::PlayerMove(PlayerMoveData { players: changed_players.clone(), last_processed_sequence }),
                now,
            );
        }

        if !changed_players.is_empty() || !added_projectiles.is_empty() || !removed_projectile_ids.is_empty() {
            broadcast(
                inner,
                ServerMessage::StateDelta(StateDeltaData { changed_players, added_projectiles, removed_projectile_ids }),
                now,
            );
        }
    }

    if now.saturating_sub(inner.last_snapshot_broadcast) >= room.config.snapshot_interval_ms() {
        inner.last_snapshot_broadcast = now;
        let players: Vec<PlayerSnapshot> = inner.world.players().map(player_snapshot).collect();
        let projectiles = inner
            .world
            .get_all_projectiles()
            .map(|p| crate::message::ProjectileSnapshot {
                id: p.id.clone(),
                owner_id: p.owner_id.clone(),
                position: p.position,
                weapon_type: p.weapon_type,
            })
            .collect();
        broadcast(inner, ServerMessage::StateSnapshot(StateSnapshotData { players, projectiles }), now);
    }
}

fn player_snapshot(p: &PlayerState) -> PlayerSnapshot {
    PlayerSnapshot {
        id: p.id.clone(),
        name: p.name.clone(),
        position: p.position,
        rotation: p.rotation,
        health: p.health,
        is_dead: p.is_dead,
        is_sprinting: p.is_sprinting,
        is_rolling: p.is_rolling,
        weapon_type: p.weapon_type,
        current_ammo: p.current_ammo,
    }
}

fn broadcast(inner: &mut RoomInner, msg: ServerMessage, now: u64) {
    for conn in inner.connections.values() {
        conn.queue.push(msg.clone(), now);
    }
}

fn send_to(inner: &mut RoomInner, player_id: &str, msg: ServerMessage, now: u64) {
    if let Some(conn) = inner.connections.get(player_id) {
        conn.queue.push(msg, now);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tick panicked with a non-string payload".to_string()
    }
}

fn spawn_position(player_id: &str) -> Vec2 {
    let hash: u64 = player_id.bytes().map(|b| b as u64).sum();
    let x = 100.0 + (hash % 1400) as f64;
    let y = 100.0 + ((hash / 7) % 800) as f64;
    Vec2::new(x, y)
}

fn default_walls() -> Vec<Wall> {
    vec![
        Wall::new(Vec2::new(700.0, 0.0), Vec2::new(900.0, 400.0)),
        Wall::new(Vec2::new(700.0, 600.0), Vec2::new(900.0, 1000.0)),
    ]
}

fn default_crates() -> Vec<WeaponCrate> {
    use crate::model::weapon::WeaponType;
    vec![
        WeaponCrate::new(Uuid::new_v4().to_string(), Vec2::new(200.0, 200.0), WeaponType::Shotgun),
        WeaponCrate::new(Uuid::new_v4().to_string(), Vec2::new(1400.0, 200.0), WeaponType::Sniper),
        WeaponCrate::new(Uuid::new_v4().to_string(), Vec2::new(200.0, 800.0), WeaponType::Uzi),
        WeaponCrate::new(Uuid::new_v4().to_string(), Vec2::new(1400.0, 800.0), WeaponType::Bat),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::weapon::WeaponType;

    /// Builds a `Room` without spawning its tick thread, so a test drives
    /// `tick()`/`handle_*` directly against a `ManualClock` with no
    /// background thread racing it.
    fn test_room(config: ServerConfig, clock: Arc<dyn Clock>) -> Arc<Room> {
        let id = "test-room".to_string();
        let mut world = World::new(ARENA_WIDTH, ARENA_HEIGHT, default_walls());
        for crate_ in default_crates() {
            WeaponCrateManager::seed(&mut world, crate_);
        }
        let now = clock.now_ms();
        let mut match_state = Match::new(id.clone(), config.kill_target, config.match_duration_ms());
        match_state.start(now);

        Arc::new(Room {
            id,
            clock,
            inner: Mutex::new(RoomInner {
                world,
                match_state,
                connections: std::collections::HashMap::new(),
                dirty_players: HashSet::new(),
                pending_respawns: std::collections::HashMap::new(),
                pending_added_projectiles: Vec::new(),
                pending_removed_projectile_ids: Vec::new(),
                last_delta_broadcast: now,
                last_snapshot_broadcast: now,
                last_timer_broadcast: now,
            }),
            shutting_down: AtomicBool::new(false),
            config,
        })
    }

    fn set_position(room: &Room, player_id: &str, pos: Vec2) {
        let mut inner = room.inner.lock().expect("room lock poisoned");
        if let Some(p) = inner.world.get_player_mut(player_id) {
            p.position = pos;
        }
    }

    #[test]
    fn kill_target_ends_match_and_awards_xp() {
        let mut config = ServerConfig::default();
        config.kill_target = 1;
        let clock = Arc::new(ManualClock::new());
        let room = test_room(config, clock.clone());

        let queue_a = OutboundQueue::new(64);
        let queue_b = OutboundQueue::new(64);
        let p1 = room.join("attacker", queue_a.clone());
        let p2 = room.join("victim", queue_b.clone());

        set_position(&room, &p1, Vec2::new(0.0, 500.0));
        set_position(&room, &p2, Vec2::new(50.0, 500.0));
        {
            let mut inner = room.inner.lock().expect("room lock poisoned");
            inner.world.get_player_mut(&p1).unwrap().weapon_type = WeaponType::Bat;
        }
        queue_a.drain();
        queue_b.drain();

        // Bat cooldown is 1000/1.5 ~= 667ms; three swings of 35 damage kill
        // a full-health (100) victim. Each swing advances past the cooldown
        // window first, including the initial one (last_fire_time starts at
        // 0, so an attack at time 0 would itself read as on-cooldown).
        clock.advance(700);
        room.handle_melee(&p1, 0.0);
        clock.advance(700);
        room.handle_melee(&p1, 0.0);
        clock.advance(700);
        room.handle_melee(&p1, 0.0);

        let received = queue_a.drain();
        let ended = received.iter().find_map(|m| match m {
            ServerMessage::MatchEnded(data) => Some(data.clone()),
            _ => None,
        });
        let ended = ended.expect("match:ended should have been broadcast once the kill target was reached");
        assert_eq!(ended.reason, "kill_target");
        let attacker_score = ended.final_scores.iter().find(|s| s.player_id == p1).unwrap();
        assert_eq!(attacker_score.kills, 1);
        assert_eq!(attacker_score.xp, KILL_XP);
    }

    #[test]
    fn reload_blocks_fire_until_complete() {
        let config = ServerConfig::default();
        let clock = Arc::new(ManualClock::new());
        let room = test_room(config, clock.clone());

        let queue = OutboundQueue::new(64);
        let p1 = room.join("shooter", queue.clone());
        {
            // Partial magazine, otherwise handle_reload is a no-op on an
            // already-full clip.
            let mut inner = room.inner.lock().expect("room lock poisoned");
            inner.world.get_player_mut(&p1).unwrap().current_ammo = 1;
        }
        queue.drain();

        room.handle_reload(&p1);
        room.handle_shoot(&p1, 0.0);

        let received = queue.drain();
        assert!(received.iter().any(|m| matches!(
            m,
            ServerMessage::ShootFailed(ShootFailedData { reason: crate::model::weapon::ActionRejection::Reloading })
        )));

        let inner = room.inner.lock().expect("room lock poisoned");
        let player = inner.world.get_player(&p1).unwrap();
        assert!(player.is_reloading);
        assert_eq!(player.current_ammo, 1);
    }

    #[test]
    fn input_sequence_numbers_only_move_forward() {
        let config = ServerConfig::default();
        let clock = Arc::new(ManualClock::new());
        let room = test_room(config, clock);

        let queue = OutboundQueue::new(64);
        let p1 = room.join("mover", queue);

        room.handle_input(&p1, InputState { sequence: 5, ..InputState::default() });
        room.handle_input(&p1, InputState { sequence: 3, ..InputState::default() });
        {
            let inner = room.inner.lock().expect("room lock poisoned");
            assert_eq!(inner.world.get_player(&p1).unwrap().last_processed_sequence, 5);
        }

        room.handle_input(&p1, InputState { sequence: 10, ..InputState::default() });
        let inner = room.inner.lock().expect("room lock poisoned");
        assert_eq!(inner.world.get_player(&p1).unwrap().last_processed_sequence, 10);
    }

    #[test]
    fn ordinary_movement_marks_player_dirty_for_delta_broadcast() {
        let config = ServerConfig::default();
        let clock = Arc::new(ManualClock::new());
        let room = test_room(config.clone(), clock.clone());

        let queue = OutboundQueue::new(64);
        let p1 = room.join("idler", queue.clone());
        queue.drain();

        clock.advance(config.delta_interval_ms());
        room.tick();

        let received = queue.drain();
        assert!(
            received.iter().any(|m| matches!(m, ServerMessage::PlayerMove(data) if !data.players.is_empty())),
            "an idle player should still be acknowledged via player:move every delta tick"
        );
    }

    #[test]
    fn fatal_tick_error_ends_match_and_tears_room_down() {
        let config = ServerConfig::default();
        let clock = Arc::new(ManualClock::new());
        let room = test_room(config, clock);

        let queue = OutboundQueue::new(64);
        let _p1 = room.join("bystander", queue.clone());
        queue.drain();

        room.handle_fatal_error("simulated panic".to_string());

        assert!(room.is_shut_down());
        let received = queue.drain();
        assert!(received.iter().any(|m| matches!(m, ServerMessage::MatchEnded(data) if data.reason == "server_error")));
        assert!(received.iter().any(|m| matches!(m, ServerMessage::RoomClosing)));
    }
}

