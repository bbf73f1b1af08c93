use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::model::vec2::Vec2;
use crate::model::weapon::WeaponType;

pub const SPEED: f64 = 220.0;
pub const SPRINT_MULTIPLIER: f64 = 1.6;
pub const ACCELERATION: f64 = 1400.0;
pub const DECELERATION: f64 = 1800.0;
pub const STOP_EPSILON: f64 = 1.0;
pub const ROLL_SPEED: f64 = 420.0;
pub const ROLL_DURATION_MS: u64 = 280;
pub const MAX_HEALTH: i32 = 100;

/// The latest input snapshot received from a client, consumed by the next
/// tick. Overwritten on every `input:state` message (latest-wins).
#[derive(Debug, Clone, Copy)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub aim_angle: f64,
    pub is_sprinting: bool,
    pub sequence: u64,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            up: false,
            down: false,
            left: false,
            right: false,
            aim_angle: 0.0,
            is_sprinting: false,
            sequence: 0,
        }
    }
}

/// Why a dodge roll ended. Reported in `roll:end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollEndReason {
    Timeout,
    WallCollision,
    Interrupted,
}

/// Kill/death/XP counters. Encapsulated behind atomics so concurrent
/// attackers crediting damage against the same victim in a single tick
/// never race — callers never touch the fields directly.
#[derive(Debug, Default)]
pub struct PlayerStats {
    kills: AtomicU32,
    deaths: AtomicU32,
    xp: AtomicU64,
}

impl PlayerStats {
    pub fn increment_kills(&self) {
        self.kills.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_deaths(&self) {
        self.deaths.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_xp(&self, amount: u64) {
        self.xp.fetch_add(amount, Ordering::SeqCst);
    }

    pub fn kills(&self) -> u32 {
        self.kills.load(Ordering::SeqCst)
    }

    pub fn deaths(&self) -> u32 {
        self.deaths.load(Ordering::SeqCst)
    }

    pub fn xp(&self) -> u64 {
        self.xp.load(Ordering::SeqCst)
    }
}

/// Per-player authoritative data. Mutated only by the tick loop and message
/// handlers holding the room lock.
#[derive(Debug)]
pub struct PlayerState {
    pub id: String,
    pub name: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f64,
    pub health: i32,
    pub is_dead: bool,
    pub is_sprinting: bool,
    pub is_rolling: bool,
    pub stats: PlayerStats,
    pub last_processed_sequence: u64,

    pub weapon_type: WeaponType,
    pub current_ammo: u32,
    pub is_reloading: bool,
    pub last_fire_time: u64,
    pub reload_start_time: u64,
    pub melee_swing_end_time: u64,
    pub roll_end_time: u64,
    pub roll_direction: Vec2,

    pub latest_input: Option<InputState>,
}

impl PlayerState {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: Vec2) -> Self {
        let weapon_type = WeaponType::Pistol;
        Self {
            id: id.into(),
            name: name.into(),
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            health: MAX_HEALTH,
            is_dead: false,
            is_sprinting: false,
            is_rolling: false,
            stats: PlayerStats::default(),
            last_processed_sequence: 0,
            weapon_type,
            current_ammo: weapon_type.config().magazine,
            is_reloading: false,
            last_fire_time: 0,
            reload_start_time: 0,
            melee_swing_end_time: 0,
            roll_end_time: 0,
            roll_direction: Vec2::ZERO,
            latest_input: None,
        }
    }

    pub fn max_speed(&self) -> f64 {
        if self.is_sprinting {
            SPEED * SPRINT_MULTIPLIER
        } else {
            SPEED
        }
    }

    /// Centralizes every sprint-cancellation trigger (fire, reload, damage,
    /// roll) behind one call so no call site forgets it (spec design note:
    /// source scattered this across handlers).
    pub fn cancel_sprint(&mut self) {
        self.is_sprinting = false;
    }

    pub fn begin_reload(&mut self, now: u64) {
        self.is_reloading = true;
        self.reload_start_time = now;
        self.cancel_sprint();
    }

    pub fn finish_reload(&mut self) {
        self.current_ammo = self.weapon_type.config().magazine;
        self.is_reloading = false;
    }

    pub fn begin_roll(&mut self, direction: Vec2, now: u64) {
        self.is_rolling = true;
        self.roll_direction = direction.normalized();
        self.velocity = self.roll_direction.scale(ROLL_SPEED);
        self.roll_end_time = now + ROLL_DURATION_MS;
        self.cancel_sprint();
    }

    pub fn end_roll(&mut self) {
        self.is_rolling = false;
    }

    pub fn switch_weapon(&mut self, weapon_type: WeaponType) {
        self.weapon_type = weapon_type;
        self.current_ammo = weapon_type.config().magazine;
        self.is_reloading = false;
    }

    /// Applies damage, clamping health to zero. Cancels sprint (damage is a
    /// sprint-cancellation trigger). Returns `true` if this hit killed the
    /// player.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        self.cancel_sprint();
        self.health = (self.health - amount).max(0);
        if self.health == 0 && !self.is_dead {
            self.is_dead = true;
            self.velocity = Vec2::ZERO;
            true
        } else {
            false
        }
    }

    pub fn respawn(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.health = MAX_HEALTH;
        self.is_dead = false;
        self.is_rolling = false;
        self.is_sprinting = false;
        self.is_reloading = false;
        self.weapon_type = WeaponType::Pistol;
        self.current_ammo = self.weapon_type.config().magazine;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_past_zero_clamps_and_marks_dead() {
        let mut p = PlayerState::new("p1", "a", Vec2::ZERO);
        p.velocity = Vec2::new(5.0, 0.0);
        let killed = p.apply_damage(1000);
        assert!(killed);
        assert_eq!(p.health, 0);
        assert!(p.is_dead);
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn second_lethal_hit_does_not_report_kill_again() {
        let mut p = PlayerState::new("p1", "a", Vec2::ZERO);
        assert!(p.apply_damage(1000));
        assert!(!p.apply_damage(10));
    }

    #[test]
    fn stats_increment_independently() {
        let p = PlayerState::new("p1", "a", Vec2::ZERO);
        p.stats.increment_kills();
        p.stats.increment_kills();
        p.stats.increment_deaths();
        p.stats.add_xp(50);
        assert_eq!(p.stats.kills(), 2);
        assert_eq!(p.stats.deaths(), 1);
        assert_eq!(p.stats.xp(), 50);
    }
}
