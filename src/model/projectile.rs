use crate::model::vec2::Vec2;
use crate::model::weapon::WeaponType;

pub const MAX_PROJECTILE_LIFETIME_MS: u64 = 4000;

/// A single in-flight shot. Inactive projectiles are not advanced, not
/// broadcast, and are collected for removal at the end of the tick.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: String,
    pub owner_id: String,
    pub weapon_type: WeaponType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: i32,
    pub spawn_time: u64,
    pub active: bool,
}

impl Projectile {
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        weapon_type: WeaponType,
        position: Vec2,
        velocity: Vec2,
        damage: i32,
        spawn_time: u64,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            weapon_type,
            position,
            velocity,
            damage,
            spawn_time,
            active: true,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.spawn_time) > MAX_PROJECTILE_LIFETIME_MS
    }
}
