use crate::model::vec2::Vec2;
use crate::model::weapon::WeaponType;

/// A pickup point on the map. Only `is_available` crates may be picked up;
/// pickup flips this to unavailable and schedules a respawn.
#[derive(Debug, Clone)]
pub struct WeaponCrate {
    pub id: String,
    pub position: Vec2,
    pub weapon_type: WeaponType,
    pub is_available: bool,
    pub respawn_at: Option<u64>,
}

impl WeaponCrate {
    pub fn new(id: impl Into<String>, position: Vec2, weapon_type: WeaponType) -> Self {
        Self {
            id: id.into(),
            position,
            weapon_type,
            is_available: true,
            respawn_at: None,
        }
    }
}
