use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::player::PlayerState;
use crate::model::vec2::Vec2;

/// Closed set of weapon kinds. Melee kinds carry `magazine == 0` and
/// `projectile_speed == 0.0`; only the shotgun uses `spread_degrees`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    Pistol,
    Uzi,
    Shotgun,
    Sniper,
    Bat,
    Knife,
}

#[derive(Debug, Clone, Copy)]
pub struct WeaponConfig {
    pub damage: i32,
    pub fire_rate: f64,
    pub magazine: u32,
    pub reload_time_ms: u64,
    pub projectile_speed: f64,
    pub range: f64,
    pub arc_degrees: f64,
    pub knockback_distance: f64,
    pub spread_degrees: f64,
    pub pellets: u32,
}

impl WeaponType {
    pub fn config(self) -> WeaponConfig {
        match self {
            WeaponType::Pistol => WeaponConfig {
                damage: 20,
                fire_rate: 3.0,
                magazine: 12,
                reload_time_ms: 1200,
                projectile_speed: 900.0,
                range: 800.0,
                arc_degrees: 0.0,
                knockback_distance: 0.0,
                spread_degrees: 0.0,
                pellets: 1,
            },
            WeaponType::Uzi => WeaponConfig {
                damage: 10,
                fire_rate: 10.0,
                magazine: 30,
                reload_time_ms: 1600,
                projectile_speed: 1100.0,
                range: 600.0,
                arc_degrees: 0.0,
                knockback_distance: 0.0,
                spread_degrees: 4.0,
                pellets: 1,
            },
            WeaponType::Shotgun => WeaponConfig {
                damage: 12,
                fire_rate: 1.2,
                magazine: 6,
                reload_time_ms: 2200,
                projectile_speed: 850.0,
                range: 350.0,
                arc_degrees: 20.0,
                knockback_distance: 0.0,
                spread_degrees: 20.0,
                pellets: 8,
            },
            WeaponType::Sniper => WeaponConfig {
                damage: 90,
                fire_rate: 0.8,
                magazine: 4,
                reload_time_ms: 2800,
                projectile_speed: 2000.0,
                range: 1600.0,
                arc_degrees: 0.0,
                knockback_distance: 0.0,
                spread_degrees: 0.0,
                pellets: 1,
            },
            WeaponType::Bat => WeaponConfig {
                damage: 35,
                fire_rate: 1.5,
                magazine: 0,
                reload_time_ms: 0,
                projectile_speed: 0.0,
                range: 90.0,
                arc_degrees: 80.0,
                knockback_distance: 140.0,
                spread_degrees: 0.0,
                pellets: 0,
            },
            WeaponType::Knife => WeaponConfig {
                damage: 55,
                fire_rate: 2.0,
                magazine: 0,
                reload_time_ms: 0,
                projectile_speed: 0.0,
                range: 55.0,
                arc_degrees: 50.0,
                knockback_distance: 0.0,
                spread_degrees: 0.0,
                pellets: 0,
            },
        }
    }

    pub fn is_melee(self) -> bool {
        self.config().magazine == 0
    }
}

/// Why a fire/melee attempt was rejected. Mirrors `shoot:failed.reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionRejection {
    Dead,
    Rolling,
    Reloading,
    OutOfAmmo,
    Cooldown,
    WrongWeaponKind,
}

pub struct PelletFan {
    pub origin: Vec2,
    pub weapon_type: WeaponType,
    pub damage: i32,
    pub speed: f64,
    pub directions: Vec<Vec2>,
}

pub struct MeleeArc {
    pub origin: Vec2,
    pub aim: f64,
    pub range: f64,
    pub half_angle_degrees: f64,
    pub damage: i32,
    pub knockback_distance: f64,
}

/// Checks whether `player` may fire their current weapon at `now`.
pub fn can_fire(player: &PlayerState, now: u64) -> Result<(), ActionRejection> {
    if player.is_dead {
        return Err(ActionRejection::Dead);
    }
    if player.is_rolling {
        return Err(ActionRejection::Rolling);
    }
    if player.weapon_type.is_melee() {
        return Err(ActionRejection::WrongWeaponKind);
    }
    if player.is_reloading {
        return Err(ActionRejection::Reloading);
    }
    if player.current_ammo == 0 {
        return Err(ActionRejection::OutOfAmmo);
    }
    let cfg = player.weapon_type.config();
    let cooldown_ms = (1000.0 / cfg.fire_rate) as u64;
    if now.saturating_sub(player.last_fire_time) < cooldown_ms {
        return Err(ActionRejection::Cooldown);
    }
    Ok(())
}

/// Resolves a fire action into a pellet fan. Spread is sampled uniformly in
/// `[-spread/2, +spread/2]` per pellet; a non-shotgun weapon fires a single
/// pellet along `aim_angle`.
pub fn apply_fire(
    player: &mut PlayerState,
    aim_angle: f64,
    now: u64,
    rng: &mut impl Rng,
) -> PelletFan {
    let cfg = player.weapon_type.config();
    player.current_ammo = player.current_ammo.saturating_sub(1);
    player.last_fire_time = now;
    player.cancel_sprint();

    let half_spread = cfg.spread_degrees.to_radians() / 2.0;
    let pellets = cfg.pellets.max(1);
    let directions = (0..pellets)
        .map(|_| {
            let offset = if half_spread > 0.0 {
                rng.random_range(-half_spread..=half_spread)
            } else {
                0.0
            };
            Vec2::from_angle(aim_angle + offset)
        })
        .collect();

    PelletFan {
        origin: player.position,
        weapon_type: player.weapon_type,
        damage: cfg.damage,
        speed: cfg.projectile_speed,
        directions,
    }
}

pub fn can_melee(player: &PlayerState, now: u64) -> Result<(), ActionRejection> {
    if player.is_dead {
        return Err(ActionRejection::Dead);
    }
    if player.is_rolling {
        return Err(ActionRejection::Rolling);
    }
    if !player.weapon_type.is_melee() {
        return Err(ActionRejection::WrongWeaponKind);
    }
    let cfg = player.weapon_type.config();
    let cooldown_ms = (1000.0 / cfg.fire_rate) as u64;
    if now.saturating_sub(player.last_fire_time) < cooldown_ms {
        return Err(ActionRejection::Cooldown);
    }
    Ok(())
}

pub fn apply_melee(player: &mut PlayerState, aim_angle: f64, now: u64) -> MeleeArc {
    let cfg = player.weapon_type.config();
    player.last_fire_time = now;
    player.melee_swing_end_time = now + 150;
    player.cancel_sprint();

    MeleeArc {
        origin: player.position,
        aim: aim_angle,
        range: cfg.range,
        half_angle_degrees: cfg.arc_degrees / 2.0,
        damage: cfg.damage,
        knockback_distance: cfg.knockback_distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::PlayerState;

    fn uzi_player() -> PlayerState {
        let mut p = PlayerState::new("p1", "tester", Vec2::ZERO);
        p.weapon_type = WeaponType::Uzi;
        p.current_ammo = WeaponType::Uzi.config().magazine;
        p
    }

    #[test]
    fn out_of_ammo_is_rejected() {
        let mut p = uzi_player();
        p.current_ammo = 0;
        assert_eq!(can_fire(&p, 1000), Err(ActionRejection::OutOfAmmo));
    }

    #[test]
    fn cooldown_blocks_rapid_refire() {
        let mut rng = rand::rng();
        let mut p = uzi_player();
        assert!(can_fire(&p, 1000).is_ok());
        let _ = apply_fire(&mut p, 0.0, 1000, &mut rng);
        assert_eq!(can_fire(&p, 1010), Err(ActionRejection::Cooldown));
    }

    #[test]
    fn melee_weapon_cannot_use_fire_path() {
        let mut p = PlayerState::new("p1", "tester", Vec2::ZERO);
        p.weapon_type = WeaponType::Bat;
        assert!(can_fire(&p, 1000).is_err());
        assert!(can_melee(&p, 1000).is_ok());
    }
}
