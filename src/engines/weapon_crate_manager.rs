//! C8: weapon crate pickup and respawn scheduling.

use crate::message::{
    ServerMessage, WeaponPickupConfirmedData, WeaponRespawnedData, WeaponSpawnedData, WeaponStateData,
};
use crate::model::world::World;

pub struct WeaponCrateManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupRejection {
    UnknownCrate,
    Unavailable,
    PlayerDead,
    TooFar,
}

impl WeaponCrateManager {
    /// Seeds a crate into the world and returns its `weapon:spawned`
    /// broadcast.
    pub fn seed(world: &mut World, crate_: crate::model::weapon_crate::WeaponCrate) -> ServerMessage {
        let msg = ServerMessage::WeaponSpawned(WeaponSpawnedData {
            crate_id: crate_.id.clone(),
            position: crate_.position,
            weapon_type: crate_.weapon_type,
        });
        world.add_crate(crate_);
        msg
    }

    /// Resolves one pickup attempt (§4.8). On success, switches the
    /// player's weapon, schedules the crate's respawn, and returns both
    /// confirmation broadcasts.
    pub fn attempt_pickup(
        world: &mut World,
        player_id: &str,
        crate_id: &str,
        now: u64,
        pickup_radius: f64,
        respawn_delay_ms: u64,
    ) -> Result<Vec<ServerMessage>, PickupRejection> {
        let (weapon_type, crate_position) = {
            let crate_ = world.get_crate(crate_id).ok_or(PickupRejection::UnknownCrate)?;
            if !crate_.is_available {
                return Err(PickupRejection::Unavailable);
            }
            (crate_.weapon_type, crate_.position)
        };

        let player = world.get_player(player_id).ok_or(PickupRejection::UnknownCrate)?;
        if player.is_dead {
            return Err(PickupRejection::PlayerDead);
        }
        if player.position.distance(crate_position) > pickup_radius {
            return Err(PickupRejection::TooFar);
        }

        if let Some(crate_) = world.get_crate_mut(crate_id) {
            crate_.is_available = false;
            crate_.respawn_at = Some(now + respawn_delay_ms);
        }

        let player = world
            .get_player_mut(player_id)
            .expect("player existence already checked above");
        player.switch_weapon(weapon_type);
        let current_ammo = player.current_ammo;

        Ok(vec![
            ServerMessage::WeaponPickupConfirmed(WeaponPickupConfirmedData {
                player_id: player_id.to_string(),
                crate_id: crate_id.to_string(),
                weapon_type,
            }),
            ServerMessage::WeaponState(WeaponStateData {
                player_id: player_id.to_string(),
                weapon_type,
                current_ammo,
                is_reloading: false,
            }),
        ])
    }

    /// Flips any crate whose respawn timer has elapsed back to available
    /// (§4.8 tick responsibility).
    pub fn tick_respawns(world: &mut World, now: u64) -> Vec<ServerMessage> {
        let due: Vec<String> = world
            .get_all_crates()
            .filter(|c| !c.is_available && c.respawn_at.is_some_and(|at| at <= now))
            .map(|c| c.id.clone())
            .collect();

        due.into_iter()
            .map(|id| {
                if let Some(c) = world.get_crate_mut(&id) {
                    c.is_available = true;
                    c.respawn_at = None;
                }
                ServerMessage::WeaponRespawned(WeaponRespawnedData { crate_id: id })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::PlayerState;
    use crate::model::vec2::Vec2;
    use crate::model::weapon::WeaponType;
    use crate::model::weapon_crate::WeaponCrate;

    #[test]
    fn pickup_rejected_when_too_far_then_succeeds_when_close() {
        let mut world = World::new(1000.0, 1000.0, vec![]);
        world.add_player(PlayerState::new("p1", "a", Vec2::new(100.0, 0.0)));
        world.add_crate(WeaponCrate::new("c1", Vec2::new(0.0, 0.0), WeaponType::Shotgun));

        let rejected = WeaponCrateManager::attempt_pickup(&mut world, "p1", "c1", 0, 50.0, 10_000);
        assert_eq!(rejected, Err(PickupRejection::TooFar));
        assert!(world.get_crate("c1").unwrap().is_available);

        world.get_player_mut("p1").unwrap().position = Vec2::new(10.0, 0.0);
        let confirmed = WeaponCrateManager::attempt_pickup(&mut world, "p1", "c1", 0, 50.0, 10_000);
        assert!(confirmed.is_ok());
        assert_eq!(world.get_player("p1").unwrap().weapon_type, WeaponType::Shotgun);
        assert!(!world.get_crate("c1").unwrap().is_available);
    }

    #[test]
    fn unavailable_crate_rejects_second_concurrent_pickup() {
        let mut world = World::new(1000.0, 1000.0, vec![]);
        world.add_player(PlayerState::new("p1", "a", Vec2::new(0.0, 0.0)));
        world.add_player(PlayerState::new("p2", "b", Vec2::new(0.0, 0.0)));
        world.add_crate(WeaponCrate::new("c1", Vec2::new(0.0, 0.0), WeaponType::Sniper));

        assert!(WeaponCrateManager::attempt_pickup(&mut world, "p1", "c1", 0, 50.0, 10_000).is_ok());
        assert_eq!(
            WeaponCrateManager::attempt_pickup(&mut world, "p2", "c1", 0, 50.0, 10_000),
            Err(PickupRejection::Unavailable)
        );
    }

    #[test]
    fn respawn_tick_flips_due_crates() {
        let mut world = World::new(1000.0, 1000.0, vec![]);
        world.add_player(PlayerState::new("p1", "a", Vec2::new(0.0, 0.0)));
        world.add_crate(WeaponCrate::new("c1", Vec2::new(0.0, 0.0), WeaponType::Uzi));
        WeaponCrateManager::attempt_pickup(&mut world, "p1", "c1", 0, 50.0, 1000).unwrap();

        assert!(WeaponCrateManager::tick_respawns(&mut world, 500).is_empty());
        let msgs = WeaponCrateManager::tick_respawns(&mut world, 1500);
        assert_eq!(msgs.len(), 1);
        assert!(world.get_crate("c1").unwrap().is_available);
    }
}
