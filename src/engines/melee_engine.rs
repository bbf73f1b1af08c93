//! C7: instant arc-cone melee resolution.

use crate::engines::DamageOutcome;
use crate::model::vec2::wrap_angle;
use crate::model::weapon::MeleeArc;
use crate::model::world::World;
use crate::physics::{Arena, knockback_translate};

pub struct MeleeEngine;

pub struct MeleeOutcome {
    pub victim_ids: Vec<String>,
    pub damages: Vec<DamageOutcome>,
    pub knockback_applied: bool,
}

impl MeleeEngine {
    /// Resolves one swing: every other living, non-rolling player inside
    /// the cone is hit (AoE), damaged, and knocked back along the aim if
    /// the weapon carries knockback (§4.7).
    pub fn resolve(world: &mut World, attacker_id: &str, arc: MeleeArc) -> MeleeOutcome {
        let victim_ids: Vec<String> = world
            .living_players()
            .filter(|p| p.id != attacker_id && !p.is_rolling)
            .filter(|p| in_cone(&arc, p.position))
            .map(|p| p.id.clone())
            .collect();

        let mut damages = Vec::with_capacity(victim_ids.len());
        for victim_id in &victim_ids {
            let (health_after, killed) = {
                let victim = world
                    .get_player_mut(victim_id)
                    .expect("melee victim resolved from a live world scan this tick");
                let killed = victim.apply_damage(arc.damage);
                (victim.health, killed)
            };
            damages.push(DamageOutcome {
                victim_id: victim_id.clone(),
                attacker_id: attacker_id.to_string(),
                damage: arc.damage,
                victim_health_after: health_after,
                killed,
            });

            if arc.knockback_distance > 0.0 {
                let walls: Vec<_> = world.walls().to_vec();
                let arena = Arena { walls: &walls, width: world.width, height: world.height };
                if let Some(victim) = world.get_player(victim_id) {
                    let from = victim.position;
                    let new_pos = knockback_translate(arena, from, arc.aim, arc.knockback_distance);
                    if let Some(victim) = world.get_player_mut(victim_id) {
                        victim.position = new_pos;
                    }
                }
            }
        }

        MeleeOutcome {
            victim_ids,
            damages,
            knockback_applied: arc.knockback_distance > 0.0,
        }
    }
}

fn in_cone(arc: &MeleeArc, point: crate::model::vec2::Vec2) -> bool {
    let to_point = point.sub(arc.origin);
    if to_point.length() > arc.range {
        return false;
    }
    let angle_to = to_point.angle();
    let delta = wrap_angle(angle_to - arc.aim).abs().to_degrees();
    delta <= arc.half_angle_degrees
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::PlayerState;
    use crate::model::vec2::Vec2;

    #[test]
    fn cone_hits_both_victims_in_arc() {
        let mut world = World::new(1000.0, 1000.0, vec![]);
        world.add_player(PlayerState::new("attacker", "a", Vec2::new(0.0, 0.0)));
        let mut v1 = PlayerState::new("v1", "b", Vec2::new(30.0, 0.0));
        v1.health = 100;
        let mut v2 = PlayerState::new("v2", "c", Vec2::new(40.0, 20.0));
        v2.health = 100;
        world.add_player(v1);
        world.add_player(v2);

        let arc = MeleeArc {
            origin: Vec2::new(0.0, 0.0),
            aim: 0.0,
            range: 90.0,
            half_angle_degrees: 40.0,
            damage: 35,
            knockback_distance: 140.0,
        };
        let outcome = MeleeEngine::resolve(&mut world, "attacker", arc);

        assert_eq!(outcome.victim_ids.len(), 2);
        assert_eq!(world.get_player("v1").unwrap().health, 65);
        assert_eq!(world.get_player("v2").unwrap().health, 65);
        assert!(world.get_player("v1").unwrap().position.x > 30.0);
    }

    #[test]
    fn player_outside_range_is_not_hit() {
        let mut world = World::new(1000.0, 1000.0, vec![]);
        world.add_player(PlayerState::new("attacker", "a", Vec2::new(0.0, 0.0)));
        let mut far = PlayerState::new("far", "b", Vec2::new(500.0, 0.0));
        far.health = 100;
        world.add_player(far);

        let arc = MeleeArc {
            origin: Vec2::new(0.0, 0.0),
            aim: 0.0,
            range: 55.0,
            half_angle_degrees: 25.0,
            damage: 55,
            knockback_distance: 0.0,
        };
        let outcome = MeleeEngine::resolve(&mut world, "attacker", arc);
        assert!(outcome.victim_ids.is_empty());
    }

    #[test]
    fn rolling_player_is_immune_to_melee() {
        let mut world = World::new(1000.0, 1000.0, vec![]);
        world.add_player(PlayerState::new("attacker", "a", Vec2::new(0.0, 0.0)));
        let mut rolling = PlayerState::new("rolling", "b", Vec2::new(30.0, 0.0));
        rolling.health = 100;
        rolling.is_rolling = true;
        world.add_player(rolling);

        let arc = MeleeArc {
            origin: Vec2::new(0.0, 0.0),
            aim: 0.0,
            range: 90.0,
            half_angle_degrees: 40.0,
            damage: 35,
            knockback_distance: 140.0,
        };
        let outcome = MeleeEngine::resolve(&mut world, "attacker", arc);
        assert!(outcome.victim_ids.is_empty());
    }
}
