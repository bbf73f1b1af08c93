//! C6: projectile spawn/advance/expire and projectile-vs-world hit testing.

use uuid::Uuid;

use crate::engines::DamageOutcome;
use crate::model::projectile::Projectile;
use crate::model::vec2::Vec2;
use crate::model::weapon::PelletFan;
use crate::model::world::World;
use crate::message::{ProjectileDestroyData, ProjectileSnapshot, ServerMessage};

/// Radius used for projectile-vs-player swept hit tests. Not part of the
/// per-weapon contract; a single body radius applies to every player.
pub const PLAYER_HIT_RADIUS: f64 = 20.0;

pub struct ProjectileEngine;

impl ProjectileEngine {
    /// Spawns one projectile per pellet direction, adds them to the world,
    /// and returns the `projectile:spawn` broadcasts for them.
    pub fn spawn_from_fire(
        world: &mut World,
        owner_id: &str,
        fan: PelletFan,
        now: u64,
    ) -> Vec<ServerMessage> {
        fan.directions
            .into_iter()
            .map(|dir| {
                let id = Uuid::new_v4().to_string();
                let projectile = Projectile::new(
                    id.clone(),
                    owner_id,
                    fan.weapon_type,
                    fan.origin,
                    dir.scale(fan.speed),
                    fan.damage,
                    now,
                );
                let snapshot = snapshot_of(&projectile);
                world.add_projectile(projectile);
                ServerMessage::ProjectileSpawn(snapshot)
            })
            .collect()
    }

    /// Advances every active projectile by `dt_secs`, resolving the first
    /// wall or living-player hit along its swept segment, and expiring any
    /// that exceed their lifetime or leave the arena. Returns the resulting
    /// broadcasts plus any damage dealt, for the caller to fold into Match.
    pub fn advance(world: &mut World, dt_secs: f64, now: u64) -> (Vec<ServerMessage>, Vec<DamageOutcome>) {
        let mut messages = Vec::new();
        let mut damages = Vec::new();
        let mut to_remove = Vec::new();

        let ids = world.projectile_ids();
        for id in ids {
            let Some(projectile) = world.get_all_projectiles().find(|p| p.id == id) else {
                continue;
            };
            if !projectile.active {
                to_remove.push(id);
                continue;
            }
            if projectile.is_expired(now) {
                to_remove.push(id);
                continue;
            }

            let start = projectile.position;
            let end = start.add(projectile.velocity.scale(dt_secs));
            let owner_id = projectile.owner_id.clone();
            let damage = projectile.damage;

            let wall_hit = world
                .walls()
                .iter()
                .filter_map(|w| w.sweep_segment(start, end))
                .fold(None, closer);

            let player_hit = world
                .living_players()
                .filter(|p| p.id != owner_id && !p.is_rolling)
                .filter_map(|p| segment_hits_circle(start, end, p.position, PLAYER_HIT_RADIUS).map(|t| (t, p.id.clone())))
                .fold(None::<(f64, String)>, |acc, (t, id)| match acc {
                    Some((bt, _)) if bt <= t => acc,
                    _ => Some((t, id)),
                });

            let out_of_bounds = end.x < 0.0 || end.x > world.width || end.y < 0.0 || end.y > world.height;

            match (wall_hit, player_hit) {
                (Some(wt), Some((pt, victim_id))) if pt <= wt => {
                    damages.push(apply_hit(world, &victim_id, &owner_id, damage));
                    messages.push(ServerMessage::HitConfirmed(crate::message::HitConfirmedData {
                        target_id: victim_id,
                        damage,
                    }));
                    to_remove.push(id);
                }
                (Some(_), _) => {
                    to_remove.push(id);
                }
                (None, Some((_, victim_id))) => {
                    damages.push(apply_hit(world, &victim_id, &owner_id, damage));
                    messages.push(ServerMessage::HitConfirmed(crate::message::HitConfirmedData {
                        target_id: victim_id,
                        damage,
                    }));
                    to_remove.push(id);
                }
                (None, None) => {
                    if out_of_bounds {
                        to_remove.push(id);
                    } else if let Some(p) = world.projectiles_mut().find(|p| p.id == id) {
                        p.position = end;
                    }
                }
            }
        }

        for id in &to_remove {
            world.remove_projectile(id);
            messages.push(ServerMessage::ProjectileDestroy(ProjectileDestroyData { id: id.clone() }));
        }

        (messages, damages)
    }
}

fn closer(acc: Option<f64>, t: f64) -> Option<f64> {
    match acc {
        Some(best) if best <= t => acc,
        _ => Some(t),
    }
}

fn apply_hit(world: &mut World, victim_id: &str, attacker_id: &str, damage: i32) -> DamageOutcome {
    let (health_after, killed) = {
        let victim = world
            .get_player_mut(victim_id)
            .expect("projectile hit resolved against a player present this tick");
        let killed = victim.apply_damage(damage);
        (victim.health, killed)
    };
    DamageOutcome {
        victim_id: victim_id.to_string(),
        attacker_id: attacker_id.to_string(),
        damage,
        victim_health_after: health_after,
        killed,
    }
}

fn snapshot_of(p: &Projectile) -> ProjectileSnapshot {
    ProjectileSnapshot {
        id: p.id.clone(),
        owner_id: p.owner_id.clone(),
        position: p.position,
        weapon_type: p.weapon_type,
    }
}

/// Earliest `t` in `[0, 1]` at which segment `start -> end` enters the
/// circle of `radius` centered at `center`, or `None` if it never does.
fn segment_hits_circle(start: Vec2, end: Vec2, center: Vec2, radius: f64) -> Option<f64> {
    let d = end.sub(start);
    let f = start.sub(center);

    let a = d.x * d.x + d.y * d.y;
    if a < f64::EPSILON {
        return if f.length() <= radius { Some(0.0) } else { None };
    }
    let b = 2.0 * (f.x * d.x + f.y * d.y);
    let c = f.x * f.x + f.y * f.y - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);

    if t1 >= 0.0 && t1 <= 1.0 {
        Some(t1)
    } else if t2 >= 0.0 && t2 <= 1.0 && c <= 0.0 {
        Some(0.0)
    } else {
        None
    }
}
