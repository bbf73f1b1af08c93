//! C5: fixed-timestep integration, wall collision and arena clamping.

use crate::model::player::{ACCELERATION, DECELERATION, PlayerState, RollEndReason, STOP_EPSILON};
use crate::model::vec2::Vec2;
use crate::model::wall::Wall;

/// The static geometry a physics step resolves against: map walls and
/// arena bounds. Borrowed out of `World` rather than taking `&World`
/// itself, so a tick can hold a player mutably from the same World while
/// still consulting its walls.
#[derive(Clone, Copy)]
pub struct Arena<'a> {
    pub walls: &'a [Wall],
    pub width: f64,
    pub height: f64,
}

impl<'a> Arena<'a> {
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

/// Advances one living player for `dt_secs`: input -> desired velocity ->
/// tentative position -> axis-separated wall resolution -> arena clamp.
pub fn step_player(player: &mut PlayerState, arena: Arena, dt_secs: f64, now: u64) {
    if player.is_dead {
        return;
    }

    if player.is_rolling {
        if now >= player.roll_end_time {
            player.end_roll();
        } else {
            advance_and_resolve(player, arena, dt_secs);
            return;
        }
    }

    let input = player.latest_input;
    let desired_dir = input
        .map(|i| {
            let mut d = Vec2::ZERO;
            if i.up {
                d.y -= 1.0;
            }
            if i.down {
                d.y += 1.0;
            }
            if i.left {
                d.x -= 1.0;
            }
            if i.right {
                d.x += 1.0;
            }
            d.normalized()
        })
        .unwrap_or(Vec2::ZERO);

    if let Some(i) = input {
        player.is_sprinting = i.is_sprinting && desired_dir.length() > 0.0;
        player.rotation = i.aim_angle;
    }

    let max_speed = player.max_speed();

    if desired_dir.length() > 0.0 {
        let target = desired_dir.scale(max_speed);
        player.velocity = player.velocity.lerp(target, (ACCELERATION * dt_secs / max_speed).min(1.0));
    } else {
        let decel = DECELERATION * dt_secs;
        let speed = player.velocity.length();
        if speed <= decel || speed < STOP_EPSILON {
            player.velocity = Vec2::ZERO;
        } else {
            player.velocity = player.velocity.scale((speed - decel) / speed);
        }
    }

    let speed = player.velocity.length();
    if speed > max_speed {
        player.velocity = player.velocity.scale(max_speed / speed);
    }

    advance_and_resolve(player, arena, dt_secs);
}

fn advance_and_resolve(player: &mut PlayerState, arena: Arena, dt_secs: f64) {
    let was_rolling = player.is_rolling;
    let step = player.velocity.scale(dt_secs);

    let after_x = Vec2::new(player.position.x + step.x, player.position.y);
    if wall_blocks_point(arena.walls, after_x) {
        player.velocity.x = 0.0;
        if was_rolling {
            player.end_roll();
        }
    } else {
        player.position.x = after_x.x;
    }

    let after_y = Vec2::new(player.position.x, player.position.y + step.y);
    if wall_blocks_point(arena.walls, after_y) {
        player.velocity.y = 0.0;
        if was_rolling {
            player.end_roll();
        }
    } else {
        player.position.y = after_y.y;
    }

    player.position = arena.clamp(player.position);
}

fn wall_blocks_point(walls: &[Wall], p: Vec2) -> bool {
    walls.iter().any(|w| w.contains(p))
}

/// Returns the roll's end reason if this tick ended it (timeout or wall
/// collision); `None` if the roll continues.
pub fn roll_end_reason(player: &PlayerState, now: u64) -> Option<RollEndReason> {
    if !player.is_rolling {
        return None;
    }
    if now >= player.roll_end_time {
        Some(RollEndReason::Timeout)
    } else if player.velocity.length() < STOP_EPSILON {
        Some(RollEndReason::WallCollision)
    } else {
        None
    }
}

/// Translates `from` by `distance` along `direction_radians`, stopping
/// short of any wall (used for melee knockback).
pub fn knockback_translate(arena: Arena, from: Vec2, direction_radians: f64, distance: f64) -> Vec2 {
    let dir = Vec2::from_angle(direction_radians);
    let target = from.add(dir.scale(distance));

    if let Some(wall) = arena.walls.iter().find(|w| w.contains(target)) {
        if let Some(t) = wall.sweep_segment(from, target) {
            let safe_t = (t - 0.01).max(0.0);
            return arena.clamp(from.add(dir.scale(distance * safe_t)));
        }
    }
    arena.clamp(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vec2::Vec2;

    #[test]
    fn player_accelerates_toward_input_direction() {
        let arena = Arena { walls: &[], width: 1000.0, height: 1000.0 };
        let mut p = PlayerState::new("p1", "a", Vec2::new(500.0, 500.0));
        p.latest_input = Some(crate::model::player::InputState {
            right: true,
            ..Default::default()
        });
        step_player(&mut p, arena, 1.0 / 60.0, 0);
        assert!(p.velocity.x > 0.0);
        assert!(p.position.x > 500.0);
    }

    #[test]
    fn player_decelerates_to_zero_with_no_input() {
        let arena = Arena { walls: &[], width: 1000.0, height: 1000.0 };
        let mut p = PlayerState::new("p1", "a", Vec2::new(500.0, 500.0));
        p.velocity = Vec2::new(5.0, 0.0);
        for _ in 0..120 {
            step_player(&mut p, arena, 1.0 / 60.0, 0);
        }
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn wall_zeroes_offending_axis_only() {
        let wall = Wall::new(Vec2::new(520.0, 0.0), Vec2::new(600.0, 1000.0));
        let walls = vec![wall];
        let arena = Arena { walls: &walls, width: 1000.0, height: 1000.0 };
        let mut p = PlayerState::new("p1", "a", Vec2::new(510.0, 500.0));
        p.velocity = Vec2::new(100.0, 50.0);
        advance_and_resolve(&mut p, arena, 1.0);
        assert_eq!(p.velocity.x, 0.0);
        assert!(p.velocity.y > 0.0);
        assert!(p.position.x < 520.0);
    }
}
