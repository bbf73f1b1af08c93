use serde::{Deserialize, Serialize};

/// A 2D point/vector in arena space. Used for position, velocity and aim math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalized(&self) -> Vec2 {
        let len = self.length();
        if len < f64::EPSILON {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    pub fn scale(&self, s: f64) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    pub fn add(&self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(&self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    pub fn distance(&self, other: Vec2) -> f64 {
        self.sub(other).length()
    }

    pub fn from_angle(radians: f64) -> Vec2 {
        Vec2::new(radians.cos(), radians.sin())
    }

    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn lerp(&self, target: Vec2, t: f64) -> Vec2 {
        Vec2::new(self.x + (target.x - self.x) * t, self.y + (target.y - self.y) * t)
    }
}

/// Wraps an angle difference into `(-pi, pi]`, used by the melee cone test.
pub fn wrap_angle(mut radians: f64) -> f64 {
    use std::f64::consts::PI;
    while radians > PI {
        radians -= 2.0 * PI;
    }
    while radians <= -PI {
        radians += 2.0 * PI;
    }
    radians
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_zero_vector_stays_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
    }

    #[test]
    fn wrap_angle_handles_full_turn() {
        use std::f64::consts::PI;
        assert!((wrap_angle(2.0 * PI + 0.1) - 0.1).abs() < 1e-9);
        assert!((wrap_angle(-2.0 * PI - 0.1) + 0.1).abs() < 1e-9);
    }
}
