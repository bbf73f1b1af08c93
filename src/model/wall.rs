use crate::model::vec2::Vec2;

/// An immutable axis-aligned rectangle. Static map geometry; never mutated
/// after the arena is built.
#[derive(Debug, Clone, Copy)]
pub struct Wall {
    pub min: Vec2,
    pub max: Vec2,
}

impl Wall {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Ray/segment vs AABB intersection using the slab method. Returns the
    /// entry `t` in `[0, 1]` along `start -> end` if the segment tunnels
    /// through the wall.
    pub fn sweep_segment(&self, start: Vec2, end: Vec2) -> Option<f64> {
        let d = end.sub(start);
        let mut t_min = 0.0f64;
        let mut t_max = 1.0f64;

        for axis in 0..2 {
            let (s, e, lo, hi) = if axis == 0 {
                (start.x, d.x, self.min.x, self.max.x)
            } else {
                (start.y, d.y, self.min.y, self.max.y)
            };

            if e.abs() < f64::EPSILON {
                if s < lo || s > hi {
                    return None;
                }
            } else {
                let mut t1 = (lo - s) / e;
                let mut t2 = (hi - s) / e;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }

        Some(t_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_through_wall_reports_entry_fraction() {
        let wall = Wall::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        let hit = wall.sweep_segment(Vec2::new(0.0, 5.0), Vec2::new(30.0, 5.0));
        assert!(hit.is_some());
        let t = hit.unwrap();
        assert!((t - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn segment_missing_wall_reports_none() {
        let wall = Wall::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        let hit = wall.sweep_segment(Vec2::new(0.0, 50.0), Vec2::new(30.0, 50.0));
        assert!(hit.is_none());
    }
}
