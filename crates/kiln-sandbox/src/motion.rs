use glam::Vec2;

/// Damped, speed-limited point mass steered by an input direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Motion {
    pub position: Vec2,
    pub velocity: Vec2,
    /// World units per second squared at full input.
    pub accel: f32,
    /// Fraction of velocity removed per second.
    pub damping: f32,
    pub max_speed: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            accel: 600.0,
            damping: 8.0,
            max_speed: 400.0,
        }
    }
}

impl Motion {
    /// Advances by `dt` seconds. `input` components are in `[-1, 1]`.
    pub fn step(&mut self, input: Vec2, dt: f32) {
        self.velocity += input * self.accel * dt;
        self.velocity = self.velocity.clamp_length_max(self.max_speed);
        self.velocity -= self.velocity * (self.damping * dt).min(1.0);
        self.position += self.velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_body_stays_put() {
        let mut m = Motion::default();
        m.step(Vec2::ZERO, 0.016);
        assert_eq!(m.position, Vec2::ZERO);
    }

    #[test]
    fn speed_never_exceeds_max() {
        let mut m = Motion::default();
        for _ in 0..1000 {
            m.step(Vec2::new(1.0, 1.0), 0.016);
            assert!(m.velocity.length() <= m.max_speed + 1e-3);
        }
        assert!(m.position.x > 0.0 && m.position.y > 0.0);
    }

    #[test]
    fn damping_brings_body_to_rest() {
        let mut m = Motion {
            velocity: Vec2::new(300.0, 0.0),
            ..Motion::default()
        };
        for _ in 0..600 {
            m.step(Vec2::ZERO, 0.016);
        }
        assert!(m.velocity.length() < 1e-3);
    }

    #[test]
    fn huge_step_does_not_reverse_velocity() {
        let mut m = Motion {
            velocity: Vec2::new(100.0, 0.0),
            ..Motion::default()
        };
        m.step(Vec2::ZERO, 0.25);
        assert!(m.velocity.x >= 0.0);
    }
}
