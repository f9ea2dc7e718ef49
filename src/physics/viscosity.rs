//! Velocity limiter for movement through the medium.

use crate::config::PhysicsConfig;
use crate::physics::Vector;

/// Slows down fast movements. Velocities up to the kick-in value pass
/// unchanged; above it they approach `max_velocity` without reaching it.
#[derive(Debug, Clone, Copy)]
pub struct Viscosity {
    kick_in: f64,
    max: f64,
}

impl Viscosity {
    pub fn new(kick_in: f64, max: f64) -> Self {
        Self { kick_in, max }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.viscosity_kick_in_velocity, config.max_velocity)
    }

    pub fn max_velocity(&self) -> f64 {
        self.max
    }

    /// Limit a scalar speed.
    pub fn limit(&self, velocity: f64) -> f64 {
        if velocity <= self.kick_in {
            return velocity;
        }
        let headroom = self.max - self.kick_in;
        if headroom <= 0.0 {
            return self.max;
        }
        let excess = velocity - self.kick_in;
        self.kick_in + headroom * (1.0 - (-excess / headroom).exp())
    }

    /// Limit the length of a velocity vector, keeping its direction.
    pub fn limit_vector(&self, velocity: Vector) -> Vector {
        let length = velocity.length();
        if length <= self.kick_in {
            return velocity;
        }
        velocity.with_length(self.limit(length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_velocities_pass_unchanged() {
        let viscosity = Viscosity::new(10.0, 15.0);
        assert_eq!(viscosity.limit(3.0), 3.0);
        assert_eq!(viscosity.limit(10.0), 10.0);
    }

    #[test]
    fn test_fast_velocities_never_reach_max() {
        let viscosity = Viscosity::new(10.0, 15.0);
        let mut previous = 10.0;
        for velocity in [11.0, 20.0, 100.0, 10_000.0] {
            let limited = viscosity.limit(velocity);
            assert!(limited > previous);
            assert!(limited <= 15.0);
            previous = limited;
        }

        let limited = viscosity.limit_vector(Vector::cartesian(0.0, 1000.0));
        assert!(limited.x.abs() < 1e-9);
        assert!(limited.y <= 15.0 && limited.y > 14.0);
    }
}
