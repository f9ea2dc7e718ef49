//! Rotational force field.

use crate::config::PhysicsConfig;
use crate::physics::{Angle, Segment, Vector};

/// Accumulates the angular momentum generated by organs that changed their
/// angle, and yields the rotation that cancels it.
///
/// Built fresh for every tick. The body is treated as a disc of the given
/// mass and radius spinning around `center_of_mass`.
#[derive(Debug)]
pub struct RotationsPhysicsEngine {
    moment_of_inertia: f64,
    center_of_mass: Vector,
    angular_momentum: f64,
    movement_cost: f64,
    max_rotation: f64,
    energy_factor: f64,
}

impl RotationsPhysicsEngine {
    pub fn new(mass: f64, radius: f64, center_of_mass: Vector, config: &PhysicsConfig) -> Self {
        Self {
            moment_of_inertia: mass * radius * radius,
            center_of_mass,
            angular_momentum: 0.0,
            movement_cost: 0.0,
            max_rotation: config.max_rotation_per_tick,
            energy_factor: config.rotation_energy_factor,
        }
    }

    /// Register an organ that went from `initial_angle` to `final_angle`,
    /// ending up at `final_position`.
    pub fn register_movement(
        &mut self,
        initial_angle: f64,
        final_angle: f64,
        final_position: &Segment,
        mass: f64,
    ) {
        let rotation = Angle::normalize(final_angle - initial_angle);
        if rotation == 0.0 || mass <= 0.0 {
            return;
        }
        let distance = final_position.center().distance_to(self.center_of_mass);
        let half_length = final_position.length() / 2.0;

        // Point mass at the organ center plus a rod spinning on itself.
        let organ_inertia = mass * (distance * distance + half_length * half_length / 3.0);
        self.angular_momentum += organ_inertia * rotation;

        let arc = (distance + half_length) * rotation.abs().to_radians();
        self.movement_cost += mass * arc;
    }

    /// Rotation (degrees) that keeps the body's angular momentum at zero.
    pub fn rotation(&self) -> f64 {
        if self.moment_of_inertia <= 0.0 {
            return 0.0;
        }
        let rotation = -self.angular_momentum / self.moment_of_inertia;
        rotation.clamp(-self.max_rotation, self.max_rotation)
    }

    pub fn energy(&self) -> f64 {
        self.movement_cost * self.energy_factor
    }
}
