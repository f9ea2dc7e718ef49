//! Translational force field.

use crate::config::PhysicsConfig;
use crate::physics::{Segment, Vector, Viscosity};

/// Accumulates the push that moving organs exert on the surrounding medium,
/// and yields the translation of the whole body.
///
/// An organ sweeping across its own axis pushes hard, like a paddle; an
/// organ sliding along its axis barely pushes at all.
#[derive(Debug)]
pub struct TranslationsPhysicsEngine {
    body_mass: f64,
    impulse: Vector,
    movement_cost: f64,
    perpendicular_drag: f64,
    parallel_drag: f64,
    energy_factor: f64,
    viscosity: Viscosity,
}

impl TranslationsPhysicsEngine {
    pub fn new(body_mass: f64, config: &PhysicsConfig) -> Self {
        Self {
            body_mass,
            impulse: Vector::ZERO,
            movement_cost: 0.0,
            perpendicular_drag: config.perpendicular_drag,
            parallel_drag: config.parallel_drag,
            energy_factor: config.translation_energy_factor,
            viscosity: Viscosity::from_config(config),
        }
    }

    pub fn register_movement(&mut self, before: &Segment, after: &Segment, mass: f64) {
        let movement = after.center().minus(before.center());
        if movement.is_zero() || mass <= 0.0 {
            return;
        }

        let axis = after.vector.normalized();
        let along = axis.by(movement.dot(axis));
        let across = movement.minus(along);
        let push = across
            .by(self.perpendicular_drag)
            .plus(along.by(self.parallel_drag));

        self.impulse = self.impulse.minus(push.by(mass));
        self.movement_cost += mass * movement.length();
    }

    pub fn translation(&self) -> Vector {
        if self.body_mass <= 0.0 {
            return Vector::ZERO;
        }
        self.viscosity.limit_vector(self.impulse.by(1.0 / self.body_mass))
    }

    pub fn energy(&self) -> f64 {
        self.movement_cost * self.energy_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal(x: f64, y: f64) -> Segment {
        Segment::new(Vector::cartesian(x, y), Vector::cartesian(10.0, 0.0))
    }

    #[test]
    fn test_paddle_pushes_body_the_other_way() {
        let config = PhysicsConfig::default();
        let mut engine = TranslationsPhysicsEngine::new(10.0, &config);
        engine.register_movement(&horizontal(0.0, 0.0), &horizontal(0.0, 1.0), 10.0);

        let translation = engine.translation();
        assert!(translation.y < 0.0);
        assert!(translation.x.abs() < 1e-9);
    }

    #[test]
    fn test_sliding_along_the_axis_pushes_less() {
        let config = PhysicsConfig::default();
        let mut across = TranslationsPhysicsEngine::new(10.0, &config);
        across.register_movement(&horizontal(0.0, 0.0), &horizontal(0.0, 1.0), 10.0);
        let mut along = TranslationsPhysicsEngine::new(10.0, &config);
        along.register_movement(&horizontal(0.0, 0.0), &horizontal(1.0, 0.0), 10.0);

        assert!(along.translation().length() < across.translation().length());
    }

    #[test]
    fn test_energy_grows_with_mass_and_distance() {
        let config = PhysicsConfig::default();
        let energy = |mass: f64, distance: f64| {
            let mut engine = TranslationsPhysicsEngine::new(100.0, &config);
            engine.register_movement(&horizontal(0.0, 0.0), &horizontal(0.0, distance), mass);
            engine.energy()
        };
        assert!(energy(20.0, 1.0) > energy(10.0, 1.0));
        assert!(energy(10.0, 2.0) > energy(10.0, 1.0));
        assert_eq!(energy(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_translation_is_limited_by_viscosity() {
        let config = PhysicsConfig::default();
        let mut engine = TranslationsPhysicsEngine::new(1.0, &config);
        engine.register_movement(&horizontal(0.0, 0.0), &horizontal(0.0, 1000.0), 100.0);
        assert!(engine.translation().length() <= config.max_velocity);
    }
}
