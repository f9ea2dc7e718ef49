//! Eggs: carry a genome and an energy budget until they hatch or decay.

use crate::config::CreatureConfig;
use crate::genomics::DnaId;
use crate::physics::Vector;
use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Egg {
    dna: DnaId,
    position: Vector,
    velocity: Vector,
    energy: f64,
    /// Heading of the creature once hatched.
    angle: f64,
    age: u64,
    incubation_time: u64,
    decay_timeout: u64,
    hatch_probability: f64,
    hatched: bool,
}

impl Egg {
    pub fn new(
        dna: DnaId,
        position: Vector,
        velocity: Vector,
        energy: f64,
        angle: f64,
        config: &CreatureConfig,
    ) -> Self {
        Self {
            dna,
            position,
            velocity,
            energy,
            angle,
            age: 0,
            incubation_time: config.egg_incubation_time,
            decay_timeout: config.egg_decay_timeout,
            hatch_probability: config.egg_hatch_probability,
            hatched: false,
        }
    }

    pub fn with_hatch_probability(mut self, probability: f64) -> Self {
        self.hatch_probability = probability;
        self
    }

    pub fn with_decay_timeout(mut self, ticks: u64) -> Self {
        self.decay_timeout = ticks;
        self
    }

    pub fn with_incubation_time(mut self, ticks: u64) -> Self {
        self.incubation_time = ticks;
        self
    }

    pub fn dna(&self) -> DnaId {
        self.dna
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn velocity(&self) -> Vector {
        self.velocity
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn is_hatched(&self) -> bool {
        self.hatched
    }

    /// Age by one tick and slide, slowed by friction.
    pub fn tick(&mut self, friction: f64) {
        self.age += 1;
        if !self.velocity.is_zero() {
            self.position = self.position.plus(self.velocity);
            self.velocity = self.velocity.by(friction);
            if self.velocity.length() < 0.01 {
                self.velocity = Vector::ZERO;
            }
        }
    }

    /// Roll for hatching. Returns true only on the tick the egg hatches.
    pub fn hatch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.hatched || self.age < self.incubation_time || self.age >= self.decay_timeout {
            return false;
        }
        if rng.gen::<f64>() < self.hatch_probability {
            self.hatched = true;
        }
        self.hatched
    }

    /// Hatched eggs and eggs past their timeout are gone.
    pub fn is_decayed(&self) -> bool {
        self.hatched || self.age >= self.decay_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn egg() -> Egg {
        Egg::new(DnaId(1), Vector::ZERO, Vector::ZERO, 100.0, 0.0, &CreatureConfig::default())
    }

    #[test]
    fn test_egg_never_hatches_before_incubation() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut egg = egg().with_hatch_probability(1.0).with_incubation_time(5);
        for _ in 0..4 {
            egg.tick(0.9);
            assert!(!egg.hatch(&mut rng));
        }
        egg.tick(0.9);
        assert!(egg.hatch(&mut rng));
        assert!(egg.is_decayed());
    }

    #[test]
    fn test_unhatchable_egg_decays_on_timeout() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut egg = egg().with_hatch_probability(0.0).with_decay_timeout(10);
        for _ in 0..9 {
            egg.tick(0.9);
            assert!(!egg.hatch(&mut rng));
            assert!(!egg.is_decayed());
        }
        egg.tick(0.9);
        assert!(egg.is_decayed());
        assert!(!egg.is_hatched());
    }

    #[test]
    fn test_laid_egg_slides_to_a_stop() {
        let mut egg = Egg::new(
            DnaId(1),
            Vector::ZERO,
            Vector::cartesian(4.0, 0.0),
            100.0,
            0.0,
            &CreatureConfig::default(),
        );
        for _ in 0..200 {
            egg.tick(0.5);
        }
        assert!(egg.velocity().is_zero());
        assert!(egg.position().x > 4.0 && egg.position().x < 8.0);
    }
}
