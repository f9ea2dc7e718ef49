//! Narjillos: the creatures. A body, an energy budget and a genome.

use crate::chemistry::Element;
use crate::config::{Configuration, CreatureConfig, PhysicsConfig};
use crate::creature::body::Body;
use crate::creature::egg::Egg;
use crate::creature::embryo::Embryo;
use crate::energy::Energy;
use crate::error::SimError;
use crate::genomics::{Dna, DnaId, GenePool};
use crate::physics::{Segment, Vector, ZeroVectorAngle};
use bevy_ecs::prelude::*;
use rand::Rng;

/// Where a narjillo is heading, and the food pellet there if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: Vector,
    pub food: Option<Entity>,
}

impl Target {
    pub fn food(position: Vector, food: Entity) -> Self {
        Self { position, food: Some(food) }
    }

    /// A target with no food, e.g. the center of the world.
    pub fn point(position: Vector) -> Self {
        Self { position, food: None }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Narjillo {
    dna: DnaId,
    body: Body,
    energy: Energy,
    target: Target,
    age: u64,
    last_egg_age: u64,
}

impl Narjillo {
    pub fn new(dna: DnaId, body: Body, energy: Energy) -> Self {
        let target = Target::point(body.start_point());
        Self {
            dna,
            body,
            energy,
            target,
            age: 0,
            last_egg_age: 0,
        }
    }

    /// Develop `dna` into a hatchling placed at `position`.
    pub fn hatch(dna: &Dna, position: Vector, angle: f64, energy: f64, config: &Configuration) -> Self {
        let mut body = Embryo::develop(dna, config);
        body.force_position(position, angle);
        Self::new(dna.id(), body, Energy::for_creature(energy, &config.creature))
    }

    pub fn dna(&self) -> DnaId {
        self.dna
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn energy(&self) -> &Energy {
        &self.energy
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = target;
    }

    pub fn position(&self) -> Vector {
        self.body.start_point()
    }

    pub fn center_of_mass(&self) -> Vector {
        self.body.center_of_mass()
    }

    pub fn radius(&self) -> f64 {
        self.body.radius()
    }

    pub fn is_dead(&self) -> bool {
        self.energy.is_depleted()
    }

    pub fn breathed_element(&self) -> Element {
        self.body.breathed_element()
    }

    pub fn byproduct(&self) -> Element {
        self.body.byproduct()
    }

    /// Move one tick toward the target, paying for it, and return the
    /// path the mouth travelled.
    pub fn tick(
        &mut self,
        physics: &PhysicsConfig,
        creature: &CreatureConfig,
    ) -> Result<Segment, ZeroVectorAngle> {
        self.age += 1;
        let start = self.position();
        let direction = self.target.position.minus(start);
        let spent = self.body.tick(direction, physics)? + creature.basal_energy_per_tick;
        self.energy.tick(spent, 0.0);
        Ok(Segment::between(start, self.position()))
    }

    pub fn feed_on(&mut self, food_energy: f64) {
        self.energy.consume(food_energy);
    }

    /// Lay an egg carrying a mutated copy of this narjillo's genome, if it
    /// is old enough since the last egg and can spare the energy.
    pub fn lay_egg<R: Rng + ?Sized>(
        &mut self,
        gene_pool: &mut GenePool,
        rng: &mut R,
        config: &Configuration,
    ) -> Result<Option<Egg>, SimError> {
        if self.is_dead() {
            return Ok(None);
        }
        let traits = self.body.head_traits();
        let interval = traits.egg_interval.max(config.creature.min_egg_interval);
        if self.age - self.last_egg_age < interval {
            return Ok(None);
        }
        let energy = self.energy.transfer(traits.energy_to_children);
        if energy <= 0.0 {
            return Ok(None);
        }
        self.last_egg_age = self.age;

        let child = gene_pool.mutate_dna(self.dna, config.creature.mutation_rate, rng)?;
        let velocity = Vector::polar(rng.gen_range(0.0..360.0), traits.egg_velocity);
        let angle = rng.gen_range(0.0..360.0);
        Ok(Some(Egg::new(child, self.position(), velocity, energy, angle, &config.creature)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::HEAD_GENES;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn head_only(pool: &mut GenePool, config: &Configuration, energy: f64) -> Narjillo {
        let text = format!("{{{}}}", vec!["100"; HEAD_GENES].join("_"));
        let id = pool.create_dna(&text).unwrap();
        Narjillo::hatch(pool.dna(id).unwrap(), Vector::ZERO, 0.0, energy, config)
    }

    #[test]
    fn test_energy_decreases_every_tick_without_food() {
        let config = Configuration::default();
        let mut pool = GenePool::new();
        let mut narjillo = head_only(&mut pool, &config, 100.0);
        narjillo.set_target(Target::point(Vector::cartesian(1000.0, 0.0)));

        let mut last = narjillo.energy().value();
        for _ in 0..10 {
            narjillo.tick(&config.physics, &config.creature).unwrap();
            assert!(narjillo.energy().value() < last);
            last = narjillo.energy().value();
        }
        assert_eq!(narjillo.age(), 10);
    }

    #[test]
    fn test_tick_returns_mouth_movement() {
        let config = Configuration::default();
        let mut pool = GenePool::new();
        let mut narjillo = head_only(&mut pool, &config, 100.0);
        let start = narjillo.position();
        let movement = narjillo.tick(&config.physics, &config.creature).unwrap();
        assert!(movement.start.approx_eq(start, 1e-12));
        assert!(movement.end().approx_eq(narjillo.position(), 1e-9));
    }

    #[test]
    fn test_lay_egg_needs_interval_and_spare_energy() {
        let config = Configuration::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut pool = GenePool::new();
        let mut narjillo = head_only(&mut pool, &config, 10_000.0);

        assert!(narjillo.lay_egg(&mut pool, &mut rng, &config).unwrap().is_none());

        for _ in 0..1500 {
            narjillo.tick(&config.physics, &config.creature).unwrap();
        }
        // Old enough, but below its initial energy.
        assert!(narjillo.lay_egg(&mut pool, &mut rng, &config).unwrap().is_none());

        narjillo.feed_on(30_000.0);
        let before = narjillo.energy().value();
        let egg = narjillo.lay_egg(&mut pool, &mut rng, &config).unwrap().unwrap();
        assert!((narjillo.energy().value() + egg.energy() - before).abs() < 1e-6);
        assert_eq!(pool.dna(egg.dna()).unwrap().parent(), Some(narjillo.dna()));

        // Too soon for another one.
        narjillo.feed_on(30_000.0);
        assert!(narjillo.lay_egg(&mut pool, &mut rng, &config).unwrap().is_none());
    }
}
