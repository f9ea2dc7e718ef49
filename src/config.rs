//! Tunable constants for the simulation.
//!
//! Every value has a default; a whole configuration can also be loaded from
//! JSON. `Configuration::validate` is run when an ecosystem is built.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Body physics constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Velocity (units per tick) above which viscosity starts slowing things down.
    pub viscosity_kick_in_velocity: f64,
    /// Asymptotic maximum velocity (units per tick).
    pub max_velocity: f64,
    /// Maximum rotation of a whole body in one tick (degrees).
    pub max_rotation_per_tick: f64,
    /// Drag felt by an organ moving across its own axis.
    pub perpendicular_drag: f64,
    /// Drag felt by an organ moving along its own axis.
    pub parallel_drag: f64,
    /// Energy per unit of mass times distance moved by rotation.
    pub rotation_energy_factor: f64,
    /// Energy per unit of mass times distance moved by translation.
    pub translation_energy_factor: f64,
    /// Exponent applied to the head metabolic rate.
    pub metabolic_consumption_exponent: f64,
    /// Fraction of adult size an organ grows each tick.
    pub growth_rate: f64,
    /// Fraction of adult size at hatching.
    pub hatchling_size: f64,
    /// Degrees the brain wave advances per tick at a beat ratio of 1.
    pub wave_speed: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            viscosity_kick_in_velocity: 10.0,
            max_velocity: 15.0,
            max_rotation_per_tick: 10.0,
            perpendicular_drag: 1.0,
            parallel_drag: 0.1,
            rotation_energy_factor: 0.002,
            translation_energy_factor: 0.002,
            metabolic_consumption_exponent: 1.5,
            growth_rate: 0.01,
            hatchling_size: 0.1,
            wave_speed: 4.0,
        }
    }
}

/// Creature lifecycle constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureConfig {
    /// Energy given to eggs spawned by `populate`.
    pub seed_energy: f64,
    /// Cap on energy relative to the initial energy.
    pub max_energy_to_initial_energy: f64,
    /// Ticks for the energy cap to decay to zero.
    pub lifespan: f64,
    /// Energy spent every tick just to stay alive.
    pub basal_energy_per_tick: f64,
    pub min_egg_interval: u64,
    pub max_egg_velocity: f64,
    pub max_organs: usize,
    /// Minimum age of an egg before it can hatch.
    pub egg_incubation_time: u64,
    /// Age at which an unhatched egg is removed.
    pub egg_decay_timeout: u64,
    /// Per-tick hatch probability once incubated.
    pub egg_hatch_probability: f64,
    /// Fraction of egg velocity kept each tick.
    pub egg_friction: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            seed_energy: 25_000.0,
            max_energy_to_initial_energy: 5.0,
            lifespan: 100_000.0,
            basal_energy_per_tick: 2.0,
            min_egg_interval: 400,
            max_egg_velocity: 8.0,
            max_organs: 12,
            egg_incubation_time: 60,
            egg_decay_timeout: 900,
            egg_hatch_probability: 0.05,
            egg_friction: 0.9,
            mutation_rate: 0.05,
        }
    }
}

/// Ecosystem-level constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemConfig {
    /// Edge of the square world in units.
    pub size: f64,
    /// Initial food pellets per 1000x1000 block.
    pub food_density_per_block: f64,
    /// Food pellets per block above which no more food spawns.
    pub max_food_density_per_block: f64,
    /// Average ticks between food spawns in a single block.
    pub food_respawn_average_interval_per_block: f64,
    pub food_energy: f64,
    /// Initial eggs per 1000x1000 block.
    pub eggs_density_per_block: f64,
    /// Size of the physics worker pool. Zero means available parallelism.
    pub worker_threads: usize,
    pub termination_timeout_ms: u64,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            size: 10_000.0,
            food_density_per_block: 10.0,
            max_food_density_per_block: 40.0,
            food_respawn_average_interval_per_block: 100.0,
            food_energy: 50_000.0,
            eggs_density_per_block: 4.0,
            worker_threads: 0,
            termination_timeout_ms: 10_000,
        }
    }
}

/// Spatial index constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Edge of a spatial cell. Must be at least `max_velocity`.
    pub cell_size: f64,
    /// Distance from a movement segment within which a thing is hit.
    pub collision_distance: f64,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            cell_size: 300.0,
            collision_distance: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Ticks between stats log lines.
    pub sample_interval_ticks: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            sample_interval_ticks: 1000,
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub physics: PhysicsConfig,
    pub creature: CreatureConfig,
    pub ecosystem: EcosystemConfig,
    pub space: SpaceConfig,
    pub experiment: ExperimentConfig,
}

impl Configuration {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Number of 1000x1000 blocks covered by the world.
    pub fn blocks(&self) -> f64 {
        let blocks_per_edge = self.ecosystem.size / 1000.0;
        blocks_per_edge * blocks_per_edge
    }

    /// Check the constraints the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ecosystem.size", self.ecosystem.size)?;
        positive("space.cell_size", self.space.cell_size)?;
        positive("space.collision_distance", self.space.collision_distance)?;
        positive("physics.max_velocity", self.physics.max_velocity)?;
        positive("physics.max_rotation_per_tick", self.physics.max_rotation_per_tick)?;
        non_negative("physics.perpendicular_drag", self.physics.perpendicular_drag)?;
        non_negative("physics.parallel_drag", self.physics.parallel_drag)?;
        non_negative("physics.rotation_energy_factor", self.physics.rotation_energy_factor)?;
        non_negative("physics.translation_energy_factor", self.physics.translation_energy_factor)?;
        non_negative("physics.growth_rate", self.physics.growth_rate)?;
        non_negative("physics.wave_speed", self.physics.wave_speed)?;
        positive("creature.lifespan", self.creature.lifespan)?;
        positive("creature.max_energy_to_initial_energy", self.creature.max_energy_to_initial_energy)?;

        if self.physics.viscosity_kick_in_velocity > self.physics.max_velocity {
            return Err(ConfigError::KickInAboveMaxVelocity {
                kick_in: self.physics.viscosity_kick_in_velocity,
                max_velocity: self.physics.max_velocity,
            });
        }

        // Movement longer than a cell could skip over a target.
        if self.space.cell_size < self.physics.max_velocity {
            return Err(ConfigError::CellSmallerThanMaxVelocity {
                cell_size: self.space.cell_size,
                max_velocity: self.physics.max_velocity,
            });
        }

        probability("creature.egg_hatch_probability", self.creature.egg_hatch_probability)?;
        probability("creature.mutation_rate", self.creature.mutation_rate)?;
        probability("creature.egg_friction", self.creature.egg_friction)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

fn probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotAProbability { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Configuration::default().validate().is_ok());
    }

    #[test]
    fn test_cell_smaller_than_max_velocity_is_rejected() {
        let mut config = Configuration::default();
        config.space.cell_size = 5.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CellSmallerThanMaxVelocity { .. })
        ));
    }

    #[test]
    fn test_negative_physics_constants_are_rejected() {
        let mut config = Configuration::default();
        config.physics.max_rotation_per_tick = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { name: "physics.max_rotation_per_tick", .. })
        ));

        let mut config = Configuration::default();
        config.physics.parallel_drag = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative { name: "physics.parallel_drag", .. })
        ));

        let mut config = Configuration::default();
        config.physics.wave_speed = f64::NAN;
        assert!(config.validate().is_err());

        // Frictionless bodies are allowed.
        let mut config = Configuration::default();
        config.physics.perpendicular_drag = 0.0;
        config.physics.parallel_drag = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Configuration::from_json_str(r#"{ "ecosystem": { "size": 2000.0 } }"#).unwrap();
        assert_eq!(config.ecosystem.size, 2000.0);
        assert_eq!(config.space.cell_size, SpaceConfig::default().cell_size);
        assert!((config.blocks() - 4.0).abs() < 1e-9);

        let json = config.to_json_string().unwrap();
        let restored = Configuration::from_json_str(&json).unwrap();
        assert_eq!(restored.ecosystem.size, 2000.0);
    }
}
