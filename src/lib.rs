//! Narjillos - Simulation Core
//!
//! A deterministic simulation of evolving swimming creatures. Creatures
//! ("narjillos") are trees of organs that move by wiggling through a viscous
//! fluid, eat food, breathe a shared atmosphere and lay eggs carrying a
//! mutated copy of their DNA.
//!
//! Uses `bevy_ecs` to store the things in an ecosystem and `rayon` to run
//! the per-creature physics in parallel. Runs are reproducible from a seed.

pub mod chemistry;
pub mod config;
pub mod creature;
pub mod ecosystem;
pub mod energy;
pub mod error;
pub mod experiment;
pub mod genomics;
pub mod physics;
pub mod profiler;
pub mod snapshot;
pub mod space;
pub mod things;

pub use chemistry::{Atmosphere, Element};
pub use config::Configuration;
pub use creature::{Body, Egg, Embryo, Narjillo, Target};
pub use ecosystem::{Ecosystem, LifecycleState, ShutdownHandle};
pub use energy::Energy;
pub use error::{ConfigError, SimError};
pub use experiment::{Experiment, ExperimentStats};
pub use genomics::{Dna, DnaId, GenePool};
pub use physics::{Segment, Vector};
pub use snapshot::Snapshot;
pub use space::Space;
pub use things::{FoodPellet, Label, Thing, ThingListener};
