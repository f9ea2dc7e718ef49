//! An experiment: one seeded run of an ecosystem and its gene pool.
//!
//! The experiment owns the only random number generator of the run, so two
//! experiments built with the same seed and configuration evolve the same
//! way, whatever the size of the worker pool.

use crate::config::Configuration;
use crate::ecosystem::Ecosystem;
use crate::error::SimError;
use crate::genomics::GenePool;
use crate::snapshot::Snapshot;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::info;

/// Population summary of an experiment at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentStats {
    pub ticks: u64,
    pub running_time_secs: u64,
    pub narjillos: usize,
    pub eggs: usize,
    pub food: usize,
    pub pool_size: usize,
    pub average_generation: f64,
    pub food_consumed: u64,
}

impl ExperimentStats {
    pub fn header() -> String {
        ["tick", "time", "narj", "eggs", "food", "pool", "avg_gen", "eaten"]
            .iter()
            .map(|label| format!("{:>10}", label))
            .collect()
    }

    pub fn csv_header() -> &'static str {
        "ticks, running_time, narjillos, eggs, food, pool_size, average_generation, food_consumed"
    }

    pub fn to_csv_line(&self) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}, {:.2}, {}",
            self.ticks,
            self.running_time_secs,
            self.narjillos,
            self.eggs,
            self.food,
            self.pool_size,
            self.average_generation,
            self.food_consumed
        )
    }
}

impl fmt::Display for ExperimentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}{:>10.2}{:>10}",
            self.ticks,
            self.running_time_secs,
            self.narjillos,
            self.eggs,
            self.food,
            self.pool_size,
            self.average_generation,
            self.food_consumed
        )
    }
}

pub struct Experiment {
    seed: u64,
    rng: ChaCha8Rng,
    gene_pool: GenePool,
    ecosystem: Ecosystem,
    started: Instant,
}

impl Experiment {
    /// Start an experiment populated with random genomes.
    pub fn new(seed: u64, config: Configuration) -> Result<Self, SimError> {
        let mut experiment = Self::empty(seed, config)?;
        experiment
            .ecosystem
            .populate(&mut experiment.gene_pool, &mut experiment.rng);
        Ok(experiment)
    }

    /// Start an experiment where every initial egg carries `dna`.
    pub fn with_dna(seed: u64, config: Configuration, dna: &str) -> Result<Self, SimError> {
        let mut experiment = Self::empty(seed, config)?;
        experiment
            .ecosystem
            .populate_with_dna(dna, &mut experiment.gene_pool, &mut experiment.rng)?;
        Ok(experiment)
    }

    /// An experiment with nothing in it yet.
    pub fn empty(seed: u64, config: Configuration) -> Result<Self, SimError> {
        let ecosystem = Ecosystem::new(config)?;
        info!(seed, "experiment started");
        Ok(Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            gene_pool: GenePool::new(),
            ecosystem,
            started: Instant::now(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ticks(&self) -> u64 {
        self.ecosystem.ticks()
    }

    pub fn ecosystem(&self) -> &Ecosystem {
        &self.ecosystem
    }

    pub fn ecosystem_mut(&mut self) -> &mut Ecosystem {
        &mut self.ecosystem
    }

    pub fn gene_pool(&self) -> &GenePool {
        &self.gene_pool
    }

    pub fn tick(&mut self) -> Result<(), SimError> {
        self.ecosystem.tick(&mut self.gene_pool, &mut self.rng)?;

        let interval = self.ecosystem.config().experiment.sample_interval_ticks;
        if interval > 0 && self.ticks() % interval == 0 {
            let stats = self.stats();
            info!(
                tick = stats.ticks,
                narjillos = stats.narjillos,
                eggs = stats.eggs,
                food = stats.food,
                pool = stats.pool_size,
                average_generation = stats.average_generation,
                "experiment sample"
            );
            #[cfg(feature = "profile")]
            info!("\n{}", self.ecosystem.profiler().summary());
        }
        Ok(())
    }

    /// Tick until `ticks` have elapsed or nothing is left alive.
    pub fn run(&mut self, ticks: u64) -> Result<(), SimError> {
        for _ in 0..ticks {
            if !self.there_are_survivors() {
                info!(tick = self.ticks(), "population extinct");
                break;
            }
            self.tick()?;
        }
        Ok(())
    }

    /// Narjillos or eggs are still around.
    pub fn there_are_survivors(&self) -> bool {
        self.ecosystem.number_of_narjillos() > 0 || self.ecosystem.number_of_eggs() > 0
    }

    pub fn stats(&self) -> ExperimentStats {
        ExperimentStats {
            ticks: self.ticks(),
            running_time_secs: self.started.elapsed().as_secs(),
            narjillos: self.ecosystem.number_of_narjillos(),
            eggs: self.ecosystem.number_of_eggs(),
            food: self.ecosystem.number_of_food_pellets(),
            pool_size: self.gene_pool.current_pool().len(),
            average_generation: self.gene_pool.average_generation(),
            food_consumed: self.ecosystem.food_consumed(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.ecosystem.snapshot()
    }

    /// Stop the ecosystem and return the final stats.
    pub fn terminate(&mut self) -> ExperimentStats {
        self.ecosystem.terminate();
        let stats = self.stats();
        info!(seed = self.seed, ticks = stats.ticks, "experiment terminated");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::DnaId;

    fn config(worker_threads: usize) -> Configuration {
        let mut config = Configuration::default();
        config.ecosystem.size = 2000.0;
        config.ecosystem.worker_threads = worker_threads;
        config.ecosystem.food_respawn_average_interval_per_block = 20.0;
        config.creature.egg_incubation_time = 5;
        config.creature.egg_hatch_probability = 0.5;
        config.creature.min_egg_interval = 50;
        config.creature.seed_energy = 20_000.0;
        config
    }

    fn run(seed: u64, worker_threads: usize, ticks: u64) -> (Vec<DnaId>, u64, Snapshot) {
        let mut experiment = Experiment::new(seed, config(worker_threads)).unwrap();
        for _ in 0..ticks {
            experiment.tick().unwrap();
        }
        let pool = experiment.gene_pool().current_pool().iter().copied().collect();
        let consumed = experiment.ecosystem().food_consumed();
        let snapshot = experiment.snapshot();
        experiment.terminate();
        (pool, consumed, snapshot)
    }

    #[test]
    fn test_same_seed_same_history_across_pool_sizes() {
        let (pool_a, consumed_a, snapshot_a) = run(1234, 4, 300);
        let (pool_b, consumed_b, snapshot_b) = run(1234, 3, 300);
        let (pool_c, consumed_c, _) = run(1234, 1, 300);

        assert_eq!(pool_a, pool_b);
        assert_eq!(pool_a, pool_c);
        assert_eq!(consumed_a, consumed_b);
        assert_eq!(consumed_a, consumed_c);
        assert_eq!(snapshot_a.to_json().unwrap(), snapshot_b.to_json().unwrap());
    }

    #[test]
    fn test_stats_track_the_population() {
        let mut experiment = Experiment::new(7, config(2)).unwrap();
        let stats = experiment.stats();
        assert_eq!(stats.ticks, 0);
        assert_eq!(stats.eggs, 16);
        assert_eq!(stats.pool_size, 16);
        assert_eq!(stats.food, 40);
        assert!(experiment.there_are_survivors());

        experiment.run(50).unwrap();
        let stats = experiment.stats();
        assert_eq!(stats.ticks, 50);
        assert!(stats.narjillos > 0);
        assert!(stats.average_generation >= 1.0);
        assert_eq!(stats.to_csv_line().split(", ").count(), 8);
        assert_eq!(
            ExperimentStats::csv_header().split(", ").count(),
            stats.to_csv_line().split(", ").count()
        );
        assert_eq!(ExperimentStats::header().len(), stats.to_string().len());
    }

    #[test]
    fn test_experiment_from_dna() {
        let dna = "{100_100_100_100_100_100_100_100_100_100_100_050_050_050_050_050_050_050_050_050_050}";
        let experiment = Experiment::with_dna(3, config(1), dna).unwrap();
        let pool = experiment.gene_pool();
        assert_eq!(pool.current_pool().len(), 16);
        for id in pool.current_pool() {
            assert_eq!(pool.dna(*id).unwrap().to_string(), dna);
        }
    }

    #[test]
    fn test_terminated_experiment_stops_ticking() {
        let mut experiment = Experiment::new(9, config(2)).unwrap();
        experiment.tick().unwrap();
        let stats = experiment.terminate();
        assert_eq!(stats.ticks, 1);
        assert!(experiment.tick().is_err());
    }
}
