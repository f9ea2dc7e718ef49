//! The ecosystem: food, eggs and narjillos, and the per-tick scheduler.
//!
//! ## Tick protocol
//!
//! 1. Eggs age, hatch or decay (over a snapshot of the egg set).
//! 2. Narjillos with depleted energy die and their genome leaves the pool.
//! 3. **Parallel phase**: every narjillo runs its body physics and queries
//!    food collisions along its movement, on the worker pool. Results are
//!    collected in the order of the narjillo list, never completion order.
//! 4. Collided food is consumed in that same order. First claim wins.
//! 5. Narjillos breathe, one after the other.
//! 6. Food may spawn; narjillos without a food target get one.
//! 7. Narjillos may lay eggs.
//!
//! Only phase 3 runs off the scheduling thread, and it only mutates each
//! narjillo's own component. Every random draw happens on the scheduling
//! thread, so a seed fully determines the outcome whatever the pool size.

use crate::chemistry::Atmosphere;
use crate::config::Configuration;
use crate::creature::{Egg, Narjillo, Target};
use crate::error::SimError;
use crate::genomics::{DnaId, GenePool};
use crate::physics::Vector;
use crate::profiler::Profiler;
use crate::snapshot::Snapshot;
use crate::space::Space;
use crate::things::{FoodPellet, Label, Thing, ThingListener};
use bevy_ecs::prelude::*;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Running,
    /// No new ticks are accepted; waiting for in-flight ones.
    ShuttingDown,
    Terminated,
}

#[derive(Debug)]
struct Lifecycle {
    /// Current state and number of ticks in flight.
    state: Mutex<(LifecycleState, usize)>,
    drained: Condvar,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: Mutex::new((LifecycleState::Running, 0)),
            drained: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, (LifecycleState, usize)> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> LifecycleState {
        self.lock().0
    }
}

/// Marks a tick as in flight until dropped.
struct TickGuard {
    lifecycle: Arc<Lifecycle>,
}

impl TickGuard {
    fn begin(lifecycle: &Arc<Lifecycle>) -> Result<Self, SimError> {
        let mut state = lifecycle.lock();
        if state.0 != LifecycleState::Running {
            return Err(SimError::NotRunning(state.0));
        }
        state.1 += 1;
        Ok(Self {
            lifecycle: Arc::clone(lifecycle),
        })
    }
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        let mut state = self.lifecycle.lock();
        state.1 -= 1;
        if state.1 == 0 {
            self.lifecycle.drained.notify_all();
        }
    }
}

/// Terminates an ecosystem from any thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    lifecycle: Arc<Lifecycle>,
    timeout: Duration,
}

impl ShutdownHandle {
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Refuse new ticks, wait up to the configured timeout for the one in
    /// flight, then terminate. Returns false if the wait timed out.
    pub fn terminate(&self) -> bool {
        let mut state = self.lifecycle.lock();
        if state.0 == LifecycleState::Terminated {
            return true;
        }
        state.0 = LifecycleState::ShuttingDown;
        let (mut state, wait) = self
            .lifecycle
            .drained
            .wait_timeout_while(state, self.timeout, |(_, in_flight)| *in_flight > 0)
            .unwrap_or_else(PoisonError::into_inner);
        if wait.timed_out() {
            warn!(in_flight = state.1, timeout = ?self.timeout, "termination timed out with ticks in flight");
        }
        state.0 = LifecycleState::Terminated;
        !wait.timed_out()
    }
}

/// Result of the parallel phase for one narjillo.
type Collisions = (Entity, Vec<Entity>);

pub struct Ecosystem {
    config: Configuration,
    world: World,
    space: Space,
    /// Live narjillos in insertion order. This is the fixed order of every
    /// sequential phase.
    narjillos: Vec<Entity>,
    atmosphere: Atmosphere,
    center: Vector,
    pool: Option<rayon::ThreadPool>,
    worker_threads: usize,
    lifecycle: Arc<Lifecycle>,
    listeners: Vec<Box<dyn ThingListener>>,
    ticks: u64,
    food_consumed: u64,
    profiler: Profiler,
}

impl Ecosystem {
    /// Build an empty ecosystem. Fails on invalid configuration.
    pub fn new(config: Configuration) -> Result<Self, SimError> {
        config.validate()?;

        let worker_threads = match config.ecosystem.worker_threads {
            0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|index| format!("tick-worker-{}", index + 1))
            .build()?;

        let size = config.ecosystem.size;
        info!(
            size,
            cell_size = config.space.cell_size,
            worker_threads,
            "ecosystem created"
        );

        Ok(Self {
            space: Space::from_config(&config.space),
            center: Vector::cartesian(size, size).by(0.5),
            config,
            world: World::new(),
            narjillos: Vec::new(),
            atmosphere: Atmosphere::default(),
            pool: Some(pool),
            worker_threads,
            lifecycle: Arc::new(Lifecycle::new()),
            listeners: Vec::new(),
            ticks: 0,
            food_consumed: 0,
            profiler: Profiler::new(),
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn size(&self) -> f64 {
        self.config.ecosystem.size
    }

    pub fn center(&self) -> Vector {
        self.center
    }

    pub fn atmosphere(&self) -> &Atmosphere {
        &self.atmosphere
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn food_consumed(&self) -> u64 {
        self.food_consumed
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            lifecycle: Arc::clone(&self.lifecycle),
            timeout: Duration::from_millis(self.config.ecosystem.termination_timeout_ms),
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn ThingListener>) {
        self.listeners.push(listener);
    }

    // ------------------------------------------------------------------
    // Population
    // ------------------------------------------------------------------

    /// Scatter the initial food and eggs with random genomes.
    pub fn populate<R: Rng + ?Sized>(&mut self, gene_pool: &mut GenePool, rng: &mut R) {
        self.spawn_initial_food(rng);
        for _ in 0..self.initial_eggs() {
            let dna = gene_pool.create_random_dna(rng);
            let position = self.random_position(rng);
            self.spawn_egg(dna, position, rng);
        }
        info!(
            food = self.number_of_food_pellets(),
            eggs = self.number_of_eggs(),
            "ecosystem populated"
        );
    }

    /// Scatter the initial food and eggs, every egg a copy of `dna`.
    pub fn populate_with_dna<R: Rng + ?Sized>(
        &mut self,
        dna: &str,
        gene_pool: &mut GenePool,
        rng: &mut R,
    ) -> Result<(), SimError> {
        self.spawn_initial_food(rng);
        for _ in 0..self.initial_eggs() {
            let id = gene_pool.create_dna(dna)?;
            let position = self.random_position(rng);
            self.spawn_egg(id, position, rng);
        }
        info!(
            food = self.number_of_food_pellets(),
            eggs = self.number_of_eggs(),
            "ecosystem populated"
        );
        Ok(())
    }

    pub fn spawn_food(&mut self, position: Vector) -> Entity {
        let food = FoodPellet::new(position, self.config.ecosystem.food_energy);
        let entity = self.world.spawn(food).id();
        self.space.add(entity, position, Label::Food);
        self.notify_added(entity, Label::Food);
        entity
    }

    /// Lay a still egg with the configured seed energy.
    pub fn spawn_egg<R: Rng + ?Sized>(&mut self, dna: DnaId, position: Vector, rng: &mut R) -> Entity {
        let angle = rng.gen_range(0.0..360.0);
        let egg = Egg::new(
            dna,
            position,
            Vector::ZERO,
            self.config.creature.seed_energy,
            angle,
            &self.config.creature,
        );
        self.insert_egg(egg)
    }

    pub fn insert_egg(&mut self, egg: Egg) -> Entity {
        let position = egg.position();
        let entity = self.world.spawn(egg).id();
        self.space.add(entity, position, Label::Egg);
        self.notify_added(entity, Label::Egg);
        entity
    }

    /// Add a narjillo, aimed at the closest food.
    pub fn insert_narjillo(&mut self, mut narjillo: Narjillo) -> Entity {
        narjillo.set_target(self.find_closest_food(narjillo.position()));
        let entity = self.world.spawn(narjillo).id();
        self.narjillos.push(entity);
        self.notify_added(entity, Label::Narjillo);
        entity
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn narjillos(&self) -> &[Entity] {
        &self.narjillos
    }

    pub fn narjillo(&self, entity: Entity) -> Option<&Narjillo> {
        self.world.get::<Narjillo>(entity)
    }

    pub fn egg(&self, entity: Entity) -> Option<&Egg> {
        self.world.get::<Egg>(entity)
    }

    pub fn food(&self, entity: Entity) -> Option<&FoodPellet> {
        self.world.get::<FoodPellet>(entity)
    }

    pub fn thing(&self, entity: Entity) -> Option<Thing<'_>> {
        if let Some(narjillo) = self.narjillo(entity) {
            return Some(Thing::Narjillo(narjillo));
        }
        if let Some(egg) = self.egg(entity) {
            return Some(Thing::Egg(egg));
        }
        self.food(entity).map(Thing::Food)
    }

    /// Every thing with `label`. Narjillos come in insertion order, the
    /// rest ordered by entity.
    pub fn things(&self, label: Label) -> Vec<Entity> {
        match label {
            Label::Narjillo => self.narjillos.clone(),
            _ => self.space.get_all(label),
        }
    }

    pub fn number_of_food_pellets(&self) -> usize {
        self.space.count(Label::Food)
    }

    pub fn number_of_eggs(&self) -> usize {
        self.space.count(Label::Egg)
    }

    pub fn number_of_narjillos(&self) -> usize {
        self.narjillos.len()
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    /// Closest food to `position`, or the center of the world if there
    /// is no food at all.
    pub fn find_closest_food(&self, position: Vector) -> Target {
        self.space
            .find_closest(position, Label::Food, None)
            .and_then(|food| self.space.position_of(food).map(|at| Target::food(at, food)))
            .unwrap_or_else(|| Target::point(self.center))
    }

    /// Aim every narjillo at its closest food.
    pub fn update_targets(&mut self) {
        self.retarget(|_| true);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_ecosystem(self)
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the ecosystem by one tick.
    ///
    /// Errors are fatal: the ecosystem is left mid-tick and should be
    /// discarded.
    pub fn tick<R: Rng + ?Sized>(&mut self, gene_pool: &mut GenePool, rng: &mut R) -> Result<(), SimError> {
        let _guard = TickGuard::begin(&self.lifecycle)?;
        self.ticks += 1;

        self.profiler.begin_section("eggs");
        self.tick_eggs(gene_pool, rng)?;

        self.profiler.begin_section("deaths");
        self.remove_dead_narjillos(gene_pool);

        self.profiler.begin_section("physics");
        let collisions = self.tick_narjillos()?;

        self.profiler.begin_section("food");
        let consumed_before = self.food_consumed;
        for (narjillo, foods) in collisions {
            for food in foods {
                self.consume_food(narjillo, food);
            }
        }

        self.profiler.begin_section("breathing");
        self.breathe();

        self.profiler.begin_section("spawning");
        if self.should_spawn_food(rng) {
            let position = self.random_position(rng);
            self.spawn_food(position);
            self.retarget(|target| target.food.is_none());
        }

        self.profiler.begin_section("laying");
        self.lay_eggs(gene_pool, rng)?;
        self.profiler.tick();

        trace!(
            tick = self.ticks,
            narjillos = self.narjillos.len(),
            eggs = self.number_of_eggs(),
            food = self.number_of_food_pellets(),
            consumed = self.food_consumed - consumed_before,
            "tick complete"
        );
        Ok(())
    }

    /// Stop accepting ticks and release the worker pool. Returns false if
    /// in-flight work did not drain before the timeout.
    pub fn terminate(&mut self) -> bool {
        let drained = self.shutdown_handle().terminate();
        self.pool.take();
        info!(ticks = self.ticks, drained, "ecosystem terminated");
        drained
    }

    fn tick_eggs<R: Rng + ?Sized>(&mut self, gene_pool: &GenePool, rng: &mut R) -> Result<(), SimError> {
        let friction = self.config.creature.egg_friction;
        for entity in self.space.get_all(Label::Egg) {
            let Some(mut egg) = self.world.get_mut::<Egg>(entity) else {
                continue;
            };
            egg.tick(friction);
            let hatched = egg.hatch(rng);
            let egg = egg.clone();

            self.space.update_position(entity, egg.position());
            if hatched {
                let dna = gene_pool.dna(egg.dna()).ok_or(SimError::UnknownDna(egg.dna()))?;
                let narjillo = Narjillo::hatch(dna, egg.position(), egg.angle(), egg.energy(), &self.config);
                let hatchling = self.insert_narjillo(narjillo);
                debug!(?entity, ?hatchling, dna = %egg.dna(), "egg hatched");
            }
            if egg.is_decayed() {
                self.remove_thing(entity, Label::Egg);
            }
        }
        Ok(())
    }

    fn remove_dead_narjillos(&mut self, gene_pool: &mut GenePool) {
        let dead: Vec<(Entity, DnaId)> = self
            .narjillos
            .iter()
            .filter_map(|&entity| {
                let narjillo = self.world.get::<Narjillo>(entity)?;
                narjillo.is_dead().then(|| (entity, narjillo.dna()))
            })
            .collect();
        if dead.is_empty() {
            return;
        }

        for &(entity, dna) in &dead {
            self.notify_removed(entity, Label::Narjillo);
            self.world.despawn(entity);
            gene_pool.remove_genome(dna);
            debug!(?entity, %dna, "narjillo died");
        }
        self.narjillos.retain(|entity| !dead.iter().any(|(dead, _)| dead == entity));
    }

    /// Body physics and collision queries for every narjillo, on the
    /// worker pool.
    fn tick_narjillos(&mut self) -> Result<Vec<Collisions>, SimError> {
        let Some(pool) = self.pool.as_ref() else {
            return Err(SimError::NotRunning(self.lifecycle.state()));
        };

        let mut query = self.world.query::<(Entity, &mut Narjillo)>();
        let mut live: HashMap<Entity, &mut Narjillo> = query
            .iter_mut(&mut self.world)
            .map(|(entity, narjillo)| (entity, narjillo.into_inner()))
            .collect();
        let batch: Vec<(Entity, &mut Narjillo)> = self
            .narjillos
            .iter()
            .filter_map(|entity| live.remove(entity).map(|narjillo| (*entity, narjillo)))
            .collect();

        let space = &self.space;
        let physics = &self.config.physics;
        let creature = &self.config.creature;
        pool.install(|| {
            batch
                .into_par_iter()
                .map(|(entity, narjillo)| -> Result<Collisions, SimError> {
                    let movement = narjillo.tick(physics, creature)?;
                    Ok((entity, space.detect_collisions(&movement, Label::Food)))
                })
                .collect()
        })
    }

    fn consume_food(&mut self, narjillo: Entity, food: Entity) {
        // Someone else got here first.
        if !self.space.contains(food) {
            return;
        }
        let Some(energy) = self.world.get::<FoodPellet>(food).map(|pellet| pellet.energy) else {
            return;
        };
        self.remove_thing(food, Label::Food);
        if let Some(mut eater) = self.world.get_mut::<Narjillo>(narjillo) {
            eater.feed_on(energy);
        }
        self.food_consumed += 1;
        debug!(?narjillo, ?food, "food consumed");

        self.retarget(|target| target.food == Some(food));
    }

    fn breathe(&mut self) {
        for &entity in &self.narjillos {
            if let Some(narjillo) = self.world.get::<Narjillo>(entity) {
                self.atmosphere
                    .convert(narjillo.breathed_element(), narjillo.byproduct());
            }
        }
    }

    fn should_spawn_food<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        let blocks = self.config.blocks();
        let max_food = blocks * self.config.ecosystem.max_food_density_per_block;
        if self.number_of_food_pellets() as f64 >= max_food {
            return false;
        }
        let interval = self.config.ecosystem.food_respawn_average_interval_per_block / blocks;
        rng.gen::<f64>() < 1.0 / interval
    }

    fn lay_eggs<R: Rng + ?Sized>(&mut self, gene_pool: &mut GenePool, rng: &mut R) -> Result<(), SimError> {
        for index in 0..self.narjillos.len() {
            let parent = self.narjillos[index];
            let egg = match self.world.get_mut::<Narjillo>(parent) {
                Some(mut narjillo) => narjillo.lay_egg(gene_pool, rng, &self.config)?,
                None => None,
            };
            if let Some(egg) = egg {
                let dna = egg.dna();
                let entity = self.insert_egg(egg);
                debug!(?parent, ?entity, %dna, "egg laid");
            }
        }
        Ok(())
    }

    /// Aim the narjillos whose target matches `filter` at their closest food.
    fn retarget(&mut self, filter: impl Fn(&Target) -> bool) {
        for index in 0..self.narjillos.len() {
            let entity = self.narjillos[index];
            let Some(narjillo) = self.world.get::<Narjillo>(entity) else {
                continue;
            };
            if !filter(&narjillo.target()) {
                continue;
            }
            let target = self.find_closest_food(narjillo.position());
            if let Some(mut narjillo) = self.world.get_mut::<Narjillo>(entity) {
                narjillo.set_target(target);
            }
        }
    }

    fn remove_thing(&mut self, entity: Entity, label: Label) {
        self.notify_removed(entity, label);
        self.space.remove(entity);
        self.world.despawn(entity);
    }

    fn spawn_initial_food<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let count = (self.config.blocks() * self.config.ecosystem.food_density_per_block).ceil() as usize;
        for _ in 0..count {
            let position = self.random_position(rng);
            self.spawn_food(position);
        }
    }

    fn initial_eggs(&self) -> usize {
        (self.config.blocks() * self.config.ecosystem.eggs_density_per_block).ceil() as usize
    }

    fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector {
        let size = self.config.ecosystem.size;
        Vector::cartesian(rng.gen::<f64>() * size, rng.gen::<f64>() * size)
    }

    fn notify_added(&mut self, entity: Entity, label: Label) {
        for listener in &mut self.listeners {
            listener.thing_added(entity, label);
        }
    }

    fn notify_removed(&mut self, entity: Entity, label: Label) {
        for listener in &mut self.listeners {
            listener.thing_removed(entity, label);
        }
    }
}
