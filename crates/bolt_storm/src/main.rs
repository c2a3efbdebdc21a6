//! Bolt storm demo application
//!
//! Fires random bursts of bolts from recycled pools. Bolts that hit something
//! are released early and throw sparks and debris, which return to their
//! pools on their own timers. Pools are prewarmed across ticks before the
//! storm begins.
//!
//! Usage: `bolt_storm [config.toml|config.ron]`

mod config;
mod facets;

use config::StormConfig;
use facets::Telemetry;
use rand::prelude::*;
use recycle_engine::config::Config;
use recycle_engine::foundation::logging;
use recycle_engine::foundation::math::{constants, utils, Vec3};
use recycle_engine::foundation::time::Stopwatch;
use recycle_engine::pooling::{
    InstanceHandle, Placement, PoolError, PoolRegistry, PrewarmScheduler, PrewarmStart, PrewarmTick,
};
use std::rc::Rc;

/// Arena half-extent for random spawn positions
const ARENA_HALF_EXTENT: f32 = 50.0;

/// How often (in ticks) the storm logs pool occupancy
const REPORT_INTERVAL: u32 = 120;

struct BoltStorm {
    config: StormConfig,
    registry: PoolRegistry,
    prewarm: PrewarmScheduler,
    rng: StdRng,
    telemetry: Rc<Telemetry>,
    bolts: Vec<InstanceHandle>,
    skipped_spawns: u64,
    impacts: u64,
}

impl BoltStorm {
    fn new(config: StormConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            registry: PoolRegistry::new(),
            prewarm: PrewarmScheduler::new(),
            rng,
            telemetry: Rc::new(Telemetry::default()),
            bolts: Vec::new(),
            skipped_spawns: 0,
            impacts: 0,
        }
    }

    fn prewarm(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let library = facets::prototype_library(&self.telemetry, self.config.bolt_speed);
        let catalog = self.config.catalog.resolve(&library);
        let budget = self.config.catalog.prewarm_budget_per_tick;

        match self.prewarm.start_catalog(&mut self.registry, &catalog, budget)? {
            PrewarmStart::Started { total } => log::info!("Prewarming {} instances", total),
            PrewarmStart::AlreadySatisfied => return Ok(()),
            PrewarmStart::AlreadyRunning => log::warn!("Prewarm was already running"),
        }

        let delta_time = self.config.delta_time();
        let mut ticks = 0;
        loop {
            ticks += 1;
            match self.prewarm.step(&mut self.registry) {
                PrewarmTick::Progress(progress) => {
                    log::debug!("Prewarm tick {}: {:.0}%", ticks, progress * 100.0);
                }
                PrewarmTick::Completed | PrewarmTick::Idle => break,
            }
            self.registry.update(delta_time);
        }

        log::info!("Prewarm finished after {} ticks", ticks);
        Ok(())
    }

    fn random_placement(&mut self) -> Placement {
        let position = Vec3::new(
            self.rng.gen_range(-ARENA_HALF_EXTENT..ARENA_HALF_EXTENT),
            0.0,
            self.rng.gen_range(-ARENA_HALF_EXTENT..ARENA_HALF_EXTENT),
        );
        let heading = self.rng.gen_range(0.0..constants::TAU);
        Placement::new(position, utils::yaw(heading))
    }

    /// Acquire one instance, treating exhaustion and unconfigured archetypes as a skipped spawn
    fn spawn(
        &mut self,
        archetype: &str,
        placement: Placement,
    ) -> Result<Option<InstanceHandle>, PoolError> {
        match self.registry.acquire(archetype, placement) {
            Ok(handle) => Ok(Some(handle)),
            Err(e) if e.is_recoverable() || matches!(e, PoolError::UnknownArchetype { .. }) => {
                log::debug!("Skipped spawn: {}", e);
                self.skipped_spawns += 1;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn fire_burst(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let count = self.rng.gen_range(self.config.burst_min..=self.config.burst_max.max(self.config.burst_min));
        for _ in 0..count {
            let placement = self.random_placement();
            if let Some(handle) = self.spawn("Bolt", placement)? {
                self.bolts.push(handle);
            }
        }
        Ok(())
    }

    fn resolve_impacts(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        // Forget bolts whose lifetime already ran out
        let registry = &self.registry;
        self.bolts.retain(|handle| {
            registry
                .pool(handle.archetype())
                .is_some_and(|pool| pool.owns(handle))
        });

        let mut index = 0;
        while index < self.bolts.len() {
            if !self.rng.gen_bool(self.config.impact_chance.clamp(0.0, 1.0)) {
                index += 1;
                continue;
            }

            let handle = self.bolts.swap_remove(index);
            let position = self
                .registry
                .pool(handle.archetype())
                .and_then(|pool| pool.instance(&handle))
                .map_or_else(Vec3::zeros, |instance| instance.placement().position);
            self.registry.release(&handle)?;
            self.impacts += 1;

            for _ in 0..self.config.sparks_per_impact {
                let heading = self.rng.gen_range(0.0..constants::TAU);
                self.spawn("Spark", Placement::new(position, utils::yaw(heading)))?;
            }
            if self.rng.gen_bool(self.config.debris_chance.clamp(0.0, 1.0)) {
                self.spawn("Debris", Placement::at(position))?;
            }
        }
        Ok(())
    }

    fn report(&self, tick: u32) {
        let mut all: Vec<_> = self.registry.all_stats().collect();
        all.sort_unstable_by_key(|(name, _)| *name);
        for (name, stats) in all {
            log::info!(
                "[tick {:>4}] {:<8} active {:>4} / available {:>4} / created {:>4} (peak {}, exhausted {}, expired {})",
                tick,
                name,
                stats.active,
                stats.available,
                stats.total_created,
                stats.peak_active,
                stats.exhaustions,
                stats.auto_releases
            );
        }

        if let Some(pool) = self.registry.pool("Bolt") {
            let mut centroid = Vec3::zeros();
            pool.for_each_active(|_, bolt| centroid += bolt.placement().position);
            if pool.active_count() > 0 {
                centroid /= pool.active_count() as f32;
            }
            log::info!(
                "[tick {:>4}] bolts centered at ({:.1}, {:.1}) after {:.2}s simulated",
                tick,
                centroid.x,
                centroid.z,
                pool.clock_seconds()
            );
        }
    }

    fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let stopwatch = Stopwatch::start_new();
        self.prewarm()?;

        let delta_time = self.config.delta_time();
        for tick in 1..=self.config.ticks {
            self.fire_burst()?;
            self.resolve_impacts()?;
            self.registry.update(delta_time);

            if tick % REPORT_INTERVAL == 0 {
                self.report(tick);
            }
        }

        self.report(self.config.ticks);
        let returned = self.registry.release_all();
        self.bolts.clear();

        let impulse = self.telemetry.launch_impulse();
        println!("Storm finished in {:.1} ms", stopwatch.elapsed_millis());
        println!("  impacts:        {}", self.impacts);
        println!("  skipped spawns: {}", self.skipped_spawns);
        println!("  spawned:        {}", self.telemetry.spawned());
        println!("  despawned:      {}", self.telemetry.despawned());
        println!("  returned at end: {}", returned);
        println!("  net launch impulse: ({:.1}, {:.1}, {:.1})", impulse.x, impulse.y, impulse.z);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading storm configuration from {}", path);
            StormConfig::load_from_file(&path)?
        }
        None => StormConfig::default(),
    };

    log::info!("Starting bolt storm ({} ticks at {} Hz)", config.ticks, config.tick_rate);
    let mut storm = BoltStorm::new(config);
    storm.run()?;

    let leaked = storm.registry.total_active();
    if leaked > 0 {
        log::error!("{} instances still active after release_all", leaked);
    }
    Ok(())
}
