//! Prewarm Scheduler
//!
//! Spreads bulk pool growth across many ticks so that entering a scene never
//! stalls a single frame on construction. The scheduler is an explicit
//! resumable state machine: `start` computes the work queue, and each `step`
//! performs at most `per_tick_budget` single-instance grows before yielding.
//!
//! # Architecture
//!
//! ```text
//! start(catalog) ──▶ PrewarmJob { queue: [(archetype, remaining)], budget }
//!                          │
//!         step() per tick  ▼
//!   grow(1) × budget ──▶ Progress(f) ... ──▶ Completed (exactly once) ──▶ Idle
//! ```
//!
//! Suspension happens only between complete `grow(1)` calls, so every pool is
//! structurally valid whenever control returns to the caller. Cancelling keeps
//! whatever was already built; partial growth is a valid resting state.

use crate::foundation::time::Stopwatch;
use crate::pooling::archetype::ArchetypeCatalog;
use crate::pooling::error::PoolResult;
use crate::pooling::registry::PoolRegistry;
use std::collections::{HashSet, VecDeque};

/// Requested prewarm level for one registered archetype
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrewarmRequest {
    /// Archetype name
    pub archetype: String,
    /// Desired total instance count (clamped to the pool's ceiling)
    pub target_count: usize,
}

impl PrewarmRequest {
    /// Create a request
    pub fn new(archetype: impl Into<String>, target_count: usize) -> Self {
        Self {
            archetype: archetype.into(),
            target_count,
        }
    }

    /// One request per well-formed catalog record, targeting its initial count
    ///
    /// A name listed more than once keeps its first record, as registration does.
    pub fn from_catalog(catalog: &ArchetypeCatalog) -> Vec<Self> {
        let mut seen = HashSet::new();
        catalog
            .iter()
            .filter(|record| !record.name.trim().is_empty() && record.prototype.is_some())
            .filter(|record| seen.insert(record.name.as_str()))
            .map(|record| Self::new(record.name.clone(), record.initial_count))
            .collect()
    }
}

/// Result of asking the scheduler to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrewarmStart {
    /// A job was queued with this many constructions to perform
    Started {
        /// Total constructions across all archetypes
        total: usize,
    },
    /// Nothing to do; completion is reported immediately
    AlreadySatisfied,
    /// Another job is in progress; this call had no effect
    AlreadyRunning,
}

/// Result of one scheduler step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrewarmTick {
    /// No job is running
    Idle,
    /// Work remains; fraction of constructions completed in `[0, 1]`
    Progress(f32),
    /// The last construction just finished
    Completed,
}

#[derive(Debug)]
struct PrewarmTask {
    archetype: String,
    target: usize,
    remaining: usize,
}

#[derive(Debug)]
struct PrewarmJob {
    tasks: VecDeque<PrewarmTask>,
    total: usize,
    completed: usize,
    per_tick_budget: usize,
    stopwatch: Stopwatch,
}

impl PrewarmJob {
    fn progress(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed as f32 / self.total as f32).min(1.0)
        }
    }
}

/// Time-sliced bulk construction driver
#[derive(Debug, Default)]
pub struct PrewarmScheduler {
    job: Option<PrewarmJob>,
    completions: u64,
}

impl PrewarmScheduler {
    /// Create an idle scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Start prewarming every well-formed archetype of `catalog` to its initial count
    ///
    /// Archetypes missing from the registry are registered first without any
    /// instances; malformed records are skipped with a warning. An invalid
    /// prototype aborts before any job is queued.
    pub fn start_catalog(
        &mut self,
        registry: &mut PoolRegistry,
        catalog: &ArchetypeCatalog,
        per_tick_budget: usize,
    ) -> PoolResult<PrewarmStart> {
        if self.is_running() {
            log::debug!("Prewarm already running; ignoring start request");
            return Ok(PrewarmStart::AlreadyRunning);
        }

        for record in catalog.iter() {
            match record.to_descriptor() {
                Ok(descriptor) => {
                    if !registry.contains(descriptor.name()) {
                        registry.create_pool_deferred(descriptor)?;
                    }
                }
                Err(reason) => log::warn!("Prewarm skipping entry '{}': {}", record.name, reason),
            }
        }

        Ok(self.start(registry, &PrewarmRequest::from_catalog(catalog), per_tick_budget))
    }

    /// Start prewarming already-registered archetypes to the requested counts
    ///
    /// Requests naming unknown archetypes are skipped with a warning. Only the
    /// first request for a given archetype counts.
    pub fn start(
        &mut self,
        registry: &PoolRegistry,
        requests: &[PrewarmRequest],
        per_tick_budget: usize,
    ) -> PrewarmStart {
        if self.is_running() {
            log::debug!("Prewarm already running; ignoring start request");
            return PrewarmStart::AlreadyRunning;
        }

        let mut tasks = VecDeque::with_capacity(requests.len());
        let mut queued = HashSet::new();
        for request in requests {
            if !queued.insert(request.archetype.as_str()) {
                log::warn!("Ignoring repeated prewarm request for '{}'", request.archetype);
                continue;
            }
            let Some(pool) = registry.pool(&request.archetype) else {
                log::warn!("Prewarm request for unknown archetype '{}'", request.archetype);
                continue;
            };
            let target = pool.descriptor().clamp_to_ceiling(request.target_count);
            let deficit = target.saturating_sub(pool.total_created());
            if deficit > 0 {
                tasks.push_back(PrewarmTask {
                    archetype: request.archetype.clone(),
                    target,
                    remaining: deficit,
                });
            }
        }

        let total: usize = tasks.iter().map(|task| task.remaining).sum();
        if total == 0 {
            self.completions += 1;
            log::debug!("Prewarm requested but every archetype is already satisfied");
            return PrewarmStart::AlreadySatisfied;
        }

        let per_tick_budget = per_tick_budget.max(1);
        log::info!(
            "Starting prewarm of {} instances across {} archetypes ({} per tick)",
            total,
            tasks.len(),
            per_tick_budget
        );

        self.job = Some(PrewarmJob {
            tasks,
            total,
            completed: 0,
            per_tick_budget,
            stopwatch: Stopwatch::start_new(),
        });
        PrewarmStart::Started { total }
    }

    /// Perform one tick worth of construction
    pub fn step(&mut self, registry: &mut PoolRegistry) -> PrewarmTick {
        let Some(job) = self.job.as_mut() else {
            return PrewarmTick::Idle;
        };

        let mut built = 0;
        while built < job.per_tick_budget {
            let Some(task) = job.tasks.front_mut() else {
                break;
            };

            let pool = registry.pool_mut(&task.archetype);
            let reached = pool
                .as_ref()
                .is_some_and(|pool| pool.total_created() >= task.target);
            let grown = if reached { 0 } else { pool.map_or(0, |pool| pool.grow(1)) };

            if grown == 0 {
                // Nothing more to build for this archetype; drop its share of the work
                if reached {
                    log::debug!(
                        "Prewarm of '{}' reached {} instances early; skipping {}",
                        task.archetype,
                        task.target,
                        task.remaining
                    );
                } else {
                    log::warn!(
                        "Prewarm of '{}' abandoned with {} instances left",
                        task.archetype,
                        task.remaining
                    );
                }
                job.total -= task.remaining;
                job.tasks.pop_front();
                continue;
            }

            built += 1;
            job.completed += 1;
            task.remaining -= 1;
            if task.remaining == 0 {
                job.tasks.pop_front();
            }
        }

        if job.tasks.is_empty() {
            job.stopwatch.stop();
            log::info!(
                "Prewarm completed: {} instances in {:.2} ms",
                job.completed,
                job.stopwatch.elapsed_millis()
            );
            self.job = None;
            self.completions += 1;
            return PrewarmTick::Completed;
        }

        PrewarmTick::Progress(job.progress())
    }

    /// Halt the running job, keeping whatever was already constructed
    pub fn cancel(&mut self) {
        if let Some(job) = self.job.take() {
            log::info!(
                "Prewarm cancelled after {}/{} instances",
                job.completed,
                job.total
            );
        }
    }

    /// Whether a job is in progress
    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    /// Progress of the running job (`None` when idle)
    pub fn progress(&self) -> Option<f32> {
        self.job.as_ref().map(PrewarmJob::progress)
    }

    /// Number of completion events reported so far
    pub fn completions(&self) -> u64 {
        self.completions
    }
}

impl Drop for PrewarmScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
