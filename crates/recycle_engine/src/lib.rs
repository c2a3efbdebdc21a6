//! # Recycle Engine
//!
//! Object recycling for real-time simulations. Short-lived entities such as
//! projectiles, effects, debris and pickups are constructed ahead of time,
//! lent out on demand and returned for reuse instead of being destroyed.
//!
//! ## Features
//!
//! - **Per-archetype pools**: LIFO reuse with an optional capacity ceiling
//! - **Auto-expand**: empty pools grow by a quarter of their population
//! - **Auto-release**: active instances can return themselves after a timeout
//! - **Time-sliced prewarm**: bulk construction spread across ticks
//! - **Config-driven catalogs**: archetypes loaded from TOML or RON
//!
//! ## Quick Start
//!
//! ```rust
//! use recycle_engine::prelude::*;
//! use std::rc::Rc;
//!
//! let bolt: PrototypeRef = Rc::new(Vec::<Box<dyn LifecycleFacet>>::new);
//! let catalog = ArchetypeCatalog::new()
//!     .with(ArchetypeDescriptor::new("Bolt", bolt).with_initial_count(32));
//!
//! let mut registry = PoolRegistry::new();
//! let mut prewarm = PrewarmScheduler::new();
//! prewarm.start_catalog(&mut registry, &catalog, 8)?;
//! while prewarm.step(&mut registry) != PrewarmTick::Completed {}
//!
//! let handle = registry.acquire("Bolt", Placement::at(Vec3::new(0.0, 1.0, 0.0)))?;
//! registry.update(1.0 / 60.0);
//! registry.release(&handle)?;
//! # Ok::<(), PoolError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::must_use_candidate)]

pub mod config;
pub mod foundation;
pub mod pooling;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{CatalogConfig, Config, ConfigError},
        foundation::{
            math::{Quat, Vec3},
            time::{Stopwatch, TickClock},
        },
        pooling::{
            ArchetypeCatalog, ArchetypeDescriptor, ArchetypeRecord, InstanceHandle,
            LifecycleFacet, Placement, Pool, PoolError, PoolRegistry, PoolResult, PoolStats,
            PrewarmRequest, PrewarmScheduler, PrewarmStart, PrewarmTick, Prototype,
            PrototypeLibrary, PrototypeRef, RecyclableInstance,
        },
    };
}
