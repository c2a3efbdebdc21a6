//! Pool Registry
//!
//! Coordinates one [`Pool`] per archetype name. The registry is an explicit
//! object owned by whatever owns the simulation lifetime; there is no global
//! instance, so tearing down or re-creating it (menus, tests) is explicit.
//!
//! # Usage
//!
//! ```rust
//! use recycle_engine::pooling::{ArchetypeDescriptor, Placement, PoolRegistry, PrototypeRef};
//! use recycle_engine::pooling::LifecycleFacet;
//! use std::rc::Rc;
//!
//! let prototype: PrototypeRef = Rc::new(Vec::<Box<dyn LifecycleFacet>>::new);
//! let mut registry = PoolRegistry::new();
//! registry
//!     .create_pool(
//!         ArchetypeDescriptor::new("Bolt", prototype)
//!             .with_initial_count(20)
//!             .with_capacity_ceiling(40),
//!     )
//!     .unwrap();
//!
//! let bolt = registry.acquire("Bolt", Placement::default()).unwrap();
//! registry.release(&bolt).unwrap();
//! ```
//!
//! # Orphaned handles
//!
//! Releasing a handle whose archetype is no longer registered reports
//! [`PoolError::UnknownArchetype`]. The instance itself was already destroyed
//! when its pool was cleared or removed, so nothing leaks and nothing needs
//! destroying at release time.

use crate::pooling::archetype::{ArchetypeCatalog, ArchetypeDescriptor};
use crate::pooling::error::{PoolError, PoolResult};
use crate::pooling::instance::{InstanceHandle, Placement};
use crate::pooling::pool::{Pool, PoolStats};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Outcome of registering an archetype
#[derive(Debug)]
pub enum Registered<'a> {
    /// A new pool was constructed
    Created(&'a mut Pool),
    /// The name was already registered; the existing pool is returned unchanged
    Existing(&'a mut Pool),
}

impl<'a> Registered<'a> {
    /// The pool, whichever way it was obtained
    pub fn pool(self) -> &'a mut Pool {
        match self {
            Self::Created(pool) | Self::Existing(pool) => pool,
        }
    }

    /// Whether the registration hit an existing archetype
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Existing(_))
    }

    /// Treat a duplicate registration as [`PoolError::DuplicateArchetype`]
    pub fn into_result(self) -> PoolResult<&'a mut Pool> {
        match self {
            Self::Created(pool) => Ok(pool),
            Self::Existing(pool) => Err(PoolError::DuplicateArchetype {
                name: pool.name().to_string(),
            }),
        }
    }
}

/// Summary of a bulk catalog load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    /// Pools constructed
    pub created: usize,
    /// Records naming an already registered archetype
    pub duplicates: usize,
    /// Malformed records skipped
    pub skipped: usize,
}

/// Directory of pools keyed by archetype name
#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: HashMap<String, Pool>,
}

impl PoolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an archetype and prewarm its pool with `initial_count` instances
    ///
    /// Validates the prototype first; a rejected prototype is a load-time failure.
    /// A duplicate name leaves the existing pool untouched.
    pub fn create_pool(&mut self, descriptor: ArchetypeDescriptor) -> PoolResult<Registered<'_>> {
        self.register(descriptor, true)
    }

    /// Register an archetype without constructing any instances
    ///
    /// Used when growth is left to the prewarm scheduler.
    pub fn create_pool_deferred(&mut self, descriptor: ArchetypeDescriptor) -> PoolResult<Registered<'_>> {
        self.register(descriptor, false)
    }

    /// Register every well-formed record of `catalog`
    ///
    /// Blank names and missing prototypes are skipped with a warning so that a
    /// partial configuration never aborts startup. Invalid prototypes abort.
    pub fn initialize_from_catalog(&mut self, catalog: &ArchetypeCatalog) -> PoolResult<CatalogSummary> {
        let mut summary = CatalogSummary::default();

        for (index, record) in catalog.iter().enumerate() {
            let descriptor = match record.to_descriptor() {
                Ok(descriptor) => descriptor,
                Err(reason) => {
                    log::warn!("Skipping catalog entry #{} ('{}'): {}", index, record.name, reason);
                    summary.skipped += 1;
                    continue;
                }
            };

            if self.create_pool(descriptor)?.is_duplicate() {
                summary.duplicates += 1;
            } else {
                summary.created += 1;
            }
        }

        log::info!(
            "Initialized {} pools from catalog ({} duplicates, {} skipped)",
            summary.created,
            summary.duplicates,
            summary.skipped
        );
        Ok(summary)
    }

    /// Acquire an instance of `name` at `placement`
    pub fn acquire(&mut self, name: &str, placement: Placement) -> PoolResult<InstanceHandle> {
        match self.pools.get_mut(name) {
            Some(pool) => pool.acquire(placement),
            None => {
                log::error!("Acquire for unknown archetype '{}'", name);
                Err(PoolError::UnknownArchetype { name: name.to_string() })
            }
        }
    }

    /// Release an instance back to the pool named in its handle
    pub fn release(&mut self, handle: &InstanceHandle) -> PoolResult<()> {
        match self.pools.get_mut(handle.archetype()) {
            Some(pool) => pool.release(handle),
            None => {
                log::error!(
                    "Release of {} for unregistered archetype '{}'; instance was destroyed with its pool",
                    handle,
                    handle.archetype()
                );
                Err(PoolError::UnknownArchetype {
                    name: handle.archetype().to_string(),
                })
            }
        }
    }

    /// Release every active instance in every pool (scene teardown)
    pub fn release_all(&mut self) -> usize {
        self.pools.values_mut().map(Pool::release_all).sum()
    }

    /// Advance every pool's clock and process auto-releases
    pub fn update(&mut self, delta_time: f32) -> usize {
        self.pools.values_mut().map(|pool| pool.update(delta_time)).sum()
    }

    /// Tear down one pool and forget its archetype
    pub fn clear_pool(&mut self, name: &str) -> PoolResult<()> {
        let mut pool = self
            .pools
            .remove(name)
            .ok_or_else(|| PoolError::UnknownArchetype { name: name.to_string() })?;
        pool.clear();
        Ok(())
    }

    /// Tear down every pool and empty the registry
    pub fn clear_all(&mut self) {
        let count = self.pools.len();
        for pool in self.pools.values_mut() {
            pool.clear();
        }
        self.pools.clear();
        log::info!("Cleared all {} pools", count);
    }

    /// Statistics for one archetype
    pub fn stats(&self, name: &str) -> Option<PoolStats> {
        self.pools.get(name).map(Pool::stats)
    }

    /// Statistics for every registered archetype
    pub fn all_stats(&self) -> impl Iterator<Item = (&str, PoolStats)> {
        self.pools.iter().map(|(name, pool)| (name.as_str(), pool.stats()))
    }

    /// Pool registered under `name`
    pub fn pool(&self, name: &str) -> Option<&Pool> {
        self.pools.get(name)
    }

    /// Mutable pool registered under `name`
    pub fn pool_mut(&mut self, name: &str) -> Option<&mut Pool> {
        self.pools.get_mut(name)
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.pools.contains_key(name)
    }

    /// Registered archetype names, in no particular order
    pub fn archetype_names(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    /// Number of registered pools
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether no pool is registered
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Total active instances across all pools
    pub fn total_active(&self) -> usize {
        self.pools.values().map(Pool::active_count).sum()
    }

    fn register(&mut self, descriptor: ArchetypeDescriptor, prewarm: bool) -> PoolResult<Registered<'_>> {
        match self.pools.entry(descriptor.name().to_string()) {
            Entry::Occupied(entry) => {
                log::warn!("Archetype '{}' already registered; keeping existing pool", entry.key());
                Ok(Registered::Existing(entry.into_mut()))
            }
            Entry::Vacant(entry) => {
                descriptor
                    .prototype()
                    .validate()
                    .map_err(|reason| PoolError::InvalidPrototype {
                        name: descriptor.name().to_string(),
                        reason,
                    })?;

                let pool = if prewarm {
                    Pool::with_initial_instances(descriptor)
                } else {
                    Pool::new(descriptor)
                };
                log::info!(
                    "Created pool '{}' with {} instances (ceiling {}, auto-expand {})",
                    pool.name(),
                    pool.total_created(),
                    pool.descriptor().capacity_ceiling(),
                    pool.descriptor().allow_auto_expand()
                );
                Ok(Registered::Created(entry.insert(pool)))
            }
        }
    }
}
