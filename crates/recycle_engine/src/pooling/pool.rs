//! Single-archetype object pool
//!
//! A [`Pool`] owns every instance of exactly one archetype and recycles them
//! in place. Instances live in a generational slot map; the pool tracks which
//! keys are resting (`available`, a LIFO stack so the most recently released
//! instance is reused first) and which are lent out (`active`).
//!
//! # Invariants
//!
//! - `available ∩ active = ∅`
//! - `|available| + |active| = total_created`
//! - `total_created ≤ capacity_ceiling` whenever the ceiling is nonzero
//!
//! # Performance Characteristics
//!
//! - **Acquire/Release**: O(1) amortized, no allocation once prewarmed
//! - **Auto-release**: one shared deadline heap per pool, O(1) cancellation
//! - **Growth**: auto-expand adds 25% of the current population (at least one)

use crate::foundation::collections::{InstanceKey, InstanceMap};
use crate::foundation::time::TickClock;
use crate::pooling::archetype::ArchetypeDescriptor;
use crate::pooling::error::{PoolError, PoolResult};
use crate::pooling::expiry::ExpiryQueue;
use crate::pooling::instance::{InstanceHandle, Placement, PoolStamp, RecyclableInstance};
use std::collections::HashSet;
use std::rc::Rc;

/// Fraction of the current population added by one auto-expand step
const AUTO_EXPAND_DIVISOR: usize = 4;

/// Snapshot of a pool's occupancy and lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances currently lent out
    pub active: usize,
    /// Instances resting and ready for acquisition
    pub available: usize,
    /// Instances constructed since construction or the last clear
    pub total_created: usize,
    /// Highest simultaneous active count observed
    pub peak_active: usize,
    /// Acquisitions refused because the pool was exhausted
    pub exhaustions: u64,
    /// Instances returned by the auto-release timeout
    pub auto_releases: u64,
}

/// Pool of recyclable instances for one archetype
pub struct Pool {
    descriptor: ArchetypeDescriptor,
    archetype: Rc<str>,
    stamp: PoolStamp,
    instances: InstanceMap<RecyclableInstance>,
    available: Vec<InstanceKey>,
    active: HashSet<InstanceKey>,
    total_created: usize,
    clock: TickClock,
    expiry: ExpiryQueue,
    peak_active: usize,
    exhaustions: u64,
    auto_releases: u64,
}

impl Pool {
    /// Create an empty pool; no instances are constructed yet
    pub fn new(descriptor: ArchetypeDescriptor) -> Self {
        let archetype: Rc<str> = Rc::from(descriptor.name());

        Self {
            descriptor,
            archetype,
            stamp: PoolStamp::next(),
            instances: InstanceMap::with_key(),
            available: Vec::new(),
            active: HashSet::new(),
            total_created: 0,
            clock: TickClock::new(),
            expiry: ExpiryQueue::new(),
            peak_active: 0,
            exhaustions: 0,
            auto_releases: 0,
        }
    }

    /// Create a pool and construct its initial instances (clamped to the ceiling)
    pub fn with_initial_instances(descriptor: ArchetypeDescriptor) -> Self {
        let initial = descriptor.initial_count();
        let mut pool = Self::new(descriptor);
        pool.grow(initial);
        pool
    }

    /// Construct up to `count` resting instances without exceeding the ceiling
    ///
    /// Returns how many were actually created; hitting the ceiling truncates silently.
    pub fn grow(&mut self, count: usize) -> usize {
        let count = self.headroom().map_or(count, |headroom| count.min(headroom));
        if count == 0 {
            return 0;
        }

        self.available.reserve(count);
        self.active.reserve(count);

        for _ in 0..count {
            let facets = self.descriptor.prototype().instantiate();
            let instance = RecyclableInstance::new(Rc::clone(&self.archetype), facets);
            let key = self.instances.insert(instance);
            self.available.push(key);
            self.total_created += 1;
        }

        log::debug!(
            "Grew pool '{}' by {} (total {}, ceiling {})",
            self.archetype,
            count,
            self.total_created,
            self.descriptor.capacity_ceiling()
        );
        count
    }

    /// Lend out one instance at `placement`
    ///
    /// Grows the pool once when it is empty and auto-expand is allowed.
    /// Fails with [`PoolError::PoolExhausted`] otherwise; the pool is left untouched
    /// apart from its exhaustion counter.
    pub fn acquire(&mut self, placement: Placement) -> PoolResult<InstanceHandle> {
        if !placement.is_finite() {
            log::warn!("Acquiring '{}' at non-finite position {:?}", self.archetype, placement.position);
        }

        if self.available.is_empty() && self.auto_expand() == 0 {
            return Err(self.exhausted());
        }

        let Some(key) = self.available.pop() else {
            return Err(self.exhausted());
        };
        let Some(instance) = self.instances.get_mut(key) else {
            log::error!("Pool '{}' lost track of instance {:?}", self.archetype, key);
            return Err(self.exhausted());
        };

        instance.activate(placement);
        if let Some(timeout) = self.descriptor.auto_release() {
            let token = self.expiry.schedule(key, self.clock.now() + f64::from(timeout));
            instance.set_release_token(Some(token));
        }

        self.active.insert(key);
        self.peak_active = self.peak_active.max(self.active.len());

        log::trace!("Acquired {:?} from '{}' at {:?}", key, self.archetype, placement.position);
        Ok(InstanceHandle::new(Rc::clone(&self.archetype), self.stamp, key))
    }

    /// Return a lent-out instance to the pool
    ///
    /// Fails with [`PoolError::NotOwned`] for double releases, handles from other
    /// pools and handles issued before a clear; no state changes in that case.
    pub fn release(&mut self, handle: &InstanceHandle) -> PoolResult<()> {
        let key = handle.key();
        if handle.stamp() != self.stamp || !self.active.remove(&key) {
            log::warn!("Rejected release of {} by pool '{}': not active here", handle, self.archetype);
            return Err(PoolError::NotOwned {
                archetype: self.archetype.to_string(),
                handle: handle.clone(),
            });
        }

        self.return_to_available(key);
        log::trace!("Released {:?} to '{}'", key, self.archetype);
        Ok(())
    }

    /// Release every active instance; returns how many were released
    pub fn release_all(&mut self) -> usize {
        let snapshot: Vec<InstanceKey> = self.active.drain().collect();
        for &key in &snapshot {
            self.return_to_available(key);
        }
        self.expiry.clear();

        if !snapshot.is_empty() {
            log::debug!("Released all {} active instances of '{}'", snapshot.len(), self.archetype);
        }
        snapshot.len()
    }

    /// Release everything, then destroy every instance and reset the counters
    ///
    /// The pool behaves as freshly constructed afterwards; handles issued before
    /// the clear are rejected as not owned.
    pub fn clear(&mut self) {
        self.release_all();

        let destroyed = self.instances.len();
        self.instances.clear();
        self.available.clear();
        self.active.clear();
        self.expiry.clear();
        self.total_created = 0;
        self.peak_active = 0;
        self.exhaustions = 0;
        self.auto_releases = 0;
        self.clock.reset();
        self.stamp = PoolStamp::next();

        log::info!("Cleared pool '{}' ({} instances destroyed)", self.archetype, destroyed);
    }

    /// Advance the pool clock and auto-release expired instances
    ///
    /// Call once per tick. Returns the number of instances released.
    pub fn update(&mut self, delta_time: f32) -> usize {
        self.clock.advance(delta_time);
        let now = self.clock.now();
        let mut released = 0;

        while let Some((key, token)) = self.expiry.pop_due(now) {
            let due = self
                .instances
                .get(key)
                .is_some_and(|instance| instance.is_active() && instance.release_token() == Some(token));
            if due && self.active.remove(&key) {
                self.return_to_available(key);
                released += 1;
            }
        }

        if released > 0 {
            self.auto_releases += released as u64;
            log::trace!("Auto-released {} instances of '{}'", released, self.archetype);
        }

        let instances = &self.instances;
        self.expiry.compact_if_bloated(self.active.len(), |key, token| {
            instances
                .get(key)
                .is_some_and(|instance| instance.release_token() == Some(token))
        });

        released
    }

    /// Active instance behind `handle`, if this pool lent it out
    pub fn instance(&self, handle: &InstanceHandle) -> Option<&RecyclableInstance> {
        if self.owns(handle) {
            self.instances.get(handle.key())
        } else {
            None
        }
    }

    /// Mutable access to the active instance behind `handle`
    pub fn instance_mut(&mut self, handle: &InstanceHandle) -> Option<&mut RecyclableInstance> {
        if self.owns(handle) {
            self.instances.get_mut(handle.key())
        } else {
            None
        }
    }

    /// Whether `handle` refers to an instance this pool currently has lent out
    pub fn owns(&self, handle: &InstanceHandle) -> bool {
        handle.stamp() == self.stamp && self.active.contains(&handle.key())
    }

    /// Visit every active instance
    pub fn for_each_active<F>(&self, mut callback: F)
    where
        F: FnMut(InstanceKey, &RecyclableInstance),
    {
        for &key in &self.active {
            if let Some(instance) = self.instances.get(key) {
                callback(key, instance);
            }
        }
    }

    /// Occupancy and counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.active.len(),
            available: self.available.len(),
            total_created: self.total_created,
            peak_active: self.peak_active,
            exhaustions: self.exhaustions,
            auto_releases: self.auto_releases,
        }
    }

    /// Archetype name
    pub fn name(&self) -> &str {
        &self.archetype
    }

    /// Descriptor the pool was built from
    pub fn descriptor(&self) -> &ArchetypeDescriptor {
        &self.descriptor
    }

    /// Instances constructed so far
    pub fn total_created(&self) -> usize {
        self.total_created
    }

    /// Instances currently lent out
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Instances ready for acquisition
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Remaining construction budget (`None` = unbounded)
    pub fn headroom(&self) -> Option<usize> {
        self.descriptor
            .ceiling()
            .map(|ceiling| ceiling.saturating_sub(self.total_created))
    }

    /// Seconds on the pool's simulation clock
    pub fn clock_seconds(&self) -> f64 {
        self.clock.now()
    }

    /// Verify the structural invariants, describing the first violation found
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(key) = self.available.iter().find(|key| self.active.contains(key)) {
            return Err(format!("{:?} is both available and active", key));
        }
        let tracked = self.available.len() + self.active.len();
        if tracked != self.total_created || self.instances.len() != self.total_created {
            return Err(format!(
                "tracked {} / stored {} instances but total_created is {}",
                tracked,
                self.instances.len(),
                self.total_created
            ));
        }
        if let Some(ceiling) = self.descriptor.ceiling() {
            if self.total_created > ceiling {
                return Err(format!("total_created {} exceeds ceiling {}", self.total_created, ceiling));
            }
        }
        Ok(())
    }

    fn return_to_available(&mut self, key: InstanceKey) {
        if let Some(instance) = self.instances.get_mut(key) {
            instance.deactivate();
        }
        self.available.push(key);
    }

    fn auto_expand(&mut self) -> usize {
        if !self.descriptor.allow_auto_expand() {
            return 0;
        }
        let step = (self.total_created / AUTO_EXPAND_DIVISOR).max(1);
        self.grow(step)
    }

    fn exhausted(&mut self) -> PoolError {
        self.exhaustions += 1;
        log::warn!(
            "Pool '{}' exhausted ({}/{} active, ceiling {})",
            self.archetype,
            self.active.len(),
            self.total_created,
            self.descriptor.capacity_ceiling()
        );

        PoolError::PoolExhausted {
            archetype: self.archetype.to_string(),
            active: self.active.len(),
            total_created: self.total_created,
            capacity_ceiling: self.descriptor.capacity_ceiling(),
        }
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("archetype", &self.archetype)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
