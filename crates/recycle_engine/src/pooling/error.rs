//! Error taxonomy for the recycling engine

use crate::pooling::instance::InstanceHandle;
use thiserror::Error;

/// Result type for pool and registry operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur while acquiring, releasing or registering pooled instances
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// No instance is available and the pool may not (or can no longer) grow.
    ///
    /// Expected under burst load; the caller should skip the spawn this frame.
    #[error("pool '{archetype}' exhausted: {active} active, {total_created} created (ceiling {capacity_ceiling})")]
    PoolExhausted {
        /// Archetype of the exhausted pool
        archetype: String,
        /// Instances currently lent out
        active: usize,
        /// Instances constructed so far
        total_created: usize,
        /// Capacity ceiling of the pool (0 = unbounded)
        capacity_ceiling: usize,
    },

    /// No pool is registered under this archetype name
    #[error("unknown archetype '{name}'")]
    UnknownArchetype {
        /// The name that failed to resolve
        name: String,
    },

    /// The handle does not refer to an instance currently lent out by this pool
    #[error("instance {handle} is not active in pool '{archetype}'")]
    NotOwned {
        /// Pool that rejected the release
        archetype: String,
        /// The rejected handle
        handle: InstanceHandle,
    },

    /// An archetype with this name is already registered
    #[error("archetype '{name}' is already registered")]
    DuplicateArchetype {
        /// The duplicated name
        name: String,
    },

    /// The prototype refused to construct instances
    #[error("prototype for archetype '{name}' is invalid: {reason}")]
    InvalidPrototype {
        /// Archetype whose prototype failed validation
        name: String,
        /// Reason reported by the prototype
        reason: String,
    },
}

impl PoolError {
    /// Whether the caller can simply carry on (skip the spawn, keep the existing pool)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. } | Self::DuplicateArchetype { .. })
    }
}
