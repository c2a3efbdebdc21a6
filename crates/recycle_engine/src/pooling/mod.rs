//! Object recycling system
//!
//! This module keeps pre-constructed, short-lived entities (projectiles,
//! effects, debris, pickups) in per-archetype pools so they can be handed out
//! and taken back without paying construction cost on the hot path.
//!
//! - [`Pool`] owns every instance of one archetype and tracks which are resting
//!   and which are active.
//! - [`PoolRegistry`] maps archetype names to pools and routes requests.
//! - [`PrewarmScheduler`] spreads bulk construction across ticks.
//! - [`RecyclableInstance`] carries the activation state and lifecycle facets.

pub mod archetype;
pub mod error;
pub mod expiry;
pub mod instance;
pub mod pool;
pub mod prewarm;
pub mod registry;

#[cfg(test)]
mod tests;

pub use archetype::*;
pub use error::*;
pub use expiry::ExpiryQueue;
pub use instance::*;
pub use pool::*;
pub use prewarm::*;
pub use registry::*;
