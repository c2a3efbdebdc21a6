//! Archetype catalog configuration
//!
//! Serializable form of [`ArchetypeCatalog`]. Prototypes cannot live in a file,
//! so each entry names one by key and [`CatalogConfig::resolve`] looks it up in
//! a [`PrototypeLibrary`].
//!
//! ```toml
//! prewarm_budget_per_tick = 16
//!
//! [[archetypes]]
//! name = "Bolt"
//! prototype = "bolt"
//! initial_count = 64
//! capacity_ceiling = 256
//! auto_release_seconds = 1.5
//! ```

use crate::config::Config;
use crate::pooling::{ArchetypeCatalog, ArchetypeRecord, PrototypeLibrary};
use serde::{Deserialize, Serialize};

/// Default number of constructions the prewarm scheduler performs per tick
pub const DEFAULT_PREWARM_BUDGET: usize = 8;

/// One archetype as written in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeEntryConfig {
    /// Archetype name
    pub name: String,
    /// Key of the prototype in the library
    pub prototype: String,
    /// Instances to construct up front
    pub initial_count: usize,
    /// Maximum instances ever constructed (0 = unbounded)
    pub capacity_ceiling: usize,
    /// Whether an empty pool may grow on demand
    pub allow_auto_expand: bool,
    /// Seconds until an active instance is returned automatically (0 = never)
    pub auto_release_seconds: f32,
}

impl Default for ArchetypeEntryConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            prototype: String::new(),
            initial_count: 0,
            capacity_ceiling: 0,
            allow_auto_expand: true,
            auto_release_seconds: 0.0,
        }
    }
}

/// Catalog and prewarm settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Archetypes in registration order
    pub archetypes: Vec<ArchetypeEntryConfig>,
    /// Constructions per prewarm tick
    pub prewarm_budget_per_tick: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            archetypes: Vec::new(),
            prewarm_budget_per_tick: DEFAULT_PREWARM_BUDGET,
        }
    }
}

impl Config for CatalogConfig {}

impl CatalogConfig {
    /// Build the runtime catalog, attaching prototypes from `library`
    ///
    /// Unknown prototype keys yield records without a prototype; the registry
    /// skips those with a warning instead of failing the whole load.
    pub fn resolve(&self, library: &PrototypeLibrary) -> ArchetypeCatalog {
        self.archetypes
            .iter()
            .map(|entry| {
                let prototype = library.get(&entry.prototype);
                if prototype.is_none() {
                    log::warn!(
                        "Archetype '{}' refers to unknown prototype '{}'",
                        entry.name,
                        entry.prototype
                    );
                }

                ArchetypeRecord {
                    name: entry.name.clone(),
                    prototype,
                    initial_count: entry.initial_count,
                    capacity_ceiling: entry.capacity_ceiling,
                    allow_auto_expand: entry.allow_auto_expand,
                    auto_release_seconds: entry.auto_release_seconds,
                }
            })
            .collect()
    }
}
