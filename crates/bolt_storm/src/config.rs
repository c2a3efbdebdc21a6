//! Demo configuration

use recycle_engine::config::{ArchetypeEntryConfig, CatalogConfig, Config};
use serde::{Deserialize, Serialize};

/// Storm simulation settings plus the archetype catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StormConfig {
    /// Simulated ticks after prewarm finishes
    pub ticks: u32,

    /// Ticks per simulated second
    pub tick_rate: f32,

    /// Fewest bolts fired per tick
    pub burst_min: u32,

    /// Most bolts fired per tick
    pub burst_max: u32,

    /// Chance per tick that a live bolt hits something
    pub impact_chance: f64,

    /// Sparks emitted per impact
    pub sparks_per_impact: u32,

    /// Chance that an impact also throws debris
    pub debris_chance: f64,

    /// Muzzle speed of bolts in units per second
    pub bolt_speed: f32,

    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,

    /// Archetypes and prewarm budget
    pub catalog: CatalogConfig,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            ticks: 600,
            tick_rate: 60.0,
            burst_min: 0,
            burst_max: 12,
            impact_chance: 0.02,
            sparks_per_impact: 3,
            debris_chance: 0.25,
            bolt_speed: 40.0,
            seed: None,
            catalog: CatalogConfig {
                archetypes: vec![
                    ArchetypeEntryConfig {
                        name: "Bolt".to_string(),
                        prototype: "bolt".to_string(),
                        initial_count: 64,
                        capacity_ceiling: 256,
                        auto_release_seconds: 1.5,
                        ..ArchetypeEntryConfig::default()
                    },
                    ArchetypeEntryConfig {
                        name: "Spark".to_string(),
                        prototype: "spark".to_string(),
                        initial_count: 32,
                        auto_release_seconds: 0.4,
                        ..ArchetypeEntryConfig::default()
                    },
                    ArchetypeEntryConfig {
                        name: "Debris".to_string(),
                        prototype: "debris".to_string(),
                        initial_count: 16,
                        capacity_ceiling: 48,
                        allow_auto_expand: false,
                        auto_release_seconds: 3.0,
                        ..ArchetypeEntryConfig::default()
                    },
                ],
                prewarm_budget_per_tick: 16,
            },
        }
    }
}

impl Config for StormConfig {}

impl StormConfig {
    /// Fixed timestep in seconds
    pub fn delta_time(&self) -> f32 {
        if self.tick_rate > 0.0 {
            1.0 / self.tick_rate
        } else {
            1.0 / 60.0
        }
    }
}
