//! Engine configuration.
//!
//! Every knob has a default, so a partial configuration file (or none at all)
//! yields a working engine. `reactor-data` loads this struct from RON, TOML
//! or JSON.

use crate::fixed::{Fixed64, Ticks, f64_to_fixed64};
use serde::{Deserialize, Serialize};

/// Tunable constants for the orchestration engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Maximum quantity a single reactor can hold.
    pub reactor_capacity: u32,

    /// Chebyshev distance within which two reactors can interact.
    pub interaction_range: u32,

    /// Smallest quantity a reactor must hold (or have free) to act.
    pub min_batch: u32,

    /// External stock at or above which a reagent is not synthesized first
    /// when expanding a reaction chain.
    pub sufficiency_threshold: u32,

    /// Multiplier applied to the amount of every prerequisite chain step.
    pub prerequisite_headroom: f64,

    /// Ticks between unconditional clears of the in-memory layout cache.
    pub layout_cache_ttl: Ticks,

    /// Ticks a persisted layout is trusted before it is checked against
    /// live reactor positions again.
    pub layout_revalidation_window: Ticks,

    /// Minimum ticks between two full passes over every room.
    pub run_interval: Ticks,

    /// An input reactor holding less than this is worth restocking.
    pub stock_threshold: u32,

    /// A reactor holding at least this much finished material is worth
    /// unloading right away.
    pub evacuation_threshold: u32,

    /// Minimum ticks between two restarts of the same evacuating order.
    pub restart_cooldown: Ticks,

    /// Drop an active order after it has been active this many ticks.
    /// `None` keeps orders until they complete or are cancelled.
    pub stale_order_timeout: Option<Ticks>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            reactor_capacity: 3000,
            interaction_range: 2,
            min_batch: 5,
            sufficiency_threshold: 1000,
            prerequisite_headroom: 1.2,
            layout_cache_ttl: 10,
            layout_revalidation_window: 50,
            run_interval: 3,
            stock_threshold: 1000,
            evacuation_threshold: 1000,
            restart_cooldown: 50,
            stale_order_timeout: None,
        }
    }
}

impl LabConfig {
    /// The prerequisite headroom as a fixed-point factor.
    pub fn headroom(&self) -> Fixed64 {
        f64_to_fixed64(self.prerequisite_headroom)
    }

    /// Fewest reactors that can form a group: two inputs and one output.
    pub const MIN_GROUP_SIZE: usize = 3;
}
