//! Combat configuration.

use serde::{Deserialize, Serialize};

use crate::calculator::CalculatorConfig;

/// Tunables of a combat field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Capacity of the field event bus
    pub event_capacity: usize,
    /// Seed for combat rolls (None = random)
    pub rng_seed: Option<u64>,
    /// Damage calculator tuning
    pub calculator: CalculatorConfig,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            event_capacity: 1024,
            rng_seed: None,
            calculator: CalculatorConfig::default(),
        }
    }
}
