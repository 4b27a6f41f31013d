//! Damage calculation.
//!
//! Resolves one damage component between an attacker and a defender into a
//! [`DamageType`] and an amount. The calculator itself is stateless; every
//! roll is drawn from the [`RandomSource`] passed in.
//!
//! Resolution order:
//! 1. Miss: `draw >= hit_chance`
//! 2. Block: `draw < block_chance`
//! 3. Critical: `draw < crit_chance`
//! 4. Otherwise normal damage

use serde::{Deserialize, Serialize};

use crate::damage::DamageType;
use crate::random::RandomSource;
use crate::stats::{BasicAttribute, Stats};

/// Which attack stat a damage component scales from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Scales from physical attack.
    #[default]
    Physical,
    /// Scales from magical attack.
    Magical,
}

impl AttackKind {
    /// Attack attribute read for this kind.
    #[must_use]
    pub const fn attribute(self) -> BasicAttribute {
        match self {
            Self::Physical => BasicAttribute::PhysicalAtk,
            Self::Magical => BasicAttribute::MagicalAtk,
        }
    }
}

/// Per-attack damage properties carried by skill metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageProperties {
    /// Attack stat to scale from.
    pub kind: AttackKind,
    /// Multiplier on the attack stat.
    pub rate: f64,
    /// Whether this damage can crit.
    pub can_crit: bool,
    /// Whether this damage can miss.
    pub can_miss: bool,
    /// Whether this damage can be blocked.
    pub can_block: bool,
}

impl Default for DamageProperties {
    fn default() -> Self {
        Self {
            kind: AttackKind::Physical,
            rate: 1.0,
            can_crit: true,
            can_miss: true,
            can_block: true,
        }
    }
}

impl DamageProperties {
    /// Sets the attack kind (builder).
    #[must_use]
    pub fn with_kind(mut self, kind: AttackKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the damage rate (builder).
    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate.max(0.0);
        self
    }

    /// Disables miss, block and crit rolls.
    #[must_use]
    pub fn guaranteed(mut self) -> Self {
        self.can_crit = false;
        self.can_miss = false;
        self.can_block = false;
        self
    }
}

/// Configuration for damage calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Defense scaling factor for diminishing returns.
    pub defense_scaling: f64,
    /// Damage multiplier on critical hits.
    pub crit_multiplier: f64,
    /// Hit chance with equal accuracy and evasion.
    pub base_hit_rate: f64,
    /// Lower bound of the hit chance.
    pub min_hit_rate: f64,
    /// Hit chance gained per point of accuracy over evasion.
    pub accuracy_scale: f64,
    /// Minimum damage of a landed hit.
    pub min_damage: f64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            defense_scaling: 100.0,
            crit_multiplier: 2.0,
            base_hit_rate: 0.9,
            min_hit_rate: 0.5,
            accuracy_scale: 0.01,
            min_damage: 1.0,
        }
    }
}

/// Result of resolving one damage component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Classification of the hit.
    pub damage_type: DamageType,
    /// Damage amount (zero for misses and blocks).
    pub amount: f64,
}

impl DamageOutcome {
    const fn empty(damage_type: DamageType) -> Self {
        Self {
            damage_type,
            amount: 0.0,
        }
    }
}

/// Calculator for damage values.
#[derive(Debug, Clone, Default)]
pub struct DamageCalculator {
    /// Configuration.
    pub config: CalculatorConfig,
}

impl DamageCalculator {
    /// Create new calculator with default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create calculator with config.
    #[must_use]
    pub fn with_config(config: CalculatorConfig) -> Self {
        Self { config }
    }

    /// Resolve one damage component.
    pub fn calculate(
        &self,
        attacker: &Stats,
        defender: &Stats,
        properties: &DamageProperties,
        rng: &dyn RandomSource,
    ) -> DamageOutcome {
        if properties.can_miss && rng.next_f64() >= self.hit_chance(attacker, defender) {
            return DamageOutcome::empty(DamageType::Miss);
        }

        if properties.can_block && rng.next_f64() < self.block_chance(defender) {
            return DamageOutcome::empty(DamageType::Block);
        }

        let base = self.base_damage(attacker, defender, properties);

        if properties.can_crit && rng.next_f64() < self.crit_chance(attacker, defender) {
            return DamageOutcome {
                damage_type: DamageType::Critical,
                amount: base * self.config.crit_multiplier,
            };
        }

        DamageOutcome {
            damage_type: DamageType::Normal,
            amount: base,
        }
    }

    /// Chance that a hit lands.
    #[must_use]
    pub fn hit_chance(&self, attacker: &Stats, defender: &Stats) -> f64 {
        let accuracy = attacker.current(BasicAttribute::Accuracy) as f64;
        let evasion = defender.current(BasicAttribute::Evasion) as f64;
        let chance = self.config.base_hit_rate + (accuracy - evasion) * self.config.accuracy_scale;
        chance.clamp(self.config.min_hit_rate.clamp(0.0, 1.0), 1.0)
    }

    /// Chance that the defender blocks.
    #[must_use]
    pub fn block_chance(&self, defender: &Stats) -> f64 {
        per_mille(defender.current(BasicAttribute::BlockRate))
    }

    /// Chance of a critical hit.
    #[must_use]
    pub fn crit_chance(&self, attacker: &Stats, defender: &Stats) -> f64 {
        per_mille(
            attacker.current(BasicAttribute::CriticalRate)
                - defender.current(BasicAttribute::CriticalEvasion),
        )
    }

    /// Fraction of damage removed by defense.
    /// Formula: reduction = defense / (defense + scaling_factor)
    #[must_use]
    pub fn defense_reduction(&self, defense: i64) -> f64 {
        if defense <= 0 {
            0.0
        } else {
            let defense = defense as f64;
            defense / (defense + self.config.defense_scaling)
        }
    }

    /// Damage of a landed, non-critical hit.
    #[must_use]
    pub fn base_damage(
        &self,
        attacker: &Stats,
        defender: &Stats,
        properties: &DamageProperties,
    ) -> f64 {
        let attack = attacker.current(properties.kind.attribute()) as f64;
        let reduction = self.defense_reduction(defender.current(BasicAttribute::Defense));
        (attack * properties.rate * (1.0 - reduction)).max(self.config.min_damage)
    }
}

fn per_mille(value: i64) -> f64 {
    (value as f64 / 1000.0).clamp(0.0, 1.0)
}
