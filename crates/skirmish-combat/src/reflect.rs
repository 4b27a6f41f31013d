//! Counted, probabilistic damage reflection.
//!
//! A [`ReflectRecord`] lives in the defender's buff state. Before each
//! incoming damage component the defender rolls it; a trigger applies the
//! configured effect onto the attacker. Once `count` reflections have fired
//! the owning buff is removed.

use serde::{Deserialize, Serialize};
use skirmish_common::EffectId;

use crate::buff::EffectSkill;
use crate::random::RandomSource;

/// Reflect rule carried by effect metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectMetadata {
    /// Maximum number of reflections.
    pub count: u32,
    /// Trigger probability in `[0, 1]`. `1.0` skips the roll.
    pub rate: f64,
    /// Effect applied to the attacker.
    pub effect_id: EffectId,
    /// Level of the applied effect.
    pub effect_level: i16,
}

/// Outcome of rolling a reflect record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectOutcome {
    /// Counter already reached the cap
    Exhausted,
    /// The probability roll failed
    Missed,
    /// Reflection fired
    Triggered {
        /// Effect to apply to the attacker
        effect: EffectSkill,
        /// Whether this reflection used up the last charge
        exhausted: bool,
    },
}

/// Active reflect rule of one actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectRecord {
    /// Buff that installed this rule
    pub source_buff_id: EffectId,
    counter: u32,
    /// Rule parameters
    pub metadata: ReflectMetadata,
}

impl ReflectRecord {
    /// Creates a fresh record with no reflections used.
    #[must_use]
    pub fn new(source_buff_id: EffectId, metadata: ReflectMetadata) -> Self {
        Self {
            source_buff_id,
            counter: 0,
            metadata,
        }
    }

    /// Reflections fired so far.
    #[must_use]
    pub const fn counter(&self) -> u32 {
        self.counter
    }

    /// Whether every charge has been used.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.counter >= self.metadata.count
    }

    /// Rolls the rule and consumes a charge on success.
    pub fn try_trigger(&mut self, rng: &dyn RandomSource) -> ReflectOutcome {
        if self.is_exhausted() {
            return ReflectOutcome::Exhausted;
        }

        if self.metadata.rate < 1.0 && rng.next_f64() >= self.metadata.rate {
            return ReflectOutcome::Missed;
        }

        self.counter += 1;
        ReflectOutcome::Triggered {
            effect: EffectSkill::new(self.metadata.effect_id, self.metadata.effect_level),
            exhausted: self.is_exhausted(),
        }
    }
}
