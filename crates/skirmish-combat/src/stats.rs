//! Per-actor stat store.
//!
//! Every value is an atomic so concurrent attackers can apply damage to the
//! same actor without an external lock. `add` is a single clamped
//! compare-and-swap: no delta is ever lost between two writers.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Numeric attributes tracked for every actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicAttribute {
    /// Hit points; depletion drives death
    Health,
    /// Spirit resource
    Spirit,
    /// Stamina resource
    Stamina,
    /// Physical attack power
    PhysicalAtk,
    /// Magical attack power
    MagicalAtk,
    /// Armor-like damage reduction
    Defense,
    /// Raises hit chance
    Accuracy,
    /// Lowers the attacker's hit chance
    Evasion,
    /// Critical chance in per-mille
    CriticalRate,
    /// Subtracted from the attacker's critical rate (per-mille)
    CriticalEvasion,
    /// Block chance in per-mille
    BlockRate,
}

impl BasicAttribute {
    /// Number of attributes.
    pub const COUNT: usize = 11;

    /// All attributes in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Health,
        Self::Spirit,
        Self::Stamina,
        Self::PhysicalAtk,
        Self::MagicalAtk,
        Self::Defense,
        Self::Accuracy,
        Self::Evasion,
        Self::CriticalRate,
        Self::CriticalEvasion,
        Self::BlockRate,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// A current/total pair.
#[derive(Debug, Default)]
pub struct StatValue {
    current: AtomicI64,
    total: AtomicI64,
}

impl StatValue {
    /// Creates a full stat value.
    #[must_use]
    pub fn new(total: i64) -> Self {
        let total = total.max(0);
        Self {
            current: AtomicI64::new(total),
            total: AtomicI64::new(total),
        }
    }

    /// Returns the current value.
    #[must_use]
    pub fn current(&self) -> i64 {
        self.current.load(Ordering::Acquire)
    }

    /// Returns the maximum value.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.total.load(Ordering::Acquire)
    }

    /// Adds `delta` (may be negative), clamped to `[0, total]`.
    ///
    /// Returns the delta actually applied.
    pub fn add(&self, delta: i64) -> i64 {
        let total = self.total();
        let mut applied = 0;
        let _ = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.saturating_add(delta).clamp(0, total);
                applied = next - current;
                Some(next)
            });
        applied
    }

    /// Sets the current value, clamped to `[0, total]`.
    pub fn set(&self, value: i64) {
        self.current
            .store(value.clamp(0, self.total()), Ordering::Release);
    }

    /// Sets the maximum value, clamping current down if needed.
    pub fn set_total(&self, total: i64) {
        let total = total.max(0);
        self.total.store(total, Ordering::Release);
        let _ = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.min(total))
            });
    }
}

/// Stat store for one actor.
#[derive(Debug)]
pub struct Stats {
    values: [StatValue; BasicAttribute::COUNT],
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    /// Creates a stat store with every attribute at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| StatValue::default()),
        }
    }

    /// Sets an attribute to a full value of `total` (builder).
    #[must_use]
    pub fn with(self, attribute: BasicAttribute, total: i64) -> Self {
        let value = self.get(attribute);
        value.set_total(total);
        value.set(total);
        self
    }

    /// Returns the value for an attribute.
    #[must_use]
    pub fn get(&self, attribute: BasicAttribute) -> &StatValue {
        &self.values[attribute.index()]
    }

    /// Returns the current value of an attribute.
    #[must_use]
    pub fn current(&self, attribute: BasicAttribute) -> i64 {
        self.get(attribute).current()
    }

    /// Returns the maximum value of an attribute.
    #[must_use]
    pub fn total(&self, attribute: BasicAttribute) -> i64 {
        self.get(attribute).total()
    }

    /// Adds a delta to an attribute. See [`StatValue::add`].
    pub fn add(&self, attribute: BasicAttribute, delta: i64) -> i64 {
        self.get(attribute).add(delta)
    }

    /// Current/total ratio of an attribute (0.0 when total is zero).
    #[must_use]
    pub fn ratio(&self, attribute: BasicAttribute) -> f32 {
        let value = self.get(attribute);
        let total = value.total();
        if total <= 0 {
            0.0
        } else {
            value.current() as f32 / total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_clamps_to_bounds() {
        let health = StatValue::new(100);
        assert_eq!(health.add(-30), -30);
        assert_eq!(health.current(), 70);

        assert_eq!(health.add(-500), -70);
        assert_eq!(health.current(), 0);

        assert_eq!(health.add(250), 100);
        assert_eq!(health.current(), 100);
    }

    #[test]
    fn test_set_total_clamps_current() {
        let value = StatValue::new(100);
        value.set_total(40);
        assert_eq!(value.current(), 40);
        assert_eq!(value.total(), 40);

        value.set(90);
        assert_eq!(value.current(), 40);
    }

    #[test]
    fn test_builder_and_ratio() {
        let stats = Stats::new()
            .with(BasicAttribute::Health, 200)
            .with(BasicAttribute::PhysicalAtk, 50);

        assert_eq!(stats.current(BasicAttribute::Health), 200);
        assert_eq!(stats.total(BasicAttribute::PhysicalAtk), 50);
        assert_eq!(stats.current(BasicAttribute::Defense), 0);

        stats.add(BasicAttribute::Health, -50);
        assert!((stats.ratio(BasicAttribute::Health) - 0.75).abs() < f32::EPSILON);
        assert_eq!(stats.ratio(BasicAttribute::Spirit), 0.0);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let stats = Stats::new().with(BasicAttribute::Health, 1_000_000);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1_000 {
                        stats.add(BasicAttribute::Health, -3);
                    }
                });
            }
        });

        assert_eq!(stats.current(BasicAttribute::Health), 1_000_000 - 8 * 3_000);
    }
}
