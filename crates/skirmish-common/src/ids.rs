//! ID types for actors, skills and effects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Simulation time in ticks.
pub type Tick = i64;

/// Identifier of an actor, unique within its owning field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(i32);

impl ObjectId {
    /// Creates an object ID from a raw value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Null/invalid object ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) object ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out object IDs for a single field.
///
/// IDs start at 1 so that [`ObjectId::NULL`] is never allocated.
#[derive(Debug)]
pub struct ObjectIdAllocator {
    next: AtomicI32,
}

impl ObjectIdAllocator {
    /// Creates an allocator starting at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicI32::new(1),
        }
    }

    /// Allocates the next object ID.
    pub fn next(&self) -> ObjectId {
        ObjectId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ObjectIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a skill in the skill metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(i32);

impl SkillId {
    /// Creates a skill ID from a raw value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Placeholder used when an event is not tied to a skill.
    pub const NONE: Self = Self(0);
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a buff/effect in the effect metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(i32);

impl EffectId {
    /// Creates an effect ID from a raw value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-assigned identifier of one skill cast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillUid(i64);

impl SkillUid {
    /// Creates a cast uid from a raw value.
    #[must_use]
    pub const fn new(uid: i64) -> Self {
        Self(uid)
    }

    /// Returns the raw uid value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_object_id() {
        assert!(!ObjectId::NULL.is_valid());
        assert!(ObjectId::new(7).is_valid());
        assert_eq!(ObjectId::new(7).raw(), 7);
    }

    #[test]
    fn test_allocator_is_monotonic() {
        let allocator = ObjectIdAllocator::default();
        let ids: Vec<_> = (0..5).map(|_| allocator.next().raw()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_display() {
        assert_eq!(ObjectId::new(12).to_string(), "#12");
        assert_eq!(SkillId::new(10_000_001).to_string(), "10000001");
    }
}
