//! Damage records.
//!
//! A [`DamageRecord`] aggregates one attack's outcome across every target it
//! hit. Each target gets a [`DamageRecordTarget`], which is also the entry
//! type of an actor's lifetime per-attacker damage ledger.

use serde::{Deserialize, Serialize};
use skirmish_common::{ObjectId, SkillId, SkillUid, Vec3};
use std::collections::BTreeMap;

use crate::calculator::DamageProperties;
use crate::skill::{SkillAttack, SkillRecord};

/// Classification of one resolved damage component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DamageType {
    /// Regular hit
    Normal,
    /// Critical hit
    Critical,
    /// Blocked by the defender
    Block,
    /// Missed entirely
    Miss,
}

/// Damage dealt to one actor, summed per [`DamageType`].
#[derive(Debug, Clone, PartialEq)]
pub struct DamageRecordTarget {
    object_id: ObjectId,
    /// Position snapshot at impact
    pub position: Vec3,
    /// Impact direction
    pub direction: Vec3,
    damage: BTreeMap<DamageType, i64>,
}

impl DamageRecordTarget {
    /// Creates an empty record for an actor.
    #[must_use]
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            position: Vec3::ZERO,
            direction: Vec3::ZERO,
            damage: BTreeMap::new(),
        }
    }

    /// Sets the impact position (builder).
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the impact direction (builder).
    #[must_use]
    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }

    /// The actor this record belongs to.
    #[must_use]
    pub const fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Adds an amount under a damage type. Same-type amounts sum.
    pub fn add_damage(&mut self, damage_type: DamageType, amount: i64) {
        *self.damage.entry(damage_type).or_insert(0) += amount;
    }

    /// Amount recorded under a damage type.
    #[must_use]
    pub fn amount(&self, damage_type: DamageType) -> i64 {
        self.damage.get(&damage_type).copied().unwrap_or(0)
    }

    /// Distinct damage types recorded.
    pub fn damage_types(&self) -> impl Iterator<Item = DamageType> + '_ {
        self.damage.keys().copied()
    }

    /// All (type, amount) entries.
    #[must_use]
    pub fn damage(&self) -> &BTreeMap<DamageType, i64> {
        &self.damage
    }

    /// Sum over every damage type.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.damage.values().sum()
    }
}

/// Outcome of one attack resolution across all of its targets.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageRecord {
    /// Actor that cast the skill
    pub caster_id: ObjectId,
    /// Actor credited as owner of the skill
    pub owner_id: ObjectId,
    /// Client cast uid
    pub skill_uid: SkillUid,
    /// Client-designated target uid
    pub target_uid: i64,
    /// Skill id
    pub skill_id: SkillId,
    /// Skill level
    pub level: i16,
    /// Attack point within the motion
    pub attack_point: u8,
    /// Motion point of the cast
    pub motion_point: u8,
    /// Impact position
    pub position: Vec3,
    /// Impact direction
    pub direction: Vec3,
    /// Damage properties used for formula damage
    pub properties: DamageProperties,
    /// Per-target outcomes, in application order
    pub targets: Vec<DamageRecordTarget>,
}

impl DamageRecord {
    /// Creates an empty record for an attack of a skill record.
    #[must_use]
    pub fn new(record: &SkillRecord, attack: &SkillAttack) -> Self {
        Self {
            caster_id: record.caster_id(),
            owner_id: record.caster_id(),
            skill_uid: record.uid(),
            target_uid: record.target_uid,
            skill_id: record.skill_id(),
            level: record.level(),
            attack_point: record.attack_point(),
            motion_point: record.motion_point(),
            position: record.impact_position,
            direction: record.direction,
            properties: attack.properties.clone(),
            targets: Vec::new(),
        }
    }

    /// Record for a given target, if it was hit.
    #[must_use]
    pub fn target(&self, object_id: ObjectId) -> Option<&DamageRecordTarget> {
        self.targets.iter().find(|t| t.object_id() == object_id)
    }

    /// Total damage across all targets.
    #[must_use]
    pub fn total_damage(&self) -> i64 {
        self.targets.iter().map(DamageRecordTarget::total).sum()
    }
}
