//! Skill metadata and in-flight skill records.

use serde::{Deserialize, Serialize};
use skirmish_common::{ObjectId, SkillId, SkillUid, Tick, Vec3};
use std::sync::Arc;

use crate::actor::Actor;
use crate::buff::EffectSkill;
use crate::calculator::DamageProperties;
use crate::condition::EffectCondition;

/// How the damage components of an attack are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum DamageKind {
    /// Resolved by the damage calculator.
    #[default]
    Formula,
    /// Fixed amount, always classified as normal damage.
    Constant(i64),
}

/// Damage components of an attack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageSpec {
    /// Number of damage components (`<= 0` deals no damage).
    pub count: i32,
    /// How each component is produced.
    #[serde(default)]
    pub kind: DamageKind,
}

impl DamageSpec {
    /// `count` formula components.
    #[must_use]
    pub const fn formula(count: i32) -> Self {
        Self {
            count,
            kind: DamageKind::Formula,
        }
    }

    /// `count` constant components of `value` each.
    #[must_use]
    pub const fn constant(count: i32, value: i64) -> Self {
        Self {
            count,
            kind: DamageKind::Constant(value),
        }
    }
}

/// Area effect spawned at the caster instead of applied to targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplashMetadata {
    /// Ticks between pulses.
    pub interval_ticks: Tick,
    /// Lifetime of the spawned region.
    pub duration_ticks: Tick,
    /// Region radius.
    pub range: f32,
}

/// An effect entry of an attack.
///
/// Conditional entries apply directly to targets; splash entries spawn a
/// region skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillEffectMetadata {
    /// Condition for direct application.
    pub condition: Option<EffectCondition>,
    /// Splash descriptor for region spawning.
    pub splash: Option<SplashMetadata>,
    /// Effects added to the receiving actor.
    pub skills: Vec<EffectSkill>,
}

fn default_target_count() -> usize {
    1
}

/// One attack point within a motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillAttack {
    /// Attack point index
    #[serde(default)]
    pub point: u8,
    /// Hit detection range
    #[serde(default)]
    pub range: f32,
    /// Maximum number of targets
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    /// Damage components
    #[serde(default)]
    pub damage: DamageSpec,
    /// Properties for formula damage
    #[serde(default)]
    pub properties: DamageProperties,
    /// Effects applied after damage
    #[serde(default)]
    pub skills: Vec<SkillEffectMetadata>,
}

impl SkillAttack {
    /// Creates an attack with the given damage and default properties.
    #[must_use]
    pub fn new(damage: DamageSpec) -> Self {
        Self {
            point: 0,
            range: 0.0,
            target_count: 1,
            damage,
            properties: DamageProperties::default(),
            skills: Vec::new(),
        }
    }

    /// Sets the damage properties (builder).
    #[must_use]
    pub fn with_properties(mut self, properties: DamageProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Adds an effect entry (builder).
    #[must_use]
    pub fn with_effect(mut self, effect: SkillEffectMetadata) -> Self {
        self.skills.push(effect);
        self
    }
}

/// One motion (animation segment) of a skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillMotion {
    /// Animation sequence name
    pub sequence: String,
    /// Length of the sequence in ticks
    pub duration_ticks: Tick,
    /// Attack points
    pub attacks: Vec<SkillAttack>,
}

/// Static data describing a skill at one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Skill id
    pub id: SkillId,
    /// Skill level
    pub level: i16,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Motions
    #[serde(default)]
    pub motions: Vec<SkillMotion>,
}

impl SkillMetadata {
    /// Creates a skill with a single motion holding one attack.
    #[must_use]
    pub fn single_attack(id: SkillId, level: i16, attack: SkillAttack) -> Self {
        Self {
            id,
            level,
            name: String::new(),
            motions: vec![SkillMotion {
                sequence: String::new(),
                duration_ticks: 0,
                attacks: vec![attack],
            }],
        }
    }
}

/// A validated, in-flight skill cast.
///
/// Produced by [`Actor::cast_skill`]; the hit-detection collaborator fills
/// in the targets before [`Actor::target_attack`] consumes it.
#[derive(Debug, Clone)]
pub struct SkillRecord {
    metadata: Arc<SkillMetadata>,
    uid: SkillUid,
    caster_id: ObjectId,
    /// Caster position at cast time
    pub position: Vec3,
    /// Caster rotation at cast time (degrees)
    pub rotation: Vec3,
    /// Twice the caster's Z rotation
    pub rotate2z: f32,
    motion_point: u8,
    attack_point: u8,
    /// Client-designated target uid
    pub target_uid: i64,
    /// Where the attack lands
    pub impact_position: Vec3,
    /// Attack direction
    pub direction: Vec3,
    /// Field tick at cast time
    pub server_tick: Tick,
    targets: Vec<Arc<Actor>>,
}

impl SkillRecord {
    /// Snapshots the caster's transform for a new cast.
    #[must_use]
    pub fn new(metadata: Arc<SkillMetadata>, uid: SkillUid, caster: &Actor, tick: Tick) -> Self {
        let transform = caster.transform();
        Self {
            metadata,
            uid,
            caster_id: caster.object_id(),
            position: transform.position,
            rotation: transform.rotation,
            rotate2z: 2.0 * transform.rotation.z,
            motion_point: 0,
            attack_point: 0,
            target_uid: 0,
            impact_position: transform.position,
            direction: transform.forward(),
            server_tick: tick,
            targets: Vec::new(),
        }
    }

    /// Skill metadata.
    #[must_use]
    pub fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    /// Skill id.
    #[must_use]
    pub fn skill_id(&self) -> SkillId {
        self.metadata.id
    }

    /// Skill level.
    #[must_use]
    pub fn level(&self) -> i16 {
        self.metadata.level
    }

    /// Cast uid.
    #[must_use]
    pub const fn uid(&self) -> SkillUid {
        self.uid
    }

    /// Casting actor.
    #[must_use]
    pub const fn caster_id(&self) -> ObjectId {
        self.caster_id
    }

    /// Selected motion point.
    #[must_use]
    pub const fn motion_point(&self) -> u8 {
        self.motion_point
    }

    /// Selected attack point.
    #[must_use]
    pub const fn attack_point(&self) -> u8 {
        self.attack_point
    }

    /// Selects a motion. Rejected if the skill has no such motion.
    pub fn try_set_motion_point(&mut self, point: u8) -> bool {
        if usize::from(point) >= self.metadata.motions.len() {
            return false;
        }
        self.motion_point = point;
        self.attack_point = 0;
        true
    }

    /// Selects an attack within the current motion.
    pub fn try_set_attack_point(&mut self, point: u8) -> bool {
        let exists = self
            .motion()
            .is_some_and(|motion| motion.attacks.iter().any(|attack| attack.point == point));
        if exists {
            self.attack_point = point;
        }
        exists
    }

    /// Current motion.
    #[must_use]
    pub fn motion(&self) -> Option<&SkillMotion> {
        self.metadata.motions.get(usize::from(self.motion_point))
    }

    /// Current attack.
    #[must_use]
    pub fn attack(&self) -> Option<&SkillAttack> {
        self.motion()?
            .attacks
            .iter()
            .find(|attack| attack.point == self.attack_point)
    }

    /// Resolved targets.
    #[must_use]
    pub fn targets(&self) -> &[Arc<Actor>] {
        &self.targets
    }

    /// Adds a resolved target, up to the attack's target count.
    pub fn add_target(&mut self, target: Arc<Actor>) -> bool {
        let limit = self.attack().map_or(0, |attack| attack.target_count);
        if self.targets.len() >= limit
            || self
                .targets
                .iter()
                .any(|t| t.object_id() == target.object_id())
        {
            return false;
        }
        self.targets.push(target);
        true
    }

    /// Removes all resolved targets.
    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }
}
