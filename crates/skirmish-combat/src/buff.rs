//! Buff state of one actor.
//!
//! [`BuffManager`] is owned by its actor behind a mutex, so every add,
//! remove, trigger and reflect roll on one actor is serialized. Procs are
//! returned to the actor instead of being applied here: the actor applies
//! them after releasing its own lock, so two actors' buff locks are never
//! held at the same time. Buffs are kept ordered by effect id so procs and
//! expiries come out in the same order on every run.

use serde::{Deserialize, Serialize};
use skirmish_common::{EffectId, ObjectId, SkillId, Tick};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

use crate::condition::EventConditionType;
use crate::reflect::{ReflectMetadata, ReflectRecord};

/// Reference to an effect by id and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectSkill {
    /// Effect id
    pub id: EffectId,
    /// Effect level
    pub level: i16,
}

impl EffectSkill {
    /// Creates an effect reference.
    #[must_use]
    pub const fn new(id: EffectId, level: i16) -> Self {
        Self { id, level }
    }
}

/// Who receives the effect of a proc.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcRecipient {
    /// The actor that caused the event
    #[default]
    Caster,
    /// The owner named by the event
    Owner,
    /// The target named by the event
    Target,
}

/// An effect applied when the buff holder sees an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectProc {
    /// Event that fires the proc.
    pub event: EventConditionType,
    /// Skills the proc is limited to (empty = any skill).
    #[serde(default)]
    pub skill_ids: Vec<SkillId>,
    /// Effect to apply.
    pub effect: EffectSkill,
    /// Receiver of the effect.
    #[serde(default)]
    pub recipient: ProcRecipient,
}

impl EffectProc {
    /// Whether this proc reacts to an event raised by a skill.
    #[must_use]
    pub fn matches(&self, event: EventConditionType, skill_id: SkillId) -> bool {
        self.event == event && (self.skill_ids.is_empty() || self.skill_ids.contains(&skill_id))
    }
}

fn default_max_stacks() -> u32 {
    1
}

/// Static data describing a buff/effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectMetadata {
    /// Effect id
    pub id: EffectId,
    /// Effect level
    pub level: i16,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Duration in ticks (0 = until removed)
    #[serde(default)]
    pub duration_ticks: Tick,
    /// Maximum stack count
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    /// Reflect rule installed while the buff is active
    #[serde(default)]
    pub reflect: Option<ReflectMetadata>,
    /// Event procs
    #[serde(default)]
    pub procs: Vec<EffectProc>,
}

impl EffectMetadata {
    /// Creates permanent, single-stack metadata.
    #[must_use]
    pub fn new(id: EffectId, level: i16) -> Self {
        Self {
            id,
            level,
            name: String::new(),
            duration_ticks: 0,
            max_stacks: 1,
            reflect: None,
            procs: Vec::new(),
        }
    }

    /// Sets the duration (builder).
    #[must_use]
    pub fn with_duration(mut self, ticks: Tick) -> Self {
        self.duration_ticks = ticks.max(0);
        self
    }

    /// Sets the stack cap (builder).
    #[must_use]
    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks.max(1);
        self
    }

    /// Sets the reflect rule (builder).
    #[must_use]
    pub fn with_reflect(mut self, reflect: ReflectMetadata) -> Self {
        self.reflect = Some(reflect);
        self
    }

    /// Adds a proc (builder).
    #[must_use]
    pub fn with_proc(mut self, proc: EffectProc) -> Self {
        self.procs.push(proc);
        self
    }
}

/// An active buff instance.
#[derive(Debug, Clone)]
pub struct Buff {
    /// Static data
    pub metadata: Arc<EffectMetadata>,
    /// Actor that applied the buff
    pub caster_id: ObjectId,
    /// Actor credited as owner
    pub owner_id: ObjectId,
    /// Tick the buff was (re)applied
    pub start_tick: Tick,
    /// Expiry tick, `None` for permanent buffs
    pub end_tick: Option<Tick>,
    /// Current stack count
    pub stacks: u32,
}

impl Buff {
    /// Effect id.
    #[must_use]
    pub fn id(&self) -> EffectId {
        self.metadata.id
    }

    /// Effect level.
    #[must_use]
    pub fn level(&self) -> i16 {
        self.metadata.level
    }

    /// Whether the buff has run out at `tick`.
    #[must_use]
    pub fn is_expired(&self, tick: Tick) -> bool {
        self.end_tick.is_some_and(|end| tick >= end)
    }
}

/// Result of adding a buff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffChange {
    /// New buff inserted
    Added,
    /// Existing buff refreshed, with the resulting stack count
    Refreshed(u32),
}

/// Active buffs of one actor.
#[derive(Debug, Default)]
pub struct BuffManager {
    buffs: BTreeMap<EffectId, Buff>,
    reflect: Option<ReflectRecord>,
}

impl BuffManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or refreshes a buff.
    ///
    /// Refreshing restarts the duration and adds a stack up to the cap. A
    /// buff carrying reflect metadata (re)installs a fresh reflect record.
    pub fn add(
        &mut self,
        metadata: Arc<EffectMetadata>,
        caster_id: ObjectId,
        owner_id: ObjectId,
        start_tick: Tick,
    ) -> BuffChange {
        let end_tick = (metadata.duration_ticks > 0).then(|| start_tick + metadata.duration_ticks);
        if let Some(reflect) = &metadata.reflect {
            self.reflect = Some(ReflectRecord::new(metadata.id, reflect.clone()));
        }

        if let Some(existing) = self.buffs.get_mut(&metadata.id) {
            existing.stacks = (existing.stacks + 1).min(metadata.max_stacks.max(1));
            existing.start_tick = start_tick;
            existing.end_tick = end_tick;
            existing.caster_id = caster_id;
            existing.owner_id = owner_id;
            existing.metadata = metadata;
            return BuffChange::Refreshed(existing.stacks);
        }

        self.buffs.insert(
            metadata.id,
            Buff {
                metadata,
                caster_id,
                owner_id,
                start_tick,
                end_tick,
                stacks: 1,
            },
        );
        BuffChange::Added
    }

    /// Removes a buff and any reflect rule it installed.
    pub fn remove(&mut self, id: EffectId) -> Option<Buff> {
        let removed = self.buffs.remove(&id)?;
        if self
            .reflect
            .as_ref()
            .is_some_and(|reflect| reflect.source_buff_id == id)
        {
            self.reflect = None;
        }
        Some(removed)
    }

    /// Gets an active buff.
    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&Buff> {
        self.buffs.get(&id)
    }

    /// Whether a buff is active.
    #[must_use]
    pub fn contains(&self, id: EffectId) -> bool {
        self.buffs.contains_key(&id)
    }

    /// Number of active buffs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffs.len()
    }

    /// Whether no buff is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
    }

    /// Iterates active buffs.
    pub fn iter(&self) -> impl Iterator<Item = &Buff> {
        self.buffs.values()
    }

    /// Active reflect rule.
    #[must_use]
    pub fn reflect(&self) -> Option<&ReflectRecord> {
        self.reflect.as_ref()
    }

    /// Active reflect rule, mutably.
    pub fn reflect_mut(&mut self) -> Option<&mut ReflectRecord> {
        self.reflect.as_mut()
    }

    /// Collects the procs of every active buff that react to an event,
    /// in effect id order.
    #[must_use]
    pub fn trigger_event(&self, event: EventConditionType, skill_id: SkillId) -> Vec<EffectProc> {
        self.buffs
            .values()
            .flat_map(|buff| buff.metadata.procs.iter())
            .filter(|proc| proc.matches(event, skill_id))
            .cloned()
            .collect()
    }

    /// Expires timed buffs. Returns the removed ids.
    pub fn update(&mut self, tick: Tick) -> Vec<EffectId> {
        let expired: Vec<EffectId> = self
            .buffs
            .values()
            .filter(|buff| buff.is_expired(tick))
            .map(Buff::id)
            .collect();

        for id in &expired {
            trace!(effect_id = %id, tick, "Buff expired");
            self.remove(*id);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caster() -> ObjectId {
        ObjectId::new(1)
    }

    fn reflect_metadata() -> ReflectMetadata {
        ReflectMetadata {
            count: 1,
            rate: 1.0,
            effect_id: EffectId::new(77),
            effect_level: 1,
        }
    }

    #[test]
    fn test_add_and_stack() {
        let mut buffs = BuffManager::new();
        let metadata = Arc::new(EffectMetadata::new(EffectId::new(10), 1).with_max_stacks(2));

        assert_eq!(buffs.add(metadata.clone(), caster(), caster(), 0), BuffChange::Added);
        assert_eq!(buffs.add(metadata.clone(), caster(), caster(), 5), BuffChange::Refreshed(2));
        assert_eq!(buffs.add(metadata, caster(), caster(), 9), BuffChange::Refreshed(2));

        let buff = buffs.get(EffectId::new(10)).expect("buff should exist");
        assert_eq!(buff.start_tick, 9);
        assert_eq!(buffs.len(), 1);
    }

    #[test]
    fn test_expiry() {
        let mut buffs = BuffManager::new();
        let timed = Arc::new(EffectMetadata::new(EffectId::new(1), 1).with_duration(100));
        let permanent = Arc::new(EffectMetadata::new(EffectId::new(2), 1));
        buffs.add(timed, caster(), caster(), 1000);
        buffs.add(permanent, caster(), caster(), 1000);

        assert!(buffs.update(1099).is_empty());
        assert_eq!(buffs.update(1100), vec![EffectId::new(1)]);
        assert!(!buffs.contains(EffectId::new(1)));
        assert!(buffs.contains(EffectId::new(2)));
    }

    #[test]
    fn test_reflect_installed_and_removed_with_source() {
        let mut buffs = BuffManager::new();
        let metadata =
            Arc::new(EffectMetadata::new(EffectId::new(5), 1).with_reflect(reflect_metadata()));
        buffs.add(metadata, caster(), caster(), 0);

        let reflect = buffs.reflect().expect("reflect should be installed");
        assert_eq!(reflect.source_buff_id, EffectId::new(5));

        assert!(buffs.remove(EffectId::new(5)).is_some());
        assert!(buffs.reflect().is_none());
        assert!(buffs.remove(EffectId::new(5)).is_none());
    }

    #[test]
    fn test_trigger_event_filters_procs() {
        let mut buffs = BuffManager::new();
        let on_hit = EffectProc {
            event: EventConditionType::OnOwnerAttackHit,
            skill_ids: Vec::new(),
            effect: EffectSkill::new(EffectId::new(100), 1),
            recipient: ProcRecipient::Caster,
        };
        let on_crit_for_skill = EffectProc {
            event: EventConditionType::OnOwnerAttackCrit,
            skill_ids: vec![SkillId::new(42)],
            effect: EffectSkill::new(EffectId::new(101), 1),
            recipient: ProcRecipient::Target,
        };
        let metadata = Arc::new(
            EffectMetadata::new(EffectId::new(9), 1)
                .with_proc(on_hit.clone())
                .with_proc(on_crit_for_skill.clone()),
        );
        buffs.add(metadata, caster(), caster(), 0);

        assert_eq!(
            buffs.trigger_event(EventConditionType::OnOwnerAttackHit, SkillId::new(7)),
            vec![on_hit]
        );
        assert!(buffs
            .trigger_event(EventConditionType::OnOwnerAttackCrit, SkillId::new(7))
            .is_empty());
        assert_eq!(
            buffs.trigger_event(EventConditionType::OnOwnerAttackCrit, SkillId::new(42)),
            vec![on_crit_for_skill]
        );
        assert!(buffs
            .trigger_event(EventConditionType::OnDeath, SkillId::NONE)
            .is_empty());
    }

    #[test]
    fn test_procs_follow_effect_id_order() {
        let mut buffs = BuffManager::new();
        let proc_for = |id| EffectProc {
            event: EventConditionType::OnOwnerAttackHit,
            skill_ids: Vec::new(),
            effect: EffectSkill::new(EffectId::new(id), 1),
            recipient: ProcRecipient::Caster,
        };
        for id in [30, 10, 20, 50, 40] {
            let metadata =
                Arc::new(EffectMetadata::new(EffectId::new(id), 1).with_proc(proc_for(id + 1)));
            buffs.add(metadata, caster(), caster(), 0);
        }

        let order: Vec<i32> = buffs
            .trigger_event(EventConditionType::OnOwnerAttackHit, SkillId::NONE)
            .iter()
            .map(|proc| proc.effect.id.raw())
            .collect();
        assert_eq!(order, vec![11, 21, 31, 41, 51]);
    }
}
