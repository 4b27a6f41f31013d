//! Combat-capable actors.
//!
//! An [`Actor`] is shared between its field and any in-flight skill records
//! through `Arc`, so every piece of mutable state is internally synchronized:
//! - stats are atomic, so concurrent attackers never lose a health delta
//! - the per-attacker damage ledger is a `DashMap` upserted in place
//! - buffs sit behind a per-actor mutex that is never held while another
//!   actor is touched

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use skirmish_common::{EffectId, ObjectId, SkillId, SkillUid, Tick, Transform, Vec3};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use crate::animation::AnimationManager;
use crate::buff::{BuffChange, BuffManager, ProcRecipient};
use crate::condition::EventConditionType;
use crate::damage::{DamageRecord, DamageRecordTarget, DamageType};
use crate::error::{CombatError, CombatResult};
use crate::events::FieldEvent;
use crate::field::FieldContext;
use crate::reflect::ReflectOutcome;
use crate::skill::{DamageKind, SkillAttack, SkillEffectMetadata, SkillRecord};
use crate::stats::{BasicAttribute, Stats};

/// What kind of entity an actor is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorPayload {
    /// A connected player's character
    Player {
        /// Character id
        character_id: i64,
        /// Character name
        name: String,
    },
    /// A field NPC
    Npc {
        /// NPC metadata id
        npc_id: i32,
    },
}

/// How long an actor has stayed in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTick {
    /// Last recorded position
    pub position: Vec3,
    /// Tick of the last movement
    pub last_tick: Tick,
    /// Ticks spent stationary since `last_tick`
    pub duration: Tick,
}

impl Default for PositionTick {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            last_tick: 0,
            duration: 0,
        }
    }
}

/// An entity that can deal and receive damage and host buffs.
#[derive(Debug)]
pub struct Actor {
    object_id: ObjectId,
    payload: ActorPayload,
    transform: RwLock<Transform>,
    is_dead: AtomicBool,
    stats: Stats,
    damage_dealers: DashMap<ObjectId, DamageRecordTarget>,
    position_tick: Mutex<PositionTick>,
    buffs: Mutex<BuffManager>,
    animation: Mutex<AnimationManager>,
}

impl Actor {
    /// Creates a living actor. Fields allocate ids through [`crate::Field::spawn`].
    #[must_use]
    pub fn new(
        object_id: ObjectId,
        payload: ActorPayload,
        transform: Transform,
        stats: Stats,
    ) -> Self {
        Self {
            object_id,
            payload,
            transform: RwLock::new(transform),
            is_dead: AtomicBool::new(false),
            stats,
            damage_dealers: DashMap::new(),
            position_tick: Mutex::new(PositionTick::default()),
            buffs: Mutex::new(BuffManager::new()),
            animation: Mutex::new(AnimationManager::new()),
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Object id within the field.
    #[must_use]
    pub const fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Player or NPC data.
    #[must_use]
    pub const fn payload(&self) -> &ActorPayload {
        &self.payload
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.read().position
    }

    /// Moves the actor.
    pub fn set_position(&self, position: Vec3) {
        self.transform.write().position = position;
    }

    /// Current rotation in degrees.
    #[must_use]
    pub fn rotation(&self) -> Vec3 {
        self.transform.read().rotation
    }

    /// Turns the actor.
    pub fn set_rotation(&self, rotation: Vec3) {
        self.transform.write().rotation = rotation;
    }

    /// Snapshot of position and rotation.
    #[must_use]
    pub fn transform(&self) -> Transform {
        *self.transform.read()
    }

    /// Whether the actor has died. Never reset.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.is_dead.load(Ordering::Acquire)
    }

    /// Stat store.
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> i64 {
        self.stats.current(BasicAttribute::Health)
    }

    /// Idle tracker.
    #[must_use]
    pub fn position_tick(&self) -> PositionTick {
        *self.position_tick.lock()
    }

    /// Lifetime damage dealt to this actor by one attacker.
    #[must_use]
    pub fn damage_dealt_by(&self, attacker: ObjectId) -> Option<DamageRecordTarget> {
        self.damage_dealers.get(&attacker).map(|e| e.value().clone())
    }

    /// Lifetime damage per attacker, highest first.
    #[must_use]
    pub fn damage_dealers(&self) -> Vec<(ObjectId, i64)> {
        let mut dealers: Vec<(ObjectId, i64)> = self
            .damage_dealers
            .iter()
            .map(|e| (*e.key(), e.value().total()))
            .collect();
        dealers.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        dealers
    }

    /// Whether a buff is active.
    #[must_use]
    pub fn has_buff(&self, effect_id: EffectId) -> bool {
        self.buffs.lock().contains(effect_id)
    }

    /// Stack count of an active buff.
    #[must_use]
    pub fn buff_stacks(&self, effect_id: EffectId) -> Option<u32> {
        self.buffs.lock().get(effect_id).map(|buff| buff.stacks)
    }

    /// Reflections used by the active reflect rule.
    #[must_use]
    pub fn reflect_counter(&self) -> Option<u32> {
        self.buffs.lock().reflect().map(|reflect| reflect.counter())
    }

    /// Animation sequence currently playing.
    #[must_use]
    pub fn current_sequence(&self) -> Option<String> {
        self.animation.lock().current().map(|seq| seq.name.clone())
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the actor to `tick`: death detection, idle tracking, then the
    /// animation and buff sub-managers.
    pub fn update(&self, field: &dyn FieldContext, tick: Tick) {
        if self.is_dead() {
            return;
        }

        if self.health() <= 0 {
            if !self.is_dead.swap(true, Ordering::AcqRel) {
                info!(object_id = %self.object_id, tick, "Actor died");
                field.broadcast(FieldEvent::ActorDied {
                    object_id: self.object_id,
                });
                self.on_death(field);
            }
            return;
        }

        let position = self.position();
        {
            let mut idle = self.position_tick.lock();
            if idle.position == position {
                idle.duration = tick - idle.last_tick;
            } else {
                *idle = PositionTick {
                    position,
                    last_tick: tick,
                    duration: 0,
                };
            }
        }

        self.animation.lock().update(tick);
        let expired = self.buffs.lock().update(tick);
        for effect_id in expired {
            field.broadcast(FieldEvent::BuffRemoved {
                object_id: self.object_id,
                effect_id,
            });
        }
    }

    fn on_death(&self, field: &dyn FieldContext) {
        self.trigger_event(field, self, self, self, EventConditionType::OnDeath, SkillId::NONE);
    }

    // ========================================================================
    // Skills
    // ========================================================================

    /// Starts a skill cast.
    ///
    /// Returns `None` when the skill is unknown or the motion point is
    /// rejected; nothing is broadcast in that case.
    pub fn cast_skill(
        &self,
        field: &dyn FieldContext,
        skill_id: SkillId,
        level: i16,
        uid: SkillUid,
        motion_point: u8,
    ) -> Option<SkillRecord> {
        let record = match self.prepare_cast(field, skill_id, level, uid, motion_point) {
            Ok(record) => record,
            Err(err @ CombatError::InvalidMotionPoint { .. }) => {
                warn!(object_id = %self.object_id, "{err}");
                return None;
            },
            Err(err) => {
                error!(object_id = %self.object_id, "{err}");
                return None;
            },
        };

        if let Some(motion) = record.motion().filter(|m| !m.sequence.is_empty()) {
            self.animation
                .lock()
                .play(&motion.sequence, record.server_tick, motion.duration_ticks);
        }

        field.broadcast(FieldEvent::SkillUsed {
            caster_id: self.object_id,
            skill_id,
            level,
            uid,
            motion_point: record.motion_point(),
            position: record.position,
            rotation: record.rotation,
        });
        Some(record)
    }

    fn prepare_cast(
        &self,
        field: &dyn FieldContext,
        skill_id: SkillId,
        level: i16,
        uid: SkillUid,
        motion_point: u8,
    ) -> CombatResult<SkillRecord> {
        let metadata = field
            .skill_metadata(skill_id, level)
            .ok_or(CombatError::SkillNotFound { id: skill_id, level })?;

        let mut record = SkillRecord::new(metadata, uid, self, field.field_tick());
        if !record.try_set_motion_point(motion_point) {
            return Err(CombatError::InvalidMotionPoint {
                id: skill_id,
                point: motion_point,
            });
        }
        Ok(record)
    }

    /// Resolves the current attack of a cast against its resolved targets.
    ///
    /// Damage is applied to every target and broadcast as one record, then
    /// the attack's effects are applied. An effect whose condition names an
    /// entity that cannot be resolved aborts the remaining effects.
    pub fn target_attack(
        &self,
        field: &dyn FieldContext,
        record: &SkillRecord,
    ) -> CombatResult<()> {
        if record.targets().is_empty() {
            return Ok(());
        }
        let Some(attack) = record.attack() else {
            return Ok(());
        };

        let mut damage = DamageRecord::new(record, attack);
        for target in record.targets() {
            target.apply_damage(field, self, &mut damage, attack);
        }
        field.broadcast(FieldEvent::SkillDamage(damage));

        let start_tick = field.field_tick();
        for effect in &attack.skills {
            if let Some(condition) = &effect.condition {
                for target in record.targets() {
                    let owner = match condition.target.resolve(self, target.as_ref()) {
                        Ok(owner) => owner,
                        Err(err) => {
                            error!(
                                caster_id = %self.object_id,
                                skill_id = %record.skill_id(),
                                "{err}"
                            );
                            return Err(err);
                        },
                    };
                    if condition.condition.check(self, owner, target) {
                        target.apply_effect(field, self, owner, effect, start_tick);
                    }
                }
            } else if effect.splash.is_some() {
                field.add_skill(self, effect, vec![self.position()], self.rotation());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Damage
    // ========================================================================

    /// Applies one attack's damage components from `caster` to this actor.
    pub fn apply_damage(
        &self,
        field: &dyn FieldContext,
        caster: &Actor,
        record: &mut DamageRecord,
        attack: &SkillAttack,
    ) {
        if attack.damage.count <= 0 {
            return;
        }

        let position = self.position();
        let direction = (position - caster.position())
            .try_normalize()
            .unwrap_or_else(|| caster.transform().forward());
        let mut target_record = DamageRecordTarget::new(self.object_id)
            .with_position(position)
            .with_direction(direction);

        let mut damage_amount: i64 = 0;
        for _ in 0..attack.damage.count {
            self.reflect(field, caster);
            let (damage_type, amount) = match attack.damage.kind {
                DamageKind::Constant(value) => (DamageType::Normal, value),
                DamageKind::Formula => {
                    let outcome = field.calculator().calculate(
                        caster.stats(),
                        &self.stats,
                        &attack.properties,
                        field.random(),
                    );
                    (outcome.damage_type, outcome.amount as i64)
                },
            };
            target_record.add_damage(damage_type, amount);
            damage_amount -= amount;
        }

        if damage_amount != 0 {
            self.damage_dealers
                .entry(caster.object_id())
                .or_insert_with(|| DamageRecordTarget::new(self.object_id))
                .add_damage(DamageType::Normal, -damage_amount);
            let health = self.stats.get(BasicAttribute::Health);
            health.add(damage_amount);
            field.broadcast(FieldEvent::StatUpdate {
                object_id: self.object_id,
                attribute: BasicAttribute::Health,
                current: health.current(),
                total: health.total(),
            });
        }

        let skill_id = record.skill_id;
        for damage_type in target_record.damage_types() {
            let events: &[EventConditionType] = match damage_type {
                DamageType::Critical => &[
                    EventConditionType::OnOwnerAttackHit,
                    EventConditionType::OnOwnerAttackCrit,
                ],
                DamageType::Normal => &[EventConditionType::OnOwnerAttackHit],
                DamageType::Miss => &[EventConditionType::OnAttackMiss],
                DamageType::Block => &[],
            };
            for &event in events {
                caster.trigger_event(field, caster, caster, self, event, skill_id);
            }
        }

        record.targets.push(target_record);
    }

    /// Rolls this actor's reflect rule against an attacker.
    ///
    /// Returns `None` when no reflect rule is active. A triggered reflection
    /// applies the configured effect onto `attacker`; the attacker's damage
    /// ledger is left untouched.
    pub fn reflect(&self, field: &dyn FieldContext, attacker: &Actor) -> Option<ReflectOutcome> {
        let (outcome, source_buff_id) = {
            let mut buffs = self.buffs.lock();
            let reflect = buffs.reflect_mut()?;
            let source_buff_id = reflect.source_buff_id;
            let outcome = reflect.try_trigger(field.random());
            if let ReflectOutcome::Triggered { exhausted: true, .. } = outcome {
                buffs.remove(source_buff_id);
            }
            (outcome, source_buff_id)
        };

        if let ReflectOutcome::Triggered { effect, exhausted } = outcome {
            debug!(
                object_id = %self.object_id,
                attacker_id = %attacker.object_id(),
                effect_id = %effect.id,
                exhausted,
                "Reflect triggered"
            );
            if exhausted {
                field.broadcast(FieldEvent::BuffRemoved {
                    object_id: self.object_id,
                    effect_id: source_buff_id,
                });
            }
            let tick = field.field_tick();
            attacker.add_buff(field, self, attacker, effect.id, effect.level, tick, true);
        }
        Some(outcome)
    }

    // ========================================================================
    // Buffs
    // ========================================================================

    /// Adds every effect of a conditional skill effect to this actor.
    pub fn apply_effect(
        &self,
        field: &dyn FieldContext,
        caster: &Actor,
        owner: &Actor,
        effect: &SkillEffectMetadata,
        start_tick: Tick,
    ) {
        debug_assert!(effect.condition.is_some());
        for skill in &effect.skills {
            self.add_buff(field, caster, owner, skill.id, skill.level, start_tick, true);
        }
    }

    /// Adds or refreshes a buff. Returns `false` if the effect is unknown.
    #[allow(clippy::too_many_arguments)]
    pub fn add_buff(
        &self,
        field: &dyn FieldContext,
        caster: &Actor,
        owner: &Actor,
        effect_id: EffectId,
        level: i16,
        start_tick: Tick,
        notify: bool,
    ) -> bool {
        let Some(metadata) = field.effect_metadata(effect_id, level) else {
            warn!(object_id = %self.object_id, %effect_id, level, "Unknown effect");
            return false;
        };

        let change = self
            .buffs
            .lock()
            .add(metadata, caster.object_id(), owner.object_id(), start_tick);
        let stacks = match change {
            BuffChange::Added => 1,
            BuffChange::Refreshed(stacks) => stacks,
        };

        if notify {
            field.broadcast(FieldEvent::BuffAdded {
                object_id: self.object_id,
                caster_id: caster.object_id(),
                effect_id,
                level,
                stacks,
            });
        }
        true
    }

    /// Removes a buff. Returns `false` if it was not active.
    pub fn remove_buff(&self, field: &dyn FieldContext, effect_id: EffectId, notify: bool) -> bool {
        let removed = self.buffs.lock().remove(effect_id).is_some();
        if removed && notify {
            field.broadcast(FieldEvent::BuffRemoved {
                object_id: self.object_id,
                effect_id,
            });
        }
        removed
    }

    /// Fires an event against this actor's buffs and applies the matching procs.
    pub fn trigger_event(
        &self,
        field: &dyn FieldContext,
        caster: &Actor,
        owner: &Actor,
        target: &Actor,
        event: EventConditionType,
        skill_id: SkillId,
    ) {
        let procs = self.buffs.lock().trigger_event(event, skill_id);
        if procs.is_empty() {
            return;
        }

        let start_tick = field.field_tick();
        for proc in procs {
            let recipient = match proc.recipient {
                ProcRecipient::Caster => caster,
                ProcRecipient::Owner => owner,
                ProcRecipient::Target => target,
            };
            let effect = proc.effect;
            recipient.add_buff(field, self, self, effect.id, effect.level, start_tick, true);
        }
    }
}
