//! The field: owner of actors and the collaborator the combat core talks to.
//!
//! Actors never hold a reference back to their field. Every combat
//! operation receives a [`FieldContext`] explicitly, which keeps ownership
//! one-way: the field owns actors, records only borrow them.

use dashmap::DashMap;
use parking_lot::Mutex;
use skirmish_common::{EffectId, ObjectId, ObjectIdAllocator, SkillId, Tick, Transform, Vec3};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::actor::{Actor, ActorPayload};
use crate::buff::EffectMetadata;
use crate::calculator::DamageCalculator;
use crate::config::CombatConfig;
use crate::error::{CombatError, CombatResult};
use crate::events::{EventBus, FieldEvent};
use crate::metadata::MetadataStorage;
use crate::random::{RandomSource, SeededRandom};
use crate::skill::{SkillEffectMetadata, SkillMetadata};
use crate::stats::Stats;

/// Services the combat core consumes from its surrounding field.
pub trait FieldContext: Send + Sync {
    /// Current field tick.
    fn field_tick(&self) -> Tick;

    /// Broadcasts a notification to the field.
    fn broadcast(&self, event: FieldEvent);

    /// Spawns a region skill from a splash effect.
    fn add_skill(
        &self,
        caster: &Actor,
        effect: &SkillEffectMetadata,
        positions: Vec<Vec3>,
        rotation: Vec3,
    );

    /// Looks up an actor registered in the field.
    fn try_get_actor(&self, object_id: ObjectId) -> Option<Arc<Actor>>;

    /// Looks up skill metadata.
    fn skill_metadata(&self, id: SkillId, level: i16) -> Option<Arc<SkillMetadata>>;

    /// Looks up effect metadata.
    fn effect_metadata(&self, id: EffectId, level: i16) -> Option<Arc<EffectMetadata>>;

    /// Damage calculator of the field.
    fn calculator(&self) -> &DamageCalculator;

    /// Random source for every combat roll in the field.
    fn random(&self) -> &dyn RandomSource;
}

/// A region skill spawned by a splash effect.
#[derive(Debug, Clone)]
pub struct SkillEffectInstance {
    /// Id of the region
    pub object_id: ObjectId,
    /// Actor that caused it
    pub caster_id: ObjectId,
    /// Effect entry it was spawned from
    pub effect: SkillEffectMetadata,
    /// Region origins
    pub positions: Vec<Vec3>,
    /// Region rotation
    pub rotation: Vec3,
    /// Spawn tick
    pub start_tick: Tick,
    /// Despawn tick, `None` when the splash has no duration
    pub end_tick: Option<Tick>,
    /// Tick of the next pulse, `None` once a one-shot region has fired
    pub next_pulse: Option<Tick>,
}

impl SkillEffectInstance {
    /// Whether the region has run out at `tick`.
    #[must_use]
    pub fn is_expired(&self, tick: Tick) -> bool {
        self.end_tick.is_some_and(|end| tick >= end)
    }

    /// Number of pulses due by `tick`, advancing the pulse schedule.
    ///
    /// A region pulses at its spawn tick and every `interval_ticks` after,
    /// never at or past its end tick. A non-positive interval pulses once.
    pub fn take_pulses(&mut self, tick: Tick) -> u32 {
        let interval = self
            .effect
            .splash
            .as_ref()
            .map_or(0, |splash| splash.interval_ticks);
        let mut pulses = 0;
        while let Some(next) = self.next_pulse {
            if next > tick || self.end_tick.is_some_and(|end| next >= end) {
                break;
            }
            pulses += 1;
            self.next_pulse = (interval > 0).then(|| next + interval);
        }
        pulses
    }

    /// Radius around each origin that a pulse reaches.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.effect.splash.as_ref().map_or(0.0, |splash| splash.range)
    }
}

/// A combat field owning its actors.
pub struct Field {
    ids: ObjectIdAllocator,
    actors: DashMap<ObjectId, Arc<Actor>>,
    tick: AtomicI64,
    metadata: MetadataStorage,
    calculator: DamageCalculator,
    random: Box<dyn RandomSource>,
    events: EventBus,
    skill_effects: Mutex<Vec<SkillEffectInstance>>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("actors", &self.actors.len())
            .field("tick", &self.field_tick())
            .field("pending_events", &self.events.pending_count())
            .field("dropped_events", &self.events.dropped_count())
            .finish_non_exhaustive()
    }
}

impl Field {
    /// Creates an empty field.
    #[must_use]
    pub fn new(config: &CombatConfig, metadata: MetadataStorage) -> Self {
        let random = config
            .rng_seed
            .map_or_else(SeededRandom::from_entropy, SeededRandom::new);
        Self {
            ids: ObjectIdAllocator::new(),
            actors: DashMap::new(),
            tick: AtomicI64::new(0),
            metadata,
            calculator: DamageCalculator::with_config(config.calculator.clone()),
            random: Box::new(random),
            events: EventBus::new(config.event_capacity),
            skill_effects: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the random source (builder).
    #[must_use]
    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    /// Registers a new actor and returns it.
    pub fn spawn(&self, payload: ActorPayload, transform: Transform, stats: Stats) -> Arc<Actor> {
        let object_id = self.ids.next();
        let actor = Arc::new(Actor::new(object_id, payload, transform, stats));
        self.actors.insert(object_id, Arc::clone(&actor));
        debug!(%object_id, position = ?transform.position, "Actor spawned");
        actor
    }

    /// Removes an actor from the field.
    ///
    /// The field releases its handle; the actor is dropped once in-flight
    /// records let go of theirs. Object ids are never reused within a field.
    pub fn despawn(&self, object_id: ObjectId) -> CombatResult<Arc<Actor>> {
        let (_, actor) = self
            .actors
            .remove(&object_id)
            .ok_or(CombatError::ActorNotFound(object_id))?;
        debug!(%object_id, "Actor despawned");
        Ok(actor)
    }

    /// Advances the field to `tick`: actors first, then region pulses and
    /// expiry.
    pub fn update(&self, tick: Tick) {
        self.tick.store(tick, Ordering::Release);

        let actors: Vec<Arc<Actor>> = self.actors.iter().map(|e| Arc::clone(e.value())).collect();
        for actor in actors {
            actor.update(self, tick);
        }

        let pulses: Vec<(SkillEffectInstance, u32)> = {
            let mut regions = self.skill_effects.lock();
            let due: Vec<_> = regions
                .iter_mut()
                .filter_map(|instance| {
                    let count = instance.take_pulses(tick);
                    (count > 0).then(|| (instance.clone(), count))
                })
                .collect();
            regions.retain(|instance| {
                let expired = instance.is_expired(tick);
                if expired {
                    trace!(object_id = %instance.object_id, tick, "Skill effect expired");
                }
                !expired
            });
            due
        };
        for (instance, count) in pulses {
            for _ in 0..count {
                self.pulse(&instance, tick);
            }
        }
    }

    /// Applies a region's effects to every living actor it reaches, except
    /// the actor that spawned it.
    fn pulse(&self, instance: &SkillEffectInstance, tick: Tick) {
        let Some(caster) = self.try_get_actor(instance.caster_id) else {
            trace!(object_id = %instance.object_id, "Skill effect caster gone");
            return;
        };

        let mut reached: Vec<Arc<Actor>> = Vec::new();
        for &origin in &instance.positions {
            for actor in self.actors_in_range(origin, instance.range(), instance.caster_id) {
                if !reached.iter().any(|a| a.object_id() == actor.object_id()) {
                    reached.push(actor);
                }
            }
        }

        debug!(
            object_id = %instance.object_id,
            tick,
            reached = reached.len(),
            "Skill effect pulsed"
        );
        for actor in reached {
            for skill in &instance.effect.skills {
                actor.add_buff(self, &caster, &actor, skill.id, skill.level, tick, true);
            }
        }
    }

    /// Living actors within `range` of `center`, nearest first.
    pub fn actors_in_range(&self, center: Vec3, range: f32, exclude: ObjectId) -> Vec<Arc<Actor>> {
        let mut found: Vec<(f32, Arc<Actor>)> = self
            .actors
            .iter()
            .filter(|e| *e.key() != exclude && !e.value().is_dead())
            .filter_map(|e| {
                let distance = e.value().position().distance(center);
                (distance <= range).then(|| (distance, Arc::clone(e.value())))
            })
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.into_iter().map(|(_, actor)| actor).collect()
    }

    /// Takes every pending notification.
    pub fn drain_events(&self) -> Vec<FieldEvent> {
        self.events.drain()
    }

    /// Active region skills.
    #[must_use]
    pub fn skill_effects(&self) -> Vec<SkillEffectInstance> {
        self.skill_effects.lock().clone()
    }

    /// Number of registered actors.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Metadata storage.
    #[must_use]
    pub fn metadata(&self) -> &MetadataStorage {
        &self.metadata
    }
}

impl FieldContext for Field {
    fn field_tick(&self) -> Tick {
        self.tick.load(Ordering::Acquire)
    }

    fn broadcast(&self, event: FieldEvent) {
        self.events.publish(event);
    }

    fn add_skill(
        &self,
        caster: &Actor,
        effect: &SkillEffectMetadata,
        positions: Vec<Vec3>,
        rotation: Vec3,
    ) {
        let start_tick = self.field_tick();
        let end_tick = effect
            .splash
            .as_ref()
            .filter(|splash| splash.duration_ticks > 0)
            .map(|splash| start_tick + splash.duration_ticks);
        let instance = SkillEffectInstance {
            object_id: self.ids.next(),
            caster_id: caster.object_id(),
            effect: effect.clone(),
            positions,
            rotation,
            start_tick,
            end_tick,
            next_pulse: Some(start_tick),
        };

        debug!(
            object_id = %instance.object_id,
            caster_id = %instance.caster_id,
            "Skill effect spawned"
        );
        self.broadcast(FieldEvent::SkillEffectSpawned {
            object_id: instance.object_id,
            caster_id: instance.caster_id,
            positions: instance.positions.clone(),
            rotation,
        });
        self.skill_effects.lock().push(instance);
    }

    fn try_get_actor(&self, object_id: ObjectId) -> Option<Arc<Actor>> {
        self.actors.get(&object_id).map(|e| Arc::clone(e.value()))
    }

    fn skill_metadata(&self, id: SkillId, level: i16) -> Option<Arc<SkillMetadata>> {
        self.metadata.skill(id, level)
    }

    fn effect_metadata(&self, id: EffectId, level: i16) -> Option<Arc<EffectMetadata>> {
        self.metadata.effect(id, level)
    }

    fn calculator(&self) -> &DamageCalculator {
        &self.calculator
    }

    fn random(&self) -> &dyn RandomSource {
        self.random.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buff::{EffectMetadata, EffectSkill};
    use crate::skill::SplashMetadata;
    use crate::stats::BasicAttribute;

    const SCORCHED: EffectId = EffectId::new(50_000_010);

    fn scorch_effect(interval_ticks: Tick, duration_ticks: Tick) -> SkillEffectMetadata {
        SkillEffectMetadata {
            splash: Some(SplashMetadata {
                interval_ticks,
                duration_ticks,
                range: 100.0,
            }),
            skills: vec![EffectSkill::new(SCORCHED, 1)],
            ..SkillEffectMetadata::default()
        }
    }

    fn scorch_field() -> Field {
        let mut storage = MetadataStorage::new();
        storage.insert_effect(EffectMetadata::new(SCORCHED, 1).with_max_stacks(10));
        Field::new(&CombatConfig::default(), storage)
    }

    fn npc() -> ActorPayload {
        ActorPayload::Npc { npc_id: 21_000_001 }
    }

    fn field() -> Field {
        Field::new(&CombatConfig::default(), MetadataStorage::new())
    }

    #[test]
    fn test_spawn_and_despawn() {
        let field = field();
        let a = field.spawn(npc(), Transform::default(), Stats::new());
        let b = field.spawn(npc(), Transform::default(), Stats::new());
        assert_ne!(a.object_id(), b.object_id());
        assert_eq!(field.actor_count(), 2);

        let found = field.try_get_actor(a.object_id()).expect("actor should exist");
        assert!(Arc::ptr_eq(&found, &a));

        field.despawn(a.object_id()).expect("despawn should succeed");
        assert!(field.try_get_actor(a.object_id()).is_none());
        assert!(matches!(
            field.despawn(a.object_id()),
            Err(CombatError::ActorNotFound(_))
        ));
    }

    #[test]
    fn test_update_advances_tick() {
        let field = field();
        field.update(1234);
        assert_eq!(field.field_tick(), 1234);
    }

    #[test]
    fn test_actors_in_range_sorted_and_filtered() {
        let field = field();
        let at = |x: f32| Transform::at(Vec3::new(x, 0.0, 0.0));
        let alive = || Stats::new().with(BasicAttribute::Health, 100);
        let caster = field.spawn(npc(), Transform::default(), alive());
        let far = field.spawn(npc(), at(300.0), alive());
        let near = field.spawn(npc(), at(50.0), alive());
        let _outside = field.spawn(npc(), at(900.0), alive());
        let dead = field.spawn(npc(), at(10.0), Stats::new());
        field.update(1);
        assert!(dead.is_dead());

        let found = field.actors_in_range(Vec3::ZERO, 400.0, caster.object_id());
        let ids: Vec<_> = found.iter().map(|a| a.object_id()).collect();
        assert_eq!(ids, vec![near.object_id(), far.object_id()]);
    }

    #[test]
    fn test_add_skill_spawns_and_expires_region() {
        let field = field();
        let caster = field.spawn(npc(), Transform::default(), Stats::new());
        let effect = SkillEffectMetadata {
            splash: Some(SplashMetadata {
                interval_ticks: 100,
                duration_ticks: 500,
                range: 150.0,
            }),
            ..SkillEffectMetadata::default()
        };

        field.update(1000);
        field.add_skill(&caster, &effect, vec![Vec3::ONE], Vec3::ZERO);

        let regions = field.skill_effects();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].end_tick, Some(1500));
        assert!(field
            .drain_events()
            .iter()
            .any(|e| matches!(e, FieldEvent::SkillEffectSpawned { .. })));

        field.update(1499);
        assert_eq!(field.skill_effects().len(), 1);
        field.update(1500);
        assert!(field.skill_effects().is_empty());
    }

    #[test]
    fn test_despawned_ids_are_not_reused() {
        let field = field();
        let first = field.spawn(npc(), Transform::default(), Stats::new());
        field.despawn(first.object_id()).expect("despawn should succeed");

        let second = field.spawn(npc(), Transform::default(), Stats::new());
        assert_ne!(first.object_id(), second.object_id());
        assert_eq!(field.actor_count(), 1);
    }

    #[test]
    fn test_region_pulses_reach_actors_in_range() {
        let field = scorch_field();
        let health = || Stats::new().with(BasicAttribute::Health, 100);
        let caster = field.spawn(npc(), Transform::default(), health());
        let near = field.spawn(npc(), Transform::at(Vec3::new(10.0, 0.0, 0.0)), health());
        let far = field.spawn(npc(), Transform::at(Vec3::new(500.0, 0.0, 0.0)), health());

        field.add_skill(&caster, &scorch_effect(100, 350), vec![Vec3::ZERO], Vec3::ZERO);
        field.drain_events();

        field.update(0);
        assert_eq!(near.buff_stacks(SCORCHED), Some(1));
        assert!(!far.has_buff(SCORCHED));
        assert!(!caster.has_buff(SCORCHED));

        field.update(50);
        assert_eq!(near.buff_stacks(SCORCHED), Some(1));

        field.update(300);
        assert_eq!(near.buff_stacks(SCORCHED), Some(4));
        assert!(field.drain_events().iter().any(|e| matches!(
            e,
            FieldEvent::BuffAdded { object_id, caster_id, .. }
                if *object_id == near.object_id() && *caster_id == caster.object_id()
        )));

        field.update(400);
        assert!(field.skill_effects().is_empty());
        assert_eq!(near.buff_stacks(SCORCHED), Some(4));
    }

    #[test]
    fn test_one_shot_region_pulses_once() {
        let field = scorch_field();
        let health = || Stats::new().with(BasicAttribute::Health, 100);
        let caster = field.spawn(npc(), Transform::default(), health());
        let near = field.spawn(npc(), Transform::at(Vec3::new(0.0, 20.0, 0.0)), health());

        field.add_skill(&caster, &scorch_effect(0, 0), vec![Vec3::ZERO], Vec3::ZERO);
        for tick in [0, 100, 200] {
            field.update(tick);
        }

        assert_eq!(near.buff_stacks(SCORCHED), Some(1));
        assert_eq!(field.skill_effects().len(), 1);
    }

    #[test]
    fn test_take_pulses_catches_up() {
        let mut instance = SkillEffectInstance {
            object_id: ObjectId::new(1),
            caster_id: ObjectId::new(2),
            effect: scorch_effect(100, 1000),
            positions: vec![Vec3::ZERO],
            rotation: Vec3::ZERO,
            start_tick: 1000,
            end_tick: Some(1250),
            next_pulse: Some(1000),
        };

        assert_eq!(instance.take_pulses(999), 0);
        assert_eq!(instance.take_pulses(1150), 2);
        assert_eq!(instance.take_pulses(5000), 1);
        assert_eq!(instance.take_pulses(6000), 0);
    }
}
