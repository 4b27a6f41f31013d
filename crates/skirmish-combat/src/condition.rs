//! Event conditions, effect targeting and begin conditions.

use serde::{Deserialize, Serialize};
use skirmish_common::EffectId;

use crate::actor::Actor;
use crate::error::{CombatError, CombatResult};
use crate::stats::BasicAttribute;

/// Named trigger points buffs can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventConditionType {
    /// The buff owner landed a hit
    OnOwnerAttackHit,
    /// The buff owner landed a critical hit
    OnOwnerAttackCrit,
    /// The buff owner's attack missed
    OnAttackMiss,
    /// The buff owner died
    OnDeath,
}

/// Entity tag naming whom an effect condition is evaluated for.
///
/// Only `Target`, `Owner` and `Caster` are resolvable by a direct attack;
/// the remaining tags exist in skill data for region and pet skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillEntity {
    /// The actor that was hit
    Target,
    /// The owner of the effect (the actor that was hit)
    Owner,
    /// The actor that cast the skill
    Caster,
    /// The last actor to attack the target
    Attacker,
    /// The owner of a pet caster
    PetOwner,
    /// Friendly actors inside a region skill
    RegionBuff,
    /// Hostile actors inside a region skill
    RegionDebuff,
}

impl SkillEntity {
    /// Resolves the tag to the caster or the hit target.
    ///
    /// Tags that do not name either fail with
    /// [`CombatError::UnrecognizedEntity`].
    pub fn resolve<'a, T: ?Sized>(self, caster: &'a T, target: &'a T) -> CombatResult<&'a T> {
        match self {
            Self::Target | Self::Owner => Ok(target),
            Self::Caster => Ok(caster),
            Self::Attacker | Self::PetOwner | Self::RegionBuff | Self::RegionDebuff => {
                Err(CombatError::UnrecognizedEntity(self))
            },
        }
    }
}

/// Requirements checked before an effect is applied.
///
/// All set requirements must hold; an empty condition always passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeginCondition {
    /// Owner must be alive.
    pub owner_alive: bool,
    /// Target must be alive.
    pub target_alive: bool,
    /// Target health ratio must be strictly below this value.
    pub target_health_below: Option<f32>,
    /// Buffs the caster must have.
    pub caster_buffs: Vec<EffectId>,
    /// Buffs the owner must have.
    pub owner_buffs: Vec<EffectId>,
}

impl BeginCondition {
    /// Evaluates the condition.
    #[must_use]
    pub fn check(&self, caster: &Actor, owner: &Actor, target: &Actor) -> bool {
        if self.owner_alive && owner.is_dead() {
            return false;
        }
        if self.target_alive && target.is_dead() {
            return false;
        }
        if let Some(threshold) = self.target_health_below {
            if target.stats().ratio(BasicAttribute::Health) >= threshold {
                return false;
            }
        }
        self.caster_buffs.iter().all(|&id| caster.has_buff(id))
            && self.owner_buffs.iter().all(|&id| owner.has_buff(id))
    }
}

/// Condition attached to a skill effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectCondition {
    /// Whose perspective the condition is evaluated from.
    pub target: SkillEntity,
    /// Requirements.
    #[serde(default)]
    pub condition: BeginCondition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorPayload;
    use crate::buff::EffectMetadata;
    use crate::config::CombatConfig;
    use crate::field::Field;
    use crate::metadata::MetadataStorage;
    use crate::stats::Stats;
    use skirmish_common::Transform;
    use std::sync::Arc;

    #[test]
    fn test_resolve_entity() {
        let caster = "caster";
        let target = "target";

        assert_eq!(*SkillEntity::Target.resolve(&caster, &target).expect("resolves"), "target");
        assert_eq!(*SkillEntity::Owner.resolve(&caster, &target).expect("resolves"), "target");
        assert_eq!(*SkillEntity::Caster.resolve(&caster, &target).expect("resolves"), "caster");
    }

    #[test]
    fn test_unrecognized_entity_fails() {
        let result = SkillEntity::RegionDebuff.resolve(&1, &2);
        assert!(matches!(
            result,
            Err(CombatError::UnrecognizedEntity(SkillEntity::RegionDebuff))
        ));
    }

    const GUARD: EffectId = EffectId::new(50_000_020);
    const FURY: EffectId = EffectId::new(50_000_021);

    fn field() -> Field {
        let mut storage = MetadataStorage::new();
        storage.insert_effect(EffectMetadata::new(GUARD, 1));
        storage.insert_effect(EffectMetadata::new(FURY, 1));
        Field::new(&CombatConfig::default(), storage)
    }

    fn spawn(field: &Field, health: i64) -> Arc<Actor> {
        field.spawn(
            ActorPayload::Npc { npc_id: 21_000_001 },
            Transform::default(),
            Stats::new().with(BasicAttribute::Health, health),
        )
    }

    fn grant(field: &Field, actor: &Actor, effect_id: EffectId) {
        assert!(actor.add_buff(field, actor, actor, effect_id, 1, 0, false));
    }

    #[test]
    fn test_empty_condition_passes() {
        let field = field();
        let actor = spawn(&field, 100);
        assert!(BeginCondition::default().check(&actor, &actor, &actor));
    }

    #[test]
    fn test_owner_alive() {
        let field = field();
        let caster = spawn(&field, 100);
        let target = spawn(&field, 100);
        let owner = spawn(&field, 0);
        let condition = BeginCondition {
            owner_alive: true,
            ..BeginCondition::default()
        };

        assert!(condition.check(&caster, &owner, &target));
        field.update(100);
        assert!(owner.is_dead());
        assert!(!condition.check(&caster, &owner, &target));
        assert!(condition.check(&caster, &target, &owner));
    }

    #[test]
    fn test_target_alive() {
        let field = field();
        let caster = spawn(&field, 100);
        let target = spawn(&field, 0);
        let condition = BeginCondition {
            target_alive: true,
            ..BeginCondition::default()
        };

        field.update(100);
        assert!(!condition.check(&caster, &caster, &target));
        assert!(condition.check(&caster, &target, &caster));
    }

    #[test]
    fn test_target_health_below_is_strict() {
        let field = field();
        let caster = spawn(&field, 100);
        let target = spawn(&field, 100);
        let condition = BeginCondition {
            target_health_below: Some(0.5),
            ..BeginCondition::default()
        };

        assert!(!condition.check(&caster, &target, &target));
        target.stats().get(BasicAttribute::Health).add(-50);
        assert!(!condition.check(&caster, &target, &target));
        target.stats().get(BasicAttribute::Health).add(-1);
        assert!(condition.check(&caster, &target, &target));
    }

    #[test]
    fn test_caster_buffs_all_required() {
        let field = field();
        let caster = spawn(&field, 100);
        let target = spawn(&field, 100);
        let condition = BeginCondition {
            caster_buffs: vec![GUARD, FURY],
            ..BeginCondition::default()
        };
        grant(&field, &target, GUARD);
        grant(&field, &target, FURY);

        grant(&field, &caster, GUARD);
        assert!(!condition.check(&caster, &target, &target));
        grant(&field, &caster, FURY);
        assert!(condition.check(&caster, &target, &target));
    }

    #[test]
    fn test_owner_buffs_checked_on_owner() {
        let field = field();
        let caster = spawn(&field, 100);
        let owner = spawn(&field, 100);
        let condition = BeginCondition {
            owner_buffs: vec![GUARD],
            ..BeginCondition::default()
        };
        grant(&field, &caster, GUARD);

        assert!(!condition.check(&caster, &owner, &caster));
        grant(&field, &owner, GUARD);
        assert!(condition.check(&caster, &owner, &caster));
    }
}
