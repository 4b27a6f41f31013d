//! Scripted skirmish: one player against a ring of NPCs.

use skirmish_combat::{
    Actor, ActorPayload, BasicAttribute, Field, FieldContext, FieldEvent, MetadataStorage, Stats,
};
use skirmish_common::{
    EffectId, ObjectId, SkillId, SkillUid, SkirmishError, SkirmishResult, Tick, Transform, Vec3,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SimConfig;

/// Skill table shipped with the runner.
pub const BUNDLED_METADATA: &str = include_str!("../data/skills.ron");

/// Loads a skill table from disk, or the bundled one.
pub fn load_metadata(path: Option<&Path>) -> SkirmishResult<MetadataStorage> {
    let source = match path {
        Some(path) => fs::read_to_string(path)?,
        None => BUNDLED_METADATA.to_owned(),
    };
    MetadataStorage::from_ron(&source).map_err(|e| SkirmishError::Metadata(e.to_string()))
}

/// Outcome of a skirmish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkirmishReport {
    /// Steps simulated
    pub steps: u32,
    /// Accepted casts
    pub casts: u32,
    /// Damage records broadcast
    pub damage_events: usize,
    /// Buffs added or refreshed
    pub buffs_applied: usize,
    /// Actors that died, in order
    pub deaths: Vec<ObjectId>,
    /// Living actors and their health
    pub survivors: Vec<(ObjectId, i64)>,
}

/// A running skirmish.
#[derive(Debug)]
pub struct Skirmish {
    config: SimConfig,
    field: Field,
    player: Arc<Actor>,
    npcs: Vec<Arc<Actor>>,
    next_uid: i64,
}

impl Skirmish {
    /// Spawns the player at the origin and the NPCs in a ring around it.
    pub fn new(config: SimConfig, metadata: MetadataStorage) -> Self {
        let field = Field::new(&config.combat, metadata);

        let player = field.spawn(
            ActorPayload::Player {
                character_id: 1,
                name: "Ayla".to_owned(),
            },
            Transform::default(),
            Stats::new()
                .with(BasicAttribute::Health, 2500)
                .with(BasicAttribute::PhysicalAtk, 60)
                .with(BasicAttribute::Defense, 30)
                .with(BasicAttribute::Accuracy, 20)
                .with(BasicAttribute::CriticalRate, 200),
        );

        let npcs: Vec<Arc<Actor>> = (0..config.npc_count)
            .map(|i| {
                let angle = i as f32 * 360.0 / config.npc_count as f32;
                let (sin, cos) = angle.to_radians().sin_cos();
                let position = Vec3::new(cos, sin, 0.0) * config.npc_spacing;
                field.spawn(
                    ActorPayload::Npc {
                        npc_id: 21_000_001 + i as i32,
                    },
                    Transform::at(position).with_rotation(Vec3::new(0.0, 0.0, angle + 180.0)),
                    Stats::new()
                        .with(BasicAttribute::Health, 600)
                        .with(BasicAttribute::PhysicalAtk, 45)
                        .with(BasicAttribute::Defense, 15)
                        .with(BasicAttribute::Evasion, 10)
                        .with(BasicAttribute::BlockRate, 80),
                )
            })
            .collect();

        let skirmish = Self {
            config,
            field,
            player,
            npcs,
            next_uid: 0,
        };
        skirmish.apply_starting_buffs();
        skirmish
    }

    fn apply_starting_buffs(&self) {
        let level = self.config.skill_level;
        for &effect_id in &self.config.player_buffs {
            grant(&self.field, &self.player, effect_id, level);
        }
        for npc in &self.npcs {
            for &effect_id in &self.config.npc_buffs {
                grant(&self.field, npc, effect_id, level);
            }
        }
    }

    /// Runs until the configured tick count or until one side is wiped out.
    pub fn run(&mut self) -> SkirmishReport {
        let mut report = SkirmishReport::default();
        let player = Arc::clone(&self.player);
        let npcs = self.npcs.clone();

        for step in 1..=self.config.ticks {
            let tick = Tick::from(step) * self.config.tick_interval;
            self.field.update(tick);
            report.steps = step;

            if step % self.config.cast_every == 0 {
                if !player.is_dead() && self.attack(&player, self.config.player_skill) {
                    report.casts += 1;
                }
                for npc in npcs.iter().filter(|npc| !npc.is_dead()) {
                    if self.attack(npc, self.config.npc_skill) {
                        report.casts += 1;
                    }
                }
            }

            self.collect_events(&mut report);
            if player.is_dead() || npcs.iter().all(|npc| npc.is_dead()) {
                break;
            }
        }

        report.survivors = std::iter::once(&player)
            .chain(npcs.iter())
            .filter(|actor| !actor.is_dead())
            .map(|actor| (actor.object_id(), actor.health()))
            .collect();

        for actor in std::iter::once(&player).chain(npcs.iter()) {
            if let Some((attacker, damage)) = actor.damage_dealers().first() {
                info!(
                    object_id = %actor.object_id(),
                    top_attacker = %attacker,
                    damage,
                    "Damage taken"
                );
            }
        }
        report
    }

    /// Casts a skill and resolves every attack point of its first motion
    /// against hostile actors in range.
    fn attack(&mut self, caster: &Arc<Actor>, skill_id: SkillId) -> bool {
        self.next_uid += 1;
        let uid = SkillUid::new(self.next_uid);
        let level = self.config.skill_level;
        let Some(mut record) = caster.cast_skill(&self.field, skill_id, level, uid, 0) else {
            return false;
        };

        let points: Vec<u8> = record
            .motion()
            .map(|motion| motion.attacks.iter().map(|attack| attack.point).collect())
            .unwrap_or_default();
        for point in points {
            if !record.try_set_attack_point(point) {
                continue;
            }
            record.clear_targets();

            let range = record.attack().map_or(0.0, |attack| attack.range);
            let candidates = self
                .field
                .actors_in_range(caster.position(), range, caster.object_id());
            for target in candidates.into_iter().filter(|t| is_hostile(caster, t)) {
                if !record.add_target(target) {
                    break;
                }
            }

            debug!(
                caster_id = %caster.object_id(),
                %skill_id,
                point,
                targets = record.targets().len(),
                "Resolving attack"
            );
            if let Err(err) = caster.target_attack(&self.field, &record) {
                warn!(caster_id = %caster.object_id(), point, "Attack aborted: {err}");
                break;
            }
        }
        true
    }

    fn collect_events(&self, report: &mut SkirmishReport) {
        for event in self.field.drain_events() {
            match event {
                FieldEvent::SkillDamage(record) => {
                    report.damage_events += 1;
                    debug!(
                        caster_id = %record.caster_id,
                        damage = record.total_damage(),
                        "Damage dealt"
                    );
                },
                FieldEvent::BuffAdded { .. } => report.buffs_applied += 1,
                FieldEvent::ActorDied { object_id } => report.deaths.push(object_id),
                _ => {},
            }
        }
    }
}

fn grant(field: &Field, actor: &Actor, effect_id: EffectId, level: i16) {
    let tick = field.field_tick();
    actor.add_buff(field, actor, actor, effect_id, level, tick, true);
}

fn is_hostile(a: &Actor, b: &Actor) -> bool {
    let is_player = |actor: &Actor| matches!(actor.payload(), ActorPayload::Player { .. });
    is_player(a) != is_player(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_metadata_parses() {
        let storage = load_metadata(None).expect("bundled table should parse");
        let config = SimConfig::default();
        assert!(storage.skill(config.player_skill, 1).is_some());
        assert!(storage.skill(config.npc_skill, 1).is_some());
        assert!(storage.effect(EffectId::new(50_000_001), 1).is_some());
    }

    #[test]
    fn test_missing_metadata_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let result = load_metadata(Some(&temp_dir.path().join("missing.ron")));
        assert!(matches!(result, Err(SkirmishError::Io(_))));
    }

    #[test]
    fn test_malformed_metadata_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("skills.ron");
        fs::write(&path, "(skills: 12)").expect("write table");
        assert!(matches!(
            load_metadata(Some(&path)),
            Err(SkirmishError::Metadata(_))
        ));
    }

    #[test]
    fn test_starting_buffs_applied() {
        let config = SimConfig::default();
        let metadata = load_metadata(None).expect("bundled table");
        let skirmish = Skirmish::new(config, metadata);

        assert!(skirmish.player.has_buff(EffectId::new(50_000_004)));
        assert_eq!(skirmish.npcs.len(), 3);
        for npc in &skirmish.npcs {
            assert!(npc.has_buff(EffectId::new(50_000_001)));
            assert!(npc.reflect_counter().is_some());
        }
    }

    #[test]
    fn test_skirmish_runs() {
        let config = SimConfig {
            ticks: 200,
            ..SimConfig::default()
        };
        let metadata = load_metadata(None).expect("bundled table");
        let mut skirmish = Skirmish::new(config, metadata);

        let report = skirmish.run();

        assert!(report.steps > 0 && report.steps <= 200);
        assert!(report.casts > 0);
        assert!(report.damage_events > 0);
        assert_eq!(skirmish.field.actor_count(), 4);
    }

    #[test]
    fn test_every_attack_point_resolves() {
        let claw = SkillId::new(20_000_001);
        let config = SimConfig {
            ticks: 10,
            npc_count: 1,
            player_skill: claw,
            npc_skill: claw,
            npc_buffs: Vec::new(),
            player_buffs: Vec::new(),
            ..SimConfig::default()
        };
        let metadata = load_metadata(None).expect("bundled table");
        let claw_points = metadata
            .skill(claw, 1)
            .map(|skill| skill.motions[0].attacks.len())
            .expect("claw should exist");
        assert_eq!(claw_points, 2);

        let report = Skirmish::new(config, metadata).run();

        assert_eq!(report.casts, 2);
        assert_eq!(report.damage_events, 4);
    }

    #[test]
    fn test_no_starting_buffs() {
        let config = SimConfig {
            npc_buffs: Vec::new(),
            player_buffs: Vec::new(),
            ..SimConfig::default()
        };
        let metadata = load_metadata(None).expect("bundled table");
        let skirmish = Skirmish::new(config, metadata);

        assert!(!skirmish.player.has_buff(EffectId::new(50_000_004)));
        assert!(skirmish.npcs.iter().all(|npc| npc.reflect_counter().is_none()));
    }

    #[test]
    fn test_casts_without_targets_deal_no_damage() {
        let config = SimConfig {
            ticks: 50,
            npc_count: 0,
            ..SimConfig::default()
        };
        let metadata = load_metadata(None).expect("bundled table");
        let report = Skirmish::new(config, metadata).run();

        assert_eq!(report.casts, 0);
        assert_eq!(report.damage_events, 0);
        assert_eq!(report.steps, 1);
    }
}
