//! Skill and effect metadata lookup.
//!
//! Tables are loaded from RON:
//!
//! ```text
//! (
//!     skills: [(id: 10000001, level: 1, motions: [(attacks: [(damage: (count: 1))])])],
//!     effects: [(id: 50000001, level: 1, duration_ticks: 3000)],
//! )
//! ```

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use skirmish_common::{EffectId, SkillId};
use std::sync::Arc;
use tracing::info;

use crate::buff::EffectMetadata;
use crate::error::{CombatError, CombatResult};
use crate::skill::SkillMetadata;

/// Serialized form of a metadata table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataTable {
    /// Skill entries, one per (id, level)
    pub skills: Vec<SkillMetadata>,
    /// Effect entries, one per (id, level)
    pub effects: Vec<EffectMetadata>,
}

/// Lookup of skill and effect metadata by id and level.
#[derive(Debug, Default)]
pub struct MetadataStorage {
    skills: AHashMap<(SkillId, i16), Arc<SkillMetadata>>,
    effects: AHashMap<(EffectId, i16), Arc<EffectMetadata>>,
}

impl MetadataStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds storage from a table.
    #[must_use]
    pub fn from_table(table: MetadataTable) -> Self {
        let mut storage = Self::new();
        for skill in table.skills {
            storage.insert_skill(skill);
        }
        for effect in table.effects {
            storage.insert_effect(effect);
        }
        storage
    }

    /// Parses a RON table.
    pub fn from_ron(source: &str) -> CombatResult<Self> {
        let table: MetadataTable =
            ron::from_str(source).map_err(|e| CombatError::Metadata(e.to_string()))?;
        let storage = Self::from_table(table);
        info!(
            skills = storage.skills.len(),
            effects = storage.effects.len(),
            "Loaded metadata table"
        );
        Ok(storage)
    }

    /// Registers a skill, replacing any previous entry.
    pub fn insert_skill(&mut self, skill: SkillMetadata) {
        self.skills.insert((skill.id, skill.level), Arc::new(skill));
    }

    /// Registers an effect, replacing any previous entry.
    pub fn insert_effect(&mut self, effect: EffectMetadata) {
        self.effects
            .insert((effect.id, effect.level), Arc::new(effect));
    }

    /// Looks up a skill.
    #[must_use]
    pub fn skill(&self, id: SkillId, level: i16) -> Option<Arc<SkillMetadata>> {
        self.skills.get(&(id, level)).cloned()
    }

    /// Looks up an effect.
    #[must_use]
    pub fn effect(&self, id: EffectId, level: i16) -> Option<Arc<EffectMetadata>> {
        self.effects.get(&(id, level)).cloned()
    }
}
