//! Skirmish runner configuration.
//!
//! Loaded from a TOML file; any missing key falls back to its default.

use serde::{Deserialize, Serialize};
use skirmish_combat::CombatConfig;
use skirmish_common::{EffectId, SkillId, SkirmishError, SkirmishResult, Tick};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "skirmish.toml";

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Timing ===
    /// Number of field ticks to simulate
    pub ticks: u32,
    /// Field ticks advanced per step (milliseconds)
    pub tick_interval: Tick,
    /// Steps between casts
    pub cast_every: u32,

    // === Data ===
    /// Skill/effect table, `None` uses the bundled table
    pub metadata_path: Option<PathBuf>,

    // === Combatants ===
    /// Number of hostile NPCs
    pub npc_count: u32,
    /// Distance of the NPC ring from the player
    pub npc_spacing: f32,
    /// Skill cast by the player
    pub player_skill: SkillId,
    /// Skill cast by NPCs
    pub npc_skill: SkillId,
    /// Level of every cast
    pub skill_level: i16,
    /// Buffs every NPC starts with (`[]` for none)
    pub npc_buffs: Vec<EffectId>,
    /// Buffs the player starts with (`[]` for none)
    pub player_buffs: Vec<EffectId>,

    // === Combat ===
    /// Combat tuning
    pub combat: CombatConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: 300,
            tick_interval: 100,
            cast_every: 10,
            metadata_path: None,
            npc_count: 3,
            npc_spacing: 150.0,
            player_skill: SkillId::new(10_000_001),
            npc_skill: SkillId::new(20_000_001),
            skill_level: 1,
            npc_buffs: vec![EffectId::new(50_000_001)],
            player_buffs: vec![EffectId::new(50_000_004)],
            combat: CombatConfig {
                rng_seed: Some(0x5EED),
                ..CombatConfig::default()
            },
        }
    }
}

impl SimConfig {
    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(mut config) => {
                    config.validate();
                    info!("Loaded config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse config file: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SkirmishResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| SkirmishError::Config(e.to_string()))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp values to workable ranges.
    pub fn validate(&mut self) {
        self.tick_interval = self.tick_interval.clamp(1, 10_000);
        self.cast_every = self.cast_every.max(1);
        self.npc_count = self.npc_count.min(64);
        self.npc_spacing = self.npc_spacing.clamp(1.0, 10_000.0);
        self.combat.event_capacity = self.combat.event_capacity.max(16);
    }
}
