//! Driver configuration.
//!
//! Read from `armory.toml`. Every field has a default, so a missing or
//! partial file still yields a runnable scenario.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use armory_weapons::{
    AbilitySpec, AmmoSpec, EffectSpec, ProjectileProperties, TargetingSpec, WeaponBlueprint,
    DEFAULT_PRESET_PATH,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::scenario::ScriptStep;

/// Configuration file name.
pub const CONFIG_FILE: &str = "armory.toml";

/// A dummy placed on the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Tag used by lock-on and homing
    pub tag: String,
    /// World position
    pub position: Vec3,
    /// Starting health
    pub health: f32,
    /// Energy shield pool
    pub energy_shield: f32,
    /// Physical shield pool
    pub physical_shield: f32,
    /// Armor reduction fraction
    pub armor: f32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            tag: "enemy".to_string(),
            position: Vec3::new(0.0, 1.6, -15.0),
            health: 100.0,
            energy_shield: 0.0,
            physical_shield: 0.0,
            armor: 0.0,
        }
    }
}

impl TargetConfig {
    fn at(z: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, z),
            ..Self::default()
        }
    }
}

/// Driver configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Clock ===
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Scenario length in seconds
    pub duration: f32,
    /// Where to write the JSON summary (stdout only when unset)
    pub summary_path: Option<PathBuf>,

    // === Loadout ===
    /// Number of weapon slots
    pub slot_count: usize,
    /// Directory of extra preset files
    pub preset_dir: PathBuf,
    /// Seed for blueprints that do not set their own
    pub seed: u64,
    /// Weapons picked up at the start, one per slot
    #[serde(rename = "blueprint")]
    pub blueprints: Vec<WeaponBlueprint>,

    // === Range ===
    /// Target dummies
    #[serde(rename = "target")]
    pub targets: Vec<TargetConfig>,
    /// Scripted inputs; empty means the built-in script
    #[serde(rename = "cue")]
    pub script: Vec<ScriptStep>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 64,
            duration: 12.0,
            summary_path: None,

            slot_count: 3,
            preset_dir: PathBuf::from(DEFAULT_PRESET_PATH),
            seed: 0x5EED,
            blueprints: default_loadout(),

            targets: vec![
                TargetConfig::at(-12.0),
                TargetConfig {
                    energy_shield: 40.0,
                    ..TargetConfig::at(-24.0)
                },
                TargetConfig {
                    armor: 0.3,
                    health: 150.0,
                    ..TargetConfig::at(-36.0)
                },
            ],
            script: Vec::new(),
        }
    }
}

/// Rifle with homing lock, shotgun, and a plasma rifle with overcharge and
/// scope.
fn default_loadout() -> Vec<WeaponBlueprint> {
    vec![
        WeaponBlueprint::new("rifle", "assault_rifle").with_ability(AbilitySpec::stock(
            EffectSpec::HomingLock {
                tag: "enemy".to_string(),
                radius: 60.0,
            },
        )),
        WeaponBlueprint::new("scattergun", "shotgun").with_targeting(TargetingSpec::None),
        WeaponBlueprint::new("plasma", "plasma_rifle")
            .with_ammo(AmmoSpec::Energy)
            .with_projectile(ProjectileProperties::Energy)
            .with_ability(AbilitySpec::stock(EffectSpec::Overcharge {
                damage_multiplier: 1.5,
                fire_rate_multiplier: 1.25,
            }))
            .with_ability(AbilitySpec::stock(EffectSpec::Scope)),
    ]
}

impl SimConfig {
    /// Load configuration from `armory.toml` in the working directory.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(10, 1000);
        self.duration = self.duration.clamp(0.0, 600.0);
        self.slot_count = self.slot_count.clamp(1, 9);
        if self.blueprints.len() > self.slot_count {
            warn!(
                "{} blueprints for {} slots; extra weapons are ignored",
                self.blueprints.len(),
                self.slot_count
            );
            self.blueprints.truncate(self.slot_count);
        }
    }

    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Number of ticks the scenario runs.
    #[must_use]
    pub fn total_ticks(&self) -> u32 {
        (self.duration * self.tick_rate as f32).ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.tick_rate, 64);
        assert_eq!(config.blueprints.len(), 3);
        assert_eq!(config.targets.len(), 3);
        assert_eq!(config.dt(), 0.015_625);
        assert_eq!(config.total_ticks(), 768);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();
        config.tick_rate = 1;
        config.slot_count = 2;
        config.duration = -4.0;
        config.validate();

        assert_eq!(config.tick_rate, 10);
        assert_eq!(config.blueprints.len(), 2);
        assert_eq!(config.total_ticks(), 0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
                tick_rate = 32
                seed = 7

                [[blueprint]]
                tag = "lance"
                preset = "rail_lance"
                projectile = { kind = "piercing", max_pierce = 2 }

                [[cue]]
                at = 0.5
                cue = { kind = "tap", action = "fire" }
            "#,
        )
        .expect("write");

        let config = SimConfig::load_from(&path);
        assert_eq!(config.tick_rate, 32);
        assert_eq!(config.seed, 7);
        assert_eq!(config.blueprints.len(), 1);
        assert_eq!(config.blueprints[0].preset, "rail_lance");
        assert_eq!(config.script.len(), 1);
        assert_eq!(config.targets.len(), 3);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = SimConfig::default();
        config.duration = 3.0;
        config.summary_path = Some(PathBuf::from("summary.json"));
        config.save_to(&path).expect("Failed to save config");

        let loaded = SimConfig::load_from(&path);
        assert_eq!(loaded.duration, 3.0);
        assert_eq!(loaded.summary_path, Some(PathBuf::from("summary.json")));
        assert_eq!(loaded.blueprints, config.blueprints);
        assert_eq!(loaded.targets, config.targets);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "tick_rate = \"fast\"").expect("write");
        assert_eq!(SimConfig::load_from(&path).tick_rate, 64);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = SimConfig::load_from("/nonexistent/path/armory.toml");
        assert_eq!(config.duration, 12.0);
    }
}
