//! Weapon presets and the profile registry.
//!
//! This module provides:
//! - Built-in presets for the common weapon archetypes
//! - Loading `[[weapon]]` tables from `*.toml` preset files
//! - Validation and duplicate rejection on registration
//! - Shared `Arc<WeaponProfile>` lookup by name

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use armory_common::{ArmoryError, ProfileError, SchemaVersion, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::profile::{
    AimSettings, ChargeCurve, ChargeSettings, EnergySettings, FireMode, WeaponProfile,
};

/// Default directory for preset files.
pub const DEFAULT_PRESET_PATH: &str = "assets/presets";

/// Errors that can occur while loading presets.
#[derive(Debug, Error)]
pub enum PresetLoadError {
    /// Failed to read file.
    #[error("Failed to read preset file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse preset TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A profile failed validation.
    #[error("Invalid preset: {0}")]
    Invalid(#[from] ProfileError),

    /// Two presets share a name.
    #[error("Duplicate preset name: {0}")]
    Duplicate(String),

    /// Lookup of a preset that is not registered.
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// File written by an incompatible schema.
    #[error("Preset schema {actual} cannot be read (expected {expected})")]
    Version {
        /// Version this build reads
        expected: SchemaVersion,
        /// Version found in the file
        actual: SchemaVersion,
    },
}

impl From<PresetLoadError> for ArmoryError {
    fn from(err: PresetLoadError) -> Self {
        match err {
            PresetLoadError::Io(e) => Self::Io(e),
            PresetLoadError::Parse(e) => Self::Serialization(e.to_string()),
            PresetLoadError::Invalid(e) => Self::Profile(e),
            PresetLoadError::Duplicate(name) => Self::DuplicatePreset(name),
            PresetLoadError::UnknownPreset(name) => Self::UnknownPreset(name),
            PresetLoadError::Version { expected, actual } => Self::VersionMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
        }
    }
}

/// Result type for preset loading.
pub type PresetResult<T> = Result<T, PresetLoadError>;

/// On-disk preset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetFile {
    /// File schema version.
    #[serde(default)]
    pub schema_version: SchemaVersion,
    /// Profiles in this file.
    #[serde(default)]
    pub weapon: Vec<WeaponProfile>,
}

/// The built-in presets.
#[must_use]
pub fn builtin_presets() -> Vec<WeaponProfile> {
    let mut marksman = WeaponProfile::named("marksman")
        .with_ammo(10, 40)
        .with_fire_rate(0.6)
        .with_reload_time(2.2)
        .with_damage(55.0)
        .with_spread(0.5)
        .with_modes(vec![FireMode::Single]);
    marksman.muzzle_velocity = 900.0;
    marksman.aim = AimSettings {
        fov: 30.0,
        offset: Vec3::new(0.0, -0.12, -0.25),
        accuracy_multiplier: 0.2,
        transition_time: 0.3,
        ..AimSettings::default()
    };
    marksman.critical_chance = 0.15;
    marksman.critical_multiplier = 2.5;

    let mut rail_lance = WeaponProfile::named("rail_lance")
        .with_ammo(4, 16)
        .with_fire_rate(1.0)
        .with_reload_time(3.0)
        .with_damage(60.0)
        .with_spread(0.0)
        .with_modes(vec![FireMode::Charge])
        .with_charge(ChargeSettings {
            min_charge_time: 0.4,
            max_charge_time: 1.5,
            curve: ChargeCurve::Keyframes {
                points: vec![(0.0, 1.0), (0.5, 1.75), (1.0, 3.0)],
            },
        });
    rail_lance.muzzle_velocity = 1200.0;
    rail_lance.recoil = 4.0;

    let mut plasma = WeaponProfile::named("plasma_rifle")
        .with_ammo(100, 0)
        .with_fire_rate(0.125)
        .with_damage(14.0)
        .with_overheat_threshold(80.0)
        .with_energy(EnergySettings {
            regen_rate: 10.0,
            overheat_cooldown: 2.0,
            resume_fraction: 0.3,
        })
        .with_modes(vec![FireMode::Auto]);
    plasma.muzzle_velocity = 180.0;
    plasma.recoil = 0.4;

    let mut shotgun = WeaponProfile::named("shotgun")
        .with_ammo(6, 24)
        .with_fire_rate(0.9)
        .with_reload_time(2.5)
        .with_damage(12.0)
        .with_scatter(8, 6.0)
        .with_modes(vec![FireMode::Scatter]);
    shotgun.recoil = 3.0;

    vec![
        WeaponProfile::named("pistol")
            .with_ammo(12, 48)
            .with_fire_rate(0.25)
            .with_reload_time(1.25)
            .with_damage(25.0)
            .with_spread(1.0)
            .with_modes(vec![FireMode::Single]),
        WeaponProfile::named("assault_rifle")
            .with_ammo(30, 120)
            .with_fire_rate(0.1)
            .with_reload_time(2.0)
            .with_damage(20.0)
            .with_spread(2.0)
            .with_burst(3, 0.075)
            .with_modes(vec![FireMode::Auto, FireMode::Single, FireMode::Burst]),
        WeaponProfile::named("burst_rifle")
            .with_ammo(24, 96)
            .with_fire_rate(0.4)
            .with_reload_time(2.0)
            .with_damage(22.0)
            .with_spread(1.2)
            .with_burst(3, 0.08)
            .with_modes(vec![FireMode::Burst, FireMode::Single]),
        shotgun,
        plasma,
        rail_lance,
        marksman,
        WeaponProfile::named("sidearm_infinite")
            .with_ammo(15, 0)
            .with_fire_rate(0.2)
            .with_damage(10.0)
            .with_modes(vec![FireMode::Single]),
    ]
}

/// Profiles by name.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: AHashMap<String, Arc<WeaponProfile>>,
}

impl ProfileRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in presets.
    pub fn with_builtins() -> PresetResult<Self> {
        let mut registry = Self::new();
        for profile in builtin_presets() {
            registry.register(profile)?;
        }
        Ok(registry)
    }

    /// Number of profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Whether a profile called `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Validates and registers a profile.
    pub fn register(&mut self, profile: WeaponProfile) -> PresetResult<Arc<WeaponProfile>> {
        profile.validate()?;
        if self.profiles.contains_key(&profile.name) {
            return Err(PresetLoadError::Duplicate(profile.name));
        }
        let profile = Arc::new(profile);
        self.profiles
            .insert(profile.name.clone(), Arc::clone(&profile));
        Ok(profile)
    }

    /// Looks up a profile.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<WeaponProfile>> {
        self.profiles.get(name).cloned()
    }

    /// Looks up a profile that must exist.
    pub fn require(&self, name: &str) -> PresetResult<Arc<WeaponProfile>> {
        self.get(name)
            .ok_or_else(|| PresetLoadError::UnknownPreset(name.to_string()))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Loads one preset file. Either every profile in it is registered or
    /// none is.
    pub fn load_file(&mut self, path: &Path) -> PresetResult<usize> {
        let content = fs::read_to_string(path)?;
        let file: PresetFile = toml::from_str(&content)?;

        if !SchemaVersion::WEAPON_PRESET.can_read(&file.schema_version) {
            return Err(PresetLoadError::Version {
                expected: SchemaVersion::WEAPON_PRESET,
                actual: file.schema_version,
            });
        }

        let mut seen = Vec::with_capacity(file.weapon.len());
        for profile in &file.weapon {
            profile.validate()?;
            if self.contains(&profile.name) || seen.contains(&profile.name.as_str()) {
                return Err(PresetLoadError::Duplicate(profile.name.clone()));
            }
            seen.push(profile.name.as_str());
        }

        let count = file.weapon.len();
        for profile in file.weapon {
            self.register(profile)?;
        }
        Ok(count)
    }

    /// Loads every `*.toml` file in `dir`, skipping files that fail.
    pub fn load_dir(&mut self, dir: &Path) -> PresetResult<usize> {
        if !dir.exists() {
            info!("Preset path {:?} does not exist; using registered presets only", dir);
            return Ok(0);
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        files.sort();

        let mut count = 0;
        for file in files {
            match self.load_file(&file) {
                Ok(n) => {
                    count += n;
                    debug!("Loaded {} presets from {:?}", n, file);
                },
                Err(e) => {
                    warn!("Failed to load preset file {:?}: {}", file, e);
                },
            }
        }

        info!("Loaded {} presets from {:?}", count, dir);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtins_are_valid_and_unique() {
        let registry = ProfileRegistry::with_builtins();
        assert!(registry.is_ok());
        let registry = registry.unwrap_or_default();
        assert_eq!(registry.len(), 8);
        assert!(registry.contains("plasma_rifle"));
        assert_eq!(registry.names().first(), Some(&"assault_rifle"));
    }

    #[test]
    fn test_register_rejects_duplicates_and_invalid() {
        let mut registry = ProfileRegistry::new();
        assert!(registry.register(WeaponProfile::named("a")).is_ok());
        assert!(matches!(
            registry.register(WeaponProfile::named("a")),
            Err(PresetLoadError::Duplicate(name)) if name == "a"
        ));
        assert!(matches!(
            registry.register(WeaponProfile::named("b").with_fire_rate(0.0)),
            Err(PresetLoadError::Invalid(ProfileError::FireRate { .. }))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_dir_skips_bad_files() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join("rifles.toml"),
            r#"
                [[weapon]]
                name = "carbine"
                magazine_capacity = 20
                total_ammo = 60
                fire_rate = 0.125
                fire_modes = ["auto", "single"]

                [[weapon]]
                name = "dmr"
                fire_modes = ["single"]
            "#,
        )
        .expect("write");
        fs::write(dir.path().join("broken.toml"), "[[weapon]]\nname = 5\n").expect("write");
        fs::write(
            dir.path().join("invalid.toml"),
            "[[weapon]]\nname = \"zero\"\nmagazine_capacity = 0\n",
        )
        .expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let mut registry = ProfileRegistry::new();
        let loaded = registry.load_dir(dir.path()).expect("load");
        assert_eq!(loaded, 2);
        assert_eq!(registry.names(), vec!["carbine", "dmr"]);
        let carbine = registry.get("carbine").expect("carbine");
        assert_eq!(carbine.fire_modes, vec![FireMode::Auto, FireMode::Single]);
        assert!(!registry.contains("zero"));
    }

    #[test]
    fn test_load_file_is_all_or_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("dupes.toml");
        fs::write(
            &path,
            "[[weapon]]\nname = \"x\"\n\n[[weapon]]\nname = \"x\"\n",
        )
        .expect("write");

        let mut registry = ProfileRegistry::new();
        assert!(matches!(
            registry.load_file(&path),
            Err(PresetLoadError::Duplicate(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_incompatible_schema_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("future.toml");
        fs::write(
            &path,
            "schema_version = { major = 2, minor = 0, patch = 0 }\n[[weapon]]\nname = \"y\"\n",
        )
        .expect("write");

        let mut registry = ProfileRegistry::new();
        let err = registry.load_file(&path);
        assert!(matches!(err, Err(PresetLoadError::Version { .. })));
        let armory: ArmoryError = err.err().map(Into::into).expect("error");
        assert!(matches!(armory, ArmoryError::VersionMismatch { .. }));
    }

    #[test]
    fn test_require_unknown_preset() {
        let registry = ProfileRegistry::new();
        assert!(matches!(
            registry.require("railgun"),
            Err(PresetLoadError::UnknownPreset(name)) if name == "railgun"
        ));
    }

    #[test]
    fn test_missing_dir_loads_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let mut registry = ProfileRegistry::new();
        assert_eq!(registry.load_dir(&dir.path().join("absent")).ok(), Some(0));
    }
}
