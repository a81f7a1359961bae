//! Weapon blueprints.
//!
//! A [`WeaponBlueprint`] names a preset and the module variants to inject.
//! Blueprints are plain data and can be written by hand in TOML:
//!
//! ```toml
//! [[blueprint]]
//! tag = "plasma"
//! preset = "plasma_rifle"
//! ammo = { kind = "energy" }
//! projectile = { kind = "energy" }
//!
//! [[blueprint.ability]]
//! effect = { kind = "overcharge" }
//! cooldown = 10.0
//! ```

use std::fs;
use std::path::Path;

use armory_common::{ArmoryError, SchemaVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::abilities::{Beam, DeployableShield, HomingLock, Overcharge, Scope, TimeWarp};
use crate::ability::{Ability, AbilityConfig, AbilityDuration};
use crate::ammo::{EnergyAmmo, InfiniteAmmo, StandardAmmo};
use crate::capability::AbilityTrigger;
use crate::coordinator::{Module, ModularWeapon};
use crate::fire_control::ModalFireControl;
use crate::host::ProjectileProperties;
use crate::input::WeaponAction;
use crate::presets::ProfileRegistry;
use crate::projectile::ProjectileEmitter;
use crate::slots::WeaponInstance;
use crate::targeting::{LockOnTargeting, SpreadTargeting};

/// Errors raised while reading or building blueprints.
#[derive(Debug, Error)]
pub enum BlueprintError {
    /// Blueprint names a preset the registry does not hold.
    #[error("Blueprint {tag}: unknown preset {preset}")]
    UnknownPreset {
        /// Blueprint tag
        tag: String,
        /// Missing preset name
        preset: String,
    },

    /// A module spec is unusable.
    #[error("Blueprint {tag}: invalid {module} module: {reason}")]
    InvalidModule {
        /// Blueprint tag
        tag: String,
        /// Module kind
        module: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Failed to read file.
    #[error("Failed to read blueprint file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML, including unknown module kinds.
    #[error("Failed to parse blueprint TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// File written by an incompatible schema.
    #[error("Blueprint schema {actual} cannot be read (expected {expected})")]
    Version {
        /// Version this build reads
        expected: SchemaVersion,
        /// Version found in the file
        actual: SchemaVersion,
    },
}

impl From<BlueprintError> for ArmoryError {
    fn from(err: BlueprintError) -> Self {
        match err {
            BlueprintError::UnknownPreset { preset, .. } => Self::UnknownPreset(preset),
            BlueprintError::Io(e) => Self::Io(e),
            BlueprintError::Version { expected, actual } => Self::VersionMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            other => Self::Serialization(other.to_string()),
        }
    }
}

/// Ammo module variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AmmoSpec {
    /// Magazine and reserve.
    #[default]
    Standard,
    /// Regenerating energy with overheat.
    Energy,
    /// Never runs dry.
    Infinite,
}

/// Targeting module variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetingSpec {
    /// No targeting module; shots go straight down the aim ray.
    None,
    /// Random spread cone.
    #[default]
    Spread,
    /// Lock onto the nearest tagged target.
    LockOn {
        /// Target tag to look for.
        tag: String,
        /// Acquisition radius.
        radius: f32,
        /// Largest steering angle in degrees.
        max_angle: f32,
    },
}

/// Ability effect variant with its tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectSpec {
    /// Homing lock on the nearest tagged target.
    HomingLock {
        /// Target tag to look for.
        #[serde(default = "default_enemy_tag")]
        tag: String,
        /// Lock radius.
        #[serde(default = "default_lock_radius")]
        radius: f32,
    },
    /// Damage and fire-rate boost.
    Overcharge {
        /// Damage multiplier while active.
        #[serde(default = "default_overcharge_damage")]
        damage_multiplier: f32,
        /// Fire-rate multiplier while active.
        #[serde(default = "default_overcharge_rate")]
        fire_rate_multiplier: f32,
    },
    /// Instant hitscan beam.
    Beam {
        /// Beam range.
        #[serde(default = "default_beam_range")]
        range: f32,
        /// Multiplier on profile damage.
        #[serde(default = "default_beam_damage")]
        damage_multiplier: f32,
    },
    /// Aim-down-sights zoom.
    Scope,
    /// Shield placed in front of the player.
    DeployableShield {
        /// Placement distance.
        #[serde(default = "default_shield_distance")]
        distance: f32,
    },
    /// Slows global time.
    TimeWarp {
        /// Time scale while active.
        #[serde(default = "default_time_scale")]
        scale: f32,
    },
}

fn default_enemy_tag() -> String {
    "enemy".to_string()
}

const fn default_lock_radius() -> f32 {
    40.0
}

const fn default_overcharge_damage() -> f32 {
    1.5
}

const fn default_overcharge_rate() -> f32 {
    1.25
}

const fn default_beam_range() -> f32 {
    60.0
}

const fn default_beam_damage() -> f32 {
    4.0
}

const fn default_shield_distance() -> f32 {
    2.0
}

const fn default_time_scale() -> f32 {
    0.4
}

impl EffectSpec {
    /// Name used when the ability entry gives none.
    #[must_use]
    pub const fn default_name(&self) -> &'static str {
        match self {
            Self::HomingLock { .. } => "homing_lock",
            Self::Overcharge { .. } => "overcharge",
            Self::Beam { .. } => "beam",
            Self::Scope => "scope",
            Self::DeployableShield { .. } => "deployable_shield",
            Self::TimeWarp { .. } => "time_warp",
        }
    }

    /// Stock binding and timing for this effect.
    #[must_use]
    pub fn default_config(&self) -> AbilityConfig {
        let name = self.default_name();
        match self {
            Self::HomingLock { .. } => {
                AbilityConfig::new(name, AbilityTrigger::Action(WeaponAction::AbilitySecondary))
                    .with_cooldown(8.0)
                    .with_duration(AbilityDuration::Timed(6.0))
            },
            Self::Overcharge { .. } => {
                AbilityConfig::new(name, AbilityTrigger::Action(WeaponAction::AbilityPrimary))
                    .with_cooldown(15.0)
                    .with_duration(AbilityDuration::Timed(5.0))
            },
            Self::Beam { .. } => {
                AbilityConfig::new(name, AbilityTrigger::Action(WeaponAction::AbilityUtility))
                    .with_cooldown(4.0)
            },
            Self::Scope => AbilityConfig::new(name, AbilityTrigger::AimState)
                .with_duration(AbilityDuration::Sustained)
                .toggleable(),
            Self::DeployableShield { .. } => {
                AbilityConfig::new(name, AbilityTrigger::Action(WeaponAction::AbilityUtility))
                    .with_cooldown(20.0)
                    .with_duration(AbilityDuration::Timed(8.0))
            },
            Self::TimeWarp { .. } => {
                AbilityConfig::new(name, AbilityTrigger::Action(WeaponAction::AbilitySecondary))
                    .with_cooldown(30.0)
                    .with_duration(AbilityDuration::Timed(3.0))
            },
        }
    }

    fn into_module(self, config: AbilityConfig) -> Module {
        match self {
            Self::HomingLock { tag, radius } => {
                Module::ability(Ability::new(config, HomingLock::new(tag, radius)))
            },
            Self::Overcharge {
                damage_multiplier,
                fire_rate_multiplier,
            } => Module::ability(Ability::new(
                config,
                Overcharge::new(damage_multiplier, fire_rate_multiplier),
            )),
            Self::Beam {
                range,
                damage_multiplier,
            } => Module::ability(Ability::new(config, Beam::new(range, damage_multiplier))),
            Self::Scope => Module::ability(Ability::new(config, Scope::new())),
            Self::DeployableShield { distance } => {
                Module::ability(Ability::new(config, DeployableShield::new(distance)))
            },
            Self::TimeWarp { scale } => Module::ability(Ability::new(config, TimeWarp::new(scale))),
        }
    }
}

/// One ability on a blueprint. Unset fields take the effect's stock values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySpec {
    /// The effect and its tuning.
    pub effect: EffectSpec,
    /// Display name override.
    #[serde(default)]
    pub name: Option<String>,
    /// Binding override.
    #[serde(default)]
    pub trigger: Option<AbilityTrigger>,
    /// Cooldown override in seconds.
    #[serde(default)]
    pub cooldown: Option<f32>,
    /// Duration override.
    #[serde(default)]
    pub duration: Option<AbilityDuration>,
    /// Toggle override.
    #[serde(default)]
    pub toggleable: Option<bool>,
}

impl AbilitySpec {
    /// Spec with stock settings for `effect`.
    #[must_use]
    pub fn stock(effect: EffectSpec) -> Self {
        Self {
            effect,
            name: None,
            trigger: None,
            cooldown: None,
            duration: None,
            toggleable: None,
        }
    }

    /// Resolved config after applying overrides.
    #[must_use]
    pub fn config(&self) -> AbilityConfig {
        let mut config = self.effect.default_config();
        if let Some(name) = &self.name {
            config.name.clone_from(name);
        }
        if let Some(trigger) = self.trigger {
            config.trigger = trigger;
        }
        if let Some(cooldown) = self.cooldown {
            config = config.with_cooldown(cooldown);
        }
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if let Some(toggleable) = self.toggleable {
            config.toggleable = toggleable;
        }
        config
    }
}

fn default_projectile() -> ProjectileProperties {
    ProjectileProperties::Kinetic
}

/// Recipe for one weapon: a preset plus the modules to inject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponBlueprint {
    /// Identity tag of the built weapon.
    pub tag: String,
    /// Preset name in the profile registry.
    pub preset: String,
    /// Ammo module.
    #[serde(default)]
    pub ammo: AmmoSpec,
    /// Projectile module.
    #[serde(default = "default_projectile")]
    pub projectile: ProjectileProperties,
    /// Targeting module.
    #[serde(default)]
    pub targeting: TargetingSpec,
    /// Abilities in registration order.
    #[serde(default, rename = "ability")]
    pub abilities: Vec<AbilitySpec>,
    /// Seed for spread and critical rolls. Unseeded weapons use entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl WeaponBlueprint {
    /// Blueprint with standard ammo, kinetic projectiles and spread.
    #[must_use]
    pub fn new(tag: impl Into<String>, preset: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            preset: preset.into(),
            ammo: AmmoSpec::default(),
            projectile: default_projectile(),
            targeting: TargetingSpec::default(),
            abilities: Vec::new(),
            seed: None,
        }
    }

    /// Set ammo module.
    #[must_use]
    pub fn with_ammo(mut self, ammo: AmmoSpec) -> Self {
        self.ammo = ammo;
        self
    }

    /// Set projectile module.
    #[must_use]
    pub fn with_projectile(mut self, projectile: ProjectileProperties) -> Self {
        self.projectile = projectile;
        self
    }

    /// Set targeting module.
    #[must_use]
    pub fn with_targeting(mut self, targeting: TargetingSpec) -> Self {
        self.targeting = targeting;
        self
    }

    /// Add an ability.
    #[must_use]
    pub fn with_ability(mut self, ability: AbilitySpec) -> Self {
        self.abilities.push(ability);
        self
    }

    /// Set RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn invalid(&self, module: &'static str, reason: impl Into<String>) -> BlueprintError {
        BlueprintError::InvalidModule {
            tag: self.tag.clone(),
            module,
            reason: reason.into(),
        }
    }

    fn check(&self) -> Result<(), BlueprintError> {
        if let TargetingSpec::LockOn { radius, .. } = &self.targeting {
            if *radius <= 0.0 {
                return Err(self.invalid("targeting", "lock-on radius must be positive"));
            }
        }
        if let ProjectileProperties::Explosive { blast_radius, .. } = self.projectile {
            if blast_radius <= 0.0 {
                return Err(self.invalid("projectile", "blast radius must be positive"));
            }
        }
        let mut names: Vec<String> = Vec::with_capacity(self.abilities.len());
        for spec in &self.abilities {
            let name = spec.config().name;
            if names.contains(&name) {
                return Err(self.invalid("ability", format!("duplicate ability name {name}")));
            }
            names.push(name);
        }
        Ok(())
    }

    /// Assembles the weapon. The profile is bound when the weapon is picked
    /// up.
    pub fn build(&self, registry: &ProfileRegistry) -> Result<WeaponInstance, BlueprintError> {
        let profile = registry
            .get(&self.preset)
            .ok_or_else(|| BlueprintError::UnknownPreset {
                tag: self.tag.clone(),
                preset: self.preset.clone(),
            })?;
        self.check()?;

        let mut emitter = ProjectileEmitter::new(self.projectile);
        if let Some(seed) = self.seed {
            emitter = emitter.with_seed(seed);
        }

        let mut weapon = ModularWeapon::new()
            .with_module(Module::fire(ModalFireControl::new()))
            .with_module(match self.ammo {
                AmmoSpec::Standard => Module::ammo(StandardAmmo::new()),
                AmmoSpec::Energy => Module::ammo(EnergyAmmo::new()),
                AmmoSpec::Infinite => Module::ammo(InfiniteAmmo::new()),
            })
            .with_module(Module::projectile(emitter));

        match &self.targeting {
            TargetingSpec::None => {},
            TargetingSpec::Spread => {
                let spread = self.seed.map_or_else(SpreadTargeting::new, |seed| {
                    SpreadTargeting::with_seed(seed.wrapping_add(1))
                });
                weapon = weapon.with_module(Module::targeting(spread));
            },
            TargetingSpec::LockOn {
                tag,
                radius,
                max_angle,
            } => {
                weapon = weapon.with_module(Module::targeting(LockOnTargeting::new(
                    tag.clone(),
                    *radius,
                    *max_angle,
                )));
            },
        }

        for spec in &self.abilities {
            weapon = weapon.with_module(spec.effect.clone().into_module(spec.config()));
        }

        debug!(
            "Built {} from preset {} with {} modules",
            self.tag,
            self.preset,
            weapon.modules().len()
        );
        Ok(WeaponInstance::new(self.tag.clone(), profile, weapon))
    }
}

/// On-disk blueprint file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintFile {
    /// File schema version.
    #[serde(default = "blueprint_version")]
    pub schema_version: SchemaVersion,
    /// Blueprints in this file.
    #[serde(default)]
    pub blueprint: Vec<WeaponBlueprint>,
}

const fn blueprint_version() -> SchemaVersion {
    SchemaVersion::BLUEPRINT
}

/// Reads every blueprint in a TOML file.
pub fn load_blueprints(path: &Path) -> Result<Vec<WeaponBlueprint>, BlueprintError> {
    let content = fs::read_to_string(path)?;
    let file: BlueprintFile = toml::from_str(&content)?;
    if !SchemaVersion::BLUEPRINT.can_read(&file.schema_version) {
        return Err(BlueprintError::Version {
            expected: SchemaVersion::BLUEPRINT,
            actual: file.schema_version,
        });
    }
    info!("Loaded {} blueprints from {:?}", file.blueprint.len(), path);
    Ok(file.blueprint)
}
