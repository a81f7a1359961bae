//! Weapon profiles.
//!
//! A [`WeaponProfile`] is the immutable per-weapon-type configuration. It is
//! validated once, wrapped in an `Arc` and shared by every instance of that
//! weapon type.

use armory_common::{clamp01, lerp, ProfileError, Vec3};
use serde::{Deserialize, Serialize};

/// Fire mode selectable on a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireMode {
    /// One shot per trigger pull.
    Single,
    /// Fixed number of shots per trigger pull.
    Burst,
    /// Fires while the trigger is held.
    Auto,
    /// Hold to charge, release to fire.
    Charge,
    /// All pellets at once, one ammo unit per pull.
    Scatter,
}

impl FireMode {
    /// Short label for HUDs and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Single => "SEMI",
            Self::Burst => "BURST",
            Self::Auto => "AUTO",
            Self::Charge => "CHARGE",
            Self::Scatter => "SCATTER",
        }
    }
}

/// Aim-down-sights configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimSettings {
    /// Camera field of view while hip firing.
    pub hip_fov: f32,
    /// Camera field of view while aiming.
    pub fov: f32,
    /// Weapon offset from the camera while hip firing.
    pub hip_offset: Vec3,
    /// Weapon offset from the camera while aiming.
    pub offset: Vec3,
    /// Spread multiplier applied while aiming.
    pub accuracy_multiplier: f32,
    /// Seconds to blend between hip and aim.
    pub transition_time: f32,
}

impl Default for AimSettings {
    fn default() -> Self {
        Self {
            hip_fov: 70.0,
            fov: 50.0,
            hip_offset: Vec3::new(0.25, -0.2, 0.5),
            offset: Vec3::new(0.0, -0.1, 0.35),
            accuracy_multiplier: 0.5,
            transition_time: 0.2,
        }
    }
}

/// Maps normalized charge to a damage multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChargeCurve {
    /// Straight line from `min` at no charge to `max` at full charge.
    Linear {
        /// Multiplier at zero charge.
        min: f32,
        /// Multiplier at full charge.
        max: f32,
    },
    /// Piecewise-linear keyframes `(charge, multiplier)` sorted by charge.
    Keyframes {
        /// The keyframes.
        points: Vec<(f32, f32)>,
    },
}

impl Default for ChargeCurve {
    fn default() -> Self {
        Self::Linear { min: 1.0, max: 3.0 }
    }
}

impl ChargeCurve {
    /// Evaluates the curve at `charge`, clamped to `[0, 1]`.
    #[must_use]
    pub fn evaluate(&self, charge: f32) -> f32 {
        let t = clamp01(charge);
        match self {
            Self::Linear { min, max } => lerp(*min, *max, t),
            Self::Keyframes { points } => {
                let Some(&(first_t, first_v)) = points.first() else {
                    return 1.0;
                };
                if t <= first_t {
                    return first_v;
                }
                for pair in points.windows(2) {
                    let (t0, v0) = pair[0];
                    let (t1, v1) = pair[1];
                    if t <= t1 {
                        let span = t1 - t0;
                        if span <= f32::EPSILON {
                            return v1;
                        }
                        return lerp(v0, v1, (t - t0) / span);
                    }
                }
                points.last().map_or(1.0, |&(_, v)| v)
            },
        }
    }
}

/// Charge-mode timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeSettings {
    /// Shortest hold that still fires.
    pub min_charge_time: f32,
    /// Hold time that reaches full charge.
    pub max_charge_time: f32,
    /// Damage multiplier curve over normalized charge.
    pub curve: ChargeCurve,
}

impl Default for ChargeSettings {
    fn default() -> Self {
        Self {
            min_charge_time: 0.25,
            max_charge_time: 1.5,
            curve: ChargeCurve::default(),
        }
    }
}

/// Regenerating-energy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySettings {
    /// Energy regained per second while not overheated.
    pub regen_rate: f32,
    /// Seconds spent overheated.
    pub overheat_cooldown: f32,
    /// Fraction of capacity restored when the overheat ends.
    pub resume_fraction: f32,
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            regen_rate: 10.0,
            overheat_cooldown: 2.0,
            resume_fraction: 0.3,
        }
    }
}

/// Immutable per-weapon-type configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponProfile {
    /// Preset name.
    pub name: String,
    /// Rounds per magazine (or energy capacity).
    pub magazine_capacity: u32,
    /// Reserve ammo granted on first pickup.
    pub total_ammo: u32,
    /// Seconds between shots.
    pub fire_rate: f32,
    /// Seconds for a full reload.
    pub reload_time: f32,
    /// Projectile launch speed.
    pub muzzle_velocity: f32,
    /// Base damage per projectile.
    pub damage: f32,
    /// Hip-fire spread cone half-angle in degrees.
    pub spread_angle: f32,
    /// Shots per burst.
    pub burst_count: u32,
    /// Seconds between shots inside a burst.
    pub burst_interval: f32,
    /// Available fire modes in cycling order.
    pub fire_modes: Vec<FireMode>,
    /// Pellets per scatter shot.
    pub pellet_count: u32,
    /// Scatter fan half-width in degrees.
    pub scatter_spread: f32,
    /// Aim-down-sights settings.
    pub aim: AimSettings,
    /// Energy spent below capacity that triggers an overheat (0 disables).
    pub overheat_threshold: f32,
    /// Regenerating-energy tuning.
    pub energy: EnergySettings,
    /// Charge-mode tuning.
    pub charge: ChargeSettings,
    /// Recoil kick passed to the host per shot.
    pub recoil: f32,
    /// Chance in `[0, 1]` that a projectile is critical.
    pub critical_chance: f32,
    /// Damage multiplier for critical projectiles.
    pub critical_multiplier: f32,
}

impl Default for WeaponProfile {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            magazine_capacity: 30,
            total_ammo: 120,
            fire_rate: 0.1,
            reload_time: 2.0,
            muzzle_velocity: 300.0,
            damage: 20.0,
            spread_angle: 1.5,
            burst_count: 3,
            burst_interval: 0.075,
            fire_modes: vec![FireMode::Single],
            pellet_count: 8,
            scatter_spread: 6.0,
            aim: AimSettings::default(),
            overheat_threshold: 0.0,
            energy: EnergySettings::default(),
            charge: ChargeSettings::default(),
            recoil: 1.0,
            critical_chance: 0.0,
            critical_multiplier: 2.0,
        }
    }
}

impl WeaponProfile {
    /// Creates a profile with default tuning and the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set magazine capacity and reserve ammo.
    #[must_use]
    pub fn with_ammo(mut self, magazine_capacity: u32, total_ammo: u32) -> Self {
        self.magazine_capacity = magazine_capacity;
        self.total_ammo = total_ammo;
        self
    }

    /// Set seconds between shots.
    #[must_use]
    pub fn with_fire_rate(mut self, fire_rate: f32) -> Self {
        self.fire_rate = fire_rate;
        self
    }

    /// Set reload duration.
    #[must_use]
    pub fn with_reload_time(mut self, reload_time: f32) -> Self {
        self.reload_time = reload_time;
        self
    }

    /// Set available fire modes.
    #[must_use]
    pub fn with_modes(mut self, modes: impl Into<Vec<FireMode>>) -> Self {
        self.fire_modes = modes.into();
        self
    }

    /// Set burst shape.
    #[must_use]
    pub fn with_burst(mut self, count: u32, interval: f32) -> Self {
        self.burst_count = count;
        self.burst_interval = interval;
        self
    }

    /// Set scatter shape.
    #[must_use]
    pub fn with_scatter(mut self, pellets: u32, spread: f32) -> Self {
        self.pellet_count = pellets;
        self.scatter_spread = spread;
        self
    }

    /// Set overheat threshold.
    #[must_use]
    pub fn with_overheat_threshold(mut self, threshold: f32) -> Self {
        self.overheat_threshold = threshold;
        self
    }

    /// Set base damage.
    #[must_use]
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    /// Set hip-fire spread.
    #[must_use]
    pub fn with_spread(mut self, spread_angle: f32) -> Self {
        self.spread_angle = spread_angle;
        self
    }

    /// Set charge tuning.
    #[must_use]
    pub fn with_charge(mut self, charge: ChargeSettings) -> Self {
        self.charge = charge;
        self
    }

    /// Set energy tuning.
    #[must_use]
    pub fn with_energy(mut self, energy: EnergySettings) -> Self {
        self.energy = energy;
        self
    }

    /// Validates the profile.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let profile = self.name.clone();
        if self.fire_rate <= 0.0 {
            return Err(ProfileError::FireRate {
                profile,
                value: self.fire_rate,
            });
        }
        if self.reload_time < 0.0 {
            return Err(ProfileError::ReloadTime {
                profile,
                value: self.reload_time,
            });
        }
        if self.magazine_capacity == 0 {
            return Err(ProfileError::ZeroCapacity { profile });
        }
        if self.fire_modes.is_empty() {
            return Err(ProfileError::NoFireModes { profile });
        }
        if self.burst_count == 0 {
            return Err(ProfileError::ZeroBurst { profile });
        }
        if self.pellet_count == 0 {
            return Err(ProfileError::ZeroPellets { profile });
        }
        let capacity = self.magazine_capacity as f32;
        if self.overheat_threshold > capacity {
            return Err(ProfileError::OverheatThreshold {
                profile,
                threshold: self.overheat_threshold,
                capacity,
            });
        }
        let charge = &self.charge;
        if charge.max_charge_time <= 0.0 || charge.min_charge_time > charge.max_charge_time {
            return Err(ProfileError::ChargeWindow {
                profile,
                min: charge.min_charge_time,
                max: charge.max_charge_time,
            });
        }
        Ok(())
    }

    /// Returns true if the profile offers the given mode.
    #[must_use]
    pub fn has_mode(&self, mode: FireMode) -> bool {
        self.fire_modes.contains(&mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_valid() {
        assert!(WeaponProfile::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_fire_rate() {
        let profile = WeaponProfile::named("broken").with_fire_rate(0.0);
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::FireRate { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_threshold_above_capacity() {
        let profile = WeaponProfile::named("hot")
            .with_ammo(50, 0)
            .with_overheat_threshold(60.0);
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::OverheatThreshold { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_modes() {
        let profile = WeaponProfile::named("modeless").with_modes(Vec::new());
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::NoFireModes { .. })
        ));
    }

    #[test]
    fn test_linear_charge_curve() {
        let curve = ChargeCurve::Linear { min: 1.0, max: 3.0 };
        assert_eq!(curve.evaluate(0.0), 1.0);
        assert_eq!(curve.evaluate(0.5), 2.0);
        assert_eq!(curve.evaluate(2.0), 3.0);
    }

    #[test]
    fn test_keyframe_charge_curve() {
        let curve = ChargeCurve::Keyframes {
            points: vec![(0.0, 0.5), (0.5, 1.0), (1.0, 4.0)],
        };
        assert_eq!(curve.evaluate(0.0), 0.5);
        assert_eq!(curve.evaluate(0.25), 0.75);
        assert_eq!(curve.evaluate(0.75), 2.5);
        assert_eq!(curve.evaluate(1.0), 4.0);
    }

    #[test]
    fn test_profile_toml_defaults() {
        let profile: WeaponProfile = toml::from_str(
            r#"
            name = "carbine"
            magazine_capacity = 20
            fire_modes = ["single", "burst"]
            "#,
        )
        .expect("profile parses");
        assert_eq!(profile.magazine_capacity, 20);
        assert_eq!(profile.fire_modes, vec![FireMode::Single, FireMode::Burst]);
        assert_eq!(profile.burst_count, 3);
    }
}
