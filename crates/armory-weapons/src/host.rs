//! Host collaborators.
//!
//! Everything the weapon core needs from the engine goes through
//! [`WeaponHost`]: aim resolution, feedback, projectile spawning, damage
//! delivery and a few camera knobs. Feedback calls are fire-and-forget and
//! have no-op defaults.

use armory_common::{TargetId, Vec3, WeaponId};
use serde::{Deserialize, Serialize};

use crate::damage::{DamageEvent, ProjectileType};

/// Sound clip ids the core asks the host to play.
pub mod clips {
    /// Shot fired.
    pub const FIRE: &str = "weapon/fire";
    /// Trigger pulled on an empty weapon.
    pub const EMPTY: &str = "weapon/empty";
    /// Reload started.
    pub const RELOAD: &str = "weapon/reload";
    /// Fire mode switched.
    pub const MODE_SWITCH: &str = "weapon/mode_switch";
    /// Energy weapon overheated.
    pub const OVERHEAT: &str = "weapon/overheat";
    /// Charge hold started.
    pub const CHARGE: &str = "weapon/charge";
    /// Target lock acquired.
    pub const LOCK_ON: &str = "ability/lock_on";
    /// Overcharge engaged.
    pub const OVERCHARGE: &str = "ability/overcharge";
    /// Beam discharged.
    pub const BEAM: &str = "ability/beam";
    /// Shield deployed.
    pub const SHIELD: &str = "ability/shield";
    /// Time warp engaged.
    pub const TIME_WARP: &str = "ability/time_warp";
}

/// Animation triggers the core asks the host to fire.
pub mod animations {
    /// Recoil / muzzle kick.
    pub const FIRE: &str = "Fire";
    /// Magazine swap.
    pub const RELOAD: &str = "Reload";
    /// Weapon raised.
    pub const EQUIP: &str = "Equip";
    /// Weapon lowered.
    pub const HOLSTER: &str = "Holster";
}

/// Result of the forward aim ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitPoint {
    /// World-space position of the hit.
    pub position: Vec3,
    /// Surface normal.
    pub normal: Vec3,
    /// Damageable thing that was hit, if any.
    pub target: Option<TargetId>,
    /// Distance from the aim origin.
    pub distance: f32,
}

/// Player aim state read by targeting and scope logic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimState {
    /// Whether the player is aiming down sights.
    pub is_aiming: bool,
    /// Spread multiplier while aiming.
    pub accuracy_multiplier: f32,
}

impl Default for AimState {
    fn default() -> Self {
        Self {
            is_aiming: false,
            accuracy_multiplier: 1.0,
        }
    }
}

/// A candidate target reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// Target identity.
    pub id: TargetId,
    /// World-space position.
    pub position: Vec3,
}

/// Handle to a host-side projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectileHandle(pub u64);

/// Handle to a host-side effect object (glow, beam, deployable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectHandle(pub u64);

/// Type-specific projectile properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectileProperties {
    /// Plain bullet.
    Kinetic,
    /// Detonates on impact.
    Explosive {
        /// Blast radius.
        blast_radius: f32,
        /// Damage fraction left at the edge of the blast.
        edge_falloff: f32,
    },
    /// Plasma bolt.
    Energy,
    /// Passes through targets.
    Piercing {
        /// Targets it can pass through before stopping.
        max_pierce: u32,
    },
}

impl ProjectileProperties {
    /// Projectile family for these properties.
    #[must_use]
    pub const fn projectile_type(&self) -> ProjectileType {
        match self {
            Self::Kinetic => ProjectileType::Kinetic,
            Self::Explosive { .. } => ProjectileType::Explosive,
            Self::Energy => ProjectileType::Energy,
            Self::Piercing { .. } => ProjectileType::Piercing,
        }
    }
}

/// Everything the host needs to spawn a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpawn {
    /// Weapon that fired it.
    pub weapon: WeaponId,
    /// Launch position.
    pub origin: Vec3,
    /// Normalized launch direction.
    pub direction: Vec3,
    /// Launch speed.
    pub speed: f32,
    /// Damage to deliver on hit.
    pub damage: DamageEvent,
    /// Type-specific properties.
    pub properties: ProjectileProperties,
    /// Target the projectile should steer toward.
    pub homing_target: Option<TargetId>,
}

/// Engine services used by the weapon core.
pub trait WeaponHost {
    /// Camera position the aim ray starts from.
    fn aim_origin(&self) -> Vec3;

    /// Normalized camera forward.
    fn aim_forward(&self) -> Vec3;

    /// World-space muzzle position of the held weapon.
    fn muzzle_position(&self) -> Vec3;

    /// Casts the forward aim ray against the world.
    fn raycast_forward(&mut self) -> Option<HitPoint>;

    /// Spawns the rendered/simulated projectile.
    fn spawn_projectile_visual(&mut self, spawn: &ProjectileSpawn) -> ProjectileHandle;

    /// Spawns a named effect object.
    fn spawn_effect(&mut self, effect: &str, position: Vec3) -> EffectHandle;

    /// Delivers damage to whatever was hit.
    fn resolve_damage(&mut self, target: TargetId, event: &DamageEvent);

    /// Current aim state.
    fn aim_state(&self) -> AimState;

    /// Targets carrying `tag` within `radius` of `origin`.
    fn targets_in_radius(&self, tag: &str, origin: Vec3, radius: f32) -> Vec<TargetInfo>;

    /// Hands a dropped weapon to the physics world.
    fn release_weapon(&mut self, weapon: WeaponId, impulse: Vec3);

    /// Plays a sound clip.
    fn play_sound(&mut self, _clip: &str) {}

    /// Fires an animation trigger.
    fn trigger_animation(&mut self, _trigger: &str) {}

    /// Applies camera recoil.
    fn apply_recoil(&mut self, _strength: f32) {}

    /// Removes an effect object.
    fn despawn_effect(&mut self, _handle: EffectHandle) {}

    /// Sets the ammo readout text; `None` clears it.
    fn ammo_readout(&mut self, _text: Option<&str>) {}

    /// Sets the camera field of view.
    fn set_field_of_view(&mut self, _fov: f32) {}

    /// Sets the held weapon's offset from the camera.
    fn set_weapon_offset(&mut self, _offset: Vec3) {}

    /// Sets the global time scale.
    fn set_time_scale(&mut self, _scale: f32) {}
}

/// A host that records every call. Used by tests and the headless driver.
#[derive(Debug, Clone)]
pub struct RecordingHost {
    /// Aim ray origin.
    pub origin: Vec3,
    /// Aim forward.
    pub forward: Vec3,
    /// Muzzle position.
    pub muzzle: Vec3,
    /// What the forward ray returns.
    pub raycast: Option<HitPoint>,
    /// Reported aim state.
    pub aim: AimState,
    /// Tagged targets the host knows about.
    pub targets: Vec<(String, TargetInfo)>,
    /// Sounds played, in order.
    pub sounds: Vec<String>,
    /// Animation triggers, in order.
    pub animations: Vec<String>,
    /// Recoil kicks, in order.
    pub recoil: Vec<f32>,
    /// Projectiles spawned, in order.
    pub projectiles: Vec<ProjectileSpawn>,
    /// Effects spawned, with their handles.
    pub effects: Vec<(EffectHandle, String, Vec3)>,
    /// Effects removed.
    pub despawned: Vec<EffectHandle>,
    /// Damage delivered.
    pub damage: Vec<(TargetId, DamageEvent)>,
    /// Current readout text.
    pub readout: Option<String>,
    /// Every readout change, including clears.
    pub readout_history: Vec<Option<String>>,
    /// Last field of view set.
    pub field_of_view: Option<f32>,
    /// Last weapon offset set.
    pub weapon_offset: Option<Vec3>,
    /// Current time scale.
    pub time_scale: f32,
    /// Weapons released into the world.
    pub released: Vec<(WeaponId, Vec3)>,
    next_handle: u64,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            origin: Vec3::new(0.0, 1.6, 0.0),
            forward: Vec3::NEG_Z,
            muzzle: Vec3::new(0.2, 1.4, -0.5),
            raycast: None,
            aim: AimState::default(),
            targets: Vec::new(),
            sounds: Vec::new(),
            animations: Vec::new(),
            recoil: Vec::new(),
            projectiles: Vec::new(),
            effects: Vec::new(),
            despawned: Vec::new(),
            damage: Vec::new(),
            readout: None,
            readout_history: Vec::new(),
            field_of_view: None,
            weapon_offset: None,
            time_scale: 1.0,
            released: Vec::new(),
            next_handle: 1,
        }
    }
}

impl RecordingHost {
    /// Creates a host looking down -Z with nothing in front of it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `clip` was played.
    #[must_use]
    pub fn sound_count(&self, clip: &str) -> usize {
        self.sounds.iter().filter(|s| s.as_str() == clip).count()
    }

    /// Adds a tagged target.
    pub fn add_target(&mut self, tag: impl Into<String>, id: TargetId, position: Vec3) {
        self.targets.push((tag.into(), TargetInfo { id, position }));
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl WeaponHost for RecordingHost {
    fn aim_origin(&self) -> Vec3 {
        self.origin
    }

    fn aim_forward(&self) -> Vec3 {
        self.forward
    }

    fn muzzle_position(&self) -> Vec3 {
        self.muzzle
    }

    fn raycast_forward(&mut self) -> Option<HitPoint> {
        self.raycast
    }

    fn spawn_projectile_visual(&mut self, spawn: &ProjectileSpawn) -> ProjectileHandle {
        self.projectiles.push(*spawn);
        ProjectileHandle(self.next_handle())
    }

    fn spawn_effect(&mut self, effect: &str, position: Vec3) -> EffectHandle {
        let handle = EffectHandle(self.next_handle());
        self.effects.push((handle, effect.to_string(), position));
        handle
    }

    fn resolve_damage(&mut self, target: TargetId, event: &DamageEvent) {
        self.damage.push((target, *event));
    }

    fn aim_state(&self) -> AimState {
        self.aim
    }

    fn targets_in_radius(&self, tag: &str, origin: Vec3, radius: f32) -> Vec<TargetInfo> {
        self.targets
            .iter()
            .filter(|(t, info)| t == tag && info.position.distance(origin) <= radius)
            .map(|(_, info)| *info)
            .collect()
    }

    fn release_weapon(&mut self, weapon: WeaponId, impulse: Vec3) {
        self.released.push((weapon, impulse));
    }

    fn play_sound(&mut self, clip: &str) {
        self.sounds.push(clip.to_string());
    }

    fn trigger_animation(&mut self, trigger: &str) {
        self.animations.push(trigger.to_string());
    }

    fn apply_recoil(&mut self, strength: f32) {
        self.recoil.push(strength);
    }

    fn despawn_effect(&mut self, handle: EffectHandle) {
        self.despawned.push(handle);
    }

    fn ammo_readout(&mut self, text: Option<&str>) {
        self.readout = text.map(str::to_string);
        self.readout_history.push(self.readout.clone());
    }

    fn set_field_of_view(&mut self, fov: f32) {
        self.field_of_view = Some(fov);
    }

    fn set_weapon_offset(&mut self, offset: Vec3) {
        self.weapon_offset = Some(offset);
    }

    fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_filtered_by_tag_and_radius() {
        let mut host = RecordingHost::new();
        host.add_target("enemy", TargetId::new(1), Vec3::new(0.0, 0.0, -5.0));
        host.add_target("enemy", TargetId::new(2), Vec3::new(0.0, 0.0, -50.0));
        host.add_target("ally", TargetId::new(3), Vec3::new(0.0, 0.0, -2.0));

        let found = host.targets_in_radius("enemy", Vec3::ZERO, 10.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, TargetId::new(1));
    }

    #[test]
    fn test_effect_handles_are_unique() {
        let mut host = RecordingHost::new();
        let a = host.spawn_effect("glow", Vec3::ZERO);
        let b = host.spawn_effect("glow", Vec3::ZERO);
        assert_ne!(a, b);
    }
}
