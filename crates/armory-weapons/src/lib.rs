//! # Armory Weapons
//!
//! Modular weapon core for first-person shooters.
//!
//! A weapon is a coordinator plus a set of capability modules injected at
//! assembly time. This crate provides:
//! - Capability traits (fire control, ammo, projectile, targeting, ability)
//! - Ammo modules (magazine/reserve, regenerating energy, infinite)
//! - Modal fire control (single, burst, auto, charge, scatter)
//! - Projectile emitters and targeting modules
//! - Ability framework with cooldown and duration bookkeeping
//! - Weapon coordinator and slot manager
//! - Timed sequences for reloads, overheats, bursts and charges
//! - Damage events and reference damage resolution
//! - Weapon profiles, presets and blueprints
//! - Host collaborator trait and a recording host
//! - Event bus for HUD, audio and telemetry observers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod abilities;
pub mod ability;
pub mod ammo;
pub mod blueprint;
pub mod capability;
pub mod coordinator;
pub mod damage;
pub mod events;
pub mod fire_control;
pub mod host;
pub mod input;
pub mod presets;
pub mod profile;
pub mod projectile;
pub mod sequence;
pub mod slots;
pub mod targeting;


/// Prelude for convenient imports
pub mod prelude {
    pub use crate::abilities::*;
    pub use crate::ability::*;
    pub use crate::ammo::*;
    pub use crate::blueprint::*;
    pub use crate::capability::*;
    pub use crate::coordinator::*;
    pub use crate::damage::*;
    pub use crate::events::*;
    pub use crate::fire_control::*;
    pub use crate::host::*;
    pub use crate::input::*;
    pub use crate::presets::*;
    pub use crate::profile::*;
    pub use crate::projectile::*;
    pub use crate::sequence::*;
    pub use crate::slots::*;
    pub use crate::targeting::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_blueprint_fires() {
        let registry = ProfileRegistry::with_builtins().expect("builtins");
        let instance = WeaponBlueprint::new("sidearm", "pistol")
            .with_seed(1)
            .build(&registry)
            .expect("build");

        let mut slots = WeaponSlotManager::new(2);
        let mut host = RecordingHost::new();
        let mut input = WeaponInput::new();
        assert!(slots.pickup(instance, 0, &mut host, 0.0).is_ok());

        input.press(WeaponAction::Fire);
        assert_eq!(slots.update(&input, &mut host, 0.0, 0.0625), 1);
        assert_eq!(host.readout.as_deref(), Some("11 / 48"));
    }
}
