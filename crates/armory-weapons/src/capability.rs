//! Module capability contracts.
//!
//! A weapon is assembled from independently replaceable modules. Each module
//! implements [`WeaponModule`] for its lifecycle plus exactly one capability
//! trait: [`FireControl`], [`AmmoModule`], [`ProjectileModule`],
//! [`TargetingModule`] or [`AbilityModule`].
//!
//! Modules never hold references to each other or to the engine. Whatever
//! they need is passed in per call through a [`ModuleContext`], and fire
//! control reaches its siblings through a [`FireRig`].

use std::fmt;

use armory_common::{ModuleId, TargetId, Vec3, WeaponId};
use serde::{Deserialize, Serialize};

use crate::damage::ProjectileType;
use crate::events::{EventBus, WeaponEvent};
use crate::host::{ProjectileHandle, TargetInfo, WeaponHost};
use crate::input::{TriggerState, WeaponAction};
use crate::profile::{FireMode, WeaponProfile};

/// Weapon-level multipliers abilities may change and fire control reads back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponModifiers {
    /// Scales projectile damage.
    pub damage_multiplier: f32,
    /// Scales fire rate; 2.0 halves the time between shots.
    pub fire_rate_multiplier: f32,
    /// Scales targeting spread.
    pub spread_multiplier: f32,
    /// Target new projectiles should home on.
    pub homing_target: Option<TargetId>,
}

impl Default for WeaponModifiers {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            fire_rate_multiplier: 1.0,
            spread_multiplier: 1.0,
            homing_target: None,
        }
    }
}

impl WeaponModifiers {
    /// Restores every multiplier to neutral.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything a module may touch during one call.
pub struct ModuleContext<'a> {
    /// Weapon the module belongs to.
    pub weapon: WeaponId,
    /// Current time in seconds.
    pub now: f32,
    /// Seconds since the previous tick.
    pub dt: f32,
    /// The weapon's profile.
    pub profile: &'a WeaponProfile,
    /// Engine services.
    pub host: &'a mut dyn WeaponHost,
    /// Weapon-level multipliers.
    pub modifiers: &'a mut WeaponModifiers,
    /// The weapon's event bus.
    pub events: &'a EventBus,
}

impl ModuleContext<'_> {
    /// Publishes an event on the weapon's bus.
    pub fn publish(&self, event: WeaponEvent) {
        self.events.publish(event);
    }
}

impl fmt::Debug for ModuleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("weapon", &self.weapon)
            .field("now", &self.now)
            .field("dt", &self.dt)
            .field("profile", &self.profile.name)
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

/// Lifecycle shared by every module.
pub trait WeaponModule: fmt::Debug {
    /// Unique id of this module instance.
    fn module_id(&self) -> ModuleId;

    /// Short kind name for logs.
    fn label(&self) -> &'static str;

    /// Called whenever the weapon's profile is bound or replaced. Must be
    /// safe to call repeatedly.
    fn initialize(&mut self, _profile: &WeaponProfile) {}

    /// Weapon became the held weapon.
    fn on_activated(&mut self, _ctx: &mut ModuleContext<'_>) {}

    /// Weapon was put away or dropped. In-flight sequences must stop here.
    fn on_deactivated(&mut self, _ctx: &mut ModuleContext<'_>) {}

    /// Called once per tick while the weapon is active.
    fn on_update(&mut self, _ctx: &mut ModuleContext<'_>) {}
}

/// Consumable resource of a weapon.
pub trait AmmoModule: WeaponModule {
    /// Rounds available to fire right now.
    fn current_ammo(&self) -> u32;

    /// Rounds held in reserve.
    fn total_ammo(&self) -> u32;

    /// Spends `amount` rounds. Returns false, changing nothing, when that is
    /// not possible.
    fn consume(&mut self, amount: u32, now: f32) -> bool;

    /// Whether a reload would start right now.
    fn can_reload(&self) -> bool;

    /// Starts a reload. Returns false, changing nothing, when not reloadable.
    fn reload(&mut self, ctx: &mut ModuleContext<'_>) -> bool;

    /// Abandons an in-flight reload without refilling. Returns whether one
    /// was running.
    fn cancel_reload(&mut self) -> bool;

    /// Whether a reload is in flight.
    fn is_reloading(&self) -> bool;

    /// Whether the resource is locked out by overheating.
    fn is_overheated(&self) -> bool {
        false
    }

    /// Adds rounds to the reserve (or the pool, for reserve-less kinds).
    fn add_ammo(&mut self, amount: u32);

    /// Grants the full load described by `profile`.
    fn fill(&mut self, profile: &WeaponProfile);

    /// Whether `amount` rounds could be consumed right now.
    fn has_ammo(&self, amount: u32) -> bool {
        !self.is_reloading() && !self.is_overheated() && self.current_ammo() >= amount
    }

    /// Text for the ammo readout.
    fn readout(&self) -> String;
}

/// One projectile to create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileRequest {
    /// Launch position.
    pub origin: Vec3,
    /// Normalized launch direction.
    pub direction: Vec3,
    /// Launch speed.
    pub speed: f32,
    /// Extra damage factor for this shot (charge curve output).
    pub damage_multiplier: f32,
    /// Normalized charge level.
    pub charge_level: f32,
}

/// Creates type-tagged projectiles.
pub trait ProjectileModule: WeaponModule {
    /// Describes a projectile and asks the host to spawn it.
    fn create_projectile(
        &mut self,
        request: &ProjectileRequest,
        ctx: &mut ModuleContext<'_>,
    ) -> ProjectileHandle;

    /// Family of projectiles this module creates.
    fn projectile_type(&self) -> ProjectileType;
}

/// Adjusts aim direction for spread or target assistance.
pub trait TargetingModule: WeaponModule {
    /// Final direction for a shot whose ideal direction is `base`.
    fn calculate_direction(&mut self, base: Vec3, ctx: &mut ModuleContext<'_>) -> Vec3;

    /// Whether a target is currently tracked.
    fn has_target(&self) -> bool {
        self.current_target().is_some()
    }

    /// The tracked target, if any.
    fn current_target(&self) -> Option<TargetInfo>;
}

/// Observable state of a fire control module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireState {
    /// Ready to fire.
    Idle,
    /// Waiting out the fire-rate cooldown.
    Firing,
    /// Mid-burst.
    Bursting,
    /// Ammo module is reloading.
    Reloading,
    /// Ammo module is overheated.
    Overheated,
    /// Trigger held in charge mode.
    Charging,
}

/// Sibling modules fire control drives while shooting.
#[derive(Default)]
pub struct FireRig<'m> {
    /// Ammo module, if registered.
    pub ammo: Option<&'m mut (dyn AmmoModule + 'static)>,
    /// Projectile module, if registered.
    pub projectile: Option<&'m mut (dyn ProjectileModule + 'static)>,
    /// Targeting module, if registered.
    pub targeting: Option<&'m mut (dyn TargetingModule + 'static)>,
}

impl FireRig<'_> {
    /// Whether the ammo module is mid-reload.
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.ammo.as_deref().is_some_and(|a| a.is_reloading())
    }

    /// Whether the ammo module is overheated.
    #[must_use]
    pub fn is_overheated(&self) -> bool {
        self.ammo.as_deref().is_some_and(|a| a.is_overheated())
    }

    /// Whether `amount` rounds could be spent. Missing ammo means none.
    #[must_use]
    pub fn has_ammo(&self, amount: u32) -> bool {
        self.ammo.as_deref().is_some_and(|a| a.has_ammo(amount))
    }
}

impl fmt::Debug for FireRig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FireRig")
            .field("ammo", &self.ammo.is_some())
            .field("projectile", &self.projectile.is_some())
            .field("targeting", &self.targeting.is_some())
            .finish()
    }
}

/// Turns trigger edges and timers into shots.
pub trait FireControl: WeaponModule {
    /// Ammo available, cooldown elapsed, no sequence in flight and not
    /// reloading.
    fn can_fire(&self, rig: &FireRig<'_>, now: f32) -> bool;

    /// Called every tick with the current trigger edges, including ticks
    /// where the trigger is released. Returns the number of shots fired.
    fn on_fire_input(
        &mut self,
        trigger: TriggerState,
        rig: &mut FireRig<'_>,
        ctx: &mut ModuleContext<'_>,
    ) -> u32;

    /// Fires one shot in the current mode if possible.
    fn fire(&mut self, rig: &mut FireRig<'_>, ctx: &mut ModuleContext<'_>) -> bool;

    /// Moves to the next fire mode. Returns false when nothing changed.
    fn cycle_mode(&mut self, ctx: &mut ModuleContext<'_>) -> bool;

    /// The selected mode.
    fn current_mode(&self) -> Option<FireMode>;

    /// Derived state for HUDs and tests.
    fn state(&self, rig: &FireRig<'_>, now: f32) -> FireState;

    /// Whether a burst or charge is in flight.
    fn is_busy(&self) -> bool;

    /// Stops any burst or charge. Returns whether one was running.
    fn cancel(&mut self, ctx: &mut ModuleContext<'_>) -> bool;
}

/// What turns an ability on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityTrigger {
    /// A newly pressed input action.
    Action(WeaponAction),
    /// The host's aim-down-sights flag.
    AimState,
}

/// Why an ability ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationReason {
    /// Its duration ran out.
    Expired,
    /// Toggled off by input or aim release.
    Toggled,
    /// The weapon was deactivated.
    Forced,
    /// Instant ability finished its effect.
    Instant,
}

/// Cooldown-gated special action layered onto a weapon.
pub trait AbilityModule: WeaponModule {
    /// Display name.
    fn name(&self) -> &str;

    /// Input binding.
    fn trigger(&self) -> AbilityTrigger;

    /// Cooldown elapsed and not already active.
    fn can_activate(&self, now: f32) -> bool;

    /// Turns the ability on. No-op returning false unless `can_activate`.
    fn activate(&mut self, ctx: &mut ModuleContext<'_>) -> bool;

    /// Turns the ability off. No-op returning false when not active.
    fn deactivate(&mut self, reason: DeactivationReason, ctx: &mut ModuleContext<'_>) -> bool;

    /// Seconds until the ability can be used again.
    fn cooldown_remaining(&self, now: f32) -> f32;

    /// Whether the ability is currently on.
    fn is_active(&self) -> bool;

    /// Whether pressing the trigger again turns it off.
    fn is_toggleable(&self) -> bool;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Owned context parts for module unit tests.

    use super::*;
    use crate::host::RecordingHost;

    pub(crate) struct Harness {
        pub weapon: WeaponId,
        pub profile: WeaponProfile,
        pub host: RecordingHost,
        pub modifiers: WeaponModifiers,
        pub events: EventBus,
    }

    impl Harness {
        pub fn new(profile: WeaponProfile) -> Self {
            Self {
                weapon: WeaponId::new(),
                profile,
                host: RecordingHost::new(),
                modifiers: WeaponModifiers::default(),
                events: EventBus::default(),
            }
        }

        pub fn ctx(&mut self, now: f32, dt: f32) -> ModuleContext<'_> {
            ModuleContext {
                weapon: self.weapon,
                now,
                dt,
                profile: &self.profile,
                host: &mut self.host,
                modifiers: &mut self.modifiers,
                events: &self.events,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_reset() {
        let mut modifiers = WeaponModifiers {
            damage_multiplier: 2.0,
            fire_rate_multiplier: 1.5,
            spread_multiplier: 0.5,
            homing_target: Some(TargetId::new(3)),
        };
        modifiers.reset();
        assert_eq!(modifiers, WeaponModifiers::default());
    }

    #[test]
    fn test_empty_rig_has_no_ammo() {
        let rig = FireRig::default();
        assert!(!rig.has_ammo(1));
        assert!(!rig.is_reloading());
        assert!(!rig.is_overheated());
    }
}
