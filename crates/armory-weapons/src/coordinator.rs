//! Weapon coordinator.
//!
//! A [`ModularWeapon`] owns one [`ModuleSet`] and is the only way in or out
//! of it. Modules are registered explicitly through [`Module`]; each
//! single-valued capability has one slot, abilities accumulate.
//!
//! Per tick, while active, the coordinator:
//! 1. cycles the fire mode if requested
//! 2. hands the trigger edges to fire control
//! 3. starts a reload if requested and legal
//! 4. routes ability triggers
//! 5. runs `on_update` on every module
//! 6. pushes the ammo readout if it changed

use std::sync::Arc;

use armory_common::{ModuleId, WeaponId};
use tracing::{debug, warn};

use crate::capability::{
    AbilityModule, AbilityTrigger, AmmoModule, DeactivationReason, FireControl, FireRig,
    FireState, ModuleContext, ProjectileModule, TargetingModule, WeaponModifiers, WeaponModule,
};
use crate::events::{EventBus, WeaponEvent};
use crate::host::{animations, WeaponHost};
use crate::input::{WeaponAction, WeaponInput};
use crate::profile::WeaponProfile;

/// Capability a module provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Fire control.
    Fire,
    /// Ammo.
    Ammo,
    /// Projectile creation.
    Projectile,
    /// Aim adjustment.
    Targeting,
    /// Special ability.
    Ability,
}

/// A module ready to be registered.
#[derive(Debug)]
pub enum Module {
    /// Fire control.
    Fire(Box<dyn FireControl>),
    /// Ammo.
    Ammo(Box<dyn AmmoModule>),
    /// Projectile creation.
    Projectile(Box<dyn ProjectileModule>),
    /// Aim adjustment.
    Targeting(Box<dyn TargetingModule>),
    /// Special ability.
    Ability(Box<dyn AbilityModule>),
}

impl Module {
    /// Wraps a fire control module.
    pub fn fire(module: impl FireControl + 'static) -> Self {
        Self::Fire(Box::new(module))
    }

    /// Wraps an ammo module.
    pub fn ammo(module: impl AmmoModule + 'static) -> Self {
        Self::Ammo(Box::new(module))
    }

    /// Wraps a projectile module.
    pub fn projectile(module: impl ProjectileModule + 'static) -> Self {
        Self::Projectile(Box::new(module))
    }

    /// Wraps a targeting module.
    pub fn targeting(module: impl TargetingModule + 'static) -> Self {
        Self::Targeting(Box::new(module))
    }

    /// Wraps an ability.
    pub fn ability(module: impl AbilityModule + 'static) -> Self {
        Self::Ability(Box::new(module))
    }

    /// The capability this module fills.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        match self {
            Self::Fire(_) => Capability::Fire,
            Self::Ammo(_) => Capability::Ammo,
            Self::Projectile(_) => Capability::Projectile,
            Self::Targeting(_) => Capability::Targeting,
            Self::Ability(_) => Capability::Ability,
        }
    }

    /// Id of the wrapped module.
    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        match self {
            Self::Fire(m) => m.module_id(),
            Self::Ammo(m) => m.module_id(),
            Self::Projectile(m) => m.module_id(),
            Self::Targeting(m) => m.module_id(),
            Self::Ability(m) => m.module_id(),
        }
    }

    fn initialize(&mut self, profile: &WeaponProfile) {
        match self {
            Self::Fire(m) => m.initialize(profile),
            Self::Ammo(m) => m.initialize(profile),
            Self::Projectile(m) => m.initialize(profile),
            Self::Targeting(m) => m.initialize(profile),
            Self::Ability(m) => m.initialize(profile),
        }
    }
}

/// Outcome of registering a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The module now fills its slot.
    Registered,
    /// A module with the same id is already registered; nothing changed.
    AlreadyPresent,
    /// The single-valued slot is occupied by another module; nothing changed.
    SlotTaken,
}

/// Runs `$body` once for every registered module, bound to `$m`.
macro_rules! for_each_module {
    ($set:expr, |$m:ident| $body:expr) => {{
        if let Some($m) = $set.fire.as_deref_mut() {
            $body;
        }
        if let Some($m) = $set.ammo.as_deref_mut() {
            $body;
        }
        if let Some($m) = $set.projectile.as_deref_mut() {
            $body;
        }
        if let Some($m) = $set.targeting.as_deref_mut() {
            $body;
        }
        for $m in $set.abilities.iter_mut() {
            $body;
        }
    }};
}

/// The capability implementations attached to one weapon.
#[derive(Debug, Default)]
pub struct ModuleSet {
    fire: Option<Box<dyn FireControl>>,
    ammo: Option<Box<dyn AmmoModule>>,
    projectile: Option<Box<dyn ProjectileModule>>,
    targeting: Option<Box<dyn TargetingModule>>,
    abilities: Vec<Box<dyn AbilityModule>>,
}

fn fill_slot<T: ?Sized>(slot: &mut Option<Box<T>>, module: Box<T>) -> Registration {
    if slot.is_some() {
        Registration::SlotTaken
    } else {
        *slot = Some(module);
        Registration::Registered
    }
}

impl ModuleSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `module` in its capability slot.
    pub fn register(&mut self, module: Module) -> Registration {
        if self.contains(module.module_id()) {
            return Registration::AlreadyPresent;
        }
        match module {
            Module::Fire(m) => fill_slot(&mut self.fire, m),
            Module::Ammo(m) => fill_slot(&mut self.ammo, m),
            Module::Projectile(m) => fill_slot(&mut self.projectile, m),
            Module::Targeting(m) => fill_slot(&mut self.targeting, m),
            Module::Ability(m) => {
                self.abilities.push(m);
                Registration::Registered
            },
        }
    }

    /// Whether a module with `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ModuleId) -> bool {
        self.fire.as_ref().is_some_and(|m| m.module_id() == id)
            || self.ammo.as_ref().is_some_and(|m| m.module_id() == id)
            || self.projectile.as_ref().is_some_and(|m| m.module_id() == id)
            || self.targeting.as_ref().is_some_and(|m| m.module_id() == id)
            || self.abilities.iter().any(|m| m.module_id() == id)
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.fire.is_some())
            + usize::from(self.ammo.is_some())
            + usize::from(self.projectile.is_some())
            + usize::from(self.targeting.is_some())
            + self.abilities.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the given capability has at least one module.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Fire => self.fire.is_some(),
            Capability::Ammo => self.ammo.is_some(),
            Capability::Projectile => self.projectile.is_some(),
            Capability::Targeting => self.targeting.is_some(),
            Capability::Ability => !self.abilities.is_empty(),
        }
    }

    /// Fire control module.
    #[must_use]
    pub fn fire(&self) -> Option<&dyn FireControl> {
        self.fire.as_deref()
    }

    /// Ammo module.
    #[must_use]
    pub fn ammo(&self) -> Option<&dyn AmmoModule> {
        self.ammo.as_deref()
    }

    /// Mutable ammo module.
    pub fn ammo_mut(&mut self) -> Option<&mut (dyn AmmoModule + 'static)> {
        self.ammo.as_deref_mut()
    }

    /// Projectile module.
    #[must_use]
    pub fn projectile(&self) -> Option<&dyn ProjectileModule> {
        self.projectile.as_deref()
    }

    /// Targeting module.
    #[must_use]
    pub fn targeting(&self) -> Option<&dyn TargetingModule> {
        self.targeting.as_deref()
    }

    /// Registered abilities in registration order.
    pub fn abilities(&self) -> impl Iterator<Item = &dyn AbilityModule> + '_ {
        self.abilities.iter().map(|a| &**a)
    }

    /// Ability by name.
    #[must_use]
    pub fn ability(&self, name: &str) -> Option<&dyn AbilityModule> {
        self.abilities().find(|a| a.name() == name)
    }

    /// Swaps in a different fire control module, returning the old one.
    pub fn replace_fire(&mut self, module: Box<dyn FireControl>) -> Option<Box<dyn FireControl>> {
        self.fire.replace(module)
    }

    /// Runs `initialize` on every module.
    pub fn initialize_all(&mut self, profile: &WeaponProfile) {
        for_each_module!(self, |m| m.initialize(profile));
    }

    fn activate_all(&mut self, ctx: &mut ModuleContext<'_>) {
        for_each_module!(self, |m| m.on_activated(ctx));
    }

    fn deactivate_all(&mut self, ctx: &mut ModuleContext<'_>) {
        for_each_module!(self, |m| m.on_deactivated(ctx));
    }

    fn update_all(&mut self, ctx: &mut ModuleContext<'_>) {
        for_each_module!(self, |m| m.on_update(ctx));
    }

    fn rig(&mut self) -> (Option<&mut (dyn FireControl + 'static)>, FireRig<'_>) {
        (
            self.fire.as_deref_mut(),
            FireRig {
                ammo: self.ammo.as_deref_mut(),
                projectile: self.projectile.as_deref_mut(),
                targeting: self.targeting.as_deref_mut(),
            },
        )
    }
}

/// One weapon: identity, late-bound profile and its modules.
#[derive(Debug)]
pub struct ModularWeapon {
    id: WeaponId,
    profile: Option<Arc<WeaponProfile>>,
    modules: ModuleSet,
    modifiers: WeaponModifiers,
    events: EventBus,
    active: bool,
    input_enabled: bool,
    was_aiming: bool,
    last_readout: Option<String>,
    warned_no_profile: bool,
}

impl Default for ModularWeapon {
    fn default() -> Self {
        Self::new()
    }
}

impl ModularWeapon {
    /// Creates an inactive weapon with no profile and no modules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(WeaponId::new())
    }

    /// Creates a weapon with a fixed id.
    #[must_use]
    pub fn with_id(id: WeaponId) -> Self {
        Self {
            id,
            profile: None,
            modules: ModuleSet::new(),
            modifiers: WeaponModifiers::default(),
            events: EventBus::default(),
            active: false,
            input_enabled: false,
            was_aiming: false,
            last_readout: None,
            warned_no_profile: false,
        }
    }

    /// Builder form of [`ModularWeapon::attach`].
    #[must_use]
    pub fn with_module(mut self, module: Module) -> Self {
        self.attach(module);
        self
    }

    /// Builder form of [`ModularWeapon::set_profile`].
    #[must_use]
    pub fn with_profile(mut self, profile: Arc<WeaponProfile>) -> Self {
        self.set_profile(profile);
        self
    }

    /// Registers a module, initializing it if a profile is already bound.
    pub fn attach(&mut self, mut module: Module) -> Registration {
        let capability = module.capability();
        if let Some(profile) = &self.profile {
            module.initialize(profile);
        }
        let outcome = self.modules.register(module);
        match outcome {
            Registration::Registered => debug!("{} attached {:?} module", self.id, capability),
            Registration::AlreadyPresent => {},
            Registration::SlotTaken => {
                warn!("{} already has a {:?} module; ignoring", self.id, capability);
            },
        }
        outcome
    }

    /// Binds or replaces the profile and re-initializes every module.
    pub fn set_profile(&mut self, profile: Arc<WeaponProfile>) {
        self.modules.initialize_all(&profile);
        debug!("{} bound to profile {}", self.id, profile.name);
        self.profile = Some(profile);
        self.warned_no_profile = false;
    }

    /// Swaps in a different fire control module and returns the old one.
    ///
    /// The old module's in-flight burst or charge is dropped with it.
    pub fn set_active_fire_module(
        &mut self,
        mut module: Box<dyn FireControl>,
    ) -> Option<Box<dyn FireControl>> {
        if let Some(profile) = &self.profile {
            module.initialize(profile);
        }
        self.modules.replace_fire(module)
    }

    /// Weapon id.
    #[must_use]
    pub const fn id(&self) -> WeaponId {
        self.id
    }

    /// Bound profile.
    #[must_use]
    pub fn profile(&self) -> Option<&Arc<WeaponProfile>> {
        self.profile.as_ref()
    }

    /// Registered modules.
    #[must_use]
    pub const fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// Mutable access to the registered modules.
    pub fn modules_mut(&mut self) -> &mut ModuleSet {
        &mut self.modules
    }

    /// Fire control module.
    #[must_use]
    pub fn fire_control(&self) -> Option<&dyn FireControl> {
        self.modules.fire()
    }

    /// Ammo module.
    #[must_use]
    pub fn ammo(&self) -> Option<&dyn AmmoModule> {
        self.modules.ammo()
    }

    /// Current weapon-level multipliers.
    #[must_use]
    pub const fn modifiers(&self) -> &WeaponModifiers {
        &self.modifiers
    }

    /// The weapon's event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Drains pending events.
    pub fn drain_events(&self) -> Vec<WeaponEvent> {
        self.events.drain()
    }

    /// Whether this is the held weapon.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether input is routed to the modules.
    #[must_use]
    pub const fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Enables or disables input without changing activation.
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled && self.active;
    }

    /// Fire state, if fire control is registered.
    pub fn fire_state(&mut self, now: f32) -> Option<FireState> {
        let (fire, rig) = self.modules.rig();
        fire.map(|f| f.state(&rig, now))
    }

    /// Whether fire control would fire right now.
    pub fn can_fire(&mut self, now: f32) -> bool {
        let (fire, rig) = self.modules.rig();
        fire.is_some_and(|f| f.can_fire(&rig, now))
    }

    /// Grants the profile's full load. Returns false without a profile or
    /// ammo module.
    pub fn fill_ammo(&mut self) -> bool {
        match (&self.profile, self.modules.ammo.as_deref_mut()) {
            (Some(profile), Some(ammo)) => {
                ammo.fill(profile);
                self.last_readout = None;
                true
            },
            _ => false,
        }
    }

    /// Makes this the held weapon and calls `on_activated` on every module.
    pub fn activate(&mut self, host: &mut dyn WeaponHost, now: f32) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.input_enabled = true;
        self.was_aiming = false;
        self.last_readout = None;

        if let Some(profile) = self.profile.clone() {
            let mut ctx = ModuleContext {
                weapon: self.id,
                now,
                dt: 0.0,
                profile: &profile,
                host,
                modifiers: &mut self.modifiers,
                events: &self.events,
            };
            self.modules.activate_all(&mut ctx);
            ctx.host.trigger_animation(animations::EQUIP);
        }
        debug!("{} activated", self.id);
        self.events.publish(WeaponEvent::Activated { weapon: self.id });
        true
    }

    /// Puts the weapon away: cancels in-flight sequences, force-deactivates
    /// abilities and disables input.
    pub fn deactivate(&mut self, host: &mut dyn WeaponHost, now: f32) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.input_enabled = false;
        self.was_aiming = false;

        if let Some(profile) = self.profile.clone() {
            let mut ctx = ModuleContext {
                weapon: self.id,
                now,
                dt: 0.0,
                profile: &profile,
                host,
                modifiers: &mut self.modifiers,
                events: &self.events,
            };
            self.modules.deactivate_all(&mut ctx);
            ctx.host.trigger_animation(animations::HOLSTER);
        }
        debug!("{} deactivated", self.id);
        self.events.publish(WeaponEvent::Deactivated { weapon: self.id });
        true
    }

    /// Advances the weapon by one tick. Returns the number of shots fired.
    pub fn update(
        &mut self,
        input: &WeaponInput,
        host: &mut dyn WeaponHost,
        now: f32,
        dt: f32,
    ) -> u32 {
        if !self.active {
            return 0;
        }
        let Some(profile) = self.profile.clone() else {
            if !self.warned_no_profile {
                warn!("{} has no profile; skipping update", self.id);
                self.warned_no_profile = true;
            }
            return 0;
        };

        let mut ctx = ModuleContext {
            weapon: self.id,
            now,
            dt,
            profile: &profile,
            host,
            modifiers: &mut self.modifiers,
            events: &self.events,
        };
        let modules = &mut self.modules;
        let mut shots = 0;

        if self.input_enabled {
            if input.just_pressed(WeaponAction::CycleMode) {
                if let Some(fire) = modules.fire.as_deref_mut() {
                    fire.cycle_mode(&mut ctx);
                }
            }

            let (fire, mut rig) = modules.rig();
            if let Some(fire) = fire {
                shots = fire.on_fire_input(input.trigger(WeaponAction::Fire), &mut rig, &mut ctx);
            }

            if input.just_pressed(WeaponAction::Reload) {
                let busy = modules.fire.as_deref().is_some_and(|f| f.is_busy());
                if let Some(ammo) = modules.ammo.as_deref_mut() {
                    if !busy && ammo.can_reload() {
                        ammo.reload(&mut ctx);
                    }
                }
            }

            let aiming = ctx.host.aim_state().is_aiming;
            for ability in &mut modules.abilities {
                route_ability(&mut **ability, input, aiming, self.was_aiming, &mut ctx);
            }
            self.was_aiming = aiming;
        }

        modules.update_all(&mut ctx);

        let readout = modules.ammo.as_deref().map(|ammo| ammo.readout());
        if readout != self.last_readout {
            ctx.host.ammo_readout(readout.as_deref());
            self.last_readout = readout;
        }
        shots
    }
}

fn route_ability(
    ability: &mut dyn AbilityModule,
    input: &WeaponInput,
    aiming: bool,
    was_aiming: bool,
    ctx: &mut ModuleContext<'_>,
) {
    match ability.trigger() {
        AbilityTrigger::Action(action) => {
            if !input.just_pressed(action) {
                return;
            }
            if ability.is_active() {
                if ability.is_toggleable() {
                    ability.deactivate(DeactivationReason::Toggled, ctx);
                }
            } else {
                ability.activate(ctx);
            }
        },
        AbilityTrigger::AimState => {
            if aiming && !was_aiming {
                ability.activate(ctx);
            } else if !aiming && was_aiming {
                ability.deactivate(DeactivationReason::Toggled, ctx);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{Ability, AbilityConfig, AbilityDuration};
    use crate::abilities::{Overcharge, Scope};
    use crate::ammo::StandardAmmo;
    use crate::fire_control::ModalFireControl;
    use crate::host::RecordingHost;
    use crate::profile::FireMode;
    use crate::projectile::ProjectileEmitter;

    const DT: f32 = 0.0625;

    fn rifle() -> Arc<WeaponProfile> {
        Arc::new(
            WeaponProfile::named("rifle")
                .with_ammo(30, 120)
                .with_fire_rate(0.125)
                .with_reload_time(1.0)
                .with_modes(vec![FireMode::Auto, FireMode::Single]),
        )
    }

    fn weapon() -> ModularWeapon {
        let profile = rifle();
        ModularWeapon::new()
            .with_module(Module::fire(ModalFireControl::new()))
            .with_module(Module::ammo(StandardAmmo::from_profile(&profile)))
            .with_module(Module::projectile(ProjectileEmitter::kinetic()))
            .with_profile(profile)
    }

    #[test]
    fn test_single_valued_slots() {
        let mut weapon = weapon();
        assert_eq!(
            weapon.attach(Module::ammo(StandardAmmo::new())),
            Registration::SlotTaken
        );
        assert_eq!(
            weapon.attach(Module::targeting(crate::targeting::SpreadTargeting::new())),
            Registration::Registered
        );
        assert_eq!(weapon.modules().len(), 4);
    }

    #[test]
    fn test_reregistering_same_module_is_noop() {
        let overcharge = Ability::new(
            AbilityConfig::new("oc", AbilityTrigger::Action(WeaponAction::AbilityPrimary)),
            Overcharge::new(2.0, 1.0),
        );
        let mut set = ModuleSet::new();
        assert_eq!(
            set.register(Module::ability(overcharge.clone())),
            Registration::Registered
        );
        assert_eq!(
            set.register(Module::ability(overcharge)),
            Registration::AlreadyPresent
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_inactive_weapon_ignores_input() {
        let mut weapon = weapon();
        let mut host = RecordingHost::new();
        let mut input = WeaponInput::new();
        input.press(WeaponAction::Fire);
        assert_eq!(weapon.update(&input, &mut host, 0.0, DT), 0);
        assert!(host.projectiles.is_empty());
    }

    #[test]
    fn test_missing_profile_is_noop() {
        let mut weapon = ModularWeapon::new()
            .with_module(Module::fire(ModalFireControl::new()))
            .with_module(Module::ammo(StandardAmmo::new()));
        let mut host = RecordingHost::new();
        let mut input = WeaponInput::new();
        weapon.activate(&mut host, 0.0);
        input.press(WeaponAction::Fire);
        assert_eq!(weapon.update(&input, &mut host, 0.0, DT), 0);
        assert_eq!(weapon.update(&input, &mut host, DT, DT), 0);
    }

    #[test]
    fn test_late_profile_initializes_modules() {
        let mut weapon = ModularWeapon::new()
            .with_module(Module::fire(ModalFireControl::new()))
            .with_module(Module::ammo(StandardAmmo::new()));
        assert_eq!(weapon.fire_control().and_then(|f| f.current_mode()), None);

        weapon.set_profile(rifle());
        weapon.set_profile(rifle());
        assert_eq!(
            weapon.fire_control().and_then(|f| f.current_mode()),
            Some(FireMode::Auto)
        );
        assert!(weapon.fill_ammo());
        assert_eq!(weapon.ammo().map(|a| a.current_ammo()), Some(30));
    }

    #[test]
    fn test_cycle_mode_input() {
        let mut weapon = weapon();
        let mut host = RecordingHost::new();
        let mut input = WeaponInput::new();
        weapon.activate(&mut host, 0.0);
        input.press(WeaponAction::CycleMode);
        weapon.update(&input, &mut host, 0.0, DT);
        assert_eq!(
            weapon.fire_control().and_then(|f| f.current_mode()),
            Some(FireMode::Single)
        );
    }

    #[test]
    fn test_reload_cancelled_on_deactivate() {
        let mut weapon = weapon();
        let mut host = RecordingHost::new();
        let mut input = WeaponInput::new();
        weapon.activate(&mut host, 0.0);

        input.press(WeaponAction::Fire);
        weapon.update(&input, &mut host, 0.0, DT);
        input.end_frame();
        input.release(WeaponAction::Fire);
        input.press(WeaponAction::Reload);
        weapon.update(&input, &mut host, DT, DT);
        assert_eq!(weapon.fire_state(DT), Some(FireState::Reloading));

        weapon.deactivate(&mut host, 0.5);
        assert_eq!(weapon.fire_state(0.5), Some(FireState::Idle));
        assert_eq!(weapon.ammo().map(|a| a.current_ammo()), Some(29));
        assert!(weapon
            .drain_events()
            .iter()
            .any(|e| matches!(e, WeaponEvent::ReloadCancelled { .. })));
    }

    #[test]
    fn test_reload_refused_mid_burst() {
        let profile = Arc::new(
            WeaponProfile::named("burst")
                .with_ammo(30, 120)
                .with_fire_rate(0.5)
                .with_reload_time(1.0)
                .with_burst(3, 2.0 * DT)
                .with_modes(vec![FireMode::Burst]),
        );
        let mut weapon = ModularWeapon::new()
            .with_module(Module::fire(ModalFireControl::new()))
            .with_module(Module::ammo(StandardAmmo::from_profile(&profile)))
            .with_module(Module::projectile(ProjectileEmitter::kinetic()))
            .with_profile(profile);
        let mut host = RecordingHost::new();
        let mut input = WeaponInput::new();
        weapon.activate(&mut host, 0.0);

        input.press(WeaponAction::Fire);
        assert_eq!(weapon.update(&input, &mut host, 0.0, DT), 1);
        input.end_frame();
        input.release(WeaponAction::Fire);
        input.press(WeaponAction::Reload);
        weapon.update(&input, &mut host, DT, DT);
        assert_eq!(weapon.fire_state(DT), Some(FireState::Bursting));
        input.end_frame();
        input.release(WeaponAction::Reload);

        let shots: u32 = (2..8)
            .map(|frame| weapon.update(&input, &mut host, frame as f32 * DT, DT))
            .sum();
        assert_eq!(shots, 2);
        assert_eq!(
            weapon.ammo().map(|a| (a.current_ammo(), a.total_ammo())),
            Some((27, 120))
        );
        assert!(!weapon.ammo().is_some_and(|a| a.is_reloading()));
        assert!(!weapon
            .drain_events()
            .iter()
            .any(|e| matches!(e, WeaponEvent::ReloadStarted { .. })));
    }

    #[test]
    fn test_readout_pushed_only_on_change() {
        let mut weapon = weapon();
        let mut host = RecordingHost::new();
        let input = WeaponInput::new();
        weapon.activate(&mut host, 0.0);
        weapon.update(&input, &mut host, 0.0, DT);
        weapon.update(&input, &mut host, DT, DT);
        assert_eq!(host.readout.as_deref(), Some("30 / 120"));
        assert_eq!(host.readout_history.len(), 1);
    }

    #[test]
    fn test_toggle_and_forced_deactivation() {
        let mut weapon = weapon().with_module(Module::ability(Ability::new(
            AbilityConfig::new("oc", AbilityTrigger::Action(WeaponAction::AbilityPrimary))
                .with_duration(AbilityDuration::Sustained)
                .toggleable(),
            Overcharge::new(2.0, 1.0),
        )));
        let mut host = RecordingHost::new();
        let mut input = WeaponInput::new();
        weapon.activate(&mut host, 0.0);

        input.press(WeaponAction::AbilityPrimary);
        weapon.update(&input, &mut host, 0.0, DT);
        assert!((weapon.modifiers().damage_multiplier - 2.0).abs() < f32::EPSILON);
        input.end_frame();
        input.release(WeaponAction::AbilityPrimary);
        weapon.update(&input, &mut host, DT, DT);
        input.end_frame();
        input.press(WeaponAction::AbilityPrimary);
        weapon.update(&input, &mut host, 2.0 * DT, DT);
        assert!((weapon.modifiers().damage_multiplier - 1.0).abs() < f32::EPSILON);

        input.end_frame();
        input.release(WeaponAction::AbilityPrimary);
        weapon.update(&input, &mut host, 3.0 * DT, DT);
        input.end_frame();
        input.press(WeaponAction::AbilityPrimary);
        weapon.update(&input, &mut host, 4.0 * DT, DT);
        assert!(weapon.modules().ability("oc").is_some_and(|a| a.is_active()));

        weapon.deactivate(&mut host, 1.0);
        assert!(!weapon.modules().ability("oc").is_some_and(|a| a.is_active()));
        assert!((weapon.modifiers().damage_multiplier - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_scope_follows_aim_state() {
        let mut weapon = weapon().with_module(Module::ability(Ability::new(
            AbilityConfig::new("scope", AbilityTrigger::AimState)
                .with_duration(AbilityDuration::Sustained),
            Scope::new(),
        )));
        let mut host = RecordingHost::new();
        let input = WeaponInput::new();
        weapon.activate(&mut host, 0.0);

        host.aim.is_aiming = true;
        weapon.update(&input, &mut host, 0.0, DT);
        assert!(weapon.modules().ability("scope").is_some_and(|a| a.is_active()));

        host.aim.is_aiming = false;
        weapon.update(&input, &mut host, 1.0, DT);
        assert!(!weapon.modules().ability("scope").is_some_and(|a| a.is_active()));
    }
}
