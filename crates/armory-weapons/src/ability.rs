//! Ability framework.
//!
//! An [`Ability`] pairs the shared cooldown/duration bookkeeping with an
//! [`AbilityEffect`] that does the actual work. The bookkeeping guarantees
//! that an effect's `deactivate` runs exactly once per activation, whether
//! the ability expired, was toggled off or was forced off by the weapon.

use armory_common::ModuleId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{
    AbilityModule, AbilityTrigger, DeactivationReason, ModuleContext, WeaponModule,
};
use crate::events::WeaponEvent;
use crate::profile::WeaponProfile;

/// How long an ability stays on once activated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityDuration {
    /// Fires its effect and turns off in the same call.
    Instant,
    /// Turns off by itself after this many seconds.
    Timed(f32),
    /// Stays on until toggled or forced off.
    Sustained,
}

/// Static tuning of one ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityConfig {
    /// Display name.
    pub name: String,
    /// Seconds from one activation until the next is allowed.
    pub cooldown: f32,
    /// How long it stays on.
    pub duration: AbilityDuration,
    /// What turns it on.
    pub trigger: AbilityTrigger,
    /// Whether pressing the trigger again turns it off.
    pub toggleable: bool,
}

impl AbilityConfig {
    /// Instant ability with no cooldown.
    #[must_use]
    pub fn new(name: impl Into<String>, trigger: AbilityTrigger) -> Self {
        Self {
            name: name.into(),
            cooldown: 0.0,
            duration: AbilityDuration::Instant,
            trigger,
            toggleable: false,
        }
    }

    /// Set cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown.max(0.0);
        self
    }

    /// Set duration.
    #[must_use]
    pub fn with_duration(mut self, duration: AbilityDuration) -> Self {
        self.duration = duration;
        self
    }

    /// Allow toggling off with the trigger.
    #[must_use]
    pub fn toggleable(mut self) -> Self {
        self.toggleable = true;
        self
    }
}

/// Cooldown and activity bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityState {
    /// When the ability was last activated.
    pub last_activation: Option<f32>,
    /// Whether the ability is on.
    pub active: bool,
}

impl AbilityState {
    /// `max(0, last_activation + cooldown - now)`, or 0 if never used.
    #[must_use]
    pub fn cooldown_remaining(&self, cooldown: f32, now: f32) -> f32 {
        self.last_activation
            .map_or(0.0, |last| (last + cooldown - now).max(0.0))
    }

    /// Cooldown elapsed and not already active.
    #[must_use]
    pub fn can_activate(&self, cooldown: f32, now: f32) -> bool {
        !self.active && self.last_activation.map_or(true, |last| now >= last + cooldown)
    }
}

/// The effect half of an ability.
pub trait AbilityEffect: std::fmt::Debug {
    /// Kind name for logs.
    fn label(&self) -> &'static str;

    /// Called when the weapon's profile is bound or replaced.
    fn initialize(&mut self, _profile: &WeaponProfile) {}

    /// Turns the effect on.
    fn activate(&mut self, ctx: &mut ModuleContext<'_>);

    /// Turns the effect off. `Forced` means the weapon is going away and any
    /// smoothing must be skipped.
    fn deactivate(&mut self, reason: DeactivationReason, ctx: &mut ModuleContext<'_>);

    /// Called every tick while the weapon is active, on or off.
    fn tick(&mut self, _active: bool, _ctx: &mut ModuleContext<'_>) {}

    /// Called when the weapon goes away, even if the ability is already off.
    /// Anything still settling from an earlier deactivation must finish now.
    fn force_reset(&mut self, _ctx: &mut ModuleContext<'_>) {}
}

/// An ability module built from a config and an effect.
#[derive(Debug, Clone)]
pub struct Ability<E> {
    id: ModuleId,
    config: AbilityConfig,
    state: AbilityState,
    effect: E,
}

impl<E: AbilityEffect> Ability<E> {
    /// Creates the ability.
    #[must_use]
    pub fn new(config: AbilityConfig, effect: E) -> Self {
        Self {
            id: ModuleId::next(),
            config,
            state: AbilityState::default(),
            effect,
        }
    }

    /// Static tuning.
    #[must_use]
    pub const fn config(&self) -> &AbilityConfig {
        &self.config
    }

    /// Bookkeeping.
    #[must_use]
    pub const fn state(&self) -> &AbilityState {
        &self.state
    }

    /// The effect.
    #[must_use]
    pub const fn effect(&self) -> &E {
        &self.effect
    }

    fn expired(&self, now: f32) -> bool {
        match (self.config.duration, self.state.last_activation) {
            (AbilityDuration::Timed(duration), Some(last)) => now >= last + duration,
            _ => false,
        }
    }
}

impl<E: AbilityEffect> WeaponModule for Ability<E> {
    fn module_id(&self) -> ModuleId {
        self.id
    }

    fn label(&self) -> &'static str {
        self.effect.label()
    }

    fn initialize(&mut self, profile: &WeaponProfile) {
        self.effect.initialize(profile);
    }

    fn on_deactivated(&mut self, ctx: &mut ModuleContext<'_>) {
        self.deactivate(DeactivationReason::Forced, ctx);
        self.effect.force_reset(ctx);
    }

    fn on_update(&mut self, ctx: &mut ModuleContext<'_>) {
        if self.state.active && self.expired(ctx.now) {
            self.deactivate(DeactivationReason::Expired, ctx);
        }
        self.effect.tick(self.state.active, ctx);
    }
}

impl<E: AbilityEffect> AbilityModule for Ability<E> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn trigger(&self) -> AbilityTrigger {
        self.config.trigger
    }

    fn can_activate(&self, now: f32) -> bool {
        self.state.can_activate(self.config.cooldown, now)
    }

    fn activate(&mut self, ctx: &mut ModuleContext<'_>) -> bool {
        if !self.can_activate(ctx.now) {
            return false;
        }
        self.state.last_activation = Some(ctx.now);
        self.state.active = true;
        debug!("{} activated {}", ctx.weapon, self.config.name);
        ctx.publish(WeaponEvent::AbilityActivated {
            weapon: ctx.weapon,
            ability: self.config.name.clone(),
            time: ctx.now,
        });
        self.effect.activate(ctx);
        if self.config.duration == AbilityDuration::Instant {
            self.deactivate(DeactivationReason::Instant, ctx);
        }
        true
    }

    fn deactivate(&mut self, reason: DeactivationReason, ctx: &mut ModuleContext<'_>) -> bool {
        if !self.state.active {
            return false;
        }
        self.state.active = false;
        self.effect.deactivate(reason, ctx);
        debug!("{} deactivated {} ({:?})", ctx.weapon, self.config.name, reason);
        ctx.publish(WeaponEvent::AbilityDeactivated {
            weapon: ctx.weapon,
            ability: self.config.name.clone(),
            reason,
            time: ctx.now,
        });
        true
    }

    fn cooldown_remaining(&self, now: f32) -> f32 {
        self.state.cooldown_remaining(self.config.cooldown, now)
    }

    fn is_active(&self) -> bool {
        self.state.active
    }

    fn is_toggleable(&self) -> bool {
        self.config.toggleable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::Harness;
    use crate::input::WeaponAction;

    #[derive(Debug, Default)]
    struct Counter {
        on: u32,
        off: Vec<DeactivationReason>,
        resets: u32,
    }

    impl AbilityEffect for Counter {
        fn label(&self) -> &'static str {
            "counter"
        }

        fn activate(&mut self, _ctx: &mut ModuleContext<'_>) {
            self.on += 1;
        }

        fn deactivate(&mut self, reason: DeactivationReason, _ctx: &mut ModuleContext<'_>) {
            self.off.push(reason);
        }

        fn force_reset(&mut self, _ctx: &mut ModuleContext<'_>) {
            self.resets += 1;
        }
    }

    fn config(duration: AbilityDuration) -> AbilityConfig {
        AbilityConfig::new("test", AbilityTrigger::Action(WeaponAction::AbilityPrimary))
            .with_cooldown(4.0)
            .with_duration(duration)
    }

    #[test]
    fn test_instant_deactivates_immediately() {
        let mut harness = Harness::new(WeaponProfile::default());
        let mut ability = Ability::new(config(AbilityDuration::Instant), Counter::default());

        assert!(ability.activate(&mut harness.ctx(1.0, 0.0)));
        assert!(!ability.is_active());
        assert_eq!(ability.effect().on, 1);
        assert_eq!(ability.effect().off, vec![DeactivationReason::Instant]);
        assert!(!ability.activate(&mut harness.ctx(2.0, 0.0)));
        assert!(ability.activate(&mut harness.ctx(5.0, 0.0)));
    }

    #[test]
    fn test_timed_expires_once() {
        let mut harness = Harness::new(WeaponProfile::default());
        let mut ability = Ability::new(config(AbilityDuration::Timed(2.0)), Counter::default());

        assert!(ability.activate(&mut harness.ctx(0.0, 0.0)));
        ability.on_update(&mut harness.ctx(1.0, 1.0));
        assert!(ability.is_active());
        ability.on_update(&mut harness.ctx(2.0, 1.0));
        assert!(!ability.is_active());
        ability.on_update(&mut harness.ctx(3.0, 1.0));
        ability.on_deactivated(&mut harness.ctx(3.0, 0.0));
        assert_eq!(ability.effect().off, vec![DeactivationReason::Expired]);
        assert_eq!(ability.effect().resets, 1);
    }

    #[test]
    fn test_forced_deactivation() {
        let mut harness = Harness::new(WeaponProfile::default());
        let mut ability = Ability::new(config(AbilityDuration::Sustained), Counter::default());
        assert!(ability.activate(&mut harness.ctx(0.0, 0.0)));
        assert!(!ability.activate(&mut harness.ctx(10.0, 0.0)));

        ability.on_deactivated(&mut harness.ctx(1.0, 0.0));
        assert!(!ability.is_active());
        assert_eq!(ability.effect().off, vec![DeactivationReason::Forced]);
    }

    #[test]
    fn test_cooldown_remaining_reaches_zero_exactly() {
        let state = AbilityState {
            last_activation: Some(1.0),
            active: false,
        };
        assert!((state.cooldown_remaining(4.0, 1.0) - 4.0).abs() < f32::EPSILON);
        assert!((state.cooldown_remaining(4.0, 3.0) - 2.0).abs() < f32::EPSILON);
        assert_eq!(state.cooldown_remaining(4.0, 5.0), 0.0);
        assert_eq!(state.cooldown_remaining(4.0, 9.0), 0.0);
        assert!(state.can_activate(4.0, 5.0));
        assert!(!state.can_activate(4.0, 4.5));
    }
}
