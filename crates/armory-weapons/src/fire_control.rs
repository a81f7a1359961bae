//! Modal fire control.
//!
//! One [`ModalFireControl`] holds the profile's ordered fire modes and a
//! current index. Every tick it receives the trigger edges and decides,
//! from its own timers, whether a shot leaves the weapon:
//!
//! - Single and Scatter fire once on the press edge
//! - Auto fires while held, at most once per tick and once per fire interval
//! - Burst fires `burst_count` shots `burst_interval` apart, stopping early
//!   when ammo runs out
//! - Charge records the press and fires on release when held long enough
//!
//! A shot consumes one ammo unit, aims through the world raycast, applies
//! targeting, fans pellets for Scatter and hands each direction to the
//! projectile module.

use armory_common::{clamp01, fan_axis, lerp, rotate_about, ModuleId, Vec3, FAR_AIM_DISTANCE};
use tracing::{debug, warn};

use crate::capability::{
    FireControl, FireRig, FireState, ModuleContext, ProjectileRequest, WeaponModule,
};
use crate::events::WeaponEvent;
use crate::host::{animations, clips, WeaponHost};
use crate::input::TriggerState;
use crate::profile::{FireMode, WeaponProfile};
use crate::sequence::SequenceSlot;

/// Ideal shot direction from the muzzle.
///
/// Aims at whatever the camera ray hits, or at a far point along the camera
/// forward when it hits nothing.
pub fn base_direction(host: &mut dyn WeaponHost) -> Vec3 {
    let forward = host.aim_forward();
    let target = host.raycast_forward().map_or_else(
        || host.aim_origin() + forward * FAR_AIM_DISTANCE,
        |hit| hit.position,
    );
    (target - host.muzzle_position())
        .try_normalize()
        .unwrap_or(forward)
}

/// Linear fan of `pellets` directions around `base`.
///
/// Pellet `i` is turned by `lerp(-spread, spread, i / (pellets - 1))` degrees
/// around the fan axis, so the first and last pellets sit exactly on the
/// edges. A single pellet goes straight down `base`.
#[must_use]
pub fn scatter_fan(base: Vec3, pellets: u32, spread_deg: f32) -> Vec<Vec3> {
    if pellets <= 1 {
        return vec![base];
    }
    let axis = fan_axis(base, Vec3::Y);
    let last = (pellets - 1) as f32;
    (0..pellets)
        .map(|i| rotate_about(base, axis, lerp(-spread_deg, spread_deg, i as f32 / last)))
        .collect()
}

/// Fire control over the profile's ordered fire modes.
#[derive(Debug, Clone)]
pub struct ModalFireControl {
    id: ModuleId,
    modes: Vec<FireMode>,
    index: usize,
    cooldown_until: f32,
    last_shot_at: Option<f32>,
    burst_remaining: u32,
    burst_step: SequenceSlot,
    charge: SequenceSlot,
    warned_missing: bool,
}

impl Default for ModalFireControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalFireControl {
    /// Creates fire control with no modes. Modes arrive with the profile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ModuleId::next(),
            modes: Vec::new(),
            index: 0,
            cooldown_until: f32::NEG_INFINITY,
            last_shot_at: None,
            burst_remaining: 0,
            burst_step: SequenceSlot::new(),
            charge: SequenceSlot::new(),
            warned_missing: false,
        }
    }

    /// Creates fire control initialized from `profile`.
    #[must_use]
    pub fn from_profile(profile: &WeaponProfile) -> Self {
        let mut control = Self::new();
        control.initialize(profile);
        control
    }

    /// Available modes in cycling order.
    #[must_use]
    pub fn modes(&self) -> &[FireMode] {
        &self.modes
    }

    /// Selects `mode` directly. Returns false if the weapon lacks it or a
    /// burst is in flight.
    pub fn select_mode(&mut self, mode: FireMode) -> bool {
        if self.burst_remaining > 0 {
            return false;
        }
        match self.modes.iter().position(|m| *m == mode) {
            Some(index) => {
                self.index = index;
                self.charge.cancel();
                true
            },
            None => false,
        }
    }

    /// Time of the most recent shot.
    #[must_use]
    pub const fn last_shot_at(&self) -> Option<f32> {
        self.last_shot_at
    }

    /// Shots left in the current burst.
    #[must_use]
    pub const fn burst_remaining(&self) -> u32 {
        self.burst_remaining
    }

    /// Normalized charge while charging.
    #[must_use]
    pub fn charge_level(&self, profile: &WeaponProfile, now: f32) -> Option<f32> {
        self.charge
            .get()
            .map(|seq| charge_fraction(seq.elapsed(now), profile.charge.max_charge_time))
    }

    fn shot_interval(ctx: &ModuleContext<'_>) -> f32 {
        let multiplier = ctx.modifiers.fire_rate_multiplier;
        if multiplier > 0.0 {
            ctx.profile.fire_rate / multiplier
        } else {
            ctx.profile.fire_rate
        }
    }

    fn ready(&self, rig: &FireRig<'_>, now: f32) -> bool {
        rig.has_ammo(1) && !rig.is_reloading() && now >= self.cooldown_until
    }

    fn warn_missing(&mut self, what: &str, ctx: &ModuleContext<'_>) {
        if !self.warned_missing {
            warn!("{} ({}) has no {} module; firing disabled", ctx.weapon, ctx.profile.name, what);
            self.warned_missing = true;
        }
    }

    fn dry_fire(ctx: &mut ModuleContext<'_>) {
        ctx.host.play_sound(clips::EMPTY);
        ctx.publish(WeaponEvent::DryFire {
            weapon: ctx.weapon,
            time: ctx.now,
        });
    }

    /// One trigger pull's worth of projectiles.
    fn shoot(
        &mut self,
        rig: &mut FireRig<'_>,
        ctx: &mut ModuleContext<'_>,
        charge_level: f32,
        damage_multiplier: f32,
    ) -> bool {
        let Some(mode) = self.current_mode() else {
            return false;
        };
        let Some(projectile) = rig.projectile.as_deref_mut() else {
            self.warn_missing("projectile", ctx);
            return false;
        };
        let Some(ammo) = rig.ammo.as_deref_mut() else {
            self.warn_missing("ammo", ctx);
            return false;
        };
        if !ammo.consume(1, ctx.now) {
            Self::dry_fire(ctx);
            return false;
        }

        let origin = ctx.host.muzzle_position();
        let base = base_direction(&mut *ctx.host);
        let aimed = match rig.targeting.as_deref_mut() {
            Some(targeting) => targeting.calculate_direction(base, ctx),
            None => base,
        };
        let directions = if mode == FireMode::Scatter {
            scatter_fan(aimed, ctx.profile.pellet_count, ctx.profile.scatter_spread)
        } else {
            vec![aimed]
        };

        let speed = ctx.profile.muzzle_velocity;
        for direction in &directions {
            let request = ProjectileRequest {
                origin,
                direction: *direction,
                speed,
                damage_multiplier,
                charge_level,
            };
            projectile.create_projectile(&request, ctx);
        }

        ctx.host.play_sound(clips::FIRE);
        ctx.host.trigger_animation(animations::FIRE);
        ctx.host.apply_recoil(ctx.profile.recoil);
        ctx.publish(WeaponEvent::ShotFired {
            weapon: ctx.weapon,
            time: ctx.now,
            mode,
            pellets: directions.len() as u32,
            charge_level,
        });

        self.cooldown_until = ctx.now + Self::shot_interval(ctx);
        self.last_shot_at = Some(ctx.now);
        true
    }

    fn start_burst(&mut self, rig: &mut FireRig<'_>, ctx: &mut ModuleContext<'_>) -> bool {
        if !self.shoot(rig, ctx, 0.0, 1.0) {
            return false;
        }
        self.burst_remaining = ctx.profile.burst_count.saturating_sub(1);
        if self.burst_remaining > 0 {
            self.burst_step.start(ctx.now, ctx.profile.burst_interval);
        }
        true
    }

    /// Advances an in-flight burst. Returns shots fired this tick.
    fn step_burst(&mut self, rig: &mut FireRig<'_>, ctx: &mut ModuleContext<'_>) -> u32 {
        if self.burst_step.take_if_complete(ctx.now).is_none() {
            return 0;
        }
        if rig.has_ammo(1) && !rig.is_reloading() && self.shoot(rig, ctx, 0.0, 1.0) {
            self.burst_remaining -= 1;
            if self.burst_remaining > 0 {
                self.burst_step.start(ctx.now, ctx.profile.burst_interval);
            }
            return 1;
        }
        debug!(
            "{} burst aborted with {} shots left",
            ctx.weapon, self.burst_remaining
        );
        self.burst_remaining = 0;
        0
    }

    fn release_charge(&mut self, rig: &mut FireRig<'_>, ctx: &mut ModuleContext<'_>) -> u32 {
        let Some(sequence) = self.charge.get().copied() else {
            return 0;
        };
        self.charge.cancel();

        let held = sequence.elapsed(ctx.now);
        let profile = ctx.profile;
        let settings = &profile.charge;
        if held < settings.min_charge_time {
            debug!("{} charge released early after {:.2}s", ctx.weapon, held);
            ctx.publish(WeaponEvent::ChargeAborted {
                weapon: ctx.weapon,
                time: ctx.now,
            });
            return 0;
        }

        let level = charge_fraction(held, settings.max_charge_time);
        let multiplier = settings.curve.evaluate(level);
        u32::from(self.shoot(rig, ctx, level, multiplier))
    }

    fn start_charge(&mut self, ctx: &mut ModuleContext<'_>) {
        self.charge.start(ctx.now, ctx.profile.charge.max_charge_time);
        ctx.host.play_sound(clips::CHARGE);
        ctx.publish(WeaponEvent::ChargeStarted {
            weapon: ctx.weapon,
            time: ctx.now,
        });
    }
}

fn charge_fraction(held: f32, max_charge_time: f32) -> f32 {
    if max_charge_time <= 0.0 {
        1.0
    } else {
        clamp01(held / max_charge_time)
    }
}

impl WeaponModule for ModalFireControl {
    fn module_id(&self) -> ModuleId {
        self.id
    }

    fn label(&self) -> &'static str {
        "modal_fire_control"
    }

    fn initialize(&mut self, profile: &WeaponProfile) {
        let selected = self.current_mode();
        self.modes.clone_from(&profile.fire_modes);
        self.index = selected
            .and_then(|mode| self.modes.iter().position(|m| *m == mode))
            .unwrap_or(0);
        self.warned_missing = false;
    }

    fn on_deactivated(&mut self, ctx: &mut ModuleContext<'_>) {
        self.cancel(ctx);
    }
}

impl FireControl for ModalFireControl {
    fn can_fire(&self, rig: &FireRig<'_>, now: f32) -> bool {
        self.ready(rig, now) && !self.is_busy()
    }

    fn on_fire_input(
        &mut self,
        trigger: TriggerState,
        rig: &mut FireRig<'_>,
        ctx: &mut ModuleContext<'_>,
    ) -> u32 {
        if self.burst_remaining > 0 {
            return self.step_burst(rig, ctx);
        }
        if self.charge.is_running() {
            if trigger.pressed {
                return 0;
            }
            return self.release_charge(rig, ctx);
        }

        let Some(mode) = self.current_mode() else {
            return 0;
        };
        if trigger.pressed && rig.ammo.is_none() {
            self.warn_missing("ammo", ctx);
            return 0;
        }
        if trigger.just_pressed && !rig.has_ammo(1) && !rig.is_reloading() {
            Self::dry_fire(ctx);
            return 0;
        }

        let wants_shot = match mode {
            FireMode::Auto => trigger.pressed,
            FireMode::Single | FireMode::Burst | FireMode::Scatter | FireMode::Charge => {
                trigger.just_pressed
            },
        };
        if !wants_shot || !self.can_fire(rig, ctx.now) {
            return 0;
        }

        match mode {
            FireMode::Charge => {
                self.start_charge(ctx);
                0
            },
            _ => u32::from(self.fire(rig, ctx)),
        }
    }

    fn fire(&mut self, rig: &mut FireRig<'_>, ctx: &mut ModuleContext<'_>) -> bool {
        if !self.can_fire(rig, ctx.now) {
            return false;
        }
        match self.current_mode() {
            Some(FireMode::Burst) => self.start_burst(rig, ctx),
            Some(FireMode::Charge) => {
                let multiplier = ctx.profile.charge.curve.evaluate(0.0);
                self.shoot(rig, ctx, 0.0, multiplier)
            },
            Some(_) => self.shoot(rig, ctx, 0.0, 1.0),
            None => false,
        }
    }

    fn cycle_mode(&mut self, ctx: &mut ModuleContext<'_>) -> bool {
        if self.modes.len() <= 1 || self.burst_remaining > 0 {
            return false;
        }
        if self.charge.cancel() {
            ctx.publish(WeaponEvent::ChargeAborted {
                weapon: ctx.weapon,
                time: ctx.now,
            });
        }
        self.index = (self.index + 1) % self.modes.len();
        let mode = self.modes[self.index];
        debug!("{} switched to {}", ctx.weapon, mode.label());
        ctx.host.play_sound(clips::MODE_SWITCH);
        ctx.publish(WeaponEvent::ModeChanged {
            weapon: ctx.weapon,
            mode,
        });
        true
    }

    fn current_mode(&self) -> Option<FireMode> {
        self.modes.get(self.index).copied()
    }

    fn state(&self, rig: &FireRig<'_>, now: f32) -> FireState {
        if rig.is_reloading() {
            FireState::Reloading
        } else if rig.is_overheated() {
            FireState::Overheated
        } else if self.burst_remaining > 0 {
            FireState::Bursting
        } else if self.charge.is_running() {
            FireState::Charging
        } else if now < self.cooldown_until {
            FireState::Firing
        } else {
            FireState::Idle
        }
    }

    fn is_busy(&self) -> bool {
        self.burst_remaining > 0 || self.charge.is_running()
    }

    fn cancel(&mut self, ctx: &mut ModuleContext<'_>) -> bool {
        let mut cancelled = false;
        if self.burst_remaining > 0 {
            self.burst_remaining = 0;
            self.burst_step.cancel();
            cancelled = true;
        }
        if self.charge.cancel() {
            ctx.publish(WeaponEvent::ChargeAborted {
                weapon: ctx.weapon,
                time: ctx.now,
            });
            cancelled = true;
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ammo::StandardAmmo;
    use crate::capability::testing::Harness;
    use crate::capability::AmmoModule;
    use crate::host::HitPoint;
    use crate::profile::{ChargeCurve, ChargeSettings};
    use crate::projectile::ProjectileEmitter;
    use armory_common::signed_angle_deg;

    const DT: f32 = 0.0625;

    fn profile(modes: &[FireMode]) -> WeaponProfile {
        WeaponProfile::named("test")
            .with_ammo(30, 120)
            .with_fire_rate(0.125)
            .with_burst(5, 0.0625)
            .with_scatter(5, 10.0)
            .with_modes(modes.to_vec())
    }

    #[test]
    fn test_scatter_fan_edges() {
        let base = Vec3::NEG_Z;
        let fan = scatter_fan(base, 5, 10.0);
        assert_eq!(fan.len(), 5);
        let axis = fan_axis(base, Vec3::Y);
        let angles: Vec<f32> = fan.iter().map(|d| signed_angle_deg(base, *d, axis)).collect();
        assert!((angles[0] + 10.0).abs() < 1e-3);
        assert!(angles[2].abs() < 1e-3);
        assert!((angles[4] - 10.0).abs() < 1e-3);
        assert!((angles[1] + 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_scatter_fan_single_pellet() {
        assert_eq!(scatter_fan(Vec3::X, 1, 30.0), vec![Vec3::X]);
        assert_eq!(scatter_fan(Vec3::X, 0, 30.0), vec![Vec3::X]);
    }

    #[test]
    fn test_base_direction_uses_raycast_hit() {
        let mut harness = Harness::new(profile(&[FireMode::Single]));
        harness.host.muzzle = Vec3::ZERO;
        harness.host.raycast = Some(HitPoint {
            position: Vec3::new(10.0, 0.0, 0.0),
            normal: Vec3::Y,
            target: None,
            distance: 10.0,
        });
        assert_eq!(base_direction(&mut harness.host), Vec3::X);

        harness.host.raycast = None;
        harness.host.origin = Vec3::ZERO;
        assert_eq!(base_direction(&mut harness.host), Vec3::NEG_Z);
    }

    #[test]
    fn test_single_fires_once_per_press() {
        let mut harness = Harness::new(profile(&[FireMode::Single]));
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut emitter = ProjectileEmitter::kinetic();
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: Some(&mut emitter),
            targeting: None,
        };

        assert_eq!(fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.0, DT)), 1);
        assert_eq!(fc.state(&rig, 0.0625), FireState::Firing);
        assert_eq!(fc.on_fire_input(TriggerState::HELD, &mut rig, &mut harness.ctx(0.5, DT)), 0);
        assert_eq!(
            fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.0625, DT)),
            0
        );
        assert_eq!(
            fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.125, DT)),
            1
        );
        assert_eq!(rig.ammo.as_deref().map(|a| a.current_ammo()), Some(28));
        assert_eq!(harness.host.projectiles.len(), 2);
        assert_eq!(harness.host.sound_count(clips::FIRE), 2);
    }

    #[test]
    fn test_auto_respects_fire_rate() {
        let mut harness = Harness::new(profile(&[FireMode::Auto]));
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut emitter = ProjectileEmitter::kinetic();
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: Some(&mut emitter),
            targeting: None,
        };

        let mut shots = 0;
        for frame in 0..16 {
            let now = frame as f32 * DT;
            let trigger = if frame == 0 {
                TriggerState::PULLED
            } else {
                TriggerState::HELD
            };
            shots += fc.on_fire_input(trigger, &mut rig, &mut harness.ctx(now, DT));
        }
        assert_eq!(shots, 8);

        assert_eq!(
            fc.on_fire_input(TriggerState::RELEASED, &mut rig, &mut harness.ctx(1.0, DT)),
            0
        );
    }

    #[test]
    fn test_burst_steps_and_waits() {
        let mut harness = Harness::new(profile(&[FireMode::Burst]));
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut emitter = ProjectileEmitter::kinetic();
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: Some(&mut emitter),
            targeting: None,
        };

        assert_eq!(fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.0, DT)), 1);
        assert!(fc.is_busy());
        assert_eq!(fc.state(&rig, 0.0), FireState::Bursting);
        let mut shots = 1;
        for frame in 1..8 {
            let now = frame as f32 * DT;
            shots += fc.on_fire_input(TriggerState::RELEASED, &mut rig, &mut harness.ctx(now, DT));
        }
        assert_eq!(shots, 5);
        assert!(!fc.is_busy());
        assert_eq!(fc.last_shot_at(), Some(0.25));
    }

    #[test]
    fn test_mode_switch_blocked_mid_burst() {
        let mut harness = Harness::new(profile(&[FireMode::Burst, FireMode::Single]));
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut emitter = ProjectileEmitter::kinetic();
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: Some(&mut emitter),
            targeting: None,
        };

        fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.0, DT));
        assert!(!fc.cycle_mode(&mut harness.ctx(0.0, DT)));
        assert_eq!(fc.current_mode(), Some(FireMode::Burst));
    }

    #[test]
    fn test_cycle_mode_wraps() {
        let mut harness = Harness::new(profile(&[FireMode::Single, FireMode::Auto]));
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        assert!(fc.cycle_mode(&mut harness.ctx(0.0, DT)));
        assert_eq!(fc.current_mode(), Some(FireMode::Auto));
        assert!(fc.cycle_mode(&mut harness.ctx(0.0, DT)));
        assert_eq!(fc.current_mode(), Some(FireMode::Single));

        let mut lone = ModalFireControl::from_profile(&profile(&[FireMode::Single]));
        assert!(!lone.cycle_mode(&mut harness.ctx(0.0, DT)));
    }

    #[test]
    fn test_scatter_consumes_one_per_pull() {
        let mut harness = Harness::new(profile(&[FireMode::Scatter]));
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut emitter = ProjectileEmitter::kinetic();
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: Some(&mut emitter),
            targeting: None,
        };

        assert_eq!(fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.0, DT)), 1);
        assert_eq!(ammo.magazine(), 29);
        assert_eq!(harness.host.projectiles.len(), 5);
    }

    #[test]
    fn test_charge_release_scales_damage() {
        let charge = ChargeSettings {
            min_charge_time: 0.25,
            max_charge_time: 1.0,
            curve: ChargeCurve::Linear { min: 1.0, max: 3.0 },
        };
        let mut harness = Harness::new(
            profile(&[FireMode::Charge]).with_damage(10.0).with_charge(charge),
        );
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut emitter = ProjectileEmitter::kinetic();
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: Some(&mut emitter),
            targeting: None,
        };

        assert_eq!(fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.0, DT)), 0);
        assert_eq!(fc.state(&rig, 0.25), FireState::Charging);
        assert_eq!(fc.on_fire_input(TriggerState::HELD, &mut rig, &mut harness.ctx(0.25, DT)), 0);
        assert_eq!(
            fc.on_fire_input(TriggerState::RELEASED, &mut rig, &mut harness.ctx(0.5, DT)),
            1
        );

        let damage = harness.host.projectiles[0].damage;
        assert!((damage.charge_level - 0.5).abs() < f32::EPSILON);
        assert!((damage.amount - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_charge_released_early_aborts() {
        let mut harness = Harness::new(profile(&[FireMode::Charge]));
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut emitter = ProjectileEmitter::kinetic();
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: Some(&mut emitter),
            targeting: None,
        };

        fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.0, DT));
        assert_eq!(
            fc.on_fire_input(TriggerState::RELEASED, &mut rig, &mut harness.ctx(0.125, DT)),
            0
        );
        assert_eq!(ammo.magazine(), 30);
        assert!(harness
            .events
            .drain()
            .iter()
            .any(|e| matches!(e, WeaponEvent::ChargeAborted { .. })));
    }

    #[test]
    fn test_empty_magazine_dry_fires() {
        let mut harness = Harness::new(profile(&[FireMode::Single]).with_ammo(1, 0));
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut emitter = ProjectileEmitter::kinetic();
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: Some(&mut emitter),
            targeting: None,
        };

        assert_eq!(fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.0, DT)), 1);
        assert_eq!(fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(1.0, DT)), 0);
        assert_eq!(harness.host.sound_count(clips::EMPTY), 1);
    }

    #[test]
    fn test_missing_projectile_module_is_noop() {
        let mut harness = Harness::new(profile(&[FireMode::Single]));
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: None,
            targeting: None,
        };

        assert_eq!(fc.on_fire_input(TriggerState::PULLED, &mut rig, &mut harness.ctx(0.0, DT)), 0);
        assert_eq!(ammo.magazine(), 30);
        assert!(harness.host.sounds.is_empty());
    }

    #[test]
    fn test_fire_rate_multiplier_shortens_interval() {
        let mut harness = Harness::new(profile(&[FireMode::Single]));
        harness.modifiers.fire_rate_multiplier = 2.0;
        let mut ammo = StandardAmmo::from_profile(&harness.profile);
        let mut emitter = ProjectileEmitter::kinetic();
        let mut fc = ModalFireControl::from_profile(&harness.profile);
        let mut rig = FireRig {
            ammo: Some(&mut ammo),
            projectile: Some(&mut emitter),
            targeting: None,
        };

        assert!(fc.fire(&mut rig, &mut harness.ctx(0.0, DT)));
        assert!(fc.can_fire(&rig, 0.0625));
    }
}
