//! Ability effects.
//!
//! Each type here is an [`AbilityEffect`] meant to be wrapped in
//! [`Ability`](crate::ability::Ability).

use armory_common::{lerp, TargetId, Vec3};
use tracing::debug;

use crate::ability::AbilityEffect;
use crate::capability::{DeactivationReason, ModuleContext};
use crate::damage::{Bypass, BypassFlags, DamageEvent, ProjectileType};
use crate::host::{clips, EffectHandle, TargetInfo};
use crate::profile::WeaponProfile;
use crate::sequence::TimedSequence;

fn nearest(ctx: &ModuleContext<'_>, tag: &str, radius: f32) -> Option<TargetInfo> {
    let origin = ctx.host.aim_origin();
    ctx.host
        .targets_in_radius(tag, origin, radius)
        .into_iter()
        .min_by(|a, b| {
            a.position
                .distance_squared(origin)
                .total_cmp(&b.position.distance_squared(origin))
        })
}

/// Marks the nearest tagged target so new projectiles home on it.
#[derive(Debug, Clone)]
pub struct HomingLock {
    tag: String,
    radius: f32,
    target: Option<TargetId>,
}

impl HomingLock {
    /// Creates the effect.
    #[must_use]
    pub fn new(tag: impl Into<String>, radius: f32) -> Self {
        Self {
            tag: tag.into(),
            radius,
            target: None,
        }
    }

    /// Currently locked target.
    #[must_use]
    pub const fn target(&self) -> Option<TargetId> {
        self.target
    }
}

impl AbilityEffect for HomingLock {
    fn label(&self) -> &'static str {
        "homing_lock"
    }

    fn activate(&mut self, ctx: &mut ModuleContext<'_>) {
        self.target = nearest(ctx, &self.tag, self.radius).map(|t| t.id);
        ctx.modifiers.homing_target = self.target;
        if self.target.is_some() {
            ctx.host.play_sound(clips::LOCK_ON);
        }
    }

    fn deactivate(&mut self, _reason: DeactivationReason, ctx: &mut ModuleContext<'_>) {
        if ctx.modifiers.homing_target == self.target {
            ctx.modifiers.homing_target = None;
        }
        self.target = None;
    }

    fn tick(&mut self, active: bool, ctx: &mut ModuleContext<'_>) {
        if !active || self.target.is_none() {
            return;
        }
        // Drop the lock once the target leaves the radius.
        let still_close = ctx
            .host
            .targets_in_radius(&self.tag, ctx.host.aim_origin(), self.radius)
            .iter()
            .any(|t| Some(t.id) == self.target);
        if !still_close {
            debug!("{} lost homing target", ctx.weapon);
            self.target = None;
            ctx.modifiers.homing_target = None;
        }
    }
}

/// Temporary damage and fire-rate buff with a glow effect.
#[derive(Debug, Clone)]
pub struct Overcharge {
    damage_multiplier: f32,
    fire_rate_multiplier: f32,
    glow: Option<EffectHandle>,
}

impl Overcharge {
    /// Effect object spawned while overcharged.
    pub const EFFECT: &'static str = "overcharge_glow";

    /// Creates the effect. Multipliers must be positive.
    #[must_use]
    pub fn new(damage_multiplier: f32, fire_rate_multiplier: f32) -> Self {
        Self {
            damage_multiplier: damage_multiplier.max(f32::EPSILON),
            fire_rate_multiplier: fire_rate_multiplier.max(f32::EPSILON),
            glow: None,
        }
    }
}

impl AbilityEffect for Overcharge {
    fn label(&self) -> &'static str {
        "overcharge"
    }

    fn activate(&mut self, ctx: &mut ModuleContext<'_>) {
        ctx.modifiers.damage_multiplier *= self.damage_multiplier;
        ctx.modifiers.fire_rate_multiplier *= self.fire_rate_multiplier;
        let muzzle = ctx.host.muzzle_position();
        self.glow = Some(ctx.host.spawn_effect(Self::EFFECT, muzzle));
        ctx.host.play_sound(clips::OVERCHARGE);
    }

    fn deactivate(&mut self, _reason: DeactivationReason, ctx: &mut ModuleContext<'_>) {
        ctx.modifiers.damage_multiplier /= self.damage_multiplier;
        ctx.modifiers.fire_rate_multiplier /= self.fire_rate_multiplier;
        if let Some(glow) = self.glow.take() {
            ctx.host.despawn_effect(glow);
        }
    }
}

/// Instant hitscan beam that ignores shields and walls.
#[derive(Debug, Clone)]
pub struct Beam {
    range: f32,
    damage_multiplier: f32,
}

impl Beam {
    /// Effect object spawned for the beam flash.
    pub const EFFECT: &'static str = "beam_flash";

    /// Bypass flags carried by beam damage.
    pub const BYPASS: BypassFlags = BypassFlags::NONE
        .with(Bypass::PhysicalShield)
        .with(Bypass::EnergyShield)
        .with(Bypass::Walls);

    /// Creates the effect.
    #[must_use]
    pub const fn new(range: f32, damage_multiplier: f32) -> Self {
        Self {
            range,
            damage_multiplier,
        }
    }
}

impl AbilityEffect for Beam {
    fn label(&self) -> &'static str {
        "beam"
    }

    fn activate(&mut self, ctx: &mut ModuleContext<'_>) {
        ctx.host.play_sound(clips::BEAM);
        let muzzle = ctx.host.muzzle_position();
        let flash = ctx.host.spawn_effect(Self::EFFECT, muzzle);
        ctx.host.despawn_effect(flash);

        let Some(hit) = ctx.host.raycast_forward() else {
            return;
        };
        let Some(target) = hit.target else {
            return;
        };
        if hit.distance > self.range {
            return;
        }
        let amount = ctx.profile.damage * self.damage_multiplier * ctx.modifiers.damage_multiplier;
        let event = DamageEvent::new(amount, ProjectileType::Beam)
            .with_bypass(Self::BYPASS)
            .at(hit.position, hit.normal);
        ctx.host.resolve_damage(target, &event);
    }

    fn deactivate(&mut self, _reason: DeactivationReason, _ctx: &mut ModuleContext<'_>) {}
}

#[derive(Debug, Clone, Copy)]
struct ScopeBlend {
    from: (f32, Vec3),
    to: (f32, Vec3),
    sequence: TimedSequence,
}

/// Aim-down-sights zoom with a smooth field-of-view and offset blend.
///
/// Usually bound to the host's aim flag rather than a button.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    hip: (f32, Vec3),
    aimed: (f32, Vec3),
    transition_time: f32,
    current: (f32, Vec3),
    blend: Option<ScopeBlend>,
}

impl Scope {
    /// Creates the effect. Tuning arrives with the profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current field of view.
    #[must_use]
    pub const fn field_of_view(&self) -> f32 {
        self.current.0
    }

    /// Whether a blend is in progress.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.blend.is_some()
    }

    fn blend_to(&mut self, to: (f32, Vec3), now: f32) {
        self.blend = Some(ScopeBlend {
            from: self.current,
            to,
            sequence: TimedSequence::new(now, self.transition_time),
        });
    }

    fn apply(&mut self, value: (f32, Vec3), ctx: &mut ModuleContext<'_>) {
        self.current = value;
        ctx.host.set_field_of_view(value.0);
        ctx.host.set_weapon_offset(value.1);
    }
}

impl AbilityEffect for Scope {
    fn label(&self) -> &'static str {
        "scope"
    }

    fn initialize(&mut self, profile: &WeaponProfile) {
        let aim = &profile.aim;
        self.hip = (aim.hip_fov, aim.hip_offset);
        self.aimed = (aim.fov, aim.offset);
        self.transition_time = aim.transition_time;
        if self.blend.is_none() {
            self.current = self.hip;
        }
    }

    fn activate(&mut self, ctx: &mut ModuleContext<'_>) {
        self.blend_to(self.aimed, ctx.now);
    }

    fn deactivate(&mut self, reason: DeactivationReason, ctx: &mut ModuleContext<'_>) {
        if reason == DeactivationReason::Forced {
            self.blend = None;
            self.apply(self.hip, ctx);
        } else {
            self.blend_to(self.hip, ctx.now);
        }
    }

    fn force_reset(&mut self, ctx: &mut ModuleContext<'_>) {
        if self.blend.take().is_some() {
            self.apply(self.hip, ctx);
        }
    }

    fn tick(&mut self, _active: bool, ctx: &mut ModuleContext<'_>) {
        let Some(blend) = self.blend else {
            return;
        };
        let t = blend.sequence.progress(ctx.now);
        let value = (
            lerp(blend.from.0, blend.to.0, t),
            blend.from.1.lerp(blend.to.1, t),
        );
        self.apply(value, ctx);
        if blend.sequence.is_complete(ctx.now) {
            self.blend = None;
        }
    }
}

/// Places a shield object in front of the player while active.
#[derive(Debug, Clone)]
pub struct DeployableShield {
    distance: f32,
    deployed: Option<EffectHandle>,
}

impl DeployableShield {
    /// Effect object representing the shield.
    pub const EFFECT: &'static str = "deployable_shield";

    /// Creates the effect; the shield appears `distance` ahead of the aim
    /// origin.
    #[must_use]
    pub const fn new(distance: f32) -> Self {
        Self {
            distance,
            deployed: None,
        }
    }

    /// Whether a shield is standing.
    #[must_use]
    pub const fn is_deployed(&self) -> bool {
        self.deployed.is_some()
    }
}

impl AbilityEffect for DeployableShield {
    fn label(&self) -> &'static str {
        "deployable_shield"
    }

    fn activate(&mut self, ctx: &mut ModuleContext<'_>) {
        let position = ctx.host.aim_origin() + ctx.host.aim_forward() * self.distance;
        self.deployed = Some(ctx.host.spawn_effect(Self::EFFECT, position));
        ctx.host.play_sound(clips::SHIELD);
    }

    fn deactivate(&mut self, _reason: DeactivationReason, ctx: &mut ModuleContext<'_>) {
        if let Some(shield) = self.deployed.take() {
            ctx.host.despawn_effect(shield);
        }
    }
}

/// Slows global time while active.
#[derive(Debug, Clone)]
pub struct TimeWarp {
    scale: f32,
}

impl TimeWarp {
    /// Creates the effect with the given time scale.
    #[must_use]
    pub fn new(scale: f32) -> Self {
        Self {
            scale: scale.max(0.0),
        }
    }
}

impl AbilityEffect for TimeWarp {
    fn label(&self) -> &'static str {
        "time_warp"
    }

    fn activate(&mut self, ctx: &mut ModuleContext<'_>) {
        ctx.host.set_time_scale(self.scale);
        ctx.host.play_sound(clips::TIME_WARP);
    }

    fn deactivate(&mut self, _reason: DeactivationReason, ctx: &mut ModuleContext<'_>) {
        ctx.host.set_time_scale(1.0);
    }
}
