//! Targeting modules.
//!
//! [`SpreadTargeting`] scatters shots inside the profile's spread cone,
//! tightened while aiming. [`LockOnTargeting`] tracks the nearest tagged
//! target and bends shots toward it.

use armory_common::{cone_direction, rotate_toward, ModuleId, Vec3};
use tracing::debug;

use crate::capability::{ModuleContext, TargetingModule, WeaponModule};
use crate::host::{clips, TargetInfo};

/// Random cone spread around the aim direction.
#[derive(Debug, Clone)]
pub struct SpreadTargeting {
    id: ModuleId,
    rng: fastrand::Rng,
}

impl Default for SpreadTargeting {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadTargeting {
    /// Creates the module with an entropy-seeded generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ModuleId::next(),
            rng: fastrand::Rng::new(),
        }
    }

    /// Creates the module with a fixed seed so spread patterns repeat.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            id: ModuleId::next(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Cone half-angle for the next shot.
    #[must_use]
    pub fn effective_spread(ctx: &ModuleContext<'_>) -> f32 {
        let aim = ctx.host.aim_state();
        let mut angle = ctx.profile.spread_angle * ctx.modifiers.spread_multiplier;
        if aim.is_aiming {
            angle *= aim.accuracy_multiplier;
        }
        angle.max(0.0)
    }
}

impl WeaponModule for SpreadTargeting {
    fn module_id(&self) -> ModuleId {
        self.id
    }

    fn label(&self) -> &'static str {
        "spread_targeting"
    }
}

impl TargetingModule for SpreadTargeting {
    fn calculate_direction(&mut self, base: Vec3, ctx: &mut ModuleContext<'_>) -> Vec3 {
        let angle = Self::effective_spread(ctx);
        cone_direction(base, angle, self.rng.f32(), self.rng.f32())
    }

    fn current_target(&self) -> Option<TargetInfo> {
        None
    }
}

/// Tracks the nearest tagged target and steers shots toward it.
#[derive(Debug, Clone)]
pub struct LockOnTargeting {
    id: ModuleId,
    tag: String,
    radius: f32,
    max_lock_angle: f32,
    target: Option<TargetInfo>,
}

impl LockOnTargeting {
    /// Creates the module.
    ///
    /// Shots turn toward the target by at most `max_lock_angle` degrees.
    #[must_use]
    pub fn new(tag: impl Into<String>, radius: f32, max_lock_angle: f32) -> Self {
        Self {
            id: ModuleId::next(),
            tag: tag.into(),
            radius,
            max_lock_angle,
            target: None,
        }
    }

    /// Tag candidates must carry.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn acquire(&mut self, ctx: &mut ModuleContext<'_>) {
        let origin = ctx.host.aim_origin();
        let nearest = ctx
            .host
            .targets_in_radius(&self.tag, origin, self.radius)
            .into_iter()
            .min_by(|a, b| {
                a.position
                    .distance_squared(origin)
                    .total_cmp(&b.position.distance_squared(origin))
            });

        let previous = self.target.map(|t| t.id);
        if let Some(target) = nearest {
            if previous != Some(target.id) {
                debug!("{} locked on {:?}", ctx.weapon, target.id);
                ctx.host.play_sound(clips::LOCK_ON);
            }
        }
        self.target = nearest;
    }
}

impl WeaponModule for LockOnTargeting {
    fn module_id(&self) -> ModuleId {
        self.id
    }

    fn label(&self) -> &'static str {
        "lock_on_targeting"
    }

    fn on_deactivated(&mut self, _ctx: &mut ModuleContext<'_>) {
        self.target = None;
    }

    fn on_update(&mut self, ctx: &mut ModuleContext<'_>) {
        self.acquire(ctx);
    }
}

impl TargetingModule for LockOnTargeting {
    fn calculate_direction(&mut self, base: Vec3, ctx: &mut ModuleContext<'_>) -> Vec3 {
        let Some(target) = self.target else {
            return base;
        };
        let desired = (target.position - ctx.host.muzzle_position()).normalize_or_zero();
        if desired == Vec3::ZERO {
            return base;
        }
        rotate_toward(base, desired, self.max_lock_angle)
    }

    fn current_target(&self) -> Option<TargetInfo> {
        self.target
    }
}
