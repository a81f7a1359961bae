//! Projectile module.
//!
//! [`ProjectileEmitter`] turns a shot request into a [`ProjectileSpawn`]:
//! damage with modifiers and critical rolls folded in, bypass flags for the
//! projectile family, and the current homing target.

use armory_common::ModuleId;

use crate::capability::{ModuleContext, ProjectileModule, ProjectileRequest, WeaponModule};
use crate::damage::{Bypass, BypassFlags, DamageEvent, ProjectileType};
use crate::host::{ProjectileHandle, ProjectileProperties, ProjectileSpawn};

/// Creates projectiles of one family.
#[derive(Debug, Clone)]
pub struct ProjectileEmitter {
    id: ModuleId,
    properties: ProjectileProperties,
    rng: fastrand::Rng,
    spawned: u64,
}

impl ProjectileEmitter {
    /// Creates an emitter for the given properties.
    #[must_use]
    pub fn new(properties: ProjectileProperties) -> Self {
        Self {
            id: ModuleId::next(),
            properties,
            rng: fastrand::Rng::new(),
            spawned: 0,
        }
    }

    /// Plain bullets.
    #[must_use]
    pub fn kinetic() -> Self {
        Self::new(ProjectileProperties::Kinetic)
    }

    /// Rockets and grenades.
    #[must_use]
    pub fn explosive(blast_radius: f32, edge_falloff: f32) -> Self {
        Self::new(ProjectileProperties::Explosive {
            blast_radius,
            edge_falloff,
        })
    }

    /// Plasma bolts. They ignore energy shields.
    #[must_use]
    pub fn energy() -> Self {
        Self::new(ProjectileProperties::Energy)
    }

    /// Slugs that pass through `max_pierce` targets and physical shields.
    #[must_use]
    pub fn piercing(max_pierce: u32) -> Self {
        Self::new(ProjectileProperties::Piercing { max_pierce })
    }

    /// Seeds the critical-hit roll.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Type-specific properties attached to every projectile.
    #[must_use]
    pub const fn properties(&self) -> &ProjectileProperties {
        &self.properties
    }

    /// Projectiles created so far.
    #[must_use]
    pub const fn spawned(&self) -> u64 {
        self.spawned
    }

    fn bypass(&self) -> BypassFlags {
        match self.properties {
            ProjectileProperties::Energy => BypassFlags::NONE.with(Bypass::EnergyShield),
            ProjectileProperties::Piercing { .. } => BypassFlags::NONE.with(Bypass::PhysicalShield),
            ProjectileProperties::Kinetic | ProjectileProperties::Explosive { .. } => {
                BypassFlags::NONE
            },
        }
    }
}

impl WeaponModule for ProjectileEmitter {
    fn module_id(&self) -> ModuleId {
        self.id
    }

    fn label(&self) -> &'static str {
        "projectile_emitter"
    }
}

impl ProjectileModule for ProjectileEmitter {
    fn create_projectile(
        &mut self,
        request: &ProjectileRequest,
        ctx: &mut ModuleContext<'_>,
    ) -> ProjectileHandle {
        let profile = ctx.profile;
        let critical = profile.critical_chance > 0.0 && self.rng.f32() < profile.critical_chance;
        let mut amount =
            profile.damage * ctx.modifiers.damage_multiplier * request.damage_multiplier;
        if critical {
            amount *= profile.critical_multiplier;
        }

        let damage = DamageEvent::new(amount, self.projectile_type())
            .with_bypass(self.bypass())
            .with_charge(request.charge_level)
            .critical(critical);

        let spawn = ProjectileSpawn {
            weapon: ctx.weapon,
            origin: request.origin,
            direction: request.direction,
            speed: request.speed,
            damage,
            properties: self.properties,
            homing_target: ctx.modifiers.homing_target,
        };
        self.spawned += 1;
        ctx.host.spawn_projectile_visual(&spawn)
    }

    fn projectile_type(&self) -> ProjectileType {
        self.properties.projectile_type()
    }
}
