//! Damage events.
//!
//! The core only builds [`DamageEvent`]s; the thing that gets hit owns the
//! resolution. [`Defenses`] is the reference resolution order (shields, then
//! armor, then health) used by the headless driver and tests.

use armory_common::Vec3;
use serde::{Deserialize, Serialize};

/// Projectile family a damage event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileType {
    /// Bullets and pellets.
    Kinetic,
    /// Rockets and grenades.
    Explosive,
    /// Plasma bolts.
    Energy,
    /// Rail slugs that pass through targets.
    Piercing,
    /// Instant-hit beam.
    Beam,
}

/// A defense category a damage event can ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bypass {
    /// Deployable / physical barrier shields.
    PhysicalShield,
    /// Regenerating energy shields.
    EnergyShield,
    /// Armor damage reduction.
    Armor,
    /// World geometry.
    Walls,
}

impl Bypass {
    const fn bit(self) -> u8 {
        match self {
            Self::PhysicalShield => 1,
            Self::EnergyShield => 1 << 1,
            Self::Armor => 1 << 2,
            Self::Walls => 1 << 3,
        }
    }

    /// Every bypass category.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [
            Self::PhysicalShield,
            Self::EnergyShield,
            Self::Armor,
            Self::Walls,
        ]
    }
}

/// Set of [`Bypass`] categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BypassFlags(u8);

impl BypassFlags {
    /// Bypasses nothing.
    pub const NONE: Self = Self(0);

    /// Builds a set from a list of categories.
    #[must_use]
    pub fn from_slice(bypasses: &[Bypass]) -> Self {
        bypasses.iter().fold(Self::NONE, |set, &b| set.with(b))
    }

    /// Returns a copy with `bypass` added.
    #[must_use]
    pub const fn with(self, bypass: Bypass) -> Self {
        Self(self.0 | bypass.bit())
    }

    /// Whether `bypass` is in the set.
    #[must_use]
    pub const fn contains(self, bypass: Bypass) -> bool {
        self.0 & bypass.bit() != 0
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the categories in the set.
    pub fn iter(self) -> impl Iterator<Item = Bypass> {
        Bypass::all().into_iter().filter(move |&b| self.contains(b))
    }
}

/// One damage application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Damage before the target's defenses.
    pub amount: f32,
    /// Source projectile family.
    pub projectile_type: ProjectileType,
    /// Defenses this event ignores.
    pub bypass: BypassFlags,
    /// World-space hit location.
    pub hit_point: Vec3,
    /// Surface normal at the hit.
    pub hit_normal: Vec3,
    /// Normalized charge the shot was fired with.
    pub charge_level: f32,
    /// Whether the shot rolled a critical.
    pub critical: bool,
}

impl DamageEvent {
    /// Creates an event with no bypasses and no hit location yet.
    #[must_use]
    pub const fn new(amount: f32, projectile_type: ProjectileType) -> Self {
        Self {
            amount,
            projectile_type,
            bypass: BypassFlags::NONE,
            hit_point: Vec3::ZERO,
            hit_normal: Vec3::ZERO,
            charge_level: 0.0,
            critical: false,
        }
    }

    /// Sets the bypass set.
    #[must_use]
    pub const fn with_bypass(mut self, bypass: BypassFlags) -> Self {
        self.bypass = bypass;
        self
    }

    /// Sets the hit location.
    #[must_use]
    pub const fn at(mut self, point: Vec3, normal: Vec3) -> Self {
        self.hit_point = point;
        self.hit_normal = normal;
        self
    }

    /// Sets the charge level.
    #[must_use]
    pub const fn with_charge(mut self, charge_level: f32) -> Self {
        self.charge_level = charge_level;
        self
    }

    /// Marks the event critical.
    #[must_use]
    pub const fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Breakdown of how a damage event was absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Absorbed by the energy shield.
    pub energy_shield: f32,
    /// Absorbed by the physical shield.
    pub physical_shield: f32,
    /// Removed by armor.
    pub armor: f32,
    /// Subtracted from health.
    pub health: f32,
    /// Whether health reached zero.
    pub killed: bool,
}

/// Reference target defenses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Defenses {
    /// Energy shield pool.
    pub energy_shield: f32,
    /// Physical shield pool.
    pub physical_shield: f32,
    /// Fraction of damage armor removes, in `[0, 1]`.
    pub armor: f32,
    /// Remaining health.
    pub health: f32,
}

impl Defenses {
    /// Creates a target with only health.
    #[must_use]
    pub const fn with_health(health: f32) -> Self {
        Self {
            energy_shield: 0.0,
            physical_shield: 0.0,
            armor: 0.0,
            health,
        }
    }

    /// Applies an event: shields absorb first, armor reduces the rest, and
    /// what is left comes off health.
    pub fn apply(&mut self, event: &DamageEvent) -> DamageOutcome {
        let mut outcome = DamageOutcome::default();
        let mut remaining = event.amount.max(0.0);

        if !event.bypass.contains(Bypass::EnergyShield) {
            let absorbed = remaining.min(self.energy_shield);
            self.energy_shield -= absorbed;
            remaining -= absorbed;
            outcome.energy_shield = absorbed;
        }
        if !event.bypass.contains(Bypass::PhysicalShield) {
            let absorbed = remaining.min(self.physical_shield);
            self.physical_shield -= absorbed;
            remaining -= absorbed;
            outcome.physical_shield = absorbed;
        }
        if !event.bypass.contains(Bypass::Armor) {
            let reduced = remaining * self.armor.clamp(0.0, 1.0);
            remaining -= reduced;
            outcome.armor = reduced;
        }

        let dealt = remaining.min(self.health);
        self.health -= dealt;
        outcome.health = dealt;
        outcome.killed = self.health <= 0.0;
        outcome
    }

    /// Whether the target still stands.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}
