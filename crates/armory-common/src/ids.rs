//! ID types for weapons, modules and damage targets.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for weapon IDs.
static WEAPON_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Global counter for module IDs.
static MODULE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a weapon instance (carried or lying in the world).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeaponId(u64);

impl WeaponId {
    /// Creates a new unique weapon ID.
    #[must_use]
    pub fn new() -> Self {
        Self(WEAPON_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a weapon ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for WeaponId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WeaponId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "weapon#{}", self.0)
    }
}

/// Identity of one module object attached to a weapon.
///
/// Registration uses this to recognise a module that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(u64);

impl ModuleId {
    /// Allocates the next module ID.
    #[must_use]
    pub fn next() -> Self {
        Self(MODULE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Something that can receive damage: an enemy, a destructible, a shield.
///
/// The host owns what the raw value means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(u64);

impl TargetId {
    /// Creates a target ID from a raw host value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "target#{}", self.0)
    }
}
