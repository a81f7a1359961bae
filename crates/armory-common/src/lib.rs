//! # Armory Common
//!
//! Shared types for the Armory weapon crates.
//!
//! This crate provides the small foundation every other crate leans on:
//! - ID types (WeaponId, ModuleId, TargetId)
//! - Vector math helpers over `glam`
//! - Schema versions for preset files
//! - Top-level error type
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod math;
pub mod version;

pub use glam::Vec3;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::math::*;
    pub use crate::version::*;
    pub use glam::Vec3;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_id_generation() {
        let id1 = WeaponId::new();
        let id2 = WeaponId::new();
        assert_ne!(id1, id2);
        assert!(id2.raw() > id1.raw());
    }

    #[test]
    fn test_module_ids_are_unique() {
        let a = ModuleId::next();
        let b = ModuleId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_version_compatibility() {
        let v1 = SchemaVersion::new(1, 0, 0);
        let v2 = SchemaVersion::new(1, 1, 0);
        let v3 = SchemaVersion::new(2, 0, 0);

        assert!(v2.is_compatible_with(&v1));
        assert!(!v1.is_compatible_with(&v3));
    }
}
