//! Error types for Armory.
//!
//! Gameplay refusals (no ammo, ability on cooldown, reload not possible) are
//! not errors and never show up here. These types cover authoring and loading.

use thiserror::Error;

/// Top-level error type for Armory operations.
#[derive(Debug, Error)]
pub enum ArmoryError {
    /// Weapon profile failed validation
    #[error("Invalid weapon profile: {0}")]
    Profile(#[from] ProfileError),

    /// Preset or blueprint parsing errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Two presets share a name
    #[error("Duplicate preset name: {0}")]
    DuplicatePreset(String),

    /// Blueprint references a preset that is not registered
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Validation failures for a weapon profile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    /// Fire rate must be a positive number of seconds
    #[error("{profile}: fire rate must be positive, got {value}")]
    FireRate {
        /// Profile name
        profile: String,
        /// Offending value
        value: f32,
    },

    /// Reload time must not be negative
    #[error("{profile}: reload time must not be negative, got {value}")]
    ReloadTime {
        /// Profile name
        profile: String,
        /// Offending value
        value: f32,
    },

    /// Magazine capacity must be at least one
    #[error("{profile}: magazine capacity must be at least 1")]
    ZeroCapacity {
        /// Profile name
        profile: String,
    },

    /// At least one fire mode is required
    #[error("{profile}: no fire modes configured")]
    NoFireModes {
        /// Profile name
        profile: String,
    },

    /// Burst count must be at least one
    #[error("{profile}: burst count must be at least 1")]
    ZeroBurst {
        /// Profile name
        profile: String,
    },

    /// Scatter needs at least one pellet
    #[error("{profile}: pellet count must be at least 1")]
    ZeroPellets {
        /// Profile name
        profile: String,
    },

    /// Overheat threshold larger than the energy capacity
    #[error("{profile}: overheat threshold {threshold} exceeds capacity {capacity}")]
    OverheatThreshold {
        /// Profile name
        profile: String,
        /// Configured threshold
        threshold: f32,
        /// Magazine/energy capacity
        capacity: f32,
    },

    /// Charge window is inverted or empty
    #[error("{profile}: charge window invalid (min {min}, max {max})")]
    ChargeWindow {
        /// Profile name
        profile: String,
        /// Minimum hold time
        min: f32,
        /// Full charge time
        max: f32,
    },
}

/// Result type alias for Armory operations.
pub type ArmoryResult<T> = Result<T, ArmoryError>;
