//! Vector helpers for aiming and spread.
//!
//! Angles at this layer are degrees because that is how weapon presets are
//! authored. Directions are expected to be normalized.

use glam::{Quat, Vec3};

/// Distance used for the aim point when the forward ray hits nothing.
pub const FAR_AIM_DISTANCE: f32 = 1000.0;

/// Clamps a value to `[0, 1]`.
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Linear interpolation between two scalars.
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Axis around which a horizontal fan turns `base`.
///
/// This is world up with the component along `base` removed. When `base` is
/// (anti)parallel to up, any perpendicular axis is used.
#[must_use]
pub fn fan_axis(base: Vec3, up: Vec3) -> Vec3 {
    let projected = up - base * up.dot(base);
    projected
        .try_normalize()
        .unwrap_or_else(|| base.any_orthonormal_vector())
}

/// Rotates `base` by `angle_deg` around `axis`.
#[must_use]
pub fn rotate_about(base: Vec3, axis: Vec3, angle_deg: f32) -> Vec3 {
    (Quat::from_axis_angle(axis, angle_deg.to_radians()) * base).normalize_or_zero()
}

/// Signed angle in degrees from `from` to `to`, positive when the turn is
/// counter-clockwise around `axis`.
#[must_use]
pub fn signed_angle_deg(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    let unsigned = from.angle_between(to).to_degrees();
    if axis.dot(from.cross(to)) < 0.0 {
        -unsigned
    } else {
        unsigned
    }
}

/// Tilts `base` inside a cone of half-angle `max_angle_deg`.
///
/// `radial` and `azimuth` are uniform samples in `[0, 1)`. The square root on
/// `radial` keeps the samples uniform over the cone's cross-section.
#[must_use]
pub fn cone_direction(base: Vec3, max_angle_deg: f32, radial: f32, azimuth: f32) -> Vec3 {
    if max_angle_deg <= 0.0 {
        return base;
    }
    let (a, b) = base.any_orthonormal_pair();
    let theta = azimuth * std::f32::consts::TAU;
    let tilt_axis = a * theta.cos() + b * theta.sin();
    rotate_about(base, tilt_axis, max_angle_deg * radial.sqrt())
}

/// Turns `from` toward `to` by at most `max_angle_deg`.
#[must_use]
pub fn rotate_toward(from: Vec3, to: Vec3, max_angle_deg: f32) -> Vec3 {
    let angle = from.angle_between(to).to_degrees();
    if angle <= max_angle_deg || angle <= f32::EPSILON {
        return to;
    }
    let arc = Quat::from_rotation_arc(from, to);
    (Quat::IDENTITY.slerp(arc, max_angle_deg / angle) * from).normalize_or_zero()
}
