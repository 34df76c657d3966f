//! Vector helpers shared by the steering behaviors.
//!
//! Every helper is total: zero-length inputs produce zero outputs, never NaN.

use crate::constants::EPSILON;
use bevy::math::Vec3;

/// Unit vector along `v`, or zero when `v` is too short to have a direction.
///
/// Components are rescaled by the largest one before squaring, so finite
/// vectors too long for `length_squared` keep their direction.
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    match scaled_direction(v) {
        Some((unit, length)) if length * length > EPSILON => unit,
        _ => Vec3::ZERO,
    }
}

/// Rescales `v` to `max_magnitude` when it is longer, otherwise returns it unchanged.
///
/// Caps the length, not each axis, so the direction is preserved.
/// A non-positive cap yields zero, as does a non-finite `v`.
pub fn limit_magnitude(v: Vec3, max_magnitude: f32) -> Vec3 {
    if !(max_magnitude > 0.0) {
        return Vec3::ZERO;
    }
    match scaled_direction(v) {
        Some((unit, length)) if length > max_magnitude => unit * max_magnitude,
        Some(_) => v,
        None if v == Vec3::ZERO => v,
        None => Vec3::ZERO,
    }
}

/// Unit direction and length of a finite, non-zero `v`. The length may
/// overflow to infinity; the direction never does.
fn scaled_direction(v: Vec3) -> Option<(Vec3, f32)> {
    if !v.is_finite() {
        return None;
    }
    let scale = v.abs().max_element();
    if scale == 0.0 {
        return None;
    }
    let scaled = v / scale;
    let scaled_len = scaled.length();
    Some((scaled / scaled_len, scaled_len * scale))
}

/// Point on the horizontal circle of `radius` around `center` at `angle` radians.
///
/// `x` follows the cosine and `z` the sine; `y` is left as in `center`.
pub fn point_on_circle_xz(center: Vec3, radius: f32, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(center.x + radius * cos, center.y, center.z + radius * sin)
}

/// Drops the vertical component.
pub fn flatten_y(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
