//! Scalar helpers and the reflection/refraction primitives.
//!
//! Directions passed to [`reflect`] and [`refract`] point away from the
//! surface, matching the local shading convention used by the BSDFs.

use crate::{Color, Vec3};

/// Offset used to suppress self-intersection and to reject near-zero
/// determinants.
pub const EPSILON: f32 = 3e-4;

/// Inverse of 4π, the density of a uniformly sampled sphere direction.
pub const INV_FOUR_PI: f32 = 0.25 * std::f32::consts::FRAC_1_PI;

#[inline]
pub fn sqr(x: f32) -> f32 {
    x * x
}

/// Square root that clamps small negative inputs (from rounding) to zero.
#[inline]
pub fn safe_sqrt(x: f32) -> f32 {
    x.max(0.0).sqrt()
}

/// Arc-cosine that clamps its input to [-1, 1].
#[inline]
pub fn safe_acos(x: f32) -> f32 {
    x.clamp(-1.0, 1.0).acos()
}

/// Arithmetic mean of the three channels.
#[inline]
pub fn mean(c: Color) -> f32 {
    c.element_sum() / 3.0
}

/// Mirror `w` about `n`.
#[inline]
pub fn reflect(w: Vec3, n: Vec3) -> Vec3 {
    2.0 * n.dot(w) * n - w
}

/// Refract `w` through a surface with normal `n` and relative index of
/// refraction `eta`.
///
/// `n` must lie on the same side as `w`. Returns [`Vec3::ZERO`] on total
/// internal reflection.
pub fn refract(w: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let inv_eta = 1.0 / eta;
    let cos_i = n.dot(w);
    let k = 1.0 - sqr(inv_eta) * (1.0 - sqr(cos_i));
    if k < 0.0 {
        return Vec3::ZERO;
    }
    (inv_eta * cos_i - k.sqrt()) * n - inv_eta * w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_functions_clamp() {
        assert_eq!(safe_sqrt(-1e-6), 0.0);
        assert!((safe_sqrt(4.0) - 2.0).abs() < 1e-6);
        assert_eq!(safe_acos(1.0001), 0.0);
        assert!((safe_acos(-1.5) - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_reflect_about_normal() {
        let w = Vec3::new(1.0, 0.0, 1.0).normalize();
        let r = reflect(w, Vec3::Z);
        assert!((r - Vec3::new(-w.x, 0.0, w.z)).length() < 1e-5);
    }

    #[test]
    fn test_refract_straight_through() {
        let t = refract(Vec3::Z, Vec3::Z, 1.5);
        assert!((t - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_refract_snell() {
        let w = Vec3::new(0.5, 0.0, 0.75_f32.sqrt());
        let eta = 1.5;
        let t = refract(w, Vec3::Z, eta);
        // sin_t = sin_i / eta
        assert!((t.x.abs() - 0.5 / eta).abs() < 1e-5);
        assert!(t.z < 0.0);
        assert!((t.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_refract_total_internal_reflection() {
        let w = Vec3::new(0.9, 0.0, 0.19_f32.sqrt());
        assert_eq!(refract(w, Vec3::Z, 1.0 / 1.5), Vec3::ZERO);
    }
}
