//! Fresnel terms.

use glint_math::{sqr, Color};

/// `(1 - cos)^5`, clamped to `[0, 1]`.
#[inline]
pub fn schlick_weight(cos_theta: f32) -> f32 {
    let m = (1.0 - cos_theta).clamp(0.0, 1.0);
    let m2 = m * m;
    m2 * m2 * m
}

/// Schlick's approximation for a scalar `f0`.
#[inline]
pub fn schlick(f0: f32, cos_theta: f32) -> f32 {
    f0 + (1.0 - f0) * schlick_weight(cos_theta)
}

/// Schlick's approximation for a colored `f0`.
#[inline]
pub fn schlick_color(f0: Color, cos_theta: f32) -> Color {
    f0 + (Color::ONE - f0) * schlick_weight(cos_theta)
}

/// Unpolarized reflectance of a dielectric interface.
///
/// `eta` is the relative index of refraction (transmitted over incident).
/// Returns 1 on total internal reflection.
pub fn fresnel_dielectric(cos_theta_i: f32, eta: f32) -> f32 {
    let inv_eta = 1.0 / eta;
    let cos_theta_t2 = 1.0 - sqr(inv_eta) * (1.0 - sqr(cos_theta_i));
    if cos_theta_t2 <= 0.0 {
        return 1.0;
    }

    let cos_i = cos_theta_i.abs();
    let cos_t = cos_theta_t2.sqrt();

    let rs = (eta * cos_i - cos_t) / (eta * cos_i + cos_t);
    let rp = (cos_i - eta * cos_t) / (cos_i + eta * cos_t);
    0.5 * (rs * rs + rp * rp)
}
