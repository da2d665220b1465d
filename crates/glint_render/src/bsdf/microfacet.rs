//! GGX microfacet distribution with Smith shadowing.

use std::f32::consts::PI;

use glint_math::frame::{abs_cos_theta, cos_theta, tan_theta2};
use glint_math::{safe_sqrt, sqr, Vec2, Vec3};

/// Roughness below this makes the distribution numerically singular.
pub const MIN_ALPHA: f32 = 1e-3;

/// Maps user-facing roughness to the GGX `alpha`.
#[inline]
pub fn roughness_to_alpha(roughness: f32) -> f32 {
    sqr(roughness).max(MIN_ALPHA)
}

/// GGX normal distribution `D(wh)`.
pub fn evaluate_ggx(alpha: f32, wh: Vec3) -> f32 {
    let a = wh.x / alpha;
    let b = wh.y / alpha;
    let c = sqr(a) + sqr(b) + sqr(wh.z);
    1.0 / (PI * sqr(alpha * c))
}

/// Smith masking term for direction `w` and microfacet normal `wh`.
pub fn smith_g1(alpha: f32, wh: Vec3, w: Vec3) -> f32 {
    if w.dot(wh) * cos_theta(w) * cos_theta(wh) <= 0.0 {
        return 0.0;
    }
    if cos_theta(w).abs() >= 1.0 {
        return 1.0;
    }
    let a2_tan2 = sqr(alpha) * tan_theta2(w);
    2.0 / (1.0 + (1.0 + a2_tan2).sqrt())
}

/// Samples a normal visible from `wo` (Heitz 2018).
///
/// The result lies on the same side of the surface as `wo`.
pub fn sample_ggx_vndf(alpha: f32, wo: Vec3, rnd: Vec2) -> Vec3 {
    let sign = 1.0_f32.copysign(cos_theta(wo));
    let vh = sign * Vec3::new(alpha * wo.x, alpha * wo.y, wo.z).normalize();

    let len2 = vh.x * vh.x + vh.y * vh.y;
    let t1 = if len2 > 0.0 {
        Vec3::new(-vh.y, vh.x, 0.0) / len2.sqrt()
    } else {
        Vec3::X
    };
    let t2 = vh.cross(t1);

    let r = rnd.x.sqrt();
    let phi = 2.0 * PI * rnd.y;
    let p1 = r * phi.cos();
    let mut p2 = r * phi.sin();
    let s = 0.5 * (1.0 + vh.z);
    p2 = (1.0 - s) * safe_sqrt(1.0 - sqr(p1)) + s * p2;

    let nh = p1 * t1 + p2 * t2 + safe_sqrt(1.0 - sqr(p1) - sqr(p2)) * vh;
    let ne = Vec3::new(alpha * nh.x, alpha * nh.y, nh.z.max(0.0)).normalize();
    sign * ne
}

/// Density of [`sample_ggx_vndf`] producing `wh`.
pub fn pdf_ggx_vndf(alpha: f32, wh: Vec3, wo: Vec3) -> f32 {
    evaluate_ggx(alpha, wh) * smith_g1(alpha, wh, wo) * wh.dot(wo).abs() / abs_cos_theta(wo)
}

/// Jacobian from microfacet normal to reflected direction.
#[inline]
pub fn det_reflection(wh: Vec3, wo: Vec3) -> f32 {
    1.0 / (4.0 * wh.dot(wo)).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{IndependentSampler, Sampler};
    use glint_math::warp::square_to_uniform_sphere;

    #[test]
    fn test_ggx_projected_area_is_one() {
        // Integral of D(h) cos(h) over the hemisphere.
        let alpha = 0.4;
        let mut rng = IndependentSampler::new(1, 11);
        let n = 200_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let h = square_to_uniform_sphere(rng.next_2d());
            if h.z > 0.0 {
                sum += evaluate_ggx(alpha, h) * h.z;
            }
        }
        let estimate = sum * 4.0 * PI / n as f32;
        assert!((estimate - 1.0).abs() < 0.05, "estimate {}", estimate);
    }

    #[test]
    fn test_vndf_samples_face_wo() {
        let mut rng = IndependentSampler::new(1, 3);
        for wo in [Vec3::new(0.3, 0.2, 0.9).normalize(), Vec3::new(0.5, 0.0, -0.6).normalize()] {
            for _ in 0..256 {
                let m = sample_ggx_vndf(0.5, wo, rng.next_2d());
                assert!((m.length() - 1.0).abs() < 1e-4);
                assert!(m.z * wo.z >= 0.0);
                assert!(m.dot(wo) >= -1e-5);
            }
        }
    }

    #[test]
    fn test_smith_g1_bounds() {
        let wh = Vec3::Z;
        assert_eq!(smith_g1(0.3, wh, Vec3::Z), 1.0);
        let grazing = Vec3::new(0.99, 0.0, 0.141).normalize();
        let g = smith_g1(0.3, wh, grazing);
        assert!(g > 0.0 && g < 1.0);
        // Back-facing relative to the microfacet
        let tilted = Vec3::new(0.8, 0.0, 0.6);
        let w = Vec3::new(-0.9, 0.0, 0.3).normalize();
        assert_eq!(smith_g1(0.3, tilted, w), 0.0);
    }

    #[test]
    fn test_roughness_floor() {
        assert_eq!(roughness_to_alpha(0.0), MIN_ALPHA);
        assert!((roughness_to_alpha(0.5) - 0.25).abs() < 1e-6);
    }
}
