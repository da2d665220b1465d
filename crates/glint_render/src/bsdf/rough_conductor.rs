use std::sync::Arc;

use glint_core::Texture;
use glint_math::frame::{abs_cos_theta, same_hemisphere};
use glint_math::{reflect, Color, Vec2, Vec3};

use crate::bsdf::microfacet::{evaluate_ggx, roughness_to_alpha, sample_ggx_vndf, smith_g1};
use crate::bsdf::{Bsdf, BsdfEval, BsdfSample};
use crate::sampler::Sampler;

/// GGX metal without a Fresnel term; `reflectance` tints the lobe.
pub struct RoughConductor {
    reflectance: Arc<dyn Texture>,
    roughness: Arc<dyn Texture>,
}

impl RoughConductor {
    pub fn new(reflectance: Arc<dyn Texture>, roughness: Arc<dyn Texture>) -> Self {
        Self {
            reflectance,
            roughness,
        }
    }
}

/// `R * D * G1(wi) * G1(wo) / (4 |cos wo|)`, shared with the principled
/// metallic lobe.
pub(crate) fn evaluate_lobe(color: Color, alpha: f32, wo: Vec3, wi: Vec3) -> BsdfEval {
    if !same_hemisphere(wo, wi) {
        return BsdfEval::invalid();
    }
    let Some(wh) = (wi + wo).try_normalize() else {
        return BsdfEval::invalid();
    };
    let value = color * evaluate_ggx(alpha, wh) * smith_g1(alpha, wh, wi) * smith_g1(alpha, wh, wo)
        / (4.0 * abs_cos_theta(wo));
    BsdfEval { value }
}

/// Reflects about a visible normal; everything but one Smith term cancels.
pub(crate) fn sample_lobe(color: Color, alpha: f32, wo: Vec3, rng: &mut dyn Sampler) -> BsdfSample {
    let wh = sample_ggx_vndf(alpha, wo, rng.next_2d());
    let wi = reflect(wo, wh);
    if !same_hemisphere(wo, wi) {
        return BsdfSample::invalid();
    }
    BsdfSample {
        wi,
        weight: color * smith_g1(alpha, wh, wi),
    }
}

impl Bsdf for RoughConductor {
    fn evaluate(&self, uv: Vec2, wo: Vec3, wi: Vec3) -> BsdfEval {
        let alpha = roughness_to_alpha(self.roughness.scalar(uv));
        evaluate_lobe(self.reflectance.evaluate(uv), alpha, wo, wi)
    }

    fn sample(&self, uv: Vec2, wo: Vec3, rng: &mut dyn Sampler) -> BsdfSample {
        let alpha = roughness_to_alpha(self.roughness.scalar(uv));
        sample_lobe(self.reflectance.evaluate(uv), alpha, wo, rng)
    }

    fn albedo(&self, uv: Vec2) -> Color {
        self.reflectance.evaluate(uv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::microfacet::{det_reflection, pdf_ggx_vndf};
    use crate::sampler::IndependentSampler;
    use glint_core::ConstantTexture;
    use glint_math::warp::{cosine_hemisphere_pdf, square_to_cosine_hemisphere};

    fn conductor(reflectance: f32, roughness: f32) -> RoughConductor {
        RoughConductor::new(
            Arc::new(ConstantTexture::new(Color::splat(reflectance))),
            Arc::new(ConstantTexture::scalar_value(roughness)),
        )
    }

    #[test]
    fn test_rough_conductor_energy() {
        // roughness 0.316 gives alpha ~0.1, where single scattering loses
        // little energy.
        let bsdf = conductor(0.8, 0.316);
        let wo = Vec3::Z;
        let mut rng = IndependentSampler::new(1, 21);
        let n = 400_000;
        let mut sum = 0.0f64;
        for _ in 0..n {
            let wi = square_to_cosine_hemisphere(rng.next_2d());
            if wi.z <= 0.0 {
                continue;
            }
            let pdf = cosine_hemisphere_pdf(wi);
            sum += (bsdf.evaluate(Vec2::ZERO, wo, wi).value.x / pdf) as f64;
        }
        let estimate = (sum / n as f64) as f32;
        assert!((estimate - 0.8).abs() < 0.8 * 0.05, "estimate {}", estimate);
    }

    #[test]
    fn test_rough_conductor_energy_oblique() {
        let bsdf = conductor(0.8, 0.316);
        let wo = Vec3::new(0.6, 0.2, 0.7).normalize();
        let mut rng = IndependentSampler::new(1, 8);
        let n = 100_000;
        let mut sum = 0.0f64;
        for _ in 0..n {
            let s = bsdf.sample(Vec2::ZERO, wo, &mut rng);
            if !s.is_invalid() {
                sum += s.weight.x as f64;
            }
        }
        let estimate = (sum / n as f64) as f32;
        assert!((estimate - 0.8).abs() < 0.8 * 0.05, "estimate {}", estimate);
    }

    #[test]
    fn test_rough_conductor_weight_matches_evaluate() {
        let bsdf = conductor(1.0, 0.6);
        let alpha = roughness_to_alpha(0.6);
        let wo = Vec3::new(0.4, -0.2, 0.8).normalize();
        let mut rng = IndependentSampler::new(1, 5);
        for _ in 0..64 {
            let s = bsdf.sample(Vec2::ZERO, wo, &mut rng);
            if s.is_invalid() {
                continue;
            }
            let wh = (s.wi + wo).normalize();
            let pdf = pdf_ggx_vndf(alpha, wh, wo) * det_reflection(wh, wo);
            let expected = bsdf.evaluate(Vec2::ZERO, wo, s.wi).value / pdf;
            assert!((expected - s.weight).abs().max_element() < 1e-2 * expected.x.max(1.0));
        }
    }

    #[test]
    fn test_rough_conductor_opposite_hemisphere_is_zero() {
        let bsdf = conductor(1.0, 0.3);
        let value = bsdf.evaluate(Vec2::ZERO, Vec3::Z, Vec3::NEG_Z).value;
        assert_eq!(value, Color::ZERO);
    }
}
