//! Simplified principled material: a diffuse base under a GGX specular
//! layer, blended by metallic.

use std::f32::consts::FRAC_1_PI;
use std::sync::Arc;

use glint_core::Texture;
use glint_math::frame::{abs_cos_theta, cos_theta, same_hemisphere};
use glint_math::warp::square_to_cosine_hemisphere;
use glint_math::{mean, Color, Vec2, Vec3};

use crate::bsdf::fresnel::schlick;
use crate::bsdf::microfacet::roughness_to_alpha;
use crate::bsdf::rough_conductor::{evaluate_lobe, sample_lobe};
use crate::bsdf::{Bsdf, BsdfEval, BsdfSample};
use crate::sampler::Sampler;

/// Specular reflectance of a dielectric base at normal incidence.
const DIELECTRIC_F0: f32 = 0.08;

pub struct Principled {
    base_color: Arc<dyn Texture>,
    roughness: Arc<dyn Texture>,
    metallic: Arc<dyn Texture>,
    specular: Arc<dyn Texture>,
}

/// Both lobes resolved for one shading point.
struct Lobes {
    diffuse_probability: f32,
    diffuse_color: Color,
    metallic_color: Color,
    alpha: f32,
}

impl Principled {
    pub fn new(
        base_color: Arc<dyn Texture>,
        roughness: Arc<dyn Texture>,
        metallic: Arc<dyn Texture>,
        specular: Arc<dyn Texture>,
    ) -> Self {
        Self {
            base_color,
            roughness,
            metallic,
            specular,
        }
    }

    fn lobes(&self, uv: Vec2, wo: Vec3) -> Lobes {
        let base = self.base_color.evaluate(uv);
        let metallic = self.metallic.scalar(uv);
        let specular = self.specular.scalar(uv);
        let f = specular * schlick((1.0 - metallic) * DIELECTRIC_F0, cos_theta(wo));

        let diffuse_color = (1.0 - f) * (1.0 - metallic) * base;
        let metallic_color = Color::splat(f) + (1.0 - f) * metallic * base;

        let diffuse_albedo = mean(diffuse_color);
        let total = diffuse_albedo + mean(metallic_color);
        Lobes {
            diffuse_probability: if total > 0.0 { diffuse_albedo / total } else { 1.0 },
            diffuse_color,
            metallic_color,
            alpha: roughness_to_alpha(self.roughness.scalar(uv)),
        }
    }
}

impl Bsdf for Principled {
    fn evaluate(&self, uv: Vec2, wo: Vec3, wi: Vec3) -> BsdfEval {
        if !same_hemisphere(wo, wi) {
            return BsdfEval::invalid();
        }
        let lobes = self.lobes(uv, wo);
        let diffuse = lobes.diffuse_color * abs_cos_theta(wi) * FRAC_1_PI;
        let metallic = evaluate_lobe(lobes.metallic_color, lobes.alpha, wo, wi).value;
        BsdfEval {
            value: diffuse + metallic,
        }
    }

    fn sample(&self, uv: Vec2, wo: Vec3, rng: &mut dyn Sampler) -> BsdfSample {
        let lobes = self.lobes(uv, wo);

        if rng.next_1d() < lobes.diffuse_probability {
            let mut wi = square_to_cosine_hemisphere(rng.next_2d());
            if wo.z < 0.0 {
                wi.z = -wi.z;
            }
            return BsdfSample {
                wi,
                weight: lobes.diffuse_color / lobes.diffuse_probability,
            };
        }

        let mut sample = sample_lobe(lobes.metallic_color, lobes.alpha, wo, rng);
        sample.weight /= 1.0 - lobes.diffuse_probability;
        sample
    }

    fn albedo(&self, uv: Vec2) -> Color {
        self.base_color.evaluate(uv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::IndependentSampler;
    use glint_core::ConstantTexture;

    fn principled(base: Color, roughness: f32, metallic: f32, specular: f32) -> Principled {
        Principled::new(
            Arc::new(ConstantTexture::new(base)),
            Arc::new(ConstantTexture::scalar_value(roughness)),
            Arc::new(ConstantTexture::scalar_value(metallic)),
            Arc::new(ConstantTexture::scalar_value(specular)),
        )
    }

    #[test]
    fn test_lobe_probability_limits() {
        let metal = principled(Color::splat(0.9), 0.3, 1.0, 1.0);
        let lobes = metal.lobes(Vec2::ZERO, Vec3::Z);
        assert_eq!(lobes.diffuse_probability, 0.0);

        let matte = principled(Color::splat(0.9), 0.3, 0.0, 0.0);
        let lobes = matte.lobes(Vec2::ZERO, Vec3::Z);
        assert_eq!(lobes.diffuse_probability, 1.0);

        let black = principled(Color::ZERO, 0.3, 0.0, 0.0);
        assert_eq!(black.lobes(Vec2::ZERO, Vec3::Z).diffuse_probability, 1.0);
    }

    #[test]
    fn test_matte_principled_is_lambertian() {
        let bsdf = principled(Color::splat(0.5), 0.5, 0.0, 0.0);
        let wo = Vec3::new(0.2, 0.0, 0.9).normalize();
        let wi = Vec3::new(-0.3, 0.4, 0.8).normalize();
        let value = bsdf.evaluate(Vec2::ZERO, wo, wi).value;
        let expected = 0.5 * wi.z * FRAC_1_PI;
        assert!((value.x - expected).abs() < 1e-5);
    }

    #[test]
    fn test_principled_samples_are_non_negative() {
        let bsdf = principled(Color::new(0.8, 0.4, 0.2), 0.4, 0.5, 0.5);
        let wo = Vec3::new(0.3, 0.1, 0.7).normalize();
        let mut rng = IndependentSampler::new(1, 17);
        for _ in 0..500 {
            let s = bsdf.sample(Vec2::ZERO, wo, &mut rng);
            if s.is_invalid() {
                continue;
            }
            assert!(s.wi.z > 0.0);
            assert!(s.weight.min_element() >= 0.0);
            assert!(s.weight.is_finite());
        }
    }
}
