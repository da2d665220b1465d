use std::sync::Arc;

use glint_core::Texture;
use glint_math::frame::cos_theta;
use glint_math::{reflect, refract, Color, Vec2, Vec3};

use crate::bsdf::fresnel::fresnel_dielectric;
use crate::bsdf::{Bsdf, BsdfEval, BsdfSample};
use crate::sampler::Sampler;

/// Perfectly smooth glass.
///
/// Only reachable through sampling; evaluation is always zero.
pub struct Dielectric {
    ior: Arc<dyn Texture>,
    reflectance: Arc<dyn Texture>,
    transmittance: Arc<dyn Texture>,
}

impl Dielectric {
    pub fn new(
        ior: Arc<dyn Texture>,
        reflectance: Arc<dyn Texture>,
        transmittance: Arc<dyn Texture>,
    ) -> Self {
        Self {
            ior,
            reflectance,
            transmittance,
        }
    }
}

impl Bsdf for Dielectric {
    fn evaluate(&self, _uv: Vec2, _wo: Vec3, _wi: Vec3) -> BsdfEval {
        BsdfEval::invalid()
    }

    fn sample(&self, uv: Vec2, wo: Vec3, rng: &mut dyn Sampler) -> BsdfSample {
        let cos_o = cos_theta(wo);
        let (eta, normal) = if cos_o > 0.0 {
            (self.ior.scalar(uv), Vec3::Z)
        } else {
            (1.0 / self.ior.scalar(uv), Vec3::NEG_Z)
        };

        let f = fresnel_dielectric(cos_o.abs(), eta);
        if rng.next_1d() <= f {
            return BsdfSample {
                wi: reflect(wo, normal),
                weight: self.reflectance.evaluate(uv),
            };
        }

        let wi = refract(wo, normal, eta);
        if wi == Vec3::ZERO {
            return BsdfSample::invalid();
        }
        BsdfSample {
            wi: wi.normalize(),
            weight: self.transmittance.evaluate(uv) / (eta * eta),
        }
    }

    fn albedo(&self, uv: Vec2) -> Color {
        self.reflectance.evaluate(uv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::IndependentSampler;
    use glint_core::ConstantTexture;

    fn glass() -> Dielectric {
        Dielectric::new(
            Arc::new(ConstantTexture::scalar_value(1.5)),
            Arc::new(ConstantTexture::new(Color::ONE)),
            Arc::new(ConstantTexture::new(Color::ONE)),
        )
    }

    #[test]
    fn test_dielectric_evaluate_is_zero() {
        let value = glass().evaluate(Vec2::ZERO, Vec3::Z, Vec3::Z).value;
        assert_eq!(value, Color::ZERO);
    }

    #[test]
    fn test_dielectric_branches() {
        let bsdf = glass();
        let wo = Vec3::new(0.3, 0.0, 0.8).normalize();
        let mut rng = IndependentSampler::new(1, 8);
        let (mut reflected, mut refracted) = (0, 0);
        for _ in 0..2000 {
            let s = bsdf.sample(Vec2::ZERO, wo, &mut rng);
            assert!((s.wi.length() - 1.0).abs() < 1e-4);
            if s.wi.z > 0.0 {
                reflected += 1;
                assert!((s.wi - Vec3::new(-wo.x, -wo.y, wo.z)).length() < 1e-5);
                assert_eq!(s.weight, Color::ONE);
            } else {
                refracted += 1;
                // Snell: sin_t = sin_i / 1.5
                let sin_t = (s.wi.x * s.wi.x + s.wi.y * s.wi.y).sqrt();
                let sin_i = (wo.x * wo.x + wo.y * wo.y).sqrt();
                assert!((sin_t - sin_i / 1.5).abs() < 1e-4);
                assert!((s.weight.x - 1.0 / 2.25).abs() < 1e-5);
            }
        }
        assert!(reflected > 0 && refracted > reflected);
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let bsdf = glass();
        // Exiting at a grazing angle, beyond the critical angle
        let wo = Vec3::new(0.9, 0.0, -0.3).normalize();
        let mut rng = IndependentSampler::new(1, 1);
        for _ in 0..64 {
            let s = bsdf.sample(Vec2::ZERO, wo, &mut rng);
            assert!(s.wi.z < 0.0);
            assert!(!s.is_invalid());
        }
    }
}
