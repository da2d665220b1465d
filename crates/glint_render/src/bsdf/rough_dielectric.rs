use std::sync::Arc;

use glint_core::Texture;
use glint_math::frame::{abs_cos_theta, cos_theta, same_hemisphere};
use glint_math::{reflect, refract, sqr, Color, Vec2, Vec3};

use crate::bsdf::fresnel::fresnel_dielectric;
use crate::bsdf::microfacet::{evaluate_ggx, roughness_to_alpha, sample_ggx_vndf, smith_g1};
use crate::bsdf::{Bsdf, BsdfEval, BsdfSample};
use crate::sampler::Sampler;

/// Frosted glass: GGX reflection and refraction.
pub struct RoughDielectric {
    ior: Arc<dyn Texture>,
    reflectance: Arc<dyn Texture>,
    transmittance: Arc<dyn Texture>,
    roughness: Arc<dyn Texture>,
}

impl RoughDielectric {
    pub fn new(
        ior: Arc<dyn Texture>,
        reflectance: Arc<dyn Texture>,
        transmittance: Arc<dyn Texture>,
        roughness: Arc<dyn Texture>,
    ) -> Self {
        Self {
            ior,
            reflectance,
            transmittance,
            roughness,
        }
    }

    /// Relative IOR seen from the side of `wo`.
    fn eta(&self, uv: Vec2, wo: Vec3) -> f32 {
        let ior = self.ior.scalar(uv);
        if cos_theta(wo) > 0.0 {
            ior
        } else {
            1.0 / ior
        }
    }
}

impl Bsdf for RoughDielectric {
    fn evaluate(&self, uv: Vec2, wo: Vec3, wi: Vec3) -> BsdfEval {
        let cos_o = cos_theta(wo);
        if cos_o == 0.0 || cos_theta(wi) == 0.0 {
            return BsdfEval::invalid();
        }
        let alpha = roughness_to_alpha(self.roughness.scalar(uv));
        let eta = self.eta(uv, wo);
        let f = fresnel_dielectric(cos_o.abs(), eta);

        if same_hemisphere(wo, wi) {
            let Some(wh) = (wi + wo).try_normalize() else {
                return BsdfEval::invalid();
            };
            let value = self.reflectance.evaluate(uv)
                * f
                * evaluate_ggx(alpha, wh)
                * smith_g1(alpha, wh, wi)
                * smith_g1(alpha, wh, wo)
                / (4.0 * cos_o.abs());
            return BsdfEval { value };
        }

        // Generalized half vector, oriented like the macro normal on wo's side
        let Some(mut wh) = (wo + eta * wi).try_normalize() else {
            return BsdfEval::invalid();
        };
        if wh.z * cos_o < 0.0 {
            wh = -wh;
        }
        let o_h = wo.dot(wh);
        let i_h = wi.dot(wh);
        // Both directions must see the same microfacet from opposite sides
        if o_h * i_h >= 0.0 {
            return BsdfEval::invalid();
        }

        let value = self.transmittance.evaluate(uv)
            * (1.0 - f)
            * evaluate_ggx(alpha, wh)
            * smith_g1(alpha, wh, wi)
            * smith_g1(alpha, wh, wo)
            * (i_h * o_h).abs()
            / (abs_cos_theta(wo) * sqr(o_h + eta * i_h));
        BsdfEval { value }
    }

    fn sample(&self, uv: Vec2, wo: Vec3, rng: &mut dyn Sampler) -> BsdfSample {
        let alpha = roughness_to_alpha(self.roughness.scalar(uv));
        let eta = self.eta(uv, wo);
        let f = fresnel_dielectric(cos_theta(wo).abs(), eta);

        let choice = rng.next_1d();
        let wh = sample_ggx_vndf(alpha, wo, rng.next_2d());

        if choice <= f {
            let wi = reflect(wo, wh);
            if !same_hemisphere(wo, wi) {
                return BsdfSample::invalid();
            }
            return BsdfSample {
                wi,
                weight: self.reflectance.evaluate(uv) * smith_g1(alpha, wh, wi),
            };
        }

        // wh already faces wo, as refract expects
        let wi = refract(wo, wh, eta);
        if wi == Vec3::ZERO || same_hemisphere(wo, wi) {
            return BsdfSample::invalid();
        }
        let wi = wi.normalize();
        BsdfSample {
            wi,
            weight: self.transmittance.evaluate(uv) * smith_g1(alpha, wh, wi) / sqr(eta),
        }
    }

    fn albedo(&self, uv: Vec2) -> Color {
        self.transmittance.evaluate(uv)
    }
}
