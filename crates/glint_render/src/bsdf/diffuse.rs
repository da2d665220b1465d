use std::f32::consts::FRAC_1_PI;
use std::sync::Arc;

use glint_core::Texture;
use glint_math::frame::{abs_cos_theta, same_hemisphere};
use glint_math::warp::square_to_cosine_hemisphere;
use glint_math::{Color, Vec2, Vec3};

use crate::bsdf::{Bsdf, BsdfEval, BsdfSample};
use crate::sampler::Sampler;

/// Lambertian reflector.
pub struct Diffuse {
    albedo: Arc<dyn Texture>,
}

impl Diffuse {
    pub fn new(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }
}

impl Bsdf for Diffuse {
    fn evaluate(&self, uv: Vec2, wo: Vec3, wi: Vec3) -> BsdfEval {
        if !same_hemisphere(wo, wi) {
            return BsdfEval::invalid();
        }
        BsdfEval {
            value: self.albedo.evaluate(uv) * abs_cos_theta(wi) * FRAC_1_PI,
        }
    }

    fn sample(&self, uv: Vec2, wo: Vec3, rng: &mut dyn Sampler) -> BsdfSample {
        let mut wi = square_to_cosine_hemisphere(rng.next_2d());
        if wo.z < 0.0 {
            wi.z = -wi.z;
        }
        // cos / pi cancels against the cosine-weighted density
        BsdfSample {
            wi,
            weight: self.albedo.evaluate(uv),
        }
    }

    fn albedo(&self, uv: Vec2) -> Color {
        self.albedo.evaluate(uv)
    }
}
