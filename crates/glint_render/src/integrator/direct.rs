use glint_math::{Color, Ray};

use crate::integrator::{next_event_estimate, Integrator};
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Direct illumination: emission, one light sample and one BSDF bounce.
#[derive(Debug, Clone, Default)]
pub struct DirectIntegrator;

impl DirectIntegrator {
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for DirectIntegrator {
    fn li(&self, ray: &Ray, scene: &Scene, rng: &mut dyn Sampler) -> Color {
        let its = scene.intersect(ray, rng);
        if !its.is_hit() {
            return scene.evaluate_background(ray.direction);
        }

        let mut radiance = its.evaluate_emission();
        if its.bsdf().is_none() {
            return radiance;
        }

        if scene.has_lights() {
            radiance += next_event_estimate(scene, &its, rng);
        }

        let sample = its.sample_bsdf(rng);
        if sample.is_invalid() {
            return radiance;
        }

        let bounce = Ray::new(its.position(), sample.wi).with_depth(ray.depth + 1);
        let next = scene.intersect(&bounce, rng);
        let incoming = if next.is_hit() {
            next.evaluate_emission()
        } else {
            scene.evaluate_background(bounce.direction)
        };
        radiance + sample.weight * incoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::test_scenes::*;
    use crate::light::EnvironmentMap;
    use crate::sampler::IndependentSampler;
    use glint_core::ConstantTexture;
    use glint_math::Vec3;
    use std::sync::Arc;

    #[test]
    fn test_direct_apex_matches_analytic() {
        let scene = lit_sphere(None);
        let mut rng = IndependentSampler::new(1, 0);
        let radiance = DirectIntegrator::new().li(&apex_ray(), &scene, &mut rng);
        assert!((radiance.x - apex_radiance()).abs() < 1e-3 * apex_radiance());
    }

    #[test]
    fn test_direct_white_furnace() {
        // A white diffuse sphere under a uniform white sky reflects 1.
        let env = Arc::new(EnvironmentMap::new(Arc::new(ConstantTexture::new(Color::ONE))));
        let scene = lit_sphere(None).with_background(env);
        let mut rng = IndependentSampler::new(1, 0);
        let n = 256;
        let mut sum = 0.0;
        for _ in 0..n {
            let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y);
            sum += DirectIntegrator::new().li(&ray, &scene, &mut rng).x - apex_radiance();
        }
        assert!((sum / n as f32 - 1.0).abs() < 1e-3);
    }
}
