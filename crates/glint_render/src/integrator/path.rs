use glint_math::{Color, Ray};

use crate::integrator::{next_event_estimate, Integrator};
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Unidirectional path tracer with next-event estimation.
///
/// Paths are traced iteratively and never exceed `max_depth` vertices.
#[derive(Debug, Clone)]
pub struct PathTracer {
    max_depth: u32,
}

impl PathTracer {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

impl Default for PathTracer {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Integrator for PathTracer {
    fn li(&self, ray: &Ray, scene: &Scene, rng: &mut dyn Sampler) -> Color {
        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut ray = *ray;

        for depth in 0..self.max_depth {
            let its = scene.intersect(&ray, rng);
            if !its.is_hit() {
                radiance += throughput * scene.evaluate_background(ray.direction);
                break;
            }

            radiance += throughput * its.evaluate_emission();

            if its.bsdf().is_none() || depth + 1 >= self.max_depth {
                break;
            }

            if scene.has_lights() {
                radiance += throughput * next_event_estimate(scene, &its, rng);
            }

            let sample = its.sample_bsdf(rng);
            if sample.is_invalid() {
                break;
            }
            throughput *= sample.weight;
            debug_assert!(throughput.is_finite(), "non-finite throughput at depth {}", depth);

            ray = Ray::new(its.position(), sample.wi).with_depth(depth + 1);
        }

        radiance
    }
}
