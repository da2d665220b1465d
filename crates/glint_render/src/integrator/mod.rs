//! Light transport estimators.
//!
//! An integrator answers one question: how much radiance arrives along a
//! ray. The block scheduling, pixel sampling and averaging around it live
//! in [`crate::renderer`].

use glint_math::{Color, Ray};

use crate::intersection::Intersection;
use crate::sampler::Sampler;
use crate::scene::Scene;

pub mod aov;
pub mod direct;
pub mod path;

pub use aov::{AlbedoIntegrator, BvhStatsIntegrator, NormalsIntegrator};
pub use direct::DirectIntegrator;
pub use path::PathTracer;

pub trait Integrator: Send + Sync {
    /// Radiance estimate arriving at the origin of `ray`.
    fn li(&self, ray: &Ray, scene: &Scene, rng: &mut dyn Sampler) -> Color;
}

/// Light contribution at `its` from one randomly chosen light.
///
/// Lights that BSDF sampling can hit are skipped, so every light is
/// accounted for by exactly one of the two strategies.
pub(crate) fn next_event_estimate(scene: &Scene, its: &Intersection<'_>, rng: &mut dyn Sampler) -> Color {
    let Some(selected) = scene.sample_light(rng) else {
        return Color::ZERO;
    };
    if selected.light.can_be_intersected() {
        return Color::ZERO;
    }

    let sample = selected.light.sample_direct(its.position(), rng);
    if sample.is_invalid() {
        return Color::ZERO;
    }

    let shadow_ray = Ray::new(its.position(), sample.wi);
    if scene.occluded(&shadow_ray, sample.distance, rng) {
        return Color::ZERO;
    }

    its.evaluate_bsdf(sample.wi).value * sample.weight / selected.probability
}
