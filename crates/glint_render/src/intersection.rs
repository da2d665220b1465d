//! Records produced by ray queries and area sampling.

use glint_math::{Color, Frame, Vec2, Vec3};

use crate::bsdf::{Bsdf, BsdfEval, BsdfSample};
use crate::sampler::Sampler;
use crate::shape::Instance;

/// A point on a surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceEvent {
    pub position: Vec3,
    pub uv: Vec2,
    pub frame: Frame,
    /// Area density with which this point was chosen (area sampling only)
    pub pdf: f32,
}

/// Points returned by `Shape::sample_area`.
pub type AreaSample = SurfaceEvent;

/// Counters gathered while traversing acceleration structures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub bvh_nodes: u32,
    pub primitives: u32,
}

/// Closest hit found so far along a ray.
///
/// `t` only ever decreases while the record is passed through
/// intersection routines. A record without an instance is a miss.
#[derive(Clone)]
pub struct Intersection<'a> {
    pub surface: SurfaceEvent,
    /// Direction towards the ray origin
    pub wo: Vec3,
    pub t: f32,
    pub instance: Option<&'a Instance>,
    pub stats: TraversalStats,
}

impl<'a> Intersection<'a> {
    pub fn new(wo: Vec3) -> Self {
        Self::with_max_distance(wo, f32::INFINITY)
    }

    /// Record that only accepts hits closer than `t`.
    pub fn with_max_distance(wo: Vec3, t: f32) -> Self {
        Self {
            surface: SurfaceEvent::default(),
            wo,
            t,
            instance: None,
            stats: TraversalStats::default(),
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.instance.is_some()
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.surface.position
    }

    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.surface.frame
    }

    pub fn bsdf(&self) -> Option<&'a dyn Bsdf> {
        self.instance.and_then(|instance| instance.bsdf())
    }

    /// Radiance emitted towards `wo`.
    pub fn evaluate_emission(&self) -> Color {
        match self.instance.and_then(|instance| instance.emission()) {
            Some(emission) => {
                let wo = self.surface.frame.to_local(self.wo);
                emission.evaluate(self.surface.uv, wo)
            }
            None => Color::ZERO,
        }
    }

    /// Sample an incident direction; `wi` is returned in world space.
    pub fn sample_bsdf(&self, rng: &mut dyn Sampler) -> BsdfSample {
        let Some(bsdf) = self.bsdf() else {
            return BsdfSample::invalid();
        };
        let frame = &self.surface.frame;
        let mut sample = bsdf.sample(self.surface.uv, frame.to_local(self.wo), rng);
        if sample.is_invalid() {
            return BsdfSample::invalid();
        }
        sample.wi = frame.to_world(sample.wi).normalize();
        sample
    }

    /// Evaluate the BSDF (times cosine) for a world-space `wi`.
    pub fn evaluate_bsdf(&self, wi: Vec3) -> BsdfEval {
        let Some(bsdf) = self.bsdf() else {
            return BsdfEval::invalid();
        };
        let frame = &self.surface.frame;
        bsdf.evaluate(self.surface.uv, frame.to_local(self.wo), frame.to_local(wi))
    }

    /// Reflectance used by the albedo integrator.
    pub fn albedo(&self) -> Color {
        self.bsdf()
            .map_or(Color::ZERO, |bsdf| bsdf.albedo(self.surface.uv))
    }
}
