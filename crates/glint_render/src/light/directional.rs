use glint_math::{Color, Vec3};

use crate::light::{DirectLightSample, Light};
use crate::sampler::Sampler;

/// Parallel light arriving from a fixed direction, e.g. the sun.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Unit direction pointing towards the light
    direction: Vec3,
    intensity: Color,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, intensity: Color) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            intensity,
        }
    }
}

impl Light for DirectionalLight {
    fn sample_direct(&self, _origin: Vec3, _rng: &mut dyn Sampler) -> DirectLightSample {
        if self.direction == Vec3::ZERO {
            return DirectLightSample::invalid();
        }
        DirectLightSample {
            wi: self.direction,
            weight: self.intensity,
            distance: f32::INFINITY,
        }
    }
}
