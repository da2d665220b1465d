//! Light sources used for next-event estimation.

use glint_math::{Color, Vec3};

use crate::sampler::Sampler;

pub mod directional;
pub mod envmap;
pub mod point;

pub use directional::DirectionalLight;
pub use envmap::EnvironmentMap;
pub use point::PointLight;

/// A direction towards a light and the radiance arriving along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectLightSample {
    /// Unit direction from the shading point towards the light
    pub wi: Vec3,
    /// Incident radiance divided by the sampling density
    pub weight: Color,
    /// Distance to the light; infinite for lights at infinity
    pub distance: f32,
}

impl DirectLightSample {
    pub fn invalid() -> Self {
        Self {
            wi: Vec3::ZERO,
            weight: Color::ZERO,
            distance: 0.0,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.weight == Color::ZERO
    }
}

pub trait Light: Send + Sync {
    fn sample_direct(&self, origin: Vec3, rng: &mut dyn Sampler) -> DirectLightSample;

    /// Whether rays can hit this light directly. Such lights are found by
    /// BSDF sampling and skipped by next-event estimation.
    fn can_be_intersected(&self) -> bool {
        false
    }
}

/// Light that also provides the radiance of rays leaving the scene.
pub trait BackgroundLight: Light {
    fn evaluate(&self, direction: Vec3) -> Color;
}
