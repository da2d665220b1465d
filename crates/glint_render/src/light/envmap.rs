use std::f32::consts::PI;
use std::sync::Arc;

use glint_core::Texture;
use glint_math::warp::square_to_uniform_sphere;
use glint_math::{safe_acos, Color, Transform, Vec2, Vec3, INV_FOUR_PI};

use crate::light::{BackgroundLight, DirectLightSample, Light};
use crate::sampler::Sampler;

/// Lat-long environment surrounding the scene.
pub struct EnvironmentMap {
    texture: Arc<dyn Texture>,
    transform: Option<Transform>,
}

impl EnvironmentMap {
    pub fn new(texture: Arc<dyn Texture>) -> Self {
        Self {
            texture,
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Texture coordinates looked up for a world direction.
    fn direction_to_uv(&self, direction: Vec3) -> Vec2 {
        let local = match &self.transform {
            Some(transform) => transform.inverse_vector(direction).normalize(),
            None => direction,
        };
        let local = Vec3::new(local.x, local.y, -local.z);
        let u = (local.z.atan2(local.x) + PI) / (2.0 * PI);
        let v = safe_acos(local.y) / PI;
        Vec2::new(u, v)
    }
}

impl Light for EnvironmentMap {
    fn sample_direct(&self, _origin: Vec3, rng: &mut dyn Sampler) -> DirectLightSample {
        let wi = square_to_uniform_sphere(rng.next_2d());
        DirectLightSample {
            wi,
            weight: self.evaluate(wi) / INV_FOUR_PI,
            distance: f32::INFINITY,
        }
    }

    fn can_be_intersected(&self) -> bool {
        true
    }
}

impl BackgroundLight for EnvironmentMap {
    fn evaluate(&self, direction: Vec3) -> Color {
        self.texture.evaluate(self.direction_to_uv(direction))
    }
}
