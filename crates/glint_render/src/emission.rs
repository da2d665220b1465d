//! Surface emission profiles.

use std::sync::Arc;

use glint_core::Texture;
use glint_math::{Color, Vec2, Vec3};

pub trait Emission: Send + Sync {
    /// Radiance leaving the surface towards the local direction `wo`.
    fn evaluate(&self, uv: Vec2, wo: Vec3) -> Color;
}

/// Uniform emission from the front side of a surface.
pub struct Lambertian {
    emission: Arc<dyn Texture>,
}

impl Lambertian {
    pub fn new(emission: Arc<dyn Texture>) -> Self {
        Self { emission }
    }
}

impl Emission for Lambertian {
    fn evaluate(&self, uv: Vec2, wo: Vec3) -> Color {
        if wo.z > 0.0 {
            self.emission.evaluate(uv)
        } else {
            Color::ZERO
        }
    }
}
