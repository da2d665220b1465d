//! Surface scattering models.
//!
//! All directions are given in the local shading frame, where the normal is
//! `+Z`, and both `wo` and `wi` point away from the surface.

use glint_math::{Color, Vec2, Vec3};

use crate::sampler::Sampler;

pub mod dielectric;
pub mod diffuse;
pub mod fresnel;
pub mod microfacet;
pub mod principled;
pub mod rough_conductor;
pub mod rough_dielectric;

pub use dielectric::Dielectric;
pub use diffuse::Diffuse;
pub use principled::Principled;
pub use rough_conductor::RoughConductor;
pub use rough_dielectric::RoughDielectric;

/// Value of a BSDF for a pair of directions, cosine term included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfEval {
    pub value: Color,
}

impl BsdfEval {
    pub fn invalid() -> Self {
        Self { value: Color::ZERO }
    }

    pub fn is_invalid(&self) -> bool {
        self.value == Color::ZERO
    }
}

/// A sampled incident direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfSample {
    pub wi: Vec3,
    /// `value(wi) / pdf(wi)`
    pub weight: Color,
}

impl BsdfSample {
    /// Marks a failed sample (e.g. a direction on the wrong side).
    pub fn invalid() -> Self {
        Self {
            wi: Vec3::ZERO,
            weight: Color::ZERO,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.weight == Color::ZERO
    }
}

pub trait Bsdf: Send + Sync {
    /// Evaluate for a direction pair. Delta lobes evaluate to zero; they
    /// are only reachable through [`Bsdf::sample`].
    fn evaluate(&self, uv: Vec2, wo: Vec3, wi: Vec3) -> BsdfEval;

    fn sample(&self, uv: Vec2, wo: Vec3, rng: &mut dyn Sampler) -> BsdfSample;

    /// Color reported by the albedo integrator.
    fn albedo(&self, uv: Vec2) -> Color;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_records() {
        assert!(BsdfEval::invalid().is_invalid());
        assert!(BsdfSample::invalid().is_invalid());
        let sample = BsdfSample {
            wi: Vec3::Z,
            weight: Color::splat(0.1),
        };
        assert!(!sample.is_invalid());
    }
}
