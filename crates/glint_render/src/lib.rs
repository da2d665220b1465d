//! glint renderer - CPU path tracing
//!
//! A Monte Carlo renderer for physically-based images. Scenes are built
//! from a [`glint_core::SceneDescription`] by the [`loader`], then rendered
//! bucket by bucket on a rayon thread pool.
//!
//! The pieces, bottom up:
//!
//! - [`bvh`]: bounding volume hierarchy over any [`bvh::PrimitiveSet`]
//! - [`shape`]: spheres, rectangles, meshes, groups and instances
//! - [`bsdf`], [`emission`], [`light`]: what surfaces and lights do with light
//! - [`integrator`]: radiance estimators, from a full path tracer to AOVs
//! - [`renderer`]: the image-space driver

#[macro_use]
mod macros;

pub mod bsdf;
pub mod bucket;
pub mod bvh;
pub mod camera;
pub mod emission;
pub mod error;
pub mod integrator;
pub mod intersection;
pub mod light;
pub mod loader;
pub mod progress;
pub mod renderer;
pub mod sampler;
pub mod scene;
pub mod shape;

pub use camera::{Camera, FovAxis, PerspectiveCamera};
pub use error::{RenderError, RenderResult};
pub use integrator::Integrator;
pub use loader::RenderJob;
pub use renderer::{color_to_rgba, render, render_pixel, ImageBuffer, RenderConfig};
pub use sampler::{HaltonSampler, IndependentSampler, Sampler};
pub use scene::Scene;

/// Re-export math types from glint_math
pub use glint_math::{Color, Ray, Transform, UVec2, Vec2, Vec3};
