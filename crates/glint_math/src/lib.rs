//! Math primitives shared by the glint crates.
//!
//! Everything here is plain value types: rays, boxes, shading frames and
//! affine transforms, plus the warping functions used to turn uniform
//! random numbers into directions.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
pub mod frame;
mod helpers;
mod interval;
mod ray;
mod transform;
pub mod warp;

pub use aabb::Aabb;
pub use frame::Frame;
pub use helpers::*;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Transform;

/// Linear RGB radiance / reflectance triple.
pub type Color = Vec3;
