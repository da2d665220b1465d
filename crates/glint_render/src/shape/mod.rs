//! Geometric shapes.
//!
//! Shapes only know geometry. Materials, emission and placement are bound
//! by wrapping a shape in an [`Instance`]; the scene's root is always built
//! from instances, and a hit record without one counts as a miss.

use glint_math::{Aabb, Ray, Vec3};

use crate::intersection::{AreaSample, Intersection};
use crate::not_implemented;
use crate::sampler::Sampler;

pub mod group;
pub mod instance;
pub mod mesh;
pub mod rectangle;
pub mod sphere;

pub use group::Group;
pub use instance::Instance;
pub use mesh::TriangleMesh;
pub use rectangle::Rectangle;
pub use sphere::Sphere;

/// Anything a ray can hit.
pub trait Shape: Send + Sync {
    /// Intersect `ray`, accepting only hits closer than `its.t`.
    ///
    /// On success the position, uv, frame and `t` of `its` are overwritten
    /// and `true` is returned; otherwise `its` is left untouched.
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        its: &mut Intersection<'a>,
        rng: &mut dyn Sampler,
    ) -> bool;

    fn bounding_box(&self) -> Aabb;

    fn centroid(&self) -> Vec3 {
        self.bounding_box().center()
    }

    /// Pick a point on the surface with known area density.
    fn sample_area(&self, _rng: &mut dyn Sampler) -> AreaSample {
        not_implemented!()
    }
}
