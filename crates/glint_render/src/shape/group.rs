//! Collections of shapes accelerated by a [`Bvh`].

use std::sync::Arc;

use glint_math::{Aabb, Ray, Vec3};

use crate::bvh::{Bvh, PrimitiveSet, SplitMethod};
use crate::intersection::{AreaSample, Intersection};
use crate::not_implemented;
use crate::sampler::Sampler;
use crate::shape::Shape;

impl PrimitiveSet for [Arc<dyn Shape>] {
    fn primitive_count(&self) -> usize {
        self.len()
    }

    fn primitive_bounds(&self, index: usize) -> Aabb {
        self[index].bounding_box()
    }

    fn primitive_centroid(&self, index: usize) -> Vec3 {
        self[index].centroid()
    }

    fn intersect_primitive<'a>(
        &'a self,
        index: usize,
        ray: &Ray,
        its: &mut Intersection<'a>,
        rng: &mut dyn Sampler,
    ) -> bool {
        self[index].intersect(ray, its, rng)
    }
}

/// A set of child shapes, usually instances, treated as one shape.
pub struct Group {
    children: Vec<Arc<dyn Shape>>,
    bvh: Bvh,
}

impl Group {
    pub fn new(children: Vec<Arc<dyn Shape>>) -> Self {
        Self::with_split_method(children, SplitMethod::default())
    }

    pub fn with_split_method(children: Vec<Arc<dyn Shape>>, method: SplitMethod) -> Self {
        let bvh = Bvh::build_with(children.as_slice(), method);
        log::debug!(
            "built group bvh: {} children, {} nodes",
            children.len(),
            bvh.nodes().len()
        );
        Self { children, bvh }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Shape for Group {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        its: &mut Intersection<'a>,
        rng: &mut dyn Sampler,
    ) -> bool {
        self.bvh.intersect(self.children.as_slice(), ray, its, rng)
    }

    fn bounding_box(&self) -> Aabb {
        self.bvh.bounding_box()
    }

    fn centroid(&self) -> Vec3 {
        self.bvh.centroid()
    }

    /// Uniformly picks a child, then samples its surface.
    fn sample_area(&self, rng: &mut dyn Sampler) -> AreaSample {
        let n = self.children.len();
        if n == 0 {
            not_implemented!();
        }
        let index = ((rng.next_1d() * n as f32) as usize).min(n - 1);
        let mut sample = self.children[index].sample_area(rng);
        sample.pdf /= n as f32;
        sample
    }
}
