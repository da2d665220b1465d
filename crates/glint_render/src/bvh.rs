//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes live in one flat array. A branch stores the index of its left
//! child; the right child always sits directly after it. Leaves refer to a
//! contiguous range of a primitive-index permutation, so the primitives
//! themselves are never moved.
//!
//! The BVH does not own its primitives. Composite shapes implement
//! [`PrimitiveSet`] and pass themselves to [`Bvh::build`] and
//! [`Bvh::intersect`].

use glint_math::{Aabb, Ray, Vec3};

use crate::intersection::Intersection;
use crate::sampler::Sampler;

/// Nodes with this many primitives or fewer are never split.
const LEAF_MAX_SIZE: usize = 2;

/// Number of buckets evaluated by the binned surface area heuristic.
const SAH_BINS: usize = 16;

/// Indexed collection of primitives that a [`Bvh`] can be built over.
pub trait PrimitiveSet {
    fn primitive_count(&self) -> usize;

    fn primitive_bounds(&self, index: usize) -> Aabb;

    fn primitive_centroid(&self, index: usize) -> Vec3;

    /// Intersect one primitive, updating `its` only for hits closer than
    /// `its.t`.
    fn intersect_primitive<'a>(
        &'a self,
        index: usize,
        ray: &Ray,
        its: &mut Intersection<'a>,
        rng: &mut dyn Sampler,
    ) -> bool;
}

/// How the split position of a node is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitMethod {
    /// Middle of the node's box along its longest axis
    #[default]
    Midpoint,
    /// Best of [`SAH_BINS`] candidate planes under the surface area heuristic
    Sah,
}

/// BVH node - either a branch with two adjacent children or a leaf.
#[derive(Debug, Clone, Copy)]
pub enum BvhNode {
    Branch { bbox: Aabb, left: u32 },
    Leaf { bbox: Aabb, first: u32, count: u32 },
}

impl BvhNode {
    pub fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Flattened binary BVH.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
}

/// Per-primitive data cached during construction.
struct BuildContext {
    bounds: Vec<Aabb>,
    centroids: Vec<Vec3>,
    method: SplitMethod,
}

impl Bvh {
    /// Build with midpoint splits.
    pub fn build<P: PrimitiveSet + ?Sized>(primitives: &P) -> Self {
        Self::build_with(primitives, SplitMethod::default())
    }

    pub fn build_with<P: PrimitiveSet + ?Sized>(primitives: &P, method: SplitMethod) -> Self {
        let count = primitives.primitive_count();
        let mut bvh = Bvh {
            nodes: Vec::with_capacity(2 * count),
            indices: (0..count as u32).collect(),
        };
        if count == 0 {
            return bvh;
        }

        let context = BuildContext {
            bounds: (0..count).map(|i| primitives.primitive_bounds(i)).collect(),
            centroids: (0..count).map(|i| primitives.primitive_centroid(i)).collect(),
            method,
        };

        bvh.nodes.push(bvh.make_leaf(&context, 0, count));
        bvh.subdivide(&context, 0);
        bvh.nodes.shrink_to_fit();

        log::debug!(
            "Built BVH over {} primitives: {} nodes ({:?})",
            count,
            bvh.nodes.len(),
            method
        );
        bvh
    }

    fn make_leaf(&self, context: &BuildContext, first: usize, count: usize) -> BvhNode {
        let mut bbox = Aabb::EMPTY;
        for &i in &self.indices[first..first + count] {
            bbox.extend(&context.bounds[i as usize]);
        }
        BvhNode::Leaf {
            bbox,
            first: first as u32,
            count: count as u32,
        }
    }

    fn subdivide(&mut self, context: &BuildContext, node_index: usize) {
        let BvhNode::Leaf { bbox, first, count } = self.nodes[node_index] else {
            return;
        };
        let (first, count) = (first as usize, count as usize);
        if count <= LEAF_MAX_SIZE {
            return;
        }

        let axis = bbox.longest_axis();
        let split = match context.method {
            SplitMethod::Midpoint => bbox.center()[axis],
            SplitMethod::Sah => match self.sah_split(context, first, count, axis) {
                Some(split) => split,
                None => return,
            },
        };

        // Two-pointer partition: centroids below the split move left.
        let range = &mut self.indices[first..first + count];
        let mut i = 0;
        let mut j = range.len();
        while i < j {
            if context.centroids[range[i] as usize][axis] < split {
                i += 1;
            } else {
                j -= 1;
                range.swap(i, j);
            }
        }

        let left_count = i;
        if left_count == 0 || left_count == count {
            // All centroids on one side; splitting would not terminate.
            return;
        }

        let left = self.nodes.len();
        let left_node = self.make_leaf(context, first, left_count);
        let right_node = self.make_leaf(context, first + left_count, count - left_count);
        self.nodes.push(left_node);
        self.nodes.push(right_node);
        self.nodes[node_index] = BvhNode::Branch {
            bbox,
            left: left as u32,
        };

        self.subdivide(context, left);
        self.subdivide(context, left + 1);
    }

    /// Split plane minimizing `count * area` summed over both sides.
    fn sah_split(
        &self,
        context: &BuildContext,
        first: usize,
        count: usize,
        axis: usize,
    ) -> Option<f32> {
        let range = &self.indices[first..first + count];
        let (lo, hi) = range.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &i| {
            let c = context.centroids[i as usize][axis];
            (lo.min(c), hi.max(c))
        });
        let extent = hi - lo;
        if !(extent > 0.0) || !extent.is_finite() {
            return None;
        }

        let mut bin_counts = [0usize; SAH_BINS];
        let mut bin_bounds = [Aabb::EMPTY; SAH_BINS];
        for &i in range {
            let c = context.centroids[i as usize][axis];
            let b = (((c - lo) / extent * SAH_BINS as f32) as usize).min(SAH_BINS - 1);
            bin_counts[b] += 1;
            bin_bounds[b].extend(&context.bounds[i as usize]);
        }

        let mut best = None;
        let mut best_cost = f32::INFINITY;
        for split in 1..SAH_BINS {
            let (mut left_box, mut right_box) = (Aabb::EMPTY, Aabb::EMPTY);
            let (mut left_n, mut right_n) = (0, 0);
            for b in 0..split {
                left_box.extend(&bin_bounds[b]);
                left_n += bin_counts[b];
            }
            for b in split..SAH_BINS {
                right_box.extend(&bin_bounds[b]);
                right_n += bin_counts[b];
            }
            if left_n == 0 || right_n == 0 {
                continue;
            }
            let cost =
                left_n as f32 * left_box.surface_area() + right_n as f32 * right_box.surface_area();
            if cost < best_cost {
                best_cost = cost;
                best = Some(lo + extent * split as f32 / SAH_BINS as f32);
            }
        }
        best
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Primitive-index permutation referenced by the leaves.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Union of all primitive boxes.
    pub fn bounding_box(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |root| *root.bbox())
    }

    pub fn centroid(&self) -> Vec3 {
        self.bounding_box().center()
    }

    /// Find the closest primitive hit nearer than `its.t`.
    ///
    /// Returns `true` and updates `its` only if such a hit exists.
    pub fn intersect<'a, P: PrimitiveSet + ?Sized>(
        &self,
        primitives: &'a P,
        ray: &Ray,
        its: &mut Intersection<'a>,
        rng: &mut dyn Sampler,
    ) -> bool {
        let Some(root) = self.nodes.first() else {
            return false;
        };
        let inv_direction = ray.direction.recip();
        if root.bbox().ray_entry(ray, inv_direction) >= its.t {
            return false;
        }
        self.intersect_node(0, primitives, ray, inv_direction, its, rng)
    }

    fn intersect_node<'a, P: PrimitiveSet + ?Sized>(
        &self,
        node_index: usize,
        primitives: &'a P,
        ray: &Ray,
        inv_direction: Vec3,
        its: &mut Intersection<'a>,
        rng: &mut dyn Sampler,
    ) -> bool {
        its.stats.bvh_nodes += 1;

        match self.nodes[node_index] {
            BvhNode::Leaf { first, count, .. } => {
                let mut hit = false;
                for &i in &self.indices[first as usize..(first + count) as usize] {
                    its.stats.primitives += 1;
                    hit |= primitives.intersect_primitive(i as usize, ray, its, rng);
                }
                hit
            }
            BvhNode::Branch { left, .. } => {
                let left = left as usize;
                let right = left + 1;
                let t_left = self.nodes[left].bbox().ray_entry(ray, inv_direction);
                let t_right = self.nodes[right].bbox().ray_entry(ray, inv_direction);

                let ((near, t_near), (far, t_far)) = if t_left <= t_right {
                    ((left, t_left), (right, t_right))
                } else {
                    ((right, t_right), (left, t_left))
                };

                let mut hit = false;
                if t_near < its.t {
                    hit |= self.intersect_node(near, primitives, ray, inv_direction, its, rng);
                }
                // its.t may have shrunk while visiting the near child.
                if t_far < its.t {
                    hit |= self.intersect_node(far, primitives, ray, inv_direction, its, rng);
                }
                hit
            }
        }
    }
}
