//! Triangle meshes backed by a [`Bvh`].

use std::sync::Arc;

use glint_core::Mesh;
use glint_math::{Aabb, Frame, Ray, Vec2, Vec3, EPSILON};

use crate::bvh::{Bvh, PrimitiveSet, SplitMethod};
use crate::intersection::{Intersection, SurfaceEvent};
use crate::sampler::Sampler;
use crate::shape::Shape;

/// Möller-Trumbore ray/triangle test.
///
/// Returns the distance and barycentric coordinates `(u, v)` of the hit
/// (weights of `p1` and `p2`), or `None` when the ray is parallel, misses,
/// or hits closer than [`EPSILON`].
pub fn intersect_triangle(ray: &Ray, p0: Vec3, p1: Vec3, p2: Vec3) -> Option<(f32, Vec2)> {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;

    let h = ray.direction.cross(edge2);
    let det = edge1.dot(h);
    if det.abs() < EPSILON * EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - p0;
    let u = inv_det * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = inv_det * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * edge2.dot(q);
    if t <= EPSILON {
        return None;
    }
    Some((t, Vec2::new(u, v)))
}

/// Triangle list viewed as BVH primitives.
struct Triangles {
    mesh: Arc<Mesh>,
    smooth_normals: bool,
}

impl Triangles {
    fn surface_at(&self, index: usize, position: Vec3, bary: Vec2) -> SurfaceEvent {
        let [i0, i1, i2] = self.mesh.triangle(index);
        let w = Vec3::new(1.0 - bary.x - bary.y, bary.x, bary.y);
        let interpolate = |a: Vec3, b: Vec3, c: Vec3| a * w.x + b * w.y + c * w.z;

        let p = &self.mesh.positions;
        let geometric = (p[i1] - p[i0]).cross(p[i2] - p[i0]).normalize();
        let normal = match (&self.mesh.normals, self.smooth_normals) {
            (Some(n), true) => interpolate(n[i0], n[i1], n[i2])
                .try_normalize()
                .unwrap_or(geometric),
            _ => geometric,
        };

        let uv = match &self.mesh.uvs {
            Some(t) => {
                let uv = interpolate(t[i0].extend(0.0), t[i1].extend(0.0), t[i2].extend(0.0));
                Vec2::new(uv.x, uv.y)
            }
            None => bary,
        };

        SurfaceEvent {
            position,
            uv,
            frame: Frame::from_normal(normal),
            pdf: 0.0,
        }
    }
}

impl PrimitiveSet for Triangles {
    fn primitive_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    fn primitive_bounds(&self, index: usize) -> Aabb {
        self.mesh.triangle_bounds(index)
    }

    fn primitive_centroid(&self, index: usize) -> Vec3 {
        self.mesh.triangle_centroid(index)
    }

    fn intersect_primitive<'a>(
        &'a self,
        index: usize,
        ray: &Ray,
        its: &mut Intersection<'a>,
        _rng: &mut dyn Sampler,
    ) -> bool {
        let [i0, i1, i2] = self.mesh.triangle(index);
        let p = &self.mesh.positions;
        let Some((t, bary)) = intersect_triangle(ray, p[i0], p[i1], p[i2]) else {
            return false;
        };
        if t >= its.t {
            return false;
        }

        its.t = t;
        its.surface = self.surface_at(index, ray.at(t), bary);
        true
    }
}

/// A mesh shape. Several instances can share one underlying [`Mesh`].
pub struct TriangleMesh {
    triangles: Triangles,
    bvh: Bvh,
}

impl TriangleMesh {
    pub fn new(mesh: Arc<Mesh>, smooth_normals: bool) -> Self {
        Self::with_split_method(mesh, smooth_normals, SplitMethod::default())
    }

    pub fn with_split_method(mesh: Arc<Mesh>, smooth_normals: bool, method: SplitMethod) -> Self {
        let triangles = Triangles {
            mesh,
            smooth_normals,
        };
        let bvh = Bvh::build_with(&triangles, method);
        Self { triangles, bvh }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.primitive_count()
    }
}

impl Shape for TriangleMesh {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        its: &mut Intersection<'a>,
        rng: &mut dyn Sampler,
    ) -> bool {
        self.bvh.intersect(&self.triangles, ray, its, rng)
    }

    fn bounding_box(&self) -> Aabb {
        self.bvh.bounding_box()
    }

    fn centroid(&self) -> Vec3 {
        self.bvh.centroid()
    }
}
