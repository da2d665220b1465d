//! Unit sphere centered at the origin.
//!
//! Size and position come from the enclosing [`crate::shape::Instance`].

use std::f32::consts::PI;

use glint_math::{warp, Aabb, Frame, Ray, Vec2, Vec3, EPSILON, INV_FOUR_PI};

use crate::intersection::{AreaSample, Intersection, SurfaceEvent};
use crate::sampler::Sampler;
use crate::shape::Shape;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sphere;

impl Sphere {
    pub fn new() -> Self {
        Self
    }

    /// Surface data for a point on the sphere.
    fn surface_at(point: Vec3) -> SurfaceEvent {
        let normal = point.normalize();

        // Texture coordinates from spherical angles
        let theta = (-normal.y).clamp(-1.0, 1.0).acos();
        let phi = (-normal.z).atan2(normal.x) + PI;
        let uv = Vec2::new(phi / (2.0 * PI), theta / PI);

        let tangent = Vec3::Y.cross(normal);
        let frame = if tangent.length_squared() < 1e-8 {
            // At the poles the longitude direction is undefined.
            Frame::from_normal(normal)
        } else {
            let tangent = tangent.normalize();
            Frame::new(tangent, normal.cross(tangent), normal)
        };

        SurfaceEvent {
            position: normal,
            uv,
            frame,
            pdf: INV_FOUR_PI,
        }
    }
}

impl Shape for Sphere {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        its: &mut Intersection<'a>,
        _rng: &mut dyn Sampler,
    ) -> bool {
        // |o + t d|^2 = 1 with |d| = 1  =>  t^2 + 2bt + c = 0
        let b = ray.origin.dot(ray.direction);
        let c = ray.origin.length_squared() - 1.0;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return false;
        }

        // Avoid cancellation by computing the larger-magnitude root first.
        let sqrt_d = discriminant.sqrt();
        let q = if b > 0.0 { -b - sqrt_d } else { -b + sqrt_d };
        let (mut t0, mut t1) = if q == 0.0 { (0.0, 0.0) } else { (q, c / q) };
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        let t = if t0 > EPSILON {
            t0
        } else if t1 > EPSILON {
            t1
        } else {
            return false;
        };
        if t >= its.t {
            return false;
        }

        its.t = t;
        its.surface = Self::surface_at(ray.at(t));
        true
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_points(-Vec3::ONE, Vec3::ONE)
    }

    fn centroid(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn sample_area(&self, rng: &mut dyn Sampler) -> AreaSample {
        Self::surface_at(warp::square_to_uniform_sphere(rng.next_2d()))
    }
}
