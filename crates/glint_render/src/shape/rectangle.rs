//! The square `[-1, 1]^2` in the z = 0 plane, facing +Z.

use glint_math::{Aabb, Frame, Ray, Vec2, Vec3, EPSILON};

use crate::intersection::{AreaSample, Intersection, SurfaceEvent};
use crate::sampler::Sampler;
use crate::shape::Shape;

#[derive(Debug, Clone, Copy, Default)]
pub struct Rectangle;

impl Rectangle {
    pub fn new() -> Self {
        Self
    }

    fn surface_at(x: f32, y: f32) -> SurfaceEvent {
        SurfaceEvent {
            position: Vec3::new(x, y, 0.0),
            uv: Vec2::new((x + 1.0) * 0.5, (y + 1.0) * 0.5),
            frame: Frame::default(),
            // Area is 4
            pdf: 0.25,
        }
    }
}

impl Shape for Rectangle {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        its: &mut Intersection<'a>,
        _rng: &mut dyn Sampler,
    ) -> bool {
        if ray.direction.z == 0.0 {
            return false;
        }

        let t = -ray.origin.z / ray.direction.z;
        if t < EPSILON || t >= its.t {
            return false;
        }

        let p = ray.at(t);
        if p.x.abs() > 1.0 || p.y.abs() > 1.0 {
            return false;
        }

        its.t = t;
        its.surface = Self::surface_at(p.x, p.y);
        true
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_points(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0))
    }

    fn centroid(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn sample_area(&self, rng: &mut dyn Sampler) -> AreaSample {
        let p = 2.0 * rng.next_2d() - Vec2::ONE;
        Self::surface_at(p.x, p.y)
    }
}
