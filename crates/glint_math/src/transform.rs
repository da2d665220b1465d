//! Affine transforms with a cached inverse.
//!
//! glam's `Mat4` already does the arithmetic; [`Transform`] keeps the
//! inverse and determinant alongside so that instancing never has to invert
//! a matrix per ray.

use crate::{Aabb, Mat4, Ray, Vec3};

/// An invertible affine transform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Mat4,
    inverse: Mat4,
    determinant: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: Mat4::IDENTITY,
        inverse: Mat4::IDENTITY,
        determinant: 1.0,
    };

    /// Wrap `matrix`. A singular matrix yields a non-finite inverse; callers
    /// can check [`Transform::is_invertible`].
    pub fn new(matrix: Mat4) -> Self {
        Self {
            matrix,
            inverse: matrix.inverse(),
            determinant: matrix.determinant(),
        }
    }

    pub fn determinant(&self) -> f32 {
        self.determinant
    }

    pub fn is_invertible(&self) -> bool {
        self.determinant != 0.0 && self.inverse.is_finite()
    }

    pub fn apply_point(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point3(point)
    }

    /// Transform a direction (no translation).
    pub fn apply_vector(&self, vector: Vec3) -> Vec3 {
        self.matrix.transform_vector3(vector)
    }

    /// Transform a surface normal by the inverse transpose.
    pub fn apply_normal(&self, normal: Vec3) -> Vec3 {
        self.inverse.transpose().transform_vector3(normal)
    }

    pub fn inverse_point(&self, point: Vec3) -> Vec3 {
        self.inverse.transform_point3(point)
    }

    pub fn inverse_vector(&self, vector: Vec3) -> Vec3 {
        self.inverse.transform_vector3(vector)
    }

    /// Map a ray into local space, leaving the direction unnormalized.
    pub fn inverse_ray(&self, ray: &Ray) -> Ray {
        Ray {
            origin: self.inverse_point(ray.origin),
            direction: self.inverse_vector(ray.direction),
            depth: ray.depth,
        }
    }

    /// Bounding box of all 8 transformed corners. Unbounded boxes stay
    /// unbounded, empty boxes stay empty.
    pub fn apply_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_unbounded() {
            return Aabb::UNIVERSE;
        }
        if aabb.is_empty() && aabb.diagonal().min_element() < 0.0 {
            return Aabb::EMPTY;
        }
        let mut result = Aabb::EMPTY;
        for i in 0..8 {
            result.extend_point(self.apply_point(aabb.corner(i)));
        }
        result
    }
}
