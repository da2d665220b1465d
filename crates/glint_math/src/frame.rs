//! Orthonormal shading frames.
//!
//! In local coordinates the normal is `+Z`, so the trigonometric helpers in
//! this module only need to look at the components of a direction.

use crate::{sqr, Vec3};

/// Tangent, bitangent and normal of a surface point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub normal: Vec3,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            tangent: Vec3::X,
            bitangent: Vec3::Y,
            normal: Vec3::Z,
        }
    }
}

impl Frame {
    pub fn new(tangent: Vec3, bitangent: Vec3, normal: Vec3) -> Self {
        Self {
            tangent,
            bitangent,
            normal,
        }
    }

    /// Build a frame around a unit normal.
    ///
    /// Uses the branchless construction from Duff et al. 2017,
    /// "Building an Orthonormal Basis, Revisited".
    pub fn from_normal(normal: Vec3) -> Self {
        let sign = 1.0_f32.copysign(normal.z);
        let a = -1.0 / (sign + normal.z);
        let b = normal.x * normal.y * a;
        let tangent = Vec3::new(1.0 + sign * normal.x * normal.x * a, sign * b, -sign * normal.x);
        let bitangent = Vec3::new(b, sign + normal.y * normal.y * a, -normal.y);
        Self {
            tangent,
            bitangent,
            normal,
        }
    }

    /// Express a world-space direction in this frame.
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        Vec3::new(
            world.dot(self.tangent),
            world.dot(self.bitangent),
            world.dot(self.normal),
        )
    }

    /// Express a local direction in world space.
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.tangent * local.x + self.bitangent * local.y + self.normal * local.z
    }
}

// ============================================================================
// Local-space trigonometry
// ============================================================================

#[inline]
pub fn cos_theta(w: Vec3) -> f32 {
    w.z
}

#[inline]
pub fn cos_theta2(w: Vec3) -> f32 {
    sqr(w.z)
}

#[inline]
pub fn abs_cos_theta(w: Vec3) -> f32 {
    w.z.abs()
}

#[inline]
pub fn sin_theta2(w: Vec3) -> f32 {
    (1.0 - cos_theta2(w)).max(0.0)
}

#[inline]
pub fn tan_theta2(w: Vec3) -> f32 {
    sin_theta2(w) / cos_theta2(w)
}

/// Both directions lie on the same side of the surface.
#[inline]
pub fn same_hemisphere(a: Vec3, b: Vec3) -> bool {
    a.z * b.z > 0.0
}
