use crate::Vec3;

/// A ray with an origin, a unit direction and the number of bounces that
/// produced it.
///
/// Rays are never moved between coordinate spaces in place; use
/// [`crate::Transform::inverse_ray`] to get a new one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub depth: u32,
}

impl Ray {
    /// Create a primary ray. `direction` is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            depth: 0,
        }
    }

    /// Same ray, tagged with a bounce count.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns `origin + t * direction`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
