use crate::{Interval, Ray, Vec3, EPSILON};

/// Axis-aligned bounding box, stored as one [`Interval`] per axis.
///
/// Unlike a padded box, a zero-width axis is allowed; [`Aabb::is_empty`]
/// reports a box as empty as soon as any axis has `min >= max`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Contains nothing. Identity for [`Aabb::extend`].
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Contains everything.
    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };

    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Box spanned by two corner points, in any order.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self {
            x: Interval::new(min.x, max.x),
            y: Interval::new(min.y, max.y),
            z: Interval::new(min.z, max.z),
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Corner `i` of the box, `i` in `0..8`, bit k selecting min/max on axis k.
    pub fn corner(&self, i: usize) -> Vec3 {
        Vec3::new(
            if i & 1 == 0 { self.x.min } else { self.x.max },
            if i & 2 == 0 { self.y.min } else { self.y.max },
            if i & 4 == 0 { self.z.min } else { self.z.max },
        )
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    pub fn is_unbounded(&self) -> bool {
        self.x.is_unbounded() || self.y.is_unbounded() || self.z.is_unbounded()
    }

    /// Grow to include `point`.
    pub fn extend_point(&mut self, point: Vec3) {
        self.x.extend(point.x);
        self.y.extend(point.y);
        self.z.extend(point.z);
    }

    /// Grow to include `other`.
    pub fn extend(&mut self, other: &Aabb) {
        *self = Aabb::surrounding(self, other);
    }

    /// Smallest box covering both inputs.
    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&a.x, &b.x),
            y: Interval::surrounding(&a.y, &b.y),
            z: Interval::surrounding(&a.z, &b.z),
        }
    }

    pub fn diagonal(&self) -> Vec3 {
        self.max() - self.min()
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(self.x.center(), self.y.center(), self.z.center())
    }

    /// Surface area, zero for empty boxes.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// `true` if `other` lies entirely inside this box.
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min().cmple(other.min()).all() && self.max().cmpge(other.max()).all()
    }

    /// Slab test. Returns the entry distance along `ray`, or infinity when
    /// the box is missed or lies entirely behind the origin.
    ///
    /// `inv_direction` is the component-wise reciprocal of the ray direction.
    /// The entry distance may be negative when the origin is inside.
    pub fn ray_entry(&self, ray: &Ray, inv_direction: Vec3) -> f32 {
        let t1 = (self.min() - ray.origin) * inv_direction;
        let t2 = (self.max() - ray.origin) * inv_direction;

        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();

        if t_far < t_near || t_far < EPSILON {
            return f32::INFINITY;
        }
        t_near
    }
}
