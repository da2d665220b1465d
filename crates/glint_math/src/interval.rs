/// A closed range `[min, max]` along one axis.
///
/// An interval with `min >= max` is considered empty; [`Interval::EMPTY`]
/// is the identity for [`Interval::extend`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Contains nothing; extending it by a value yields that value.
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    /// Contains everything.
    pub const UNIVERSE: Interval = Interval {
        min: f32::NEG_INFINITY,
        max: f32::INFINITY,
    };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns `max - min`.
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    pub fn center(&self) -> f32 {
        0.5 * (self.min + self.max)
    }

    pub fn is_empty(&self) -> bool {
        self.min >= self.max
    }

    pub fn is_unbounded(&self) -> bool {
        self.min == f32::NEG_INFINITY || self.max == f32::INFINITY
    }

    /// Returns true if x is within `[min, max]`.
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// Grow to include `x`. Never shrinks.
    pub fn extend(&mut self, x: f32) {
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Smallest interval covering both inputs.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }
}
