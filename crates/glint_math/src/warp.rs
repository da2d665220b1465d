//! Mappings from the unit square to disks, hemispheres and spheres.

use crate::{safe_sqrt, Vec2, Vec3, INV_FOUR_PI};
use std::f32::consts::{FRAC_1_PI, FRAC_PI_2, FRAC_PI_4, PI};

/// Shirley-Chiu concentric mapping onto the unit disk.
pub fn square_to_uniform_disk_concentric(sample: Vec2) -> Vec2 {
    let offset = 2.0 * sample - Vec2::ONE;
    if offset.x == 0.0 && offset.y == 0.0 {
        return Vec2::ZERO;
    }
    let (r, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, FRAC_PI_4 * (offset.y / offset.x))
    } else {
        (offset.y, FRAC_PI_2 - FRAC_PI_4 * (offset.x / offset.y))
    };
    r * Vec2::new(theta.cos(), theta.sin())
}

/// Cosine-weighted direction on the `+Z` hemisphere.
pub fn square_to_cosine_hemisphere(sample: Vec2) -> Vec3 {
    let d = square_to_uniform_disk_concentric(sample);
    let z = safe_sqrt(1.0 - d.length_squared());
    Vec3::new(d.x, d.y, z)
}

pub fn cosine_hemisphere_pdf(w: Vec3) -> f32 {
    w.z.max(0.0) * FRAC_1_PI
}

/// Uniform direction on the unit sphere.
pub fn square_to_uniform_sphere(sample: Vec2) -> Vec3 {
    let z = 1.0 - 2.0 * sample.y;
    let r = safe_sqrt(1.0 - z * z);
    let phi = 2.0 * PI * sample.x;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn uniform_sphere_pdf() -> f32 {
    INV_FOUR_PI
}
