//! Cameras turn image positions into primary rays.

pub use glint_core::description::FovAxis;
use glint_math::warp::square_to_uniform_disk_concentric;
use glint_math::{Color, Ray, Transform, UVec2, Vec2, Vec3};

use crate::sampler::Sampler;

/// A primary ray and its importance weight.
#[derive(Debug, Clone, Copy)]
pub struct CameraSample {
    pub ray: Ray,
    pub weight: Color,
}

pub trait Camera: Send + Sync {
    fn resolution(&self) -> UVec2;

    /// Ray through `normalized` in `[-1, 1]^2`, +x right and +y up.
    fn sample_normalized(&self, normalized: Vec2, rng: &mut dyn Sampler) -> CameraSample;

    /// Ray through a random point inside `pixel`; row 0 is the top.
    fn sample(&self, pixel: UVec2, rng: &mut dyn Sampler) -> CameraSample {
        let resolution = self.resolution().as_vec2();
        let p = (pixel.as_vec2() + rng.next_2d()) / resolution;
        self.sample_normalized(Vec2::new(2.0 * p.x - 1.0, 1.0 - 2.0 * p.y), rng)
    }
}

/// Pinhole camera, with an optional thin lens for depth of field.
///
/// In its local space the camera sits at the origin looking down +Z.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    resolution: UVec2,
    to_world: Transform,
    /// Half extents of the image plane at z = 1
    extent: Vec2,
    aperture_radius: f32,
    focus_distance: f32,
}

impl PerspectiveCamera {
    pub fn new(resolution: UVec2, fov_degrees: f32, fov_axis: FovAxis, to_world: Transform) -> Self {
        let tan = (0.5 * fov_degrees.to_radians()).tan();
        let aspect = resolution.x as f32 / resolution.y.max(1) as f32;
        let extent = match fov_axis {
            FovAxis::X => Vec2::new(tan, tan / aspect),
            FovAxis::Y => Vec2::new(tan * aspect, tan),
        };
        Self {
            resolution,
            to_world,
            extent,
            aperture_radius: 0.0,
            focus_distance: 1.0,
        }
    }

    pub fn with_thin_lens(mut self, aperture_radius: f32, focus_distance: f32) -> Self {
        self.aperture_radius = aperture_radius.max(0.0);
        self.focus_distance = focus_distance;
        self
    }
}

impl Camera for PerspectiveCamera {
    fn resolution(&self) -> UVec2 {
        self.resolution
    }

    fn sample_normalized(&self, normalized: Vec2, rng: &mut dyn Sampler) -> CameraSample {
        let direction = (normalized * self.extent).extend(1.0);

        let (origin, direction) = if self.aperture_radius > 0.0 {
            let lens = self.aperture_radius * square_to_uniform_disk_concentric(rng.next_2d());
            let origin = lens.extend(0.0);
            let focus = direction * self.focus_distance;
            (origin, focus - origin)
        } else {
            (Vec3::ZERO, direction)
        };

        CameraSample {
            ray: Ray::new(
                self.to_world.apply_point(origin),
                self.to_world.apply_vector(direction),
            ),
            weight: Color::ONE,
        }
    }
}
