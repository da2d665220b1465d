//! The immutable world shared by all render workers.

use std::sync::Arc;

use glint_math::{Color, Ray, Vec3, EPSILON};

use crate::camera::Camera;
use crate::intersection::Intersection;
use crate::light::{BackgroundLight, Light};
use crate::sampler::Sampler;
use crate::shape::{Group, Shape};

/// A light picked for next-event estimation.
pub struct LightSample<'a> {
    pub light: &'a dyn Light,
    /// Probability with which this light was chosen
    pub probability: f32,
}

pub struct Scene {
    camera: Arc<dyn Camera>,
    root: Arc<dyn Shape>,
    lights: Vec<Arc<dyn Light>>,
    background: Option<Arc<dyn BackgroundLight>>,
}

impl Scene {
    /// Builds a scene around `shapes`, grouping them when there is more
    /// than one.
    pub fn new(camera: Arc<dyn Camera>, mut shapes: Vec<Arc<dyn Shape>>) -> Self {
        let root: Arc<dyn Shape> = if shapes.len() == 1 {
            shapes.remove(0)
        } else {
            log::info!("Building BVH over {} shapes", shapes.len());
            Arc::new(Group::new(shapes))
        };
        Self {
            camera,
            root,
            lights: Vec::new(),
            background: None,
        }
    }

    pub fn with_light(mut self, light: Arc<dyn Light>) -> Self {
        self.lights.push(light);
        self
    }

    pub fn with_background(mut self, background: Arc<dyn BackgroundLight>) -> Self {
        self.background = Some(background);
        self
    }

    pub fn camera(&self) -> &dyn Camera {
        self.camera.as_ref()
    }

    pub fn lights(&self) -> &[Arc<dyn Light>] {
        &self.lights
    }

    /// Closest hit along `ray`. Check [`Intersection::is_hit`] for misses.
    pub fn intersect(&self, ray: &Ray, rng: &mut dyn Sampler) -> Intersection<'_> {
        let mut its = Intersection::new(-ray.direction);
        self.root.intersect(ray, &mut its, rng);
        its
    }

    /// Whether anything blocks `ray` before `max_distance`.
    pub fn occluded(&self, ray: &Ray, max_distance: f32, rng: &mut dyn Sampler) -> bool {
        let mut its = Intersection::with_max_distance(-ray.direction, max_distance * (1.0 - EPSILON));
        self.root.intersect(ray, &mut its, rng)
    }

    /// Uniformly picks one light.
    pub fn sample_light(&self, rng: &mut dyn Sampler) -> Option<LightSample<'_>> {
        let n = self.lights.len();
        if n == 0 {
            return None;
        }
        let index = ((rng.next_1d() * n as f32) as usize).min(n - 1);
        Some(LightSample {
            light: self.lights[index].as_ref(),
            probability: 1.0 / n as f32,
        })
    }

    pub fn has_lights(&self) -> bool {
        !self.lights.is_empty()
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Radiance arriving from outside the scene along `direction`.
    pub fn evaluate_background(&self, direction: Vec3) -> Color {
        self.background
            .as_ref()
            .map_or(Color::ZERO, |background| background.evaluate(direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FovAxis, PerspectiveCamera};
    use crate::light::{EnvironmentMap, PointLight};
    use crate::sampler::IndependentSampler;
    use crate::shape::{Instance, Sphere};
    use glint_core::ConstantTexture;
    use glint_math::{Mat4, Transform, UVec2};

    fn camera() -> Arc<dyn Camera> {
        Arc::new(PerspectiveCamera::new(UVec2::new(4, 4), 45.0, FovAxis::X, Transform::IDENTITY))
    }

    fn sphere_at(z: f32) -> Arc<dyn Shape> {
        let transform = Transform::new(Mat4::from_translation(Vec3::new(0.0, 0.0, z)));
        Arc::new(Instance::new(Arc::new(Sphere::new())).with_transform(transform))
    }

    #[test]
    fn test_scene_intersect_and_miss() {
        let scene = Scene::new(camera(), vec![sphere_at(5.0), sphere_at(10.0)]);
        let mut rng = IndependentSampler::new(1, 0);
        let its = scene.intersect(&Ray::new(Vec3::ZERO, Vec3::Z), &mut rng);
        assert!(its.is_hit());
        assert!((its.t - 4.0).abs() < 1e-4);
        assert_eq!(its.wo, Vec3::NEG_Z);

        let its = scene.intersect(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), &mut rng);
        assert!(!its.is_hit());
    }

    #[test]
    fn test_occlusion_stops_short_of_target() {
        let scene = Scene::new(camera(), vec![sphere_at(5.0)]);
        let mut rng = IndependentSampler::new(1, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(scene.occluded(&ray, 10.0, &mut rng));
        assert!(!scene.occluded(&ray, 3.5, &mut rng));
        // A target lying exactly on the surface is not blocked by it.
        assert!(!scene.occluded(&ray, 4.0, &mut rng));
    }

    #[test]
    fn test_light_selection() {
        let scene = Scene::new(camera(), Vec::new());
        let mut rng = IndependentSampler::new(1, 0);
        assert!(scene.sample_light(&mut rng).is_none());
        assert!(!scene.has_lights());

        let scene = scene
            .with_light(Arc::new(PointLight::new(Vec3::ZERO, Color::ONE)))
            .with_light(Arc::new(PointLight::new(Vec3::Y, Color::ONE)));
        let sample = scene.sample_light(&mut rng).unwrap();
        assert_eq!(sample.probability, 0.5);
    }

    #[test]
    fn test_background() {
        let scene = Scene::new(camera(), Vec::new());
        assert_eq!(scene.evaluate_background(Vec3::Y), Color::ZERO);
        let env = Arc::new(EnvironmentMap::new(Arc::new(ConstantTexture::new(Color::splat(2.0)))));
        let scene = scene.with_background(env);
        assert!(scene.has_background());
        assert_eq!(scene.evaluate_background(Vec3::Y), Color::splat(2.0));
    }
}
