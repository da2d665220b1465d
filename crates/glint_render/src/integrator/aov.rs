//! Integrators that visualize a single surface property.

use glint_math::{Color, Ray};

use crate::integrator::Integrator;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Shading normal at the first hit.
#[derive(Debug, Clone)]
pub struct NormalsIntegrator {
    /// Map `[-1, 1]` to `[0, 1]` so every channel is displayable
    remap: bool,
}

impl NormalsIntegrator {
    pub fn new(remap: bool) -> Self {
        Self { remap }
    }
}

impl Integrator for NormalsIntegrator {
    fn li(&self, ray: &Ray, scene: &Scene, rng: &mut dyn Sampler) -> Color {
        let its = scene.intersect(ray, rng);
        if !its.is_hit() {
            return Color::ZERO;
        }
        let normal = its.frame().normal;
        if self.remap {
            (normal + Color::ONE) * 0.5
        } else {
            normal
        }
    }
}

/// BSDF albedo at the first hit.
#[derive(Debug, Clone, Default)]
pub struct AlbedoIntegrator;

impl Integrator for AlbedoIntegrator {
    fn li(&self, ray: &Ray, scene: &Scene, rng: &mut dyn Sampler) -> Color {
        let its = scene.intersect(ray, rng);
        if !its.is_hit() {
            return Color::ZERO;
        }
        its.albedo()
    }
}

/// Heat map of BVH work for primary rays: nodes in red, primitives in
/// green, both divided by `unit`.
#[derive(Debug, Clone)]
pub struct BvhStatsIntegrator {
    unit: f32,
}

impl BvhStatsIntegrator {
    pub fn new(unit: f32) -> Self {
        Self { unit }
    }
}

impl Integrator for BvhStatsIntegrator {
    fn li(&self, ray: &Ray, scene: &Scene, rng: &mut dyn Sampler) -> Color {
        let its = scene.intersect(ray, rng);
        Color::new(
            its.stats.bvh_nodes as f32 / self.unit,
            its.stats.primitives as f32 / self.unit,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::test_scenes::*;
    use crate::sampler::IndependentSampler;
    use crate::shape::{Instance, Shape, Sphere};
    use glint_math::{Mat4, Transform, Vec3};
    use std::sync::Arc;

    #[test]
    fn test_normals_remap() {
        let scene = lit_sphere(None);
        let mut rng = IndependentSampler::new(1, 0);
        let remapped = NormalsIntegrator::new(true).li(&apex_ray(), &scene, &mut rng);
        assert!((remapped - Color::new(0.5, 1.0, 0.5)).length() < 1e-4);
        let raw = NormalsIntegrator::new(false).li(&apex_ray(), &scene, &mut rng);
        assert!((raw - Vec3::Y).length() < 1e-4);
        let miss = NormalsIntegrator::new(true).li(&Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::Y), &scene, &mut rng);
        assert_eq!(miss, Color::ZERO);
    }

    #[test]
    fn test_albedo() {
        let scene = lit_sphere(None);
        let mut rng = IndependentSampler::new(1, 0);
        assert_eq!(AlbedoIntegrator.li(&apex_ray(), &scene, &mut rng), Color::ONE);

        // No BSDF bound
        let bare = Scene::new(camera(), vec![Arc::new(Instance::new(Arc::new(Sphere::new()))) as Arc<dyn Shape>]);
        assert_eq!(AlbedoIntegrator.li(&apex_ray(), &bare, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_bvh_stats_count_work() {
        let shapes = (0..8)
            .map(|i| {
                let transform = Transform::new(Mat4::from_translation(Vec3::new(3.0 * i as f32, 0.0, 0.0)));
                Arc::new(Instance::new(Arc::new(Sphere::new())).with_transform(transform)) as Arc<dyn Shape>
            })
            .collect();
        let scene = Scene::new(camera(), shapes);
        let mut rng = IndependentSampler::new(1, 0);
        let stats = BvhStatsIntegrator::new(1.0).li(&apex_ray(), &scene, &mut rng);
        assert!(stats.x >= 1.0 && stats.y >= 1.0);
        assert_eq!(stats.z, 0.0);
    }
}
