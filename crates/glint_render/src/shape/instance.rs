//! Binds a shape to a material, an emission and a placement in the world.

use std::sync::Arc;

use glint_core::Texture;
use glint_math::{Aabb, Frame, Ray, Transform, Vec3};

use crate::bsdf::Bsdf;
use crate::emission::Emission;
use crate::intersection::{AreaSample, Intersection, SurfaceEvent};
use crate::sampler::Sampler;
use crate::shape::Shape;

/// A shape placed in the scene.
///
/// The wrapped shape is shared, so the same mesh can be instanced many
/// times with different transforms and materials.
pub struct Instance {
    shape: Arc<dyn Shape>,
    bsdf: Option<Arc<dyn Bsdf>>,
    emission: Option<Arc<dyn Emission>>,
    transform: Option<Transform>,
    normal_map: Option<Arc<dyn Texture>>,
    /// Set when the transform mirrors space
    flip_normal: bool,
}

impl Instance {
    pub fn new(shape: Arc<dyn Shape>) -> Self {
        Self {
            shape,
            bsdf: None,
            emission: None,
            transform: None,
            normal_map: None,
            flip_normal: false,
        }
    }

    pub fn with_bsdf(mut self, bsdf: Arc<dyn Bsdf>) -> Self {
        self.bsdf = Some(bsdf);
        self
    }

    pub fn with_emission(mut self, emission: Arc<dyn Emission>) -> Self {
        self.emission = Some(emission);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.flip_normal = transform.determinant() < 0.0;
        self.transform = Some(transform);
        self
    }

    pub fn with_normal_map(mut self, texture: Arc<dyn Texture>) -> Self {
        self.normal_map = Some(texture);
        self
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }

    pub fn bsdf(&self) -> Option<&dyn Bsdf> {
        self.bsdf.as_deref()
    }

    pub fn emission(&self) -> Option<&dyn Emission> {
        self.emission.as_deref()
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Whether this instance provides its own shading, which then takes
    /// precedence over anything nested inside it.
    fn has_material(&self) -> bool {
        self.bsdf.is_some() || self.emission.is_some()
    }

    /// Perturbs the shading frame by the normal map, still in local space.
    fn apply_normal_map(&self, surface: &mut SurfaceEvent) {
        let Some(texture) = &self.normal_map else {
            return;
        };
        let m = 2.0 * texture.evaluate(surface.uv) - Vec3::ONE;
        let frame = &surface.frame;
        let mapped = m.x * frame.tangent + m.y * frame.bitangent + m.z * frame.normal;
        if let Some(normal) = mapped.try_normalize() {
            surface.frame = Frame::from_normal(normal);
        }
    }

    /// Moves a local surface point into world space.
    ///
    /// The transformed tangent keeps its direction; the bitangent is
    /// re-derived so the frame stays orthonormal. Returns the factor by
    /// which the transform scales area around the point.
    fn transform_surface(&self, surface: &mut SurfaceEvent) -> f32 {
        self.apply_normal_map(surface);

        let Some(transform) = &self.transform else {
            return 1.0;
        };

        let frame = &surface.frame;
        let tangent = transform.apply_vector(frame.tangent);
        let mut bitangent = transform.apply_vector(frame.bitangent);
        let area_scale = tangent.cross(bitangent).length();

        if self.normal_map.is_some() {
            let normal = transform.apply_normal(frame.normal).normalize();
            surface.frame = Frame::from_normal(normal);
        } else {
            if self.flip_normal {
                bitangent = -bitangent;
            }
            let tangent = tangent.normalize();
            let normal = tangent.cross(bitangent).normalize();
            surface.frame = Frame::new(tangent, normal.cross(tangent), normal);
        }

        surface.position = transform.apply_point(surface.position);
        area_scale
    }
}

impl Shape for Instance {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        its: &mut Intersection<'a>,
        rng: &mut dyn Sampler,
    ) -> bool {
        let previous_instance = its.instance.take();

        let Some(transform) = &self.transform else {
            if self.shape.intersect(ray, its, rng) {
                self.apply_normal_map(&mut its.surface);
                if its.instance.is_none() || self.has_material() {
                    its.instance = Some(self);
                }
                return true;
            }
            its.instance = previous_instance;
            return false;
        };

        let previous_t = its.t;
        let local = transform.inverse_ray(ray);
        let scale = local.direction.length();
        let local = Ray {
            direction: local.direction / scale,
            ..local
        };
        its.t *= scale;

        if self.shape.intersect(&local, its, rng) {
            its.t /= scale;
            self.transform_surface(&mut its.surface);
            if its.instance.is_none() || self.has_material() {
                its.instance = Some(self);
            }
            true
        } else {
            its.t = previous_t;
            its.instance = previous_instance;
            false
        }
    }

    fn bounding_box(&self) -> Aabb {
        match &self.transform {
            Some(transform) => transform.apply_aabb(&self.shape.bounding_box()),
            None => self.shape.bounding_box(),
        }
    }

    fn centroid(&self) -> Vec3 {
        match &self.transform {
            Some(transform) => transform.apply_point(self.shape.centroid()),
            None => self.shape.centroid(),
        }
    }

    fn sample_area(&self, rng: &mut dyn Sampler) -> AreaSample {
        let mut sample = self.shape.sample_area(rng);
        let area_scale = self.transform_surface(&mut sample);
        if area_scale > 0.0 {
            sample.pdf /= area_scale;
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::Diffuse;
    use crate::sampler::IndependentSampler;
    use crate::shape::{Group, Rectangle, Sphere};
    use glint_core::ConstantTexture;
    use glint_math::{Mat4, Quat};

    fn hit(shape: &dyn Shape, ray: &Ray) -> Option<(f32, SurfaceEvent, bool)> {
        let mut rng = IndependentSampler::new(1, 0);
        let mut its = Intersection::new(-ray.direction);
        shape
            .intersect(ray, &mut its, &mut rng)
            .then(|| (its.t, its.surface, its.is_hit()))
    }

    #[test]
    fn test_instance_without_transform_sets_instance() {
        let instance = Instance::new(Arc::new(Sphere::new()));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let (t, _, is_hit) = hit(&instance, &ray).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert!(is_hit);
    }

    #[test]
    fn test_scaled_instance_world_distance() {
        let transform = Transform::new(
            Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)) * Mat4::from_scale(Vec3::splat(2.0)),
        );
        let instance = Instance::new(Arc::new(Sphere::new())).with_transform(transform);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let (t, surface, _) = hit(&instance, &ray).unwrap();
        assert!((t - 8.0).abs() < 1e-4);
        assert!((surface.position - Vec3::new(0.0, 0.0, -8.0)).length() < 1e-4);
        assert!((surface.frame.normal - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_miss_restores_distance() {
        let transform = Transform::new(Mat4::from_scale(Vec3::splat(3.0)));
        let instance = Instance::new(Arc::new(Sphere::new())).with_transform(transform);
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Y);
        let mut rng = IndependentSampler::new(1, 0);
        let mut its = Intersection::with_max_distance(-ray.direction, 42.0);
        assert!(!instance.intersect(&ray, &mut its, &mut rng));
        assert_eq!(its.t, 42.0);
    }

    #[test]
    fn test_frame_orthonormal_under_shear() {
        let shear = Mat4::from_cols(
            glint_math::Vec4::new(1.0, 0.0, 0.0, 0.0),
            glint_math::Vec4::new(0.7, 1.0, 0.0, 0.0),
            glint_math::Vec4::new(0.0, 0.3, 2.0, 0.0),
            glint_math::Vec4::new(0.0, 0.0, -6.0, 1.0),
        );
        let instance = Instance::new(Arc::new(Sphere::new())).with_transform(Transform::new(shear));
        let ray = Ray::new(Vec3::new(0.1, 0.2, 0.0), Vec3::NEG_Z);
        let (_, surface, _) = hit(&instance, &ray).unwrap();
        let f = surface.frame;
        assert!((f.tangent.length() - 1.0).abs() < 1e-4);
        assert!((f.bitangent.length() - 1.0).abs() < 1e-4);
        assert!((f.normal.length() - 1.0).abs() < 1e-4);
        assert!(f.tangent.dot(f.bitangent).abs() < 1e-4);
        assert!(f.tangent.dot(f.normal).abs() < 1e-4);
        assert!((f.tangent.cross(f.bitangent) - f.normal).length() < 1e-4);
    }

    #[test]
    fn test_mirrored_instance_keeps_outward_normal() {
        let transform = Transform::new(
            Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)) * Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)),
        );
        let instance = Instance::new(Arc::new(Sphere::new())).with_transform(transform);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let (_, surface, _) = hit(&instance, &ray).unwrap();
        assert!(surface.frame.normal.z > 0.99);
    }

    #[test]
    fn test_rotated_rectangle_normal() {
        let transform = Transform::new(
            Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))
                * Mat4::from_quat(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
        );
        let floor = Instance::new(Arc::new(Rectangle::new())).with_transform(transform);
        let ray = Ray::new(Vec3::new(0.2, 2.0, 0.3), Vec3::NEG_Y);
        let (t, surface, _) = hit(&floor, &ray).unwrap();
        assert!((t - 3.0).abs() < 1e-4);
        assert!((surface.frame.normal - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_flat_normal_map_is_identity() {
        let texture = Arc::new(ConstantTexture::new(Vec3::new(0.5, 0.5, 1.0)));
        let instance = Instance::new(Arc::new(Rectangle::new())).with_normal_map(texture);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);
        let (_, surface, _) = hit(&instance, &ray).unwrap();
        assert!((surface.frame.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_nested_material_survives_outer_instance() {
        let inner = Instance::new(Arc::new(Sphere::new()))
            .with_bsdf(Arc::new(Diffuse::new(Arc::new(ConstantTexture::new(Vec3::splat(0.5))))));
        let group = Group::new(vec![Arc::new(inner) as Arc<dyn Shape>]);
        let outer = Instance::new(Arc::new(group))
            .with_transform(Transform::new(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0))));

        let mut rng = IndependentSampler::new(1, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let mut its = Intersection::new(-ray.direction);
        assert!(outer.intersect(&ray, &mut its, &mut rng));
        assert!(its.bsdf().is_some());
    }

    #[test]
    fn test_area_sample_pdf_scales() {
        let transform = Transform::new(Mat4::from_scale(Vec3::new(2.0, 3.0, 1.0)));
        let instance = Instance::new(Arc::new(Rectangle::new())).with_transform(transform);
        let mut rng = IndependentSampler::new(1, 5);
        let sample = instance.sample_area(&mut rng);
        assert!((sample.pdf - 0.25 / 6.0).abs() < 1e-6);
    }
}
