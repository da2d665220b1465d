//! Builds renderable objects out of a [`SceneDescription`].
//!
//! Every description enum is matched exhaustively, so adding a new kind of
//! shape or material to the file format fails to compile until it can also
//! be constructed here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glint_core::description::{
    compose_transform, BsdfDesc, CameraDesc, EmissionDesc, InstanceDesc, IntegratorDesc,
    LightDesc, SamplerDesc, ShapeDesc, TextureDesc, TextureNode, TransformOp,
};
use glint_core::{
    load_obj, CheckerboardTexture, ConfigError, ConstantTexture, ImageCache, ImageTexture,
    SceneDescription, Texture,
};
use glint_math::{Transform, UVec2};

use crate::bsdf::{Bsdf, Dielectric, Diffuse, Principled, RoughConductor, RoughDielectric};
use crate::camera::{Camera, PerspectiveCamera};
use crate::emission::{Emission, Lambertian};
use crate::error::RenderResult;
use crate::integrator::{
    AlbedoIntegrator, BvhStatsIntegrator, DirectIntegrator, Integrator, NormalsIntegrator,
    PathTracer,
};
use crate::light::{DirectionalLight, EnvironmentMap, PointLight};
use crate::sampler::{HaltonSampler, IndependentSampler, Sampler};
use crate::scene::Scene;
use crate::shape::{Group, Instance, Rectangle, Shape, Sphere, TriangleMesh};

/// Everything needed to produce one image.
pub struct RenderJob {
    pub scene: Scene,
    pub integrator: Box<dyn Integrator>,
    pub sampler: Box<dyn Sampler>,
    pub output: PathBuf,
}

impl RenderJob {
    /// Load a scene file. Relative paths inside it resolve against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let description = SceneDescription::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_description(&description, base_dir)
    }

    pub fn from_description(description: &SceneDescription, base_dir: &Path) -> RenderResult<Self> {
        description.validate()?;
        let output = description
            .output
            .as_ref()
            .ok_or(ConfigError::MissingOutput)?;

        let mut builder = SceneBuilder::new(description, base_dir);
        let scene = builder.scene()?;
        log::info!(
            "Scene ready: {} instances, {} lights, {} images, {} meshes",
            description.instances.len(),
            scene.lights().len(),
            builder.images.len(),
            builder.meshes.len()
        );

        Ok(Self {
            scene,
            integrator: build_integrator(&description.integrator),
            sampler: build_sampler(&description.sampler),
            output: base_dir.join(output),
        })
    }
}

pub fn build_integrator(desc: &IntegratorDesc) -> Box<dyn Integrator> {
    match desc {
        IntegratorDesc::Pathtracer { depth } => Box::new(PathTracer::new(*depth)),
        IntegratorDesc::Direct => Box::new(DirectIntegrator::new()),
        IntegratorDesc::Normals { remap } => Box::new(NormalsIntegrator::new(*remap)),
        IntegratorDesc::Albedo => Box::new(AlbedoIntegrator),
        IntegratorDesc::BvhStats { unit } => Box::new(BvhStatsIntegrator::new(*unit)),
    }
}

pub fn build_sampler(desc: &SamplerDesc) -> Box<dyn Sampler> {
    match desc {
        SamplerDesc::Independent { count, seed } => Box::new(IndependentSampler::new(*count, *seed)),
        SamplerDesc::Halton { count, seed } => Box::new(HaltonSampler::new(*count, *seed)),
    }
}

/// Turns descriptions into objects, sharing what can be shared.
struct SceneBuilder<'a> {
    description: &'a SceneDescription,
    base_dir: PathBuf,
    images: ImageCache,
    meshes: HashMap<(PathBuf, bool), Arc<dyn Shape>>,
    shared: HashMap<String, Arc<dyn Shape>>,
    /// Shared ids currently being built, innermost last
    resolving: Vec<String>,
}

impl<'a> SceneBuilder<'a> {
    fn new(description: &'a SceneDescription, base_dir: &Path) -> Self {
        Self {
            description,
            base_dir: base_dir.to_path_buf(),
            images: ImageCache::with_base_dir(base_dir),
            meshes: HashMap::new(),
            shared: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    fn scene(&mut self) -> RenderResult<Scene> {
        let description = self.description;

        let camera = self.camera(&description.camera)?;
        let shapes = description
            .instances
            .iter()
            .enumerate()
            .map(|(i, instance)| self.instance(instance, &format!("instance {}", i)))
            .collect::<RenderResult<Vec<_>>>()?;

        let mut scene = Scene::new(camera, shapes);
        for light in &description.lights {
            scene = match light {
                LightDesc::Point { position, power } => {
                    scene.with_light(Arc::new(PointLight::new(*position, *power)))
                }
                LightDesc::Directional {
                    direction,
                    intensity,
                } => scene.with_light(Arc::new(DirectionalLight::new(*direction, *intensity))),
                LightDesc::Envmap { texture, transform } => {
                    let mut envmap = EnvironmentMap::new(self.texture(texture)?);
                    if let Some(transform) = self.transform(transform, "envmap")? {
                        envmap = envmap.with_transform(transform);
                    }
                    let envmap = Arc::new(envmap);
                    scene.with_light(envmap.clone()).with_background(envmap)
                }
            };
        }
        Ok(scene)
    }

    fn camera(&mut self, desc: &CameraDesc) -> RenderResult<Arc<dyn Camera>> {
        let CameraDesc::Perspective {
            width,
            height,
            fov,
            fov_axis,
            transform,
            aperture_radius,
            focus_distance,
        } = desc;

        let to_world = self
            .transform(transform, "camera")?
            .unwrap_or(Transform::IDENTITY);
        let mut camera = PerspectiveCamera::new(UVec2::new(*width, *height), *fov, *fov_axis, to_world);
        if *aperture_radius > 0.0 {
            camera = camera.with_thin_lens(*aperture_radius, *focus_distance);
        }
        Ok(Arc::new(camera))
    }

    fn transform(&self, ops: &[TransformOp], what: &str) -> RenderResult<Option<Transform>> {
        let Some(transform) = compose_transform(ops) else {
            return Ok(None);
        };
        if !transform.is_invertible() {
            log::warn!(
                "Transform of {} collapses space (determinant {})",
                what,
                transform.determinant()
            );
            return Err(ConfigError::SingularTransform(what.to_string()).into());
        }
        Ok(Some(transform))
    }

    fn instance(&mut self, desc: &InstanceDesc, what: &str) -> RenderResult<Arc<dyn Shape>> {
        let mut instance = Instance::new(self.shape(&desc.shape)?);
        if let Some(bsdf) = &desc.bsdf {
            instance = instance.with_bsdf(self.bsdf(bsdf)?);
        }
        if let Some(emission) = &desc.emission {
            instance = instance.with_emission(self.emission(emission)?);
        }
        if let Some(normal) = &desc.normal {
            instance = instance.with_normal_map(self.texture(normal)?);
        }
        if let Some(transform) = self.transform(&desc.transform, what)? {
            instance = instance.with_transform(transform);
        }
        Ok(Arc::new(instance))
    }

    fn shape(&mut self, desc: &ShapeDesc) -> RenderResult<Arc<dyn Shape>> {
        Ok(match desc {
            ShapeDesc::Sphere => Arc::new(Sphere::new()),
            ShapeDesc::Rectangle => Arc::new(Rectangle::new()),
            ShapeDesc::Mesh { filename, smooth } => self.mesh(filename, *smooth)?,
            ShapeDesc::Group { children } => {
                let children = children
                    .iter()
                    .enumerate()
                    .map(|(i, child)| self.instance(child, &format!("group child {}", i)))
                    .collect::<RenderResult<Vec<_>>>()?;
                Arc::new(Group::new(children))
            }
            ShapeDesc::Ref { id } => self.shared(id)?,
        })
    }

    fn mesh(&mut self, filename: &Path, smooth: bool) -> RenderResult<Arc<dyn Shape>> {
        let path = self.base_dir.join(filename);
        let key = (path, smooth);
        if let Some(mesh) = self.meshes.get(&key) {
            return Ok(mesh.clone());
        }

        let mesh = Arc::new(load_obj(&key.0)?);
        log::info!(
            "Loaded mesh {}: {} triangles",
            key.0.display(),
            mesh.triangle_count()
        );
        let shape: Arc<dyn Shape> = Arc::new(TriangleMesh::new(mesh, smooth));
        self.meshes.insert(key, shape.clone());
        Ok(shape)
    }

    /// Build an entry of the shared table once, handing out the same
    /// [`Arc`] to every reference.
    fn shared(&mut self, id: &str) -> RenderResult<Arc<dyn Shape>> {
        if let Some(shape) = self.shared.get(id) {
            return Ok(shape.clone());
        }
        if self.resolving.iter().any(|r| r == id) {
            return Err(ConfigError::CyclicReference(id.to_string()).into());
        }

        let description = self.description;
        let desc = description
            .shared
            .get(id)
            .ok_or_else(|| ConfigError::UnknownReference(id.to_string()))?;

        self.resolving.push(id.to_string());
        let shape = self.shape(desc);
        self.resolving.pop();

        let shape = shape?;
        self.shared.insert(id.to_string(), shape.clone());
        Ok(shape)
    }

    fn bsdf(&mut self, desc: &BsdfDesc) -> RenderResult<Arc<dyn Bsdf>> {
        Ok(match desc {
            BsdfDesc::Diffuse { albedo } => Arc::new(Diffuse::new(self.texture(albedo)?)),
            BsdfDesc::Dielectric {
                ior,
                reflectance,
                transmittance,
            } => Arc::new(Dielectric::new(
                self.texture(ior)?,
                self.texture(reflectance)?,
                self.texture(transmittance)?,
            )),
            BsdfDesc::RoughConductor {
                reflectance,
                roughness,
            } => Arc::new(RoughConductor::new(
                self.texture(reflectance)?,
                self.texture(roughness)?,
            )),
            BsdfDesc::RoughDielectric {
                ior,
                reflectance,
                transmittance,
                roughness,
            } => Arc::new(RoughDielectric::new(
                self.texture(ior)?,
                self.texture(reflectance)?,
                self.texture(transmittance)?,
                self.texture(roughness)?,
            )),
            BsdfDesc::Principled {
                base_color,
                roughness,
                metallic,
                specular,
            } => Arc::new(Principled::new(
                self.texture(base_color)?,
                self.texture(roughness)?,
                self.texture(metallic)?,
                self.texture(specular)?,
            )),
        })
    }

    fn emission(&mut self, desc: &EmissionDesc) -> RenderResult<Arc<dyn Emission>> {
        Ok(match desc {
            EmissionDesc::Lambertian { emission } => Arc::new(Lambertian::new(self.texture(emission)?)),
        })
    }

    fn texture(&mut self, desc: &TextureDesc) -> RenderResult<Arc<dyn Texture>> {
        Ok(match desc {
            TextureDesc::Scalar(value) => Arc::new(ConstantTexture::scalar_value(*value)),
            TextureDesc::Color(color) => Arc::new(ConstantTexture::new(*color)),
            TextureDesc::Node(TextureNode::Constant { value }) => Arc::new(ConstantTexture::new(*value)),
            TextureDesc::Node(TextureNode::Checkerboard {
                color0,
                color1,
                scale,
            }) => Arc::new(CheckerboardTexture {
                color0: *color0,
                color1: *color1,
                scale: *scale,
            }),
            TextureDesc::Node(TextureNode::Image {
                filename,
                exposure,
                border,
                filter,
            }) => Arc::new(ImageTexture {
                image: self.images.load(filename)?,
                exposure: *exposure,
                border: *border,
                filter: *filter,
            }),
        })
    }
}
