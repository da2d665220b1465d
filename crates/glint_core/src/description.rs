//! Declarative scene description.
//!
//! A scene file is JSON. Every polymorphic object (camera, sampler,
//! integrator, shape, bsdf, emission, light, texture) is an internally
//! tagged enum, so the set of constructible types is closed and checked
//! by serde before anything is built.
//!
//! ```json
//! {
//!   "camera": { "type": "perspective", "width": 640, "height": 480, "fov": 40,
//!               "transform": [{ "look_at": { "origin": [0, 0, 5], "target": [0, 0, 0] } }] },
//!   "integrator": { "type": "pathtracer", "depth": 5 },
//!   "sampler": { "type": "independent", "count": 64 },
//!   "output": "render.exr",
//!   "instances": [
//!     { "shape": { "type": "sphere" }, "bsdf": { "type": "diffuse", "albedo": 0.8 } }
//!   ],
//!   "lights": [{ "type": "point", "position": [0, 4, 4], "power": [200, 200, 200] }]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glint_math::{Color, Mat4, Transform, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::texture::{BorderMode, FilterMode};

/// Invalid or unreadable scene descriptions.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read scene file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed scene description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("The integrator has no output image")]
    MissingOutput,

    #[error("Invalid camera resolution {0}x{1}")]
    InvalidResolution(u32, u32),

    #[error("Field of view must be in (0, 180) degrees, got {0}")]
    InvalidFov(f32),

    #[error("Sample count must be at least 1")]
    InvalidSampleCount,

    #[error("Path depth must be at least 1")]
    InvalidDepth,

    #[error("Unknown shared shape \"{0}\"")]
    UnknownReference(String),

    #[error("Shared shape \"{0}\" references itself")]
    CyclicReference(String),

    #[error("Only one background light is supported, found {0}")]
    MultipleBackgrounds(usize),

    #[error("Group in {0} has no children")]
    EmptyGroup(String),

    #[error("Transform of {0} is not invertible")]
    SingularTransform(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ============================================================================
// Top level
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDescription {
    pub camera: CameraDesc,

    #[serde(default)]
    pub sampler: SamplerDesc,

    #[serde(default)]
    pub integrator: IntegratorDesc,

    /// Image written when rendering finishes
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Shapes that several instances refer to by name
    #[serde(default)]
    pub shared: BTreeMap<String, ShapeDesc>,

    #[serde(default)]
    pub instances: Vec<InstanceDesc>,

    #[serde(default)]
    pub lights: Vec<LightDesc>,
}

impl SceneDescription {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a scene file. Relative paths inside it are left
    /// untouched; resolve them against [`Path::parent`] of `path`.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let description = Self::from_json_str(&json)?;
        log::info!(
            "Loaded scene {}: {} instances, {} lights, {} shared shapes",
            path.display(),
            description.instances.len(),
            description.lights.len(),
            description.shared.len()
        );
        Ok(description)
    }

    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.output.is_none() {
            return Err(ConfigError::MissingOutput);
        }

        let CameraDesc::Perspective {
            width, height, fov, ..
        } = &self.camera;
        if *width == 0 || *height == 0 {
            return Err(ConfigError::InvalidResolution(*width, *height));
        }
        if !(*fov > 0.0 && *fov < 180.0) {
            return Err(ConfigError::InvalidFov(*fov));
        }

        if self.sampler.count() == 0 {
            return Err(ConfigError::InvalidSampleCount);
        }

        if let IntegratorDesc::Pathtracer { depth } = self.integrator {
            if depth == 0 {
                return Err(ConfigError::InvalidDepth);
            }
        }

        for (i, instance) in self.instances.iter().enumerate() {
            check_groups(&instance.shape, &format!("instance {}", i))?;
        }
        for (id, shape) in &self.shared {
            check_groups(shape, &format!("shared shape \"{}\"", id))?;
        }

        let backgrounds = self
            .lights
            .iter()
            .filter(|l| matches!(l, LightDesc::Envmap { .. }))
            .count();
        if backgrounds > 1 {
            return Err(ConfigError::MultipleBackgrounds(backgrounds));
        }

        Ok(())
    }
}

/// Empty groups have nothing to intersect or sample.
fn check_groups(shape: &ShapeDesc, what: &str) -> ConfigResult<()> {
    if let ShapeDesc::Group { children } = shape {
        if children.is_empty() {
            return Err(ConfigError::EmptyGroup(what.to_string()));
        }
        for child in children {
            check_groups(&child.shape, what)?;
        }
    }
    Ok(())
}

// ============================================================================
// Transforms
// ============================================================================

/// One step of a transform chain. Steps apply in order, each one after the
/// previous.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOp {
    Translate(Vec3),
    Scale(Vec3),
    /// Rotation by `angle` degrees around `axis`
    Rotate { axis: Vec3, angle: f32 },
    /// 4x4 matrix, row-major
    Matrix([f32; 16]),
    /// Camera-style placement: local +z looks at `target`, +y towards `up`
    LookAt {
        origin: Vec3,
        target: Vec3,
        #[serde(default = "default_up")]
        up: Vec3,
    },
}

fn default_up() -> Vec3 {
    Vec3::Y
}

impl TransformOp {
    pub fn to_matrix(&self) -> Mat4 {
        match self {
            TransformOp::Translate(t) => Mat4::from_translation(*t),
            TransformOp::Scale(s) => Mat4::from_scale(*s),
            TransformOp::Rotate { axis, angle } => {
                Mat4::from_axis_angle(axis.normalize_or_zero(), angle.to_radians())
            }
            TransformOp::Matrix(m) => Mat4::from_cols_array(m).transpose(),
            TransformOp::LookAt { origin, target, up } => {
                let forward = (*target - *origin).normalize_or_zero();
                let right = forward.cross(*up).normalize_or_zero();
                let up = right.cross(forward);
                Mat4::from_cols(
                    right.extend(0.0),
                    up.extend(0.0),
                    forward.extend(0.0),
                    origin.extend(1.0),
                )
            }
        }
    }
}

/// Compose a chain of operations. `None` for an empty chain.
pub fn compose_transform(ops: &[TransformOp]) -> Option<Transform> {
    if ops.is_empty() {
        return None;
    }
    let matrix = ops
        .iter()
        .fold(Mat4::IDENTITY, |acc, op| op.to_matrix() * acc);
    Some(Transform::new(matrix))
}

// ============================================================================
// Camera, sampler, integrator
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FovAxis {
    #[default]
    X,
    Y,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraDesc {
    Perspective {
        width: u32,
        height: u32,
        /// Field of view in degrees
        fov: f32,
        #[serde(default)]
        fov_axis: FovAxis,
        #[serde(default)]
        transform: Vec<TransformOp>,
        /// Thin lens radius; zero for a pinhole
        #[serde(default)]
        aperture_radius: f32,
        #[serde(default = "default_focus_distance")]
        focus_distance: f32,
    },
}

fn default_focus_distance() -> f32 {
    1.0
}

impl CameraDesc {
    pub fn resolution(&self) -> (u32, u32) {
        let CameraDesc::Perspective { width, height, .. } = self;
        (*width, *height)
    }
}

pub const DEFAULT_SEED: u64 = 1337;

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_sample_count() -> u32 {
    64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SamplerDesc {
    Independent {
        #[serde(default = "default_sample_count")]
        count: u32,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    Halton {
        #[serde(default = "default_sample_count")]
        count: u32,
        #[serde(default = "default_seed")]
        seed: u64,
    },
}

impl Default for SamplerDesc {
    fn default() -> Self {
        SamplerDesc::Independent {
            count: default_sample_count(),
            seed: DEFAULT_SEED,
        }
    }
}

impl SamplerDesc {
    pub fn count(&self) -> u32 {
        match self {
            SamplerDesc::Independent { count, .. } | SamplerDesc::Halton { count, .. } => *count,
        }
    }

    pub fn with_count(mut self, new_count: u32) -> Self {
        match &mut self {
            SamplerDesc::Independent { count, .. } | SamplerDesc::Halton { count, .. } => {
                *count = new_count
            }
        }
        self
    }
}

fn default_depth() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_unit() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegratorDesc {
    Pathtracer {
        #[serde(default = "default_depth")]
        depth: u32,
    },
    Direct,
    Normals {
        /// Map normals from [-1, 1] to [0, 1]
        #[serde(default = "default_true")]
        remap: bool,
    },
    Albedo,
    BvhStats {
        /// Count that maps to full intensity
        #[serde(default = "default_unit")]
        unit: f32,
    },
}

impl Default for IntegratorDesc {
    fn default() -> Self {
        IntegratorDesc::Pathtracer {
            depth: default_depth(),
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDesc {
    Sphere,
    Rectangle,
    Mesh {
        filename: PathBuf,
        /// Interpolate vertex normals when the file has them
        #[serde(default = "default_true")]
        smooth: bool,
    },
    Group {
        children: Vec<InstanceDesc>,
    },
    /// Entry of [`SceneDescription::shared`]
    Ref {
        id: String,
    },
}

/// A shape together with its material bindings and placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceDesc {
    pub shape: ShapeDesc,

    #[serde(default)]
    pub bsdf: Option<BsdfDesc>,

    #[serde(default)]
    pub emission: Option<EmissionDesc>,

    #[serde(default)]
    pub transform: Vec<TransformOp>,

    /// Tangent-space normal map
    #[serde(default)]
    pub normal: Option<TextureDesc>,
}

// ============================================================================
// Materials and lights
// ============================================================================

/// Either a bare value or a texture node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextureDesc {
    Scalar(f32),
    Color(Vec3),
    Node(TextureNode),
}

impl From<f32> for TextureDesc {
    fn from(value: f32) -> Self {
        TextureDesc::Scalar(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextureNode {
    Constant {
        value: Color,
    },
    Checkerboard {
        color0: Color,
        color1: Color,
        #[serde(default = "default_checker_scale")]
        scale: Vec2,
    },
    Image {
        filename: PathBuf,
        #[serde(default = "default_unit")]
        exposure: f32,
        #[serde(default)]
        border: BorderMode,
        #[serde(default)]
        filter: FilterMode,
    },
}

fn default_checker_scale() -> Vec2 {
    Vec2::splat(10.0)
}

fn one() -> TextureDesc {
    TextureDesc::Scalar(1.0)
}

fn half() -> TextureDesc {
    TextureDesc::Scalar(0.5)
}

fn zero() -> TextureDesc {
    TextureDesc::Scalar(0.0)
}

fn glass_ior() -> TextureDesc {
    TextureDesc::Scalar(1.5)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BsdfDesc {
    Diffuse {
        #[serde(default = "half")]
        albedo: TextureDesc,
    },
    Dielectric {
        #[serde(default = "glass_ior")]
        ior: TextureDesc,
        #[serde(default = "one")]
        reflectance: TextureDesc,
        #[serde(default = "one")]
        transmittance: TextureDesc,
    },
    RoughConductor {
        #[serde(default = "one")]
        reflectance: TextureDesc,
        #[serde(default = "half")]
        roughness: TextureDesc,
    },
    RoughDielectric {
        #[serde(default = "glass_ior")]
        ior: TextureDesc,
        #[serde(default = "one")]
        reflectance: TextureDesc,
        #[serde(default = "one")]
        transmittance: TextureDesc,
        #[serde(default = "half")]
        roughness: TextureDesc,
    },
    Principled {
        #[serde(default = "half")]
        base_color: TextureDesc,
        #[serde(default = "half")]
        roughness: TextureDesc,
        #[serde(default = "zero")]
        metallic: TextureDesc,
        #[serde(default = "half")]
        specular: TextureDesc,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmissionDesc {
    Lambertian { emission: TextureDesc },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightDesc {
    Point {
        position: Vec3,
        /// Total emitted power
        power: Color,
    },
    Directional {
        /// Direction pointing towards the light
        direction: Vec3,
        intensity: Color,
    },
    /// Environment map around the scene; doubles as the background
    Envmap {
        texture: TextureDesc,
        #[serde(default)]
        transform: Vec<TransformOp>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "camera": { "type": "perspective", "width": 32, "height": 16, "fov": 45 },
        "output": "out.png",
        "instances": [
            { "shape": { "type": "sphere" }, "bsdf": { "type": "diffuse", "albedo": [0.8, 0.2, 0.1] } }
        ],
        "lights": [{ "type": "point", "position": [0, 2, 0], "power": [10, 10, 10] }]
    }"#;

    #[test]
    fn test_parse_minimal_scene() {
        let desc = SceneDescription::from_json_str(MINIMAL).unwrap();
        desc.validate().unwrap();
        assert_eq!(desc.camera.resolution(), (32, 16));
        assert_eq!(desc.sampler.count(), 64);
        assert!(matches!(desc.integrator, IntegratorDesc::Pathtracer { depth: 2 }));
        assert_eq!(desc.instances.len(), 1);
        match &desc.instances[0].bsdf {
            Some(BsdfDesc::Diffuse {
                albedo: TextureDesc::Color(c),
            }) => assert!((c.x - 0.8).abs() < 1e-6),
            other => panic!("unexpected bsdf {:?}", other),
        }
    }

    #[test]
    fn test_missing_output_is_rejected() {
        let json = MINIMAL.replace(r#""output": "out.png","#, "");
        let desc = SceneDescription::from_json_str(&json).unwrap();
        assert!(matches!(desc.validate(), Err(ConfigError::MissingOutput)));
    }

    #[test]
    fn test_unknown_type_is_parse_error() {
        let json = MINIMAL.replace(r#""type": "sphere""#, r#""type": "torus""#);
        assert!(matches!(
            SceneDescription::from_json_str(&json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let json = MINIMAL.replace(
            r#""output""#,
            r#""integrator": { "type": "pathtracer", "depth": 0 }, "output""#,
        );
        let desc = SceneDescription::from_json_str(&json).unwrap();
        assert!(matches!(desc.validate(), Err(ConfigError::InvalidDepth)));
    }

    #[test]
    fn test_empty_group_rejected() {
        let json = MINIMAL.replace(
            r#"{ "type": "sphere" }"#,
            r#"{ "type": "group", "children": [{ "shape": { "type": "group", "children": [] } }] }"#,
        );
        let desc = SceneDescription::from_json_str(&json).unwrap();
        assert!(matches!(
            desc.validate(),
            Err(ConfigError::EmptyGroup(what)) if what == "instance 0"
        ));
    }

    #[test]
    fn test_texture_desc_variants() {
        let t: TextureDesc = serde_json::from_str("0.25").unwrap();
        assert!(matches!(t, TextureDesc::Scalar(v) if (v - 0.25).abs() < 1e-6));
        let t: TextureDesc =
            serde_json::from_str(r#"{ "type": "checkerboard", "color0": [0,0,0], "color1": [1,1,1] }"#)
                .unwrap();
        assert!(matches!(t, TextureDesc::Node(TextureNode::Checkerboard { .. })));
        let t: TextureDesc =
            serde_json::from_str(r#"{ "type": "image", "filename": "a.png", "border": "clamp" }"#).unwrap();
        assert!(matches!(
            t,
            TextureDesc::Node(TextureNode::Image { border: BorderMode::Clamp, .. })
        ));
    }

    #[test]
    fn test_transform_ops_apply_in_order() {
        let ops: Vec<TransformOp> =
            serde_json::from_str(r#"[{ "scale": [2, 2, 2] }, { "translate": [1, 0, 0] }]"#).unwrap();
        let t = compose_transform(&ops).unwrap();
        // Scale first, then translate
        assert!((t.apply_point(Vec3::X) - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
        assert!(compose_transform(&[]).is_none());
    }

    #[test]
    fn test_look_at_points_local_z_at_target() {
        let op = TransformOp::LookAt {
            origin: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        };
        let m = op.to_matrix();
        assert!((m.transform_vector3(Vec3::Z) - Vec3::NEG_Z).length() < 1e-5);
        assert!((m.transform_vector3(Vec3::Y) - Vec3::Y).length() < 1e-5);
        assert!((m.transform_vector3(Vec3::X) - Vec3::X).length() < 1e-5);
        assert!((m.transform_point3(Vec3::ZERO) - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn test_matrix_op_is_row_major() {
        let op = TransformOp::Matrix([
            1.0, 0.0, 0.0, 4.0, //
            0.0, 1.0, 0.0, 5.0, //
            0.0, 0.0, 1.0, 6.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        let p = op.to_matrix().transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(4.0, 5.0, 6.0));
    }
}
