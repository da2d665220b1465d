//! glint core - scene data that does not depend on the renderer.
//!
//! This crate provides:
//!
//! - **Geometry**: [`Mesh`] and OBJ loading
//! - **Textures**: constant, checkerboard and image textures
//! - **Scene descriptions**: the serde model of a scene file and its
//!   validation errors
//!
//! # Example
//!
//! ```ignore
//! use glint_core::SceneDescription;
//!
//! let description = SceneDescription::load("scenes/cornell.json")?;
//! description.validate()?;
//! ```

pub mod description;
pub mod mesh;
pub mod texture;

// Re-export commonly used types
pub use description::{ConfigError, ConfigResult, SceneDescription};
pub use mesh::{load_obj, Mesh, MeshError, MeshResult};
pub use texture::{
    CheckerboardTexture, ConstantTexture, Image, ImageCache, ImageTexture, Texture, TextureError,
    TextureResult,
};
