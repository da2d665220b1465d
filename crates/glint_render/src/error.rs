//! Errors raised while building or writing a render.

use std::path::PathBuf;

use glint_core::{ConfigError, MeshError, TextureError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("failed to write image {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type RenderResult<T> = Result<T, RenderError>;
