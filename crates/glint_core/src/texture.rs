//! Textures: constant values, procedural checkerboards and image lookups.
//!
//! All textures are evaluated at a surface uv coordinate and return linear
//! RGB. Images are loaded once through an [`ImageCache`] and shared.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glint_math::{Color, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {0} has zero size")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A spatially varying color.
pub trait Texture: Send + Sync {
    fn evaluate(&self, uv: Vec2) -> Color;

    /// Single-channel lookup (first channel).
    fn scalar(&self, uv: Vec2) -> f32 {
        self.evaluate(uv).x
    }
}

// ============================================================================
// Procedural textures
// ============================================================================

/// The same value everywhere.
#[derive(Clone, Copy, Debug)]
pub struct ConstantTexture {
    pub value: Color,
}

impl ConstantTexture {
    pub fn new(value: Color) -> Self {
        Self { value }
    }

    pub fn scalar_value(value: f32) -> Self {
        Self::new(Color::splat(value))
    }
}

impl Texture for ConstantTexture {
    fn evaluate(&self, _uv: Vec2) -> Color {
        self.value
    }
}

/// Alternating tiles of two colors.
#[derive(Clone, Copy, Debug)]
pub struct CheckerboardTexture {
    pub color0: Color,
    pub color1: Color,
    pub scale: Vec2,
}

impl Texture for CheckerboardTexture {
    fn evaluate(&self, uv: Vec2) -> Color {
        let odd = |x: f32| (x.floor() as i64).rem_euclid(2) == 1;
        if odd(uv.x * self.scale.x) == odd(uv.y * self.scale.y) {
            self.color0
        } else {
            self.color1
        }
    }
}

// ============================================================================
// Images
// ============================================================================

/// Behavior for uv coordinates outside `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderMode {
    Clamp,
    #[default]
    Repeat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Nearest,
    #[default]
    Bilinear,
}

/// Linear RGB pixels, row-major, row 0 at the top.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Load an image file. 8-bit images are treated as sRGB and linearized,
    /// floating point images (EXR, HDR) are used as-is.
    pub fn load(path: &Path) -> TextureResult<Self> {
        let name = path.display().to_string();
        let img = image::open(path).map_err(|source| TextureError::Load {
            path: name.clone(),
            source,
        })?;

        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(name));
        }

        let pixels: Vec<Color> = match img {
            image::DynamicImage::ImageRgb32F(_) | image::DynamicImage::ImageRgba32F(_) => img
                .to_rgb32f()
                .pixels()
                .map(|p| Color::new(p[0], p[1], p[2]))
                .collect(),
            _ => img
                .to_rgb8()
                .pixels()
                .map(|p| Color::new(srgb_to_linear(p[0]), srgb_to_linear(p[1]), srgb_to_linear(p[2])))
                .collect(),
        };

        Ok(Self::new(width, height, pixels))
    }

    /// Pixel at integer coordinates, which must be in range.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Color>()
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Texture backed by an [`Image`].
#[derive(Clone, Debug)]
pub struct ImageTexture {
    pub image: Arc<Image>,
    pub exposure: f32,
    pub border: BorderMode,
    pub filter: FilterMode,
}

impl ImageTexture {
    pub fn new(image: Arc<Image>) -> Self {
        Self {
            image,
            exposure: 1.0,
            border: BorderMode::default(),
            filter: FilterMode::default(),
        }
    }

    /// Map an integer pixel coordinate into the image according to the
    /// border mode.
    fn resolve(&self, x: i64, y: i64) -> (u32, u32) {
        let (w, h) = (self.image.width as i64, self.image.height as i64);
        match self.border {
            BorderMode::Clamp => (x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32),
            BorderMode::Repeat => (x.rem_euclid(w) as u32, y.rem_euclid(h) as u32),
        }
    }

    fn fetch(&self, x: i64, y: i64) -> Color {
        let (x, y) = self.resolve(x, y);
        self.image.get(x, y)
    }
}

impl Texture for ImageTexture {
    fn evaluate(&self, uv: Vec2) -> Color {
        // Flip v so that uv (0, 0) is the bottom-left of the image.
        let scaled = Vec2::new(
            uv.x * self.image.width as f32,
            (1.0 - uv.y) * self.image.height as f32,
        );

        let color = match self.filter {
            FilterMode::Nearest => self.fetch(scaled.x.floor() as i64, scaled.y.floor() as i64),
            FilterMode::Bilinear => {
                // Pixel centers sit at half-integer coordinates.
                let p = scaled - Vec2::splat(0.5);
                let (x0, y0) = (p.x.floor() as i64, p.y.floor() as i64);
                let fx = p.x - p.x.floor();
                let fy = p.y - p.y.floor();

                let top = self.fetch(x0, y0) * (1.0 - fx) + self.fetch(x0 + 1, y0) * fx;
                let bottom = self.fetch(x0, y0 + 1) * (1.0 - fx) + self.fetch(x0 + 1, y0 + 1) * fx;
                top * (1.0 - fy) + bottom * fy
            }
        };

        color * self.exposure
    }
}

/// Cache of loaded images keyed by resolved path.
///
/// Images referenced by several textures are decoded once.
#[derive(Default)]
pub struct ImageCache {
    images: HashMap<PathBuf, Arc<Image>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that resolves relative paths against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            images: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load an image from file, using the cache if available.
    pub fn load(&mut self, path: &Path) -> TextureResult<Arc<Image>> {
        let full_path = self.resolve_path(path);
        if let Some(image) = self.images.get(&full_path) {
            return Ok(image.clone());
        }

        let image = Arc::new(Image::load(&full_path)?);
        log::debug!(
            "Loaded image: {} ({}x{}, {:.1} KB)",
            full_path.display(),
            image.width,
            image.height,
            image.size_bytes() as f32 / 1024.0
        );

        self.images.insert(full_path, image.clone());
        Ok(image)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Resolve a path relative to the base directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> Arc<Image> {
        // 2x1: black on the left, white on the right
        Arc::new(Image::new(2, 1, vec![Color::ZERO, Color::ONE]))
    }

    #[test]
    fn test_constant_texture() {
        let tex = ConstantTexture::new(Color::new(1.0, 0.5, 0.0));
        let sample = tex.evaluate(Vec2::new(0.3, 0.9));
        assert!((sample.y - 0.5).abs() < 0.001);
        assert!((ConstantTexture::scalar_value(0.25).scalar(Vec2::ZERO) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_checkerboard_alternates() {
        let tex = CheckerboardTexture {
            color0: Color::ZERO,
            color1: Color::ONE,
            scale: Vec2::splat(2.0),
        };
        assert_eq!(tex.evaluate(Vec2::new(0.25, 0.25)), Color::ZERO);
        assert_eq!(tex.evaluate(Vec2::new(0.75, 0.25)), Color::ONE);
        assert_eq!(tex.evaluate(Vec2::new(0.75, 0.75)), Color::ZERO);
    }

    #[test]
    fn test_image_texture_nearest() {
        let mut tex = ImageTexture::new(gradient());
        tex.filter = FilterMode::Nearest;
        assert_eq!(tex.evaluate(Vec2::new(0.25, 0.5)), Color::ZERO);
        assert_eq!(tex.evaluate(Vec2::new(0.75, 0.5)), Color::ONE);
        // Repeat wraps around
        assert_eq!(tex.evaluate(Vec2::new(1.25, 0.5)), Color::ZERO);
    }

    #[test]
    fn test_image_texture_bilinear_midpoint() {
        let mut tex = ImageTexture::new(gradient());
        tex.border = BorderMode::Clamp;
        let mid = tex.evaluate(Vec2::new(0.5, 0.5));
        assert!((mid.x - 0.5).abs() < 1e-5);
        // Clamped at the left edge
        assert!(tex.evaluate(Vec2::new(0.0, 0.5)).x.abs() < 1e-5);
    }

    #[test]
    fn test_image_texture_exposure() {
        let mut tex = ImageTexture::new(gradient());
        tex.filter = FilterMode::Nearest;
        tex.exposure = 2.0;
        assert_eq!(tex.evaluate(Vec2::new(0.75, 0.5)), Color::splat(2.0));
    }

    #[test]
    fn test_image_cache_resolves_relative() {
        let cache = ImageCache::with_base_dir("/scenes");
        assert!(cache.is_empty());
        assert_eq!(
            cache.resolve_path(Path::new("tex/wood.png")),
            PathBuf::from("/scenes/tex/wood.png")
        );
        assert_eq!(
            cache.resolve_path(Path::new("/abs/wood.png")),
            PathBuf::from("/abs/wood.png")
        );
    }

    #[test]
    fn test_srgb_to_linear() {
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5 && mid > 0.1);
    }
}
