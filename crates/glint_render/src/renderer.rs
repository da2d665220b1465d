//! Image-space driver: spreads buckets over worker threads and writes the
//! averaged estimates into an [`ImageBuffer`].

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use glint_math::{Color, UVec2};

use crate::bucket::{generate_buckets, Bucket, BucketQueue, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::error::{RenderError, RenderResult};
use crate::integrator::Integrator;
use crate::progress::Progress;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Edge length of a bucket in pixels
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let encode = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [encode(color.x), encode(color.y), encode(color.z), 255]
}

/// Linear-light frame buffer.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.offset(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let offset = self.offset(x, y);
        self.pixels[offset] = color;
    }

    /// Copy a finished bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        for (pixel, color) in result.bucket.pixels().zip(&result.pixels) {
            self.set(pixel.x, pixel.y, *color);
        }
    }

    /// Write the image. `.exr` and `.hdr` keep linear floats; anything else
    /// is stored as 8-bit gamma-encoded RGBA.
    pub fn save(&self, path: &Path) -> RenderResult<()> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let output_error = |source| RenderError::Output {
            path: path.to_path_buf(),
            source,
        };

        match extension.as_deref() {
            Some("exr") => {
                let data = bytemuck::cast_slice::<Color, f32>(&self.pixels).to_vec();
                let image = image::Rgb32FImage::from_raw(self.width, self.height, data)
                    .ok_or_else(|| output_error(dimension_error()))?;
                image.save(path).map_err(output_error)?;
            }
            Some("hdr") => {
                let file = File::create(path).map_err(|source| RenderError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let pixels: Vec<image::Rgb<f32>> =
                    self.pixels.iter().map(|c| image::Rgb(c.to_array())).collect();
                image::codecs::hdr::HdrEncoder::new(BufWriter::new(file))
                    .encode(&pixels, self.width as usize, self.height as usize)
                    .map_err(output_error)?;
            }
            _ => {
                let image = image::RgbaImage::from_fn(self.width, self.height, |x, y| {
                    image::Rgba(color_to_rgba(self.get(x, y)))
                });
                image.save(path).map_err(output_error)?;
            }
        }

        log::info!("Wrote {}", path.display());
        Ok(())
    }
}

fn dimension_error() -> image::ImageError {
    image::ImageError::Parameter(image::error::ParameterError::from_kind(
        image::error::ParameterErrorKind::DimensionMismatch,
    ))
}

/// Average of all samples of one pixel.
pub fn render_pixel(
    scene: &Scene,
    integrator: &dyn Integrator,
    rng: &mut dyn Sampler,
    pixel: UVec2,
) -> Color {
    let spp = rng.samples_per_pixel();
    if spp == 0 {
        return Color::ZERO;
    }

    let mut sum = Color::ZERO;
    for sample in 0..spp {
        rng.seed_pixel(pixel, sample);
        let camera_sample = scene.camera().sample(pixel, rng);
        sum += camera_sample.weight * integrator.li(&camera_sample.ray, scene, rng);
    }
    sum / spp as f32
}

/// Render a single bucket; pixels are returned in row-major order.
pub fn render_bucket(
    bucket: &Bucket,
    scene: &Scene,
    integrator: &dyn Integrator,
    rng: &mut dyn Sampler,
) -> Vec<Color> {
    bucket
        .pixels()
        .map(|pixel| render_pixel(scene, integrator, rng, pixel))
        .collect()
}

/// Render the whole frame on the current rayon pool.
///
/// Every pool thread runs one worker with its own copy of `sampler`;
/// workers pull buckets from a shared queue until it is empty.
pub fn render(
    scene: &Scene,
    integrator: &dyn Integrator,
    sampler: &dyn Sampler,
    config: &RenderConfig,
) -> ImageBuffer {
    let resolution = scene.camera().resolution();
    let mut image = ImageBuffer::new(resolution.x, resolution.y);

    let queue = BucketQueue::new(generate_buckets(
        resolution.x,
        resolution.y,
        config.bucket_size,
    ));
    let progress = Progress::new(resolution.x as usize * resolution.y as usize);
    let workers = rayon::current_num_threads().max(1);

    log::info!(
        "Rendering {}x{} at {} spp: {} buckets on {} threads",
        resolution.x,
        resolution.y,
        sampler.samples_per_pixel(),
        queue.len(),
        workers
    );
    let start = Instant::now();

    let samplers: Vec<Box<dyn Sampler>> = (0..workers).map(|_| sampler.clone_box()).collect();
    let (tx, rx) = mpsc::channel::<BucketResult>();
    {
        let queue = &queue;
        let progress = &progress;
        // Moving `tx` in closes the channel once every worker is done.
        rayon::scope(move |s| {
            for mut rng in samplers {
                let tx = tx.clone();
                s.spawn(move |_| {
                    while let Some(bucket) = queue.pop() {
                        let pixels = render_bucket(&bucket, scene, integrator, rng.as_mut());
                        progress.advance(bucket.pixel_count() as usize);
                        // The receiver outlives the scope.
                        let _ = tx.send(BucketResult::new(bucket, pixels));
                    }
                });
            }
        });
    }

    for result in rx.try_iter() {
        image.write_bucket(&result);
    }

    let elapsed = start.elapsed().as_secs_f64();
    let samples = progress.completed() as f64 * sampler.samples_per_pixel() as f64;
    log::info!(
        "Render finished in {:.2}s ({:.2} Msamples/s)",
        elapsed,
        samples / elapsed.max(1e-9) / 1e6
    );

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, FovAxis, PerspectiveCamera};
    use crate::integrator::NormalsIntegrator;
    use crate::sampler::IndependentSampler;
    use crate::shape::{Instance, Shape, Sphere};
    use glint_math::{Mat4, Transform, Vec3};
    use std::sync::Arc;

    fn sphere_scene(width: u32, height: u32) -> Scene {
        let camera = PerspectiveCamera::new(UVec2::new(width, height), 30.0, FovAxis::X, Transform::IDENTITY);
        let sphere = Instance::new(Arc::new(Sphere::new()))
            .with_transform(Transform::new(Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0))));
        Scene::new(Arc::new(camera), vec![Arc::new(sphere) as Arc<dyn Shape>])
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
        assert_eq!(color_to_rgba(Color::new(4.0, -1.0, 0.25)), [255, 0, 127, 255]);
    }

    #[test]
    fn test_write_bucket() {
        let mut image = ImageBuffer::new(4, 4);
        let bucket = Bucket::new(1, 2, 2, 2, 0);
        let pixels = (0..4).map(|i| Color::splat(i as f32)).collect();
        image.write_bucket(&BucketResult::new(bucket, pixels));
        assert_eq!(image.get(1, 2), Color::splat(0.0));
        assert_eq!(image.get(2, 2), Color::splat(1.0));
        assert_eq!(image.get(1, 3), Color::splat(2.0));
        assert_eq!(image.get(2, 3), Color::splat(3.0));
        assert_eq!(image.get(0, 0), Color::ZERO);
    }

    #[test]
    fn test_pixel_offset_does_not_wrap() {
        let image = ImageBuffer {
            width: 70_000,
            height: 70_000,
            pixels: Vec::new(),
        };
        assert_eq!(image.offset(69_999, 69_999), 4_899_999_999);
        assert_eq!(image.offset(3, 1), 70_003);
    }

    #[test]
    fn test_render_fills_every_pixel() {
        let scene = sphere_scene(37, 23);
        let integrator = NormalsIntegrator::new(true);
        let sampler = IndependentSampler::new(2, 7);
        let config = RenderConfig { bucket_size: 8 };
        let image = render(&scene, &integrator, &sampler, &config);

        assert_eq!((image.width, image.height), (37, 23));
        // The sphere covers the center; the corners see nothing.
        assert!(image.get(18, 11).length() > 0.0);
        assert_eq!(image.get(0, 0), Color::ZERO);
    }

    #[test]
    fn test_render_is_deterministic() {
        let scene = sphere_scene(16, 16);
        let integrator = NormalsIntegrator::new(true);
        let sampler = IndependentSampler::new(4, 1);
        let config = RenderConfig { bucket_size: 5 };
        let a = render(&scene, &integrator, &sampler, &config);
        let b = render(&scene, &integrator, &sampler, &config);
        assert_eq!(a.pixels, b.pixels);
    }

    #[test]
    fn test_render_pixel_matches_single_thread() {
        let scene = sphere_scene(8, 8);
        let integrator = NormalsIntegrator::new(false);
        let sampler = IndependentSampler::new(3, 5);
        let image = render(&scene, &integrator, &sampler, &RenderConfig::default());
        let mut rng = sampler.clone_box();
        let pixel = UVec2::new(4, 4);
        let expected = render_pixel(&scene, &integrator, rng.as_mut(), pixel);
        assert_eq!(image.get(4, 4), expected);
        assert_eq!(scene.camera().resolution(), UVec2::new(8, 8));
    }

    #[test]
    fn test_save_png_and_exr() {
        let mut image = ImageBuffer::new(3, 2);
        image.set(1, 1, Color::new(0.5, 0.25, 1.0));
        let dir = std::env::temp_dir().join(format!("glint_save_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let png = dir.join("out.png");
        image.save(&png).unwrap();
        let loaded = image::open(&png).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(1, 1).0, color_to_rgba(Color::new(0.5, 0.25, 1.0)));

        let exr = dir.join("out.exr");
        image.save(&exr).unwrap();
        let loaded = image::open(&exr).unwrap().to_rgb32f();
        assert!((loaded.get_pixel(1, 1).0[1] - 0.25).abs() < 1e-6);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
