//! Bucket-based tile scheduling.
//!
//! The image is split into square buckets visited in a spiral that starts
//! with a bucket centered on the image, so the middle of the frame is
//! rendered first.

use std::sync::Mutex;

use glint_math::{Color, IVec2, UVec2};

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Image coordinates of every pixel, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = UVec2> + '_ {
        (0..self.height)
            .flat_map(move |dy| (0..self.width).map(move |dx| UVec2::new(self.x + dx, self.y + dy)))
    }
}

/// Offset (in buckets) of the `index`-th bucket on ring `rank`.
///
/// Ring `rank` holds the `8 * rank` buckets at Chebyshev distance `rank`
/// from the center bucket.
fn spiral_offset(rank: i32, index: i32) -> IVec2 {
    if rank == 0 {
        return IVec2::ZERO;
    }
    let index = (index + 1) % (8 * rank);
    let quadrant = index / (2 * rank);
    let shift = index % (2 * rank);
    match quadrant {
        0 => IVec2::new(shift - rank, -rank),
        1 => IVec2::new(rank, shift - rank),
        2 => IVec2::new(rank - shift, rank),
        _ => IVec2::new(-rank, rank - shift),
    }
}

/// Split an image into buckets, ordered in a spiral from the center.
///
/// Buckets on the border are clipped to the image; together they cover
/// every pixel exactly once.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let mut buckets = Vec::new();
    if width == 0 || height == 0 || bucket_size == 0 {
        return buckets;
    }

    let image = IVec2::new(width as i32, height as i32);
    let size = IVec2::splat(bucket_size as i32);
    let origin = (image - size) / 2;

    for rank in 0.. {
        let ring_len = if rank == 0 { 1 } else { 8 * rank };
        let before = buckets.len();

        for index in 0..ring_len {
            let min = origin + size * spiral_offset(rank, index);
            let lo = min.max(IVec2::ZERO);
            let hi = (min + size).min(image);
            if hi.x > lo.x && hi.y > lo.y {
                let extent = hi - lo;
                buckets.push(Bucket::new(
                    lo.x as u32,
                    lo.y as u32,
                    extent.x as u32,
                    extent.y as u32,
                    buckets.len(),
                ));
            }
        }

        // A ring entirely outside the image means all further rings are too.
        if rank > 0 && buckets.len() == before {
            break;
        }
    }

    buckets
}

/// Work queue shared by the render workers.
///
/// The cursor lock is only held while popping.
pub struct BucketQueue {
    buckets: Vec<Bucket>,
    cursor: Mutex<usize>,
}

impl BucketQueue {
    pub fn new(buckets: Vec<Bucket>) -> Self {
        Self {
            buckets,
            cursor: Mutex::new(0),
        }
    }

    pub fn pop(&self) -> Option<Bucket> {
        let mut cursor = match self.cursor.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let bucket = self.buckets.get(*cursor).copied()?;
        *cursor += 1;
        Some(bucket)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// Pixel colors in row-major order
    pub pixels: Vec<Color>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<Color>) -> Self {
        Self { bucket, pixels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_exact_cover(buckets: &[Bucket], width: u32, height: u32) {
        let mut seen = HashSet::new();
        for bucket in buckets {
            assert!(bucket.x + bucket.width <= width);
            assert!(bucket.y + bucket.height <= height);
            for pixel in bucket.pixels() {
                assert!(seen.insert(pixel), "pixel {:?} covered twice", pixel);
            }
        }
        assert_eq!(seen.len(), (width * height) as usize);
    }

    #[test]
    fn test_generate_buckets_exact_fit() {
        let buckets = generate_buckets(128, 128, 64);
        assert_exact_cover(&buckets, 128, 128);
    }

    #[test]
    fn test_generate_buckets_partial_fit() {
        let buckets = generate_buckets(100, 70, 64);
        assert_exact_cover(&buckets, 100, 70);
        let total_pixels: u32 = buckets.iter().map(|b| b.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 70);
    }

    #[test]
    fn test_spiral_order() {
        let buckets = generate_buckets(192, 192, 64);
        assert_eq!(buckets.len(), 9);

        // First bucket is the center one
        let first = &buckets[0];
        assert_eq!((first.x, first.y), (64, 64));

        // Indices follow the render order
        for (i, bucket) in buckets.iter().enumerate() {
            assert_eq!(bucket.index, i);
        }
    }

    #[test]
    fn test_wide_image_keeps_going_sideways() {
        let buckets = generate_buckets(1000, 10, 16);
        assert_exact_cover(&buckets, 1000, 10);
    }

    #[test]
    fn test_spiral_ring_visits_each_offset_once() {
        for rank in 1..4 {
            let offsets: HashSet<_> = (0..8 * rank).map(|i| spiral_offset(rank, i)).collect();
            assert_eq!(offsets.len(), (8 * rank) as usize);
            assert!(offsets.iter().all(|o| o.x.abs().max(o.y.abs()) == rank));
        }
    }

    #[test]
    fn test_queue_pops_in_order() {
        // A centered 64-wide block plus a clipped 32-wide block on each side.
        let queue = BucketQueue::new(generate_buckets(128, 64, 64));
        assert_eq!(queue.len(), 3);
        let popped: Vec<Bucket> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(popped.iter().map(|b| b.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!((popped[0].x, popped[0].width), (32, 64));
        assert!(popped[1..].iter().all(|b| b.width == 32));
        assert!(queue.pop().is_none());
    }
}
