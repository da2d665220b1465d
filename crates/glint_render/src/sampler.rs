//! Random number sources for Monte Carlo integration.
//!
//! Every sampler can be re-seeded for a given pixel and sample index, so a
//! pixel's estimate does not depend on which worker thread rendered it.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glint_math::{UVec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Largest f32 below one.
pub const ONE_MINUS_EPSILON: f32 = 1.0 - f32::EPSILON / 2.0;

/// A source of uniformly distributed numbers in `[0, 1)`.
pub trait Sampler: Send {
    /// Reset the sequence for sample `sample_index` of `pixel`.
    fn seed_pixel(&mut self, pixel: UVec2, sample_index: u32);

    /// Reset the sequence to a pixel-independent stream.
    fn seed(&mut self, index: u64);

    fn next_1d(&mut self) -> f32;

    fn next_2d(&mut self) -> Vec2 {
        let x = self.next_1d();
        Vec2::new(x, self.next_1d())
    }

    /// Number of samples to take per pixel.
    fn samples_per_pixel(&self) -> u32;

    /// Independent copy for another worker thread.
    fn clone_box(&self) -> Box<dyn Sampler>;
}

fn hash_seed(values: impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    values.hash(&mut hasher);
    hasher.finish()
}

// ============================================================================
// Independent
// ============================================================================

/// Uncorrelated pseudo-random numbers from a xoshiro256++ generator.
#[derive(Clone)]
pub struct IndependentSampler {
    seed: u64,
    count: u32,
    rng: Xoshiro256PlusPlus,
}

impl IndependentSampler {
    pub fn new(count: u32, seed: u64) -> Self {
        Self {
            seed,
            count,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl Sampler for IndependentSampler {
    fn seed_pixel(&mut self, pixel: UVec2, sample_index: u32) {
        let seed = hash_seed((self.seed, pixel.x, pixel.y, sample_index));
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    }

    fn seed(&mut self, index: u64) {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(hash_seed((self.seed, index)));
    }

    fn next_1d(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn samples_per_pixel(&self) -> u32 {
        self.count
    }

    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Halton
// ============================================================================

/// Number of Halton dimensions with their own prime base.
const HALTON_DIMENSIONS: usize = 256;

const PRIMES: [u32; HALTON_DIMENSIONS] = first_primes();

const fn first_primes() -> [u32; HALTON_DIMENSIONS] {
    let mut primes = [0u32; HALTON_DIMENSIONS];
    let mut count = 0;
    let mut candidate = 2u32;
    while count < HALTON_DIMENSIONS {
        let mut i = 0;
        let mut is_prime = true;
        while i < count && primes[i] * primes[i] <= candidate {
            if candidate % primes[i] == 0 {
                is_prime = false;
                break;
            }
            i += 1;
        }
        if is_prime {
            primes[count] = candidate;
            count += 1;
        }
        candidate += 1;
    }
    primes
}

/// Van der Corput radical inverse of `index` in `base`.
pub fn radical_inverse(base: u32, mut index: u64) -> f32 {
    let base = base as u64;
    let inv_base = 1.0 / base as f64;
    let mut reversed = 0u64;
    let mut inv_base_n = 1.0f64;
    while index > 0 {
        let next = index / base;
        reversed = reversed * base + (index - next * base);
        inv_base_n *= inv_base;
        index = next;
    }
    ((reversed as f64 * inv_base_n) as f32).min(ONE_MINUS_EPSILON)
}

/// Low-discrepancy Halton sequence, one prime base per dimension, with a
/// random per-pixel shift (Cranley-Patterson rotation) to decorrelate
/// neighbouring pixels.
///
/// Past the last prime the bases repeat, but every further cycle of
/// dimensions draws a fresh set of shifts.
#[derive(Clone)]
pub struct HaltonSampler {
    seed: u64,
    count: u32,
    index: u64,
    dimension: usize,
    offsets: [f32; HALTON_DIMENSIONS],
    /// Seed of the current pixel's shifts
    offset_seed: u64,
    /// Dimension cycle the shifts in `offsets` belong to
    cycle: u64,
    pixel: Option<UVec2>,
}

impl HaltonSampler {
    pub fn new(count: u32, seed: u64) -> Self {
        let mut sampler = Self {
            seed,
            count,
            index: 1,
            dimension: 0,
            offsets: [0.0; HALTON_DIMENSIONS],
            offset_seed: seed,
            cycle: 0,
            pixel: None,
        };
        sampler.randomize_offsets(seed, 0);
        sampler
    }

    fn randomize_offsets(&mut self, offset_seed: u64, cycle: u64) {
        let seed = if cycle == 0 {
            offset_seed
        } else {
            hash_seed((offset_seed, cycle))
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        for offset in &mut self.offsets {
            *offset = rng.gen::<f32>();
        }
        self.offset_seed = offset_seed;
        self.cycle = cycle;
    }
}

impl Sampler for HaltonSampler {
    fn seed_pixel(&mut self, pixel: UVec2, sample_index: u32) {
        if self.pixel != Some(pixel) {
            self.randomize_offsets(hash_seed((self.seed, pixel.x, pixel.y)), 0);
            self.pixel = Some(pixel);
        } else if self.cycle != 0 {
            self.randomize_offsets(self.offset_seed, 0);
        }
        // Index 0 maps to the origin in every base; start at 1.
        self.index = sample_index as u64 + 1;
        self.dimension = 0;
    }

    fn seed(&mut self, index: u64) {
        self.randomize_offsets(hash_seed((self.seed, index)), 0);
        self.pixel = None;
        self.index = 1;
        self.dimension = 0;
    }

    fn next_1d(&mut self) -> f32 {
        let cycle = (self.dimension / HALTON_DIMENSIONS) as u64;
        if cycle != self.cycle {
            self.randomize_offsets(self.offset_seed, cycle);
        }
        let d = self.dimension % HALTON_DIMENSIONS;
        self.dimension += 1;
        let value = radical_inverse(PRIMES[d], self.index) + self.offsets[d];
        let value = value - value.floor();
        value.min(ONE_MINUS_EPSILON)
    }

    fn samples_per_pixel(&self) -> u32 {
        self.count
    }

    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }
}
