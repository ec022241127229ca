//! Random sample source.
//!
//! Integrators consume an opaque stream of independent uniform variates.
//! Each worker thread forks the scene's sampler prototype once per tile,
//! keyed by the tile index, so the stream feeding a given tile does not
//! depend on which thread happens to render it.

use lumen_math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A stream of uniform samples on `[0,1)`.
///
/// `Sync` so a prototype held by the scene can be forked from worker
/// threads.
pub trait Sampler: Send + Sync {
    /// Next 1D sample.
    fn next_1d(&mut self) -> f32;

    /// Next 2D sample.
    fn next_2d(&mut self) -> Vec2;

    /// Target number of estimates per pixel.
    fn sample_count(&self) -> u32;

    /// Derive an independent stream for the given index.
    ///
    /// Forked streams are deterministic functions of the base seed and
    /// the index only.
    fn fork(&self, stream: u64) -> Box<dyn Sampler>;
}

/// Independent uniform sampler backed by a seeded `StdRng`.
pub struct IndependentSampler {
    rng: StdRng,
    seed: u64,
    sample_count: u32,
}

impl IndependentSampler {
    pub fn new(seed: u64, sample_count: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            sample_count,
        }
    }
}

/// splitmix64 finalizer, decorrelates consecutive stream indices.
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

impl Sampler for IndependentSampler {
    fn next_1d(&mut self) -> f32 {
        self.rng.gen()
    }

    fn next_2d(&mut self) -> Vec2 {
        Vec2::new(self.rng.gen(), self.rng.gen())
    }

    fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn fork(&self, stream: u64) -> Box<dyn Sampler> {
        Box::new(IndependentSampler::new(
            mix(self.seed ^ mix(stream)),
            self.sample_count,
        ))
    }
}
