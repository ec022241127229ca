//! Tile-parallel render driver.
//!
//! Worker threads pull tiles from the generator, render them into
//! private scratch blocks with a sampler forked per tile index, and
//! the finished tiles are merged in index order after all workers
//! join. Forking by tile rather than by thread makes the output
//! bit-identical for any worker count; the ordered merge keeps the
//! floating-point accumulation order fixed where tile borders
//! overlap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info};

use crate::block::{BlockDescriptor, BlockGenerator, ImageBlock, BLOCK_SIZE};
use crate::filter::{ReconstructionFilter, TentFilter};
use crate::scene::Scene;
use crate::Color;
use lumen_math::Vec2;

pub struct RenderOptions {
    /// Cooperative cancellation, checked once per tile boundary
    pub cancel: Arc<AtomicBool>,
    pub block_size: u32,
    pub filter: Box<dyn ReconstructionFilter>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            block_size: BLOCK_SIZE,
            filter: Box::new(TentFilter),
        }
    }
}

/// Final normalized image in linear RGB, row-major, top row first.
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

/// Gamma-2 tonemap of one linear pixel to 8-bit RGBA.
pub fn color_to_rgba(c: Color) -> [u8; 4] {
    let encode = |v: f32| (v.max(0.0).sqrt().min(1.0) * 255.0 + 0.5) as u8;
    [encode(c.x), encode(c.y), encode(c.z), 0xff]
}

fn render_block(scene: &Scene, block: &BlockDescriptor, out: &mut ImageBlock, filter: &dyn ReconstructionFilter) {
    let camera = scene.camera();
    let integrator = scene.integrator();
    let mut sampler = scene.sampler().fork(block.index as u64);
    let spp = sampler.sample_count();

    for y in 0..block.size.1 {
        for x in 0..block.size.0 {
            let px = (block.offset.0 + x) as f32;
            let py = (block.offset.1 + y) as f32;
            // One jittered position per pixel, clamped below the
            // next raster boundary
            let jitter = sampler.next_2d();
            let pixel_sample = Vec2::new(
                (px + jitter.x).min(next_down(px + 1.0)),
                (py + jitter.y).min(next_down(py + 1.0)),
            );

            let mut color = Color::ZERO;
            for _ in 0..spp {
                let aperture = sampler.next_2d();
                let ray = camera.generate_ray(pixel_sample, aperture);
                color += integrator.estimate(scene, sampler.as_mut(), &ray);
            }
            out.put_sample(pixel_sample, color / spp as f32, filter);
        }
    }
}

/// Largest float strictly below `x`, for clamping jitter inside a
/// pixel.
fn next_down(x: f32) -> f32 {
    f32::from_bits(x.to_bits() - 1)
}

/// Render the scene into a normalized image.
pub fn render(scene: &Scene, opts: &RenderOptions) -> RenderedImage {
    let (width, height) = scene.camera().resolution();
    let generator = BlockGenerator::new((width, height), opts.block_size);
    let filter = opts.filter.as_ref();

    info!(
        "rendering {}x{} in {} tiles of {} px",
        width,
        height,
        generator.block_count(),
        opts.block_size
    );

    let finished: Mutex<Vec<(usize, ImageBlock)>> =
        Mutex::new(Vec::with_capacity(generator.block_count()));

    rayon::scope(|s| {
        for _ in 0..rayon::current_num_threads() {
            s.spawn(|_| {
                while !opts.cancel.load(Ordering::Relaxed) {
                    let block = match generator.next() {
                        Some(block) => block,
                        None => break,
                    };
                    let mut scratch = ImageBlock::new(block.offset, block.size, filter);
                    render_block(scene, &block, &mut scratch, filter);
                    debug!("tile {} done", block.index);
                    finished
                        .lock()
                        .expect("tile list poisoned")
                        .push((block.index, scratch));
                }
            });
        }
    });

    // Merge in tile order so border accumulation is reproducible
    let mut tiles = finished.into_inner().expect("tile list poisoned");
    tiles.sort_by_key(|(index, _)| *index);
    let mut result = ImageBlock::new((0, 0), (width, height), filter);
    for (_, tile) in &tiles {
        result.merge(tile);
    }

    RenderedImage {
        width,
        height,
        pixels: result.to_rgb(),
    }
}
