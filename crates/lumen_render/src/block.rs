//! Image tiles and the tile handout scheduler.
//!
//! An `ImageBlock` is an RGB+weight accumulation buffer with a border
//! wide enough for the reconstruction filter footprint, so samples
//! near a tile edge splat into the border instead of being clipped.
//! Merging adds a finished tile (border included) into the parent
//! buffer; accumulation is commutative, so only the merge order
//! matters for bit-exact reproducibility.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::filter::ReconstructionFilter;
use crate::Color;
use lumen_math::Vec2;

/// Default tile edge length in pixels.
pub const BLOCK_SIZE: u32 = 32;

/// Placement of one tile within the output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Tile index in row-major handout order
    pub index: usize,
    /// Top-left pixel of the tile
    pub offset: (u32, u32),
    /// Tile extent, clipped at the image edges
    pub size: (u32, u32),
}

/// Bordered accumulation buffer: rgb plus filter weight per pixel.
pub struct ImageBlock {
    offset: (u32, u32),
    size: (u32, u32),
    border: u32,
    radius: f32,
    /// Row-major (r, g, b, weight), stride `size.0 + 2 * border`
    data: Vec<[f32; 4]>,
}

impl ImageBlock {
    pub fn new(offset: (u32, u32), size: (u32, u32), filter: &dyn ReconstructionFilter) -> Self {
        let border = (filter.radius() - 0.5).ceil().max(0.0) as u32;
        let stride = (size.0 + 2 * border) as usize;
        let rows = (size.1 + 2 * border) as usize;
        Self {
            offset,
            size,
            border,
            radius: filter.radius(),
            data: vec![[0.0; 4]; stride * rows],
        }
    }

    pub fn offset(&self) -> (u32, u32) {
        self.offset
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    fn stride(&self) -> usize {
        (self.size.0 + 2 * self.border) as usize
    }

    /// Splat one sample at a raster-space position through the
    /// filter footprint.
    pub fn put_sample(&mut self, raster_pos: Vec2, value: Color, filter: &dyn ReconstructionFilter) {
        if !value.is_finite() {
            return;
        }

        // Convert to block-local coordinates with the pixel-center
        // half offset removed
        let pos = Vec2::new(
            raster_pos.x - 0.5 - (self.offset.0 as f32 - self.border as f32),
            raster_pos.y - 0.5 - (self.offset.1 as f32 - self.border as f32),
        );

        let width = self.size.0 as i64 + 2 * self.border as i64;
        let height = self.size.1 as i64 + 2 * self.border as i64;
        let x0 = ((pos.x - self.radius).ceil() as i64).max(0);
        let x1 = ((pos.x + self.radius).floor() as i64).min(width - 1);
        let y0 = ((pos.y - self.radius).ceil() as i64).max(0);
        let y1 = ((pos.y + self.radius).floor() as i64).min(height - 1);

        let stride = self.stride();
        for y in y0..=y1 {
            let wy = filter.eval(y as f32 - pos.y);
            for x in x0..=x1 {
                let weight = filter.eval(x as f32 - pos.x) * wy;
                let texel = &mut self.data[y as usize * stride + x as usize];
                texel[0] += weight * value.x;
                texel[1] += weight * value.y;
                texel[2] += weight * value.z;
                texel[3] += weight;
            }
        }
    }

    /// Accumulate a finished child tile, border included. The child
    /// must lie within this block's bordered extent.
    pub fn merge(&mut self, child: &ImageBlock) {
        let dx = child.offset.0 as i64 - self.offset.0 as i64;
        let dy = child.offset.1 as i64 - self.offset.1 as i64;
        let child_stride = child.stride();
        let stride = self.stride();
        let width = self.size.0 as i64 + 2 * self.border as i64;
        let height = self.size.1 as i64 + 2 * self.border as i64;

        for cy in 0..(child.size.1 + 2 * child.border) as i64 {
            let y = cy + dy + self.border as i64 - child.border as i64;
            if y < 0 || y >= height {
                continue;
            }
            for cx in 0..(child.size.0 + 2 * child.border) as i64 {
                let x = cx + dx + self.border as i64 - child.border as i64;
                if x < 0 || x >= width {
                    continue;
                }
                let src = child.data[cy as usize * child_stride + cx as usize];
                let dst = &mut self.data[y as usize * stride + x as usize];
                for c in 0..4 {
                    dst[c] += src[c];
                }
            }
        }
    }

    /// Normalize the interior to plain RGB, dropping the border.
    pub fn to_rgb(&self) -> Vec<Color> {
        let stride = self.stride();
        let mut out = Vec::with_capacity((self.size.0 * self.size.1) as usize);
        for y in 0..self.size.1 as usize {
            for x in 0..self.size.0 as usize {
                let texel =
                    self.data[(y + self.border as usize) * stride + x + self.border as usize];
                if texel[3] > 0.0 {
                    out.push(Color::new(texel[0], texel[1], texel[2]) / texel[3]);
                } else {
                    out.push(Color::ZERO);
                }
            }
        }
        out
    }
}

/// Thread-safe tile handout over a fixed row-major partition. Each
/// tile is issued exactly once.
pub struct BlockGenerator {
    image_size: (u32, u32),
    block_size: u32,
    blocks_x: u32,
    blocks_y: u32,
    next: AtomicUsize,
}

impl BlockGenerator {
    pub fn new(image_size: (u32, u32), block_size: u32) -> Self {
        Self {
            image_size,
            block_size,
            blocks_x: image_size.0.div_ceil(block_size),
            blocks_y: image_size.1.div_ceil(block_size),
            next: AtomicUsize::new(0),
        }
    }

    pub fn block_count(&self) -> usize {
        (self.blocks_x * self.blocks_y) as usize
    }

    /// Descriptor of tile `index`, clipped at the image edges.
    pub fn descriptor(&self, index: usize) -> BlockDescriptor {
        let bx = index as u32 % self.blocks_x;
        let by = index as u32 / self.blocks_x;
        let offset = (bx * self.block_size, by * self.block_size);
        BlockDescriptor {
            index,
            offset,
            size: (
                self.block_size.min(self.image_size.0 - offset.0),
                self.block_size.min(self.image_size.1 - offset.1),
            ),
        }
    }

    /// Hand out the next unissued tile.
    pub fn next(&self) -> Option<BlockDescriptor> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        if index < self.block_count() {
            Some(self.descriptor(index))
        } else {
            None
        }
    }
}
