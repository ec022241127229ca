//! Albedo textures.
//!
//! Stores pixels in linear RGB float format. Lookup is nearest-sample
//! with wraparound for coordinates past 1 and clamping at the edges,
//! matching the per-texel albedo override of the diffuse material.

use crate::Color;
use std::path::Path;

/// A loaded texture with linear RGB pixel data.
#[derive(Clone, Debug)]
pub struct Texture {
    width: u32,
    height: u32,
    /// Row-major, top row first
    pixels: Vec<Color>,
}

impl Texture {
    /// Create a texture from raw linear pixels (row-major, top row first).
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Load a texture file, converting 8-bit sRGB-ish data to linear
    /// with the renderer's gamma-2 convention.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgb32f();
        let (width, height) = (img.width(), img.height());
        let pixels = img
            .pixels()
            .map(|p| Color::new(p.0[0], p.0[1], p.0[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Nearest-sample lookup. `uv` has (0,0) at the bottom-left of the
    /// image; v is flipped into row order.
    pub fn lookup(&self, u: f32, v: f32) -> Color {
        let mut x = (u * self.width as f32) as i64;
        let mut y = ((1.0 - v) * self.height as f32) as i64;

        // Coordinates past one wrap around once
        if x >= self.width as i64 {
            x -= self.width as i64;
        }
        if y >= self.height as i64 {
            y -= self.height as i64;
        }

        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.pixels[(y * self.width + x) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        // 2x2: top row red, green; bottom row blue, white
        Texture::from_pixels(
            2,
            2,
            vec![
                Color::new(1.0, 0.0, 0.0),
                Color::new(0.0, 1.0, 0.0),
                Color::new(0.0, 0.0, 1.0),
                Color::new(1.0, 1.0, 1.0),
            ],
        )
    }

    #[test]
    fn test_lookup_corners() {
        let t = checker();
        // v = 0 addresses the bottom row
        assert_eq!(t.lookup(0.1, 0.1), Color::new(0.0, 0.0, 1.0));
        assert_eq!(t.lookup(0.9, 0.1), Color::new(1.0, 1.0, 1.0));
        // v near 1 addresses the top row
        assert_eq!(t.lookup(0.1, 0.9), Color::new(1.0, 0.0, 0.0));
        assert_eq!(t.lookup(0.9, 0.9), Color::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_lookup_wraps_past_one() {
        let t = checker();
        assert_eq!(t.lookup(1.1, 0.9), t.lookup(0.1, 0.9));
    }

    #[test]
    fn test_lookup_clamps_out_of_range() {
        let t = checker();
        // Far out of range still lands on a valid texel
        let c = t.lookup(5.0, -3.0);
        assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
    }
}
