//! Image reconstruction filters.
//!
//! The accumulation machinery only consumes a radius and a 1D kernel
//! evaluation; kernels are separable in x and y.

pub trait ReconstructionFilter: Send + Sync {
    /// Half width of the kernel support, in pixels.
    fn radius(&self) -> f32;

    /// Kernel value at signed offset `x` from the sample position.
    fn eval(&self, x: f32) -> f32;
}

/// Nearest-pixel box kernel. Fastest, prone to aliasing.
pub struct BoxFilter;

impl ReconstructionFilter for BoxFilter {
    fn radius(&self) -> f32 {
        0.5
    }

    fn eval(&self, _x: f32) -> f32 {
        1.0
    }
}

/// Linear tent kernel over a one-pixel radius.
pub struct TentFilter;

impl ReconstructionFilter for TentFilter {
    fn radius(&self) -> f32 {
        1.0
    }

    fn eval(&self, x: f32) -> f32 {
        (1.0 - x.abs()).max(0.0)
    }
}
