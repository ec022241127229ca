//! Phase functions for in-scattering inside participating media.

use lumen_math::{warp, Vec2, Vec3, INV_FOUR_PI};

pub trait PhaseFunction: Send + Sync {
    /// Sample an outgoing direction given the incident direction,
    /// together with its density. The importance weight is one
    /// because sampling matches the phase function exactly.
    fn sample(&self, wi: Vec3, sample: Vec2) -> (Vec3, f32);

    /// Directional density, normalized over the sphere.
    fn pdf(&self, wi: Vec3, wo: Vec3) -> f32;

    /// Phase function value; equals the pdf for a perfect sampler.
    fn eval(&self, wi: Vec3, wo: Vec3) -> f32 {
        self.pdf(wi, wo)
    }
}

/// Direction-independent scattering, 1/(4pi) everywhere.
pub struct IsotropicPhase;

impl PhaseFunction for IsotropicPhase {
    fn sample(&self, _wi: Vec3, sample: Vec2) -> (Vec3, f32) {
        (warp::square_to_uniform_sphere(sample), INV_FOUR_PI)
    }

    fn pdf(&self, _wi: Vec3, _wo: Vec3) -> f32 {
        INV_FOUR_PI
    }
}
