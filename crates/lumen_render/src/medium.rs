//! Participating medium with free-flight sampling.
//!
//! A single axis-aligned heterogeneous medium. Collision distances
//! are drawn with delta tracking against the `max_density` majorant
//! and transmittance along shadow rays is estimated with ratio
//! tracking, so no closed-form integral of the density profile is
//! needed. A separate closed-form transmittance exists for the
//! homogeneous coefficients.

use crate::phase::PhaseFunction;
use crate::sampler::Sampler;
use crate::{max_channel, Color};
use lumen_math::{Aabb, Ray, Vec3, RAY_EPSILON};

/// Spatial variation of the extinction density inside the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityProfile {
    Constant,
    /// Exponential falloff from the bottom face of the bounds.
    ExponentialVertical,
}

/// Outcome of free-flight sampling along a ray segment.
#[derive(Debug, Clone, Copy)]
pub enum MediumEvent {
    /// A real collision: scatter at `p` with importance weight
    /// `weight` applied to the path throughput.
    Scatter { p: Vec3, weight: Color },
    /// The flight left the medium or overshot the segment.
    PassThrough,
}

pub struct Medium {
    sigma_a: Color,
    sigma_s: Color,
    sigma_t: Color,
    /// Single-scattering albedo, sigma_s / sigma_t per channel
    albedo: Color,
    bounds: Aabb,
    max_density: f32,
    inv_max_density: f32,
    profile: DensityProfile,
    phase: Box<dyn PhaseFunction>,
}

impl Medium {
    pub fn new(
        sigma_a: Color,
        sigma_s: Color,
        bounds: Aabb,
        max_density: f32,
        profile: DensityProfile,
        phase: Box<dyn PhaseFunction>,
    ) -> Self {
        let sigma_t = sigma_a + sigma_s;
        let albedo = Color::new(
            if sigma_t.x > 0.0 { sigma_s.x / sigma_t.x } else { 0.0 },
            if sigma_t.y > 0.0 { sigma_s.y / sigma_t.y } else { 0.0 },
            if sigma_t.z > 0.0 { sigma_s.z / sigma_t.z } else { 0.0 },
        );
        let max_density = max_density.max(0.0);
        Self {
            sigma_a,
            sigma_s,
            sigma_t,
            albedo,
            bounds,
            max_density,
            inv_max_density: if max_density > 1e-6 { 1.0 / max_density } else { 0.0 },
            profile,
            phase,
        }
    }

    pub fn phase(&self) -> &dyn PhaseFunction {
        self.phase.as_ref()
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn sigma_a(&self) -> Color {
        self.sigma_a
    }

    pub fn sigma_s(&self) -> Color {
        self.sigma_s
    }

    pub fn albedo(&self) -> Color {
        self.albedo
    }

    /// Extinction density at `p`; zero outside the bounds.
    pub fn density(&self, p: Vec3) -> f32 {
        if !self.bounds.contains(p) {
            return 0.0;
        }
        match self.profile {
            DensityProfile::Constant => self.max_density,
            DensityProfile::ExponentialVertical => {
                let height = (p.z - self.bounds.min.z) / self.bounds.extent().z;
                self.max_density * (-2.0 * height.max(0.0)).exp()
            }
        }
    }

    /// Majorant flight step for one uniform sample.
    fn flight_step(&self, u: f32) -> f32 {
        -(1.0 - u).ln() * self.inv_max_density / max_channel(self.sigma_t)
    }

    /// True while a restarted ray from `p` can still cross the bounds.
    fn still_inside(&self, p: Vec3, direction: Vec3) -> bool {
        self.bounds.intersect(&Ray::new(p, direction))
    }

    /// Delta tracking: sample a collision along `ray` up to `t_max`.
    pub fn sample_interaction(
        &self,
        ray: &Ray,
        t_max: f32,
        sampler: &mut dyn Sampler,
    ) -> MediumEvent {
        if self.inv_max_density == 0.0 || max_channel(self.sigma_t) <= 0.0 {
            return MediumEvent::PassThrough;
        }
        let mut t = RAY_EPSILON;
        loop {
            t += self.flight_step(sampler.next_1d());
            let p = ray.at(t);
            if t >= t_max || !self.still_inside(p, ray.direction) {
                return MediumEvent::PassThrough;
            }
            let density = self.density(p);
            // The acceptance probability density/max_density already
            // carries the local density, so the continuation weight is
            // the single-scattering albedo alone.
            if density * self.inv_max_density > sampler.next_1d() {
                return MediumEvent::Scatter {
                    p,
                    weight: self.albedo,
                };
            }
        }
    }

    /// Ratio tracking: unbiased transmittance estimate along `ray`
    /// up to `t_max`.
    pub fn transmittance(&self, ray: &Ray, t_max: f32, sampler: &mut dyn Sampler) -> Color {
        if self.inv_max_density == 0.0 || max_channel(self.sigma_t) <= 0.0 {
            return Color::ONE;
        }
        let mut t = RAY_EPSILON;
        let mut transmission = 1.0f32;
        loop {
            t += self.flight_step(sampler.next_1d());
            let p = ray.at(t);
            if t >= t_max || !self.still_inside(p, ray.direction) {
                return Color::splat(transmission);
            }
            transmission *= 1.0 - (self.density(p) * self.inv_max_density).max(0.0);
            if transmission == 0.0 {
                return Color::ZERO;
            }
        }
    }

    /// Closed-form Beer-Lambert transmittance between two points for
    /// the raw coefficients.
    pub fn transmittance_homogeneous(&self, a: Vec3, b: Vec3) -> Color {
        let dist = (a - b).length();
        Color::new(
            (-self.sigma_t.x * dist).exp(),
            (-self.sigma_t.y * dist).exp(),
            (-self.sigma_t.z * dist).exp(),
        )
    }
}
