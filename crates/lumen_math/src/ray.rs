//! Ray type for light transport.
//!
//! A ray is defined by an origin, a direction and the parametric interval
//! `[mint, maxt]` over which intersections are considered valid.

use crate::{Vec3, RAY_EPSILON};

/// A ray with origin, direction and a valid parametric range.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray
    pub origin: Vec3,
    /// Direction vector (not necessarily normalized)
    pub direction: Vec3,
    /// Minimum valid parameter
    pub mint: f32,
    /// Maximum valid parameter
    pub maxt: f32,
}

impl Ray {
    /// Create a ray with the default `[epsilon, inf)` range.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            mint: RAY_EPSILON,
            maxt: f32::INFINITY,
        }
    }

    /// Create a ray with an explicit parametric range.
    #[inline]
    pub fn with_bounds(origin: Vec3, direction: Vec3, mint: f32, maxt: f32) -> Self {
        Self {
            origin,
            direction,
            mint,
            maxt,
        }
    }

    /// Compute a point along the ray at parameter t.
    /// P(t) = origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Test whether a parameter lies inside the valid range.
    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        t >= self.mint && t <= self.maxt
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}
