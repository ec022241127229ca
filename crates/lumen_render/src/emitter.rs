//! Light sources.
//!
//! The only concrete emitter is a diffuse area light attached to a
//! primitive. Sampling picks a point on the carrier surface and
//! converts the area density to solid angle at the reference point;
//! the same conversion backs the `pdf` query used for multiple
//! importance weighting.

use crate::primitive::Primitive;
use crate::sampler::Sampler;
use crate::{valid_density, Color};
use lumen_math::{Ray, Vec3, RAY_EPSILON};

/// Everything a transport integrator needs to know about one
/// emitter sample or emitter hit.
#[derive(Debug, Clone, Copy)]
pub struct EmitterQueryRecord {
    /// Reference point being illuminated
    pub ref_p: Vec3,
    /// Point on the emitter
    pub p: Vec3,
    /// Emitter normal at `p`
    pub n: Vec3,
    /// Unit direction from `ref_p` to `p`
    pub d: Vec3,
    /// Distance between the two points
    pub dist: f32,
    /// Solid-angle density at `ref_p`, filled in by sampling/pdf
    pub pdf: f32,
    /// Ray for the visibility test, shortened at both ends
    pub shadow_ray: Ray,
}

impl EmitterQueryRecord {
    /// Record for a known pair of points, e.g. when a path ray hit
    /// the emitter and we need the density it would have been
    /// sampled with.
    pub fn from_points(ref_p: Vec3, p: Vec3, n: Vec3) -> Self {
        let to_light = p - ref_p;
        let dist = to_light.length();
        let d = to_light / dist;
        Self {
            ref_p,
            p,
            n,
            d,
            dist,
            pdf: 0.0,
            shadow_ray: Ray::with_bounds(ref_p, d, 5.0 * RAY_EPSILON, dist - RAY_EPSILON),
        }
    }
}

pub trait Emitter: Send + Sync {
    /// Sample a direction toward the emitter from `ref_p`. Returns
    /// the query record and the importance weight `eval / pdf`;
    /// the weight is black whenever the density is unusable.
    fn sample(
        &self,
        prim: &dyn Primitive,
        ref_p: Vec3,
        sampler: &mut dyn Sampler,
    ) -> (EmitterQueryRecord, Color);

    /// Solid-angle density at `rec.ref_p` of sampling the point
    /// `rec.p`. Zero for points facing away.
    fn pdf(&self, prim: &dyn Primitive, rec: &EmitterQueryRecord) -> f32;

    /// Emitted radiance along `-rec.d`; black on the back side.
    fn eval(&self, rec: &EmitterQueryRecord) -> Color;

    fn radiance(&self) -> Color;
}

/// One-sided diffuse area light.
pub struct AreaEmitter {
    radiance: Color,
}

impl AreaEmitter {
    pub fn new(radiance: Color) -> Self {
        Self { radiance }
    }
}

impl Emitter for AreaEmitter {
    fn sample(
        &self,
        prim: &dyn Primitive,
        ref_p: Vec3,
        sampler: &mut dyn Sampler,
    ) -> (EmitterQueryRecord, Color) {
        let surface = prim.sample_surface(sampler.next_2d());
        let mut rec = EmitterQueryRecord::from_points(ref_p, surface.p, surface.n);
        rec.pdf = self.pdf(prim, &rec);
        if !valid_density(rec.pdf) {
            return (rec, Color::ZERO);
        }
        let value = self.eval(&rec) / rec.pdf;
        (rec, value)
    }

    fn pdf(&self, prim: &dyn Primitive, rec: &EmitterQueryRecord) -> f32 {
        // Area density converted to solid angle at the reference
        // point: p_A * dist^2 / cos(theta)
        let cos_theta = rec.n.dot(-rec.d);
        if cos_theta <= 0.0 {
            return 0.0;
        }
        prim.inv_area() * rec.dist * rec.dist / cos_theta
    }

    fn eval(&self, rec: &EmitterQueryRecord) -> Color {
        if rec.n.dot(rec.d) < 0.0 {
            self.radiance
        } else {
            Color::ZERO
        }
    }

    fn radiance(&self) -> Color {
        self.radiance
    }
}
