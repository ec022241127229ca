//! Surface path tracing.
//!
//! One bounce loop serves both configurations: pure BSDF sampling, or
//! next-event estimation combined with BSDF sampling through the
//! balance heuristic. Emitter hits found by BSDF sampling carry the
//! MIS weight computed at the previous vertex; discrete (specular)
//! bounces force that weight to one since next-event estimation can
//! never sample them.

use crate::bsdf::Measure;
use crate::emitter::EmitterQueryRecord;
use crate::integrator::Integrator;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::{max_channel, Color};
use lumen_math::{Frame, Ray};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSamplingMode {
    /// BSDF sampling only; emitters contribute when a bounce hits them
    Hemisphere,
    /// Next-event estimation + BSDF sampling, balance heuristic
    Mis,
}

pub struct PathTracer {
    pub mode: PathSamplingMode,
    /// Russian roulette from the third bounce on
    pub rr: bool,
}

impl Integrator for PathTracer {
    fn estimate(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray) -> Color {
        let use_nee = self.mode == PathSamplingMode::Mis;
        let mut color = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut path_ray = *ray;
        // Balance-heuristic weight for an emitter found by the
        // previous BSDF sample
        let mut bsdf_mis_weight = 1.0f32;
        let mut depth = 1u32;

        let mut its = match scene.intersect(&path_ray) {
            Some(its) => its,
            None => return color,
        };

        loop {
            if let Some(emitter) = its.primitive.emitter() {
                let rec = EmitterQueryRecord::from_points(path_ray.origin, its.p, its.frame.n);
                let weight = if use_nee { bsdf_mis_weight } else { 1.0 };
                color += throughput * weight * emitter.eval(&rec);
            }

            if use_nee {
                color += throughput * self.next_event(scene, sampler, &path_ray, &its);
            }

            if self.rr && depth >= 3 {
                let survival = max_channel(throughput).min(0.99);
                if sampler.next_1d() > survival {
                    return color;
                }
                throughput /= survival;
            }

            let bsdf = its.primitive.bsdf();
            let wi = its.frame.to_local(-path_ray.direction);
            let bs = bsdf.sample(wi, its.uv, sampler.next_2d());
            throughput *= bs.weight;
            if throughput == Color::ZERO {
                return color;
            }
            let pdf_bsdf = bsdf.pdf(wi, bs.wo);

            let origin = its.p;
            path_ray = Ray::new(origin, its.frame.to_world(bs.wo));
            its = match scene.intersect(&path_ray) {
                Some(next) => next,
                None => return color,
            };

            bsdf_mis_weight = 1.0;
            if bs.measure == Measure::SolidAngle {
                if let Some(emitter) = its.primitive.emitter() {
                    let rec = EmitterQueryRecord::from_points(origin, its.p, its.frame.n);
                    let pdf_light = emitter.pdf(its.primitive, &rec);
                    let denom = pdf_bsdf + pdf_light;
                    bsdf_mis_weight = if denom > 0.0 { pdf_bsdf / denom } else { 0.0 };
                }
            }
            depth += 1;
        }
    }
}

impl PathTracer {
    /// Next-event estimation at a surface vertex, weighted by the
    /// balance heuristic against BSDF sampling.
    fn next_event(
        &self,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        path_ray: &Ray,
        its: &crate::scene::Intersection<'_>,
    ) -> Color {
        let prim = match scene.pick_emitter(sampler.next_1d()) {
            Some(prim) => prim,
            None => return Color::ZERO,
        };
        let emitter = match prim.emitter() {
            Some(emitter) => emitter,
            None => return Color::ZERO,
        };

        let (rec, li) = emitter.sample(prim, its.p, sampler);
        if li == Color::ZERO || scene.intersect_any(&rec.shadow_ray) {
            return Color::ZERO;
        }

        let bsdf = its.primitive.bsdf();
        let wi = its.frame.to_local(-path_ray.direction);
        let wo = its.frame.to_local(rec.d);
        let fr = bsdf.eval(wi, wo, its.uv);
        let cos_theta = Frame::cos_theta(wo).max(0.0);

        let pdf_bsdf = bsdf.pdf(wi, wo);
        let denom = pdf_bsdf + rec.pdf;
        let weight = if denom > 0.0 { rec.pdf / denom } else { 0.0 };

        li * fr * cos_theta * weight * scene.emitter_count() as f32
    }
}
