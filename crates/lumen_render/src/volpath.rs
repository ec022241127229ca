//! Path tracing through a participating medium.
//!
//! Each bounce first runs the medium's free-flight sampler, bounded
//! by the distance to the next surface. A real collision switches the
//! vertex to phase-function sampling and transmittance-weighted
//! next-event estimation; a pass-through falls back to the surface
//! logic with every radiance term attenuated by the tracked
//! transmittance along the segment. The balance heuristic mirrors the
//! surface path tracer, substituting the phase density where a BSDF
//! density would appear.

use crate::bsdf::Measure;
use crate::emitter::EmitterQueryRecord;
use crate::integrator::Integrator;
use crate::medium::{Medium, MediumEvent};
use crate::sampler::Sampler;
use crate::scene::{Intersection, Scene};
use crate::{max_channel, Color};
use lumen_math::{Frame, Ray, Vec3};

pub struct VolumePathTracer {
    /// Russian roulette from the third bounce on
    pub rr: bool,
}

impl Integrator for VolumePathTracer {
    fn estimate(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray) -> Color {
        let mut color = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut path_ray = *ray;
        // Density of the previous direction sample (BSDF or phase);
        // `None` for the camera ray and discrete bounces, which take
        // full credit for emitter hits
        let mut prev_pdf: Option<f32> = None;
        let mut depth = 1u32;

        loop {
            let surface = scene.intersect(&path_ray);
            let t_max = surface.as_ref().map_or(f32::INFINITY, |its| its.t);

            let collision = scene.medium().and_then(|medium| {
                match medium.sample_interaction(&path_ray, t_max, sampler) {
                    MediumEvent::Scatter { p, weight } => Some((medium, p, weight)),
                    MediumEvent::PassThrough => None,
                }
            });

            if let Some((medium, p, weight)) = collision {
                throughput *= weight;
                if throughput == Color::ZERO {
                    return color;
                }

                color += throughput
                    * self.medium_next_event(scene, medium, sampler, path_ray.direction, p);

                if self.rr && depth >= 3 {
                    let survival = max_channel(throughput).min(0.99);
                    if sampler.next_1d() > survival {
                        return color;
                    }
                    throughput /= survival;
                }

                let (wo, pdf_phase) =
                    medium.phase().sample(path_ray.direction, sampler.next_2d());
                path_ray = Ray::new(p, wo);
                prev_pdf = Some(pdf_phase);
            } else {
                let its = match surface {
                    Some(its) => its,
                    None => return color,
                };
                let segment_tr = match scene.medium() {
                    Some(medium) => medium.transmittance(&path_ray, its.t, sampler),
                    None => Color::ONE,
                };

                if let Some(emitter) = its.primitive.emitter() {
                    let rec =
                        EmitterQueryRecord::from_points(path_ray.origin, its.p, its.frame.n);
                    let weight = match prev_pdf {
                        Some(pdf) => {
                            let pdf_light = emitter.pdf(its.primitive, &rec);
                            let denom = pdf + pdf_light;
                            if denom > 0.0 { pdf / denom } else { 0.0 }
                        }
                        None => 1.0,
                    };
                    color += throughput * weight * emitter.eval(&rec) * segment_tr;
                }

                color += throughput * self.surface_next_event(scene, sampler, &path_ray, &its);

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

                prev_pdf = match bs.measure {
                    Measure::SolidAngle => Some(bsdf.pdf(wi, bs.wo)),
                    Measure::Discrete => None,
                };
                path_ray = Ray::new(its.p, its.frame.to_world(bs.wo));
            }
            depth += 1;
        }
    }
}

impl VolumePathTracer {
    /// Next-event estimation from a medium scattering vertex.
    fn medium_next_event(
        &self,
        scene: &Scene,
        medium: &Medium,
        sampler: &mut dyn Sampler,
        wi: Vec3,
        p: Vec3,
    ) -> Color {
        let prim = match scene.pick_emitter(sampler.next_1d()) {
            Some(prim) => prim,
            None => return Color::ZERO,
        };
        let emitter = match prim.emitter() {
            Some(emitter) => emitter,
            None => return Color::ZERO,
        };

        let (rec, li) = emitter.sample(prim, p, sampler);
        if li == Color::ZERO || scene.intersect_any(&rec.shadow_ray) {
            return Color::ZERO;
        }

        let tr = medium.transmittance(&rec.shadow_ray, rec.shadow_ray.maxt, sampler);
        let phase_value = medium.phase().eval(wi, rec.d);
        let pdf_phase = medium.phase().pdf(wi, rec.d);

        let denom = pdf_phase + rec.pdf;
        let weight = if denom > 0.0 { rec.pdf / denom } else { 0.0 };

        li * tr * phase_value * weight * scene.emitter_count() as f32
    }

    /// Next-event estimation from a surface vertex, attenuated by
    /// the medium along the shadow ray.
    fn surface_next_event(
        &self,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        path_ray: &Ray,
        its: &Intersection<'_>,
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

        let tr = match scene.medium() {
            Some(medium) => medium.transmittance(&rec.shadow_ray, rec.shadow_ray.maxt, sampler),
            None => Color::ONE,
        };

        let bsdf = its.primitive.bsdf();
        let wi = its.frame.to_local(-path_ray.direction);
        let wo = its.frame.to_local(rec.d);
        let fr = bsdf.eval(wi, wo, its.uv);
        let cos_theta = Frame::cos_theta(wo).max(0.0);

        let pdf_bsdf = bsdf.pdf(wi, wo);
        let denom = pdf_bsdf + rec.pdf;
        let weight = if denom > 0.0 { rec.pdf / denom } else { 0.0 };

        li * tr * fr * cos_theta * weight * scene.emitter_count() as f32
    }
}
