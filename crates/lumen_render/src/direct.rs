//! Single-bounce direct illumination.
//!
//! Two estimators for the same quantity: naive hemisphere sampling
//! (the bsdf's preferred warp, hoping to hit an emitter) and
//! next-event estimation over the emitter surfaces. Emitters seen
//! directly by the camera return their radiance as-is.

use crate::integrator::Integrator;
use crate::sampler::Sampler;
use crate::scene::{Intersection, Scene};
use crate::{valid_density, Color};
use lumen_math::{warp, Frame, Ray, INV_PI, INV_TWO_PI, RAY_EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectSamplingMode {
    /// Sample a direction over the hemisphere and check what it hits
    Hemisphere,
    /// Importance-sample a point on one emitter's surface
    Surface,
}

pub struct DirectLighting {
    pub mode: DirectSamplingMode,
}

impl DirectLighting {
    fn hemisphere(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray, its: &Intersection)
        -> Color
    {
        let bsdf = its.primitive.bsdf();
        let local = if bsdf.uses_cosine() {
            warp::square_to_cosine_hemisphere(sampler.next_2d())
        } else {
            warp::square_to_uniform_hemisphere(sampler.next_2d())
        };
        let world = its.frame.to_world(local);

        let secondary = Ray::new(its.p + RAY_EPSILON * its.frame.n, world);
        let emitter = match scene.intersect(&secondary) {
            Some(hit) => match hit.primitive.emitter() {
                Some(emitter) => emitter.radiance(),
                None => return Color::ZERO,
            },
            None => return Color::ZERO,
        };

        let cos_theta = Frame::cos_theta(local);
        let pdf = if bsdf.uses_cosine() {
            cos_theta * INV_PI
        } else {
            INV_TWO_PI
        };
        if !valid_density(pdf) {
            return Color::ZERO;
        }
        let wi = its.frame.to_local(-ray.direction);
        emitter * bsdf.eval(wi, local, its.uv) * cos_theta / pdf
    }

    fn surface(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray, its: &Intersection)
        -> Color
    {
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

        let wi = its.frame.to_local(-ray.direction);
        let wo = its.frame.to_local(rec.d);
        let cos_theta = Frame::cos_theta(wo).max(0.0);
        let fr = its.primitive.bsdf().eval(wi, wo, its.uv);

        // Debias the uniform emitter pick
        li * fr * cos_theta * scene.emitter_count() as f32
    }
}

impl Integrator for DirectLighting {
    fn estimate(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray) -> Color {
        let its = match scene.intersect(ray) {
            Some(its) => its,
            None => return Color::ZERO,
        };
        if let Some(emitter) = its.primitive.emitter() {
            return emitter.radiance();
        }
        match self.mode {
            DirectSamplingMode::Hemisphere => self.hemisphere(scene, sampler, ray, &its),
            DirectSamplingMode::Surface => self.surface(scene, sampler, ray, &its),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::Diffuse;
    use crate::camera::Camera;
    use crate::emitter::AreaEmitter;
    use crate::integrator::NormalsIntegrator;
    use crate::primitive::Parallelogram;
    use crate::sampler::IndependentSampler;
    use lumen_math::Vec3;

    /// Lambertian floor under a square emitter facing down.
    fn lit_floor(radiance: f32, half_size: f32, height: f32) -> Scene {
        let camera = Camera::new(
            (8, 8),
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            45.0,
            0.0,
            1.0,
        );
        let mut scene = Scene::new(
            camera,
            Box::new(IndependentSampler::new(0, 1)),
            Box::new(NormalsIntegrator),
        );
        scene.add_primitive(Box::new(Parallelogram::new(
            Vec3::new(-100.0, -100.0, 0.0),
            Vec3::X * 200.0,
            Vec3::Y * 200.0,
            Box::new(Diffuse::new(Color::splat(0.5), true)),
        )));
        // Emitter normal points down (-Z) toward the floor
        scene.add_primitive(Box::new(
            Parallelogram::new(
                Vec3::new(-half_size, half_size, height),
                Vec3::X * (2.0 * half_size),
                -Vec3::Y * (2.0 * half_size),
                Box::new(Diffuse::new(Color::splat(0.0), true)),
            )
            .with_emitter(Box::new(AreaEmitter::new(Color::splat(radiance)))),
        ));
        scene
    }

    /// Mean estimate for a camera ray straight down at `(x, 0)`,
    /// offset so it does not pass through the emitter itself.
    fn mean_estimate(
        scene: &Scene,
        integrator: &dyn Integrator,
        x: f32,
        runs: usize,
        seed: u64,
    ) -> f64 {
        let mut sampler = IndependentSampler::new(seed, 1);
        let ray = Ray::new(Vec3::new(x, 0.0, 2.0), -Vec3::Z);
        let mut mean = 0.0f64;
        for _ in 0..runs {
            mean += integrator.estimate(scene, &mut sampler, &ray).x as f64 / runs as f64;
        }
        mean
    }

    #[test]
    fn test_emitter_seen_directly() {
        let scene = lit_floor(7.0, 0.5, 1.0);
        let mut sampler = IndependentSampler::new(0, 1);
        // Ray from below the emitter pointing up
        let ray = Ray::new(Vec3::new(0.0, 0.0, 0.5), Vec3::Z);
        let direct = DirectLighting {
            mode: DirectSamplingMode::Surface,
        };
        assert_eq!(
            direct.estimate(&scene, &mut sampler, &ray),
            Color::splat(7.0)
        );
    }

    #[test]
    fn test_miss_is_black() {
        let scene = lit_floor(1.0, 0.5, 1.0);
        let mut sampler = IndependentSampler::new(0, 1);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z);
        let direct = DirectLighting {
            mode: DirectSamplingMode::Surface,
        };
        assert_eq!(direct.estimate(&scene, &mut sampler, &ray), Color::ZERO);
    }

    #[test]
    fn test_surface_mode_against_quadrature() {
        // Reflected radiance of a Lambertian floor below a small
        // head-on emitter: rho/pi * integral of L cos cos' / d^2 dA,
        // computed by a dense quadrature over the emitter
        let radiance = 10.0f32;
        let half = 0.25f32;
        let height = 1.0f32;
        let scene = lit_floor(radiance, half, height);

        // Shade the floor at (1, 0, 0), off to the side of the light
        let shade_x = 1.0f32;
        let n = 128;
        let mut reference = 0.0f64;
        let texel = (2.0 * half / n as f32) as f64;
        for i in 0..n {
            for j in 0..n {
                let x = -half + (i as f32 + 0.5) / n as f32 * 2.0 * half;
                let y = -half + (j as f32 + 0.5) / n as f32 * 2.0 * half;
                let to_light = Vec3::new(x - shade_x, y, height);
                let d2 = to_light.length_squared();
                let cos = (height / d2.sqrt()) as f64;
                reference += radiance as f64 * cos * cos / d2 as f64 * texel * texel;
            }
        }
        reference *= 0.5 * std::f64::consts::FRAC_1_PI; // rho/pi

        let direct = DirectLighting {
            mode: DirectSamplingMode::Surface,
        };
        let mean = mean_estimate(&scene, &direct, shade_x, 40_000, 13);
        assert!(
            (mean - reference).abs() < 0.02 * reference,
            "mean {mean} vs reference {reference}"
        );
    }

    #[test]
    fn test_hemisphere_and_surface_agree() {
        // Larger emitter so hemisphere sampling has a fair hit rate
        let scene = lit_floor(2.0, 2.0, 1.5);
        let surface = DirectLighting {
            mode: DirectSamplingMode::Surface,
        };
        let hemisphere = DirectLighting {
            mode: DirectSamplingMode::Hemisphere,
        };
        let a = mean_estimate(&scene, &surface, 2.5, 60_000, 21);
        let b = mean_estimate(&scene, &hemisphere, 2.5, 60_000, 22);
        assert!(
            (a - b).abs() < 0.05 * a.max(1e-3),
            "surface {a} vs hemisphere {b}"
        );
    }
}
