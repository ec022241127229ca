//! Integrator trait and the diagnostic estimators.
//!
//! Transport integrators (direct lighting, path tracing, volumetric
//! path tracing) live in their own modules; this one holds the trait
//! plus the cheap debugging integrators used to inspect geometry and
//! query cost.

use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::Color;
use lumen_math::{warp, Ray, Vec3, INV_PI, INV_TWO_PI, RAY_EPSILON};

pub trait Integrator: Send + Sync {
    /// One-sample radiance estimate for the given primary ray.
    fn estimate(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray) -> Color;
}

/// Visualizes shading normals mapped to the [0,1] color cube.
pub struct NormalsIntegrator;

impl Integrator for NormalsIntegrator {
    fn estimate(&self, scene: &Scene, _sampler: &mut dyn Sampler, ray: &Ray) -> Color {
        match scene.intersect(ray) {
            Some(its) => 0.5 * its.frame.n + Vec3::splat(0.5),
            None => Color::ZERO,
        }
    }
}

/// Heatmap of elementary intersection tests per camera ray, red at
/// `max_tests` and above, blue at zero.
pub struct IntersectionsIntegrator {
    pub max_tests: u32,
}

impl Integrator for IntersectionsIntegrator {
    fn estimate(&self, scene: &Scene, _sampler: &mut dyn Sampler, ray: &Ray) -> Color {
        match scene.intersect(ray) {
            Some(its) => {
                let intensity = its.tests as f32 / self.max_tests as f32;
                Color::new(intensity, 0.0, (1.0 - intensity).max(0.0))
            }
            None => Color::ZERO,
        }
    }
}

/// Ambient occlusion with a constant white Lambertian surface: one
/// visibility ray per estimate, sampled either uniformly or
/// cosine-weighted over the hemisphere.
pub struct AmbientOcclusion {
    pub cosine: bool,
}

impl Integrator for AmbientOcclusion {
    fn estimate(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray) -> Color {
        let its = match scene.intersect(ray) {
            Some(its) => its,
            None => return Color::ZERO,
        };

        let local = if self.cosine {
            warp::square_to_cosine_hemisphere(sampler.next_2d())
        } else {
            warp::square_to_uniform_hemisphere(sampler.next_2d())
        };
        let world = its.frame.to_world(local);

        let shadow = Ray::new(its.p + RAY_EPSILON * its.frame.n, world);
        if scene.intersect_any(&shadow) {
            return Color::ZERO;
        }

        // White albedo, brdf = 1/pi; the cosine-weighted estimator
        // cancels to exactly one
        let cos_theta = its.frame.n.dot(world).max(0.0);
        let value = if self.cosine {
            1.0
        } else {
            INV_PI * cos_theta / INV_TWO_PI
        };
        Color::splat(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::Diffuse;
    use crate::camera::Camera;
    use crate::primitive::{Parallelogram, Primitive};
    use crate::sampler::IndependentSampler;

    fn floor_scene(extra: Vec<Box<dyn Primitive>>) -> Scene {
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
        let bsdf = Box::new(Diffuse::new(Color::splat(0.5), true));
        scene.add_primitive(Box::new(Parallelogram::new(
            Vec3::new(-10.0, -10.0, 0.0),
            Vec3::X * 20.0,
            Vec3::Y * 20.0,
            bsdf,
        )));
        for p in extra {
            scene.add_primitive(p);
        }
        scene
    }

    #[test]
    fn test_normals_maps_to_unit_cube() {
        let scene = floor_scene(vec![]);
        let mut sampler = IndependentSampler::new(0, 1);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), -Vec3::Z);
        let c = NormalsIntegrator.estimate(&scene, &mut sampler, &ray);
        // Floor normal is +Z
        assert!((c - Color::new(0.5, 0.5, 1.0)).length() < 1e-5);

        let miss = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z);
        assert_eq!(NormalsIntegrator.estimate(&scene, &mut sampler, &miss), Color::ZERO);
    }

    #[test]
    fn test_intersections_heatmap_range() {
        let scene = floor_scene(vec![]);
        let mut sampler = IndependentSampler::new(0, 1);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), -Vec3::Z);
        let c = IntersectionsIntegrator { max_tests: 4 }.estimate(&scene, &mut sampler, &ray);
        // One primitive, one test
        assert!((c.x - 0.25).abs() < 1e-6);
        assert_eq!(c.y, 0.0);
        assert!((c.z - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_ao_open_floor_is_white() {
        // Nothing above the floor: both estimators average to one
        let scene = floor_scene(vec![]);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), -Vec3::Z);
        for cosine in [false, true] {
            let ao = AmbientOcclusion { cosine };
            let mut sampler = IndependentSampler::new(9, 1);
            let n = 20_000;
            let mut mean = 0.0f64;
            for _ in 0..n {
                mean += ao.estimate(&scene, &mut sampler, &ray).x as f64 / n as f64;
            }
            assert!((mean - 1.0).abs() < 0.02, "cosine={cosine}: mean {mean}");
        }
    }

    #[test]
    fn test_ao_covered_is_nearly_black() {
        // A wide plate above the query point blocks the hemisphere
        // except for near-grazing directions past its edge, which
        // carry a vanishing cosine.
        let bsdf = Box::new(Diffuse::new(Color::splat(0.5), true));
        let lid: Box<dyn Primitive> = Box::new(Parallelogram::new(
            Vec3::new(-50.0, -50.0, 0.5),
            Vec3::X * 100.0,
            Vec3::Y * 100.0,
            bsdf,
        ));
        let scene = floor_scene(vec![lid]);
        let ao = AmbientOcclusion { cosine: false };
        let mut sampler = IndependentSampler::new(3, 1);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 0.25), -Vec3::Z);
        let n = 20_000;
        let mut mean = 0.0f64;
        for _ in 0..n {
            mean += ao.estimate(&scene, &mut sampler, &ray).x as f64 / n as f64;
        }
        assert!(mean < 0.01, "mean {mean}");
    }
}
