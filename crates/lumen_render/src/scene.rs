//! Scene container and intersection queries.
//!
//! No acceleration structure: intersection is a linear scan over the
//! primitive list, which is plenty for the analytic scenes this
//! renderer targets. The scan counts elementary intersection tests so
//! the diagnostics integrator can visualize query cost.

use crate::camera::Camera;
use crate::integrator::Integrator;
use crate::medium::Medium;
use crate::primitive::Primitive;
use crate::sampler::Sampler;
use lumen_math::{Frame, Ray, Vec2, Vec3};

/// Result of a nearest-hit scene query.
pub struct Intersection<'a> {
    pub t: f32,
    pub p: Vec3,
    /// Shading frame, z aligned with the shading normal
    pub frame: Frame,
    pub uv: Vec2,
    /// Elementary intersection tests performed by the query
    pub tests: u32,
    pub primitive: &'a dyn Primitive,
}

pub struct Scene {
    primitives: Vec<Box<dyn Primitive>>,
    /// Indices into `primitives` for the emissive ones
    emitters: Vec<usize>,
    medium: Option<Medium>,
    camera: Camera,
    sampler: Box<dyn Sampler>,
    integrator: Box<dyn Integrator>,
}

impl Scene {
    pub fn new(camera: Camera, sampler: Box<dyn Sampler>, integrator: Box<dyn Integrator>) -> Self {
        Self {
            primitives: Vec::new(),
            emitters: Vec::new(),
            medium: None,
            camera,
            sampler,
            integrator,
        }
    }

    pub fn add_primitive(&mut self, primitive: Box<dyn Primitive>) {
        if primitive.is_emitter() {
            self.emitters.push(self.primitives.len());
        }
        self.primitives.push(primitive);
    }

    pub fn set_medium(&mut self, medium: Medium) {
        self.medium = Some(medium);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn sampler(&self) -> &dyn Sampler {
        self.sampler.as_ref()
    }

    pub fn integrator(&self) -> &dyn Integrator {
        self.integrator.as_ref()
    }

    pub fn medium(&self) -> Option<&Medium> {
        self.medium.as_ref()
    }

    pub fn primitives(&self) -> &[Box<dyn Primitive>] {
        &self.primitives
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    /// Pick one emissive primitive uniformly at random. Estimators
    /// debias the pick by multiplying with `emitter_count()`.
    pub fn pick_emitter(&self, u: f32) -> Option<&dyn Primitive> {
        if self.emitters.is_empty() {
            return None;
        }
        let index = ((u * self.emitters.len() as f32) as usize).min(self.emitters.len() - 1);
        Some(self.primitives[self.emitters[index]].as_ref())
    }

    /// Nearest hit along `ray` within its bounds.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        let mut clipped = *ray;
        let mut tests = 0;
        let mut nearest: Option<(usize, crate::primitive::PrimitiveHit)> = None;
        for (index, primitive) in self.primitives.iter().enumerate() {
            if let Some(hit) = primitive.intersect(&clipped, &mut tests) {
                clipped.maxt = hit.t;
                nearest = Some((index, hit));
            }
        }
        nearest.map(|(index, hit)| Intersection {
            t: hit.t,
            p: hit.p,
            frame: Frame::from_normal(hit.n),
            uv: hit.uv,
            tests,
            primitive: self.primitives[index].as_ref(),
        })
    }

    /// Occlusion query: true if anything blocks the ray within its
    /// bounds.
    pub fn intersect_any(&self, ray: &Ray) -> bool {
        let mut tests = 0;
        self.primitives
            .iter()
            .any(|primitive| primitive.intersect(ray, &mut tests).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::Diffuse;
    use crate::emitter::AreaEmitter;
    use crate::integrator::NormalsIntegrator;
    use crate::primitive::Parallelogram;
    use crate::sampler::IndependentSampler;
    use crate::Color;
    use lumen_math::RAY_EPSILON;

    fn quad_at(z: f32, emissive: bool) -> Box<dyn Primitive> {
        let bsdf = Box::new(Diffuse::new(Color::splat(0.5), true));
        let quad = Parallelogram::new(Vec3::new(-1.0, -1.0, z), Vec3::X * 2.0, Vec3::Y * 2.0, bsdf);
        if emissive {
            Box::new(quad.with_emitter(Box::new(AreaEmitter::new(Color::ONE))))
        } else {
            Box::new(quad)
        }
    }

    fn test_scene(primitives: Vec<Box<dyn Primitive>>) -> Scene {
        let camera = Camera::new(
            (4, 4),
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
        for p in primitives {
            scene.add_primitive(p);
        }
        scene
    }

    #[test]
    fn test_nearest_of_stacked_quads() {
        let scene = test_scene(vec![quad_at(0.0, false), quad_at(1.0, false)]);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z);
        let hit = scene.intersect(&ray).expect("should hit");
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert_eq!(hit.tests, 2);
    }

    #[test]
    fn test_miss_returns_none() {
        let scene = test_scene(vec![quad_at(0.0, false)]);
        let ray = Ray::new(Vec3::new(5.0, 5.0, 3.0), -Vec3::Z);
        assert!(scene.intersect(&ray).is_none());
    }

    #[test]
    fn test_occlusion_respects_ray_bounds() {
        let scene = test_scene(vec![quad_at(0.0, false)]);
        let origin = Vec3::new(0.0, 0.0, 2.0);
        let blocked = Ray::with_bounds(origin, -Vec3::Z, RAY_EPSILON, 5.0);
        assert!(scene.intersect_any(&blocked));
        // Segment ends before the quad
        let short = Ray::with_bounds(origin, -Vec3::Z, RAY_EPSILON, 1.5);
        assert!(!scene.intersect_any(&short));
    }

    #[test]
    fn test_emitter_registry() {
        let scene = test_scene(vec![
            quad_at(0.0, false),
            quad_at(1.0, true),
            quad_at(2.0, true),
        ]);
        assert_eq!(scene.emitter_count(), 2);
        let low = scene.pick_emitter(0.0).expect("emitters exist");
        let high = scene.pick_emitter(0.99).expect("emitters exist");
        assert!(low.is_emitter() && high.is_emitter());
        assert!(!std::ptr::eq(low, high));
    }

    #[test]
    fn test_pick_emitter_empty() {
        let scene = test_scene(vec![quad_at(0.0, false)]);
        assert!(scene.pick_emitter(0.5).is_none());
    }
}
