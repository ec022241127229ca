//! Scene primitives.
//!
//! A primitive bundles geometry with its material and an optional
//! emitter. Geometry exposes nearest-hit intersection (with an
//! elementary-test counter for the diagnostics integrator) and uniform
//! surface-area sampling with the normalization constant emitters need
//! for density conversion.

use crate::bsdf::Bsdf;
use crate::emitter::Emitter;
use lumen_math::{Ray, Vec2, Vec3};

/// Geometric result of a successful primitive intersection.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveHit {
    /// Hit parameter along the ray
    pub t: f32,
    /// Hit point
    pub p: Vec3,
    /// Shading normal (unit)
    pub n: Vec3,
    /// Texture coordinate
    pub uv: Vec2,
}

/// A point sampled uniformly over a primitive's surface.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSample {
    pub p: Vec3,
    pub n: Vec3,
}

pub trait Primitive: Send + Sync {
    /// Nearest hit within the ray's valid range. Elementary
    /// intersection tests are added to `tests`.
    fn intersect(&self, ray: &Ray, tests: &mut u32) -> Option<PrimitiveHit>;

    /// Sample a point uniformly over the surface area.
    fn sample_surface(&self, sample: Vec2) -> SurfaceSample;

    /// Reciprocal surface area; the area-measure density of
    /// `sample_surface`.
    fn inv_area(&self) -> f32;

    fn bsdf(&self) -> &dyn Bsdf;

    fn emitter(&self) -> Option<&dyn Emitter>;

    fn is_emitter(&self) -> bool {
        self.emitter().is_some()
    }
}

/// Analytic parallelogram: origin plus two edge vectors.
pub struct Parallelogram {
    origin: Vec3,
    u: Vec3,
    v: Vec3,
    normal: Vec3,
    inv_area: f32,
    bsdf: Box<dyn Bsdf>,
    emitter: Option<Box<dyn Emitter>>,
}

impl Parallelogram {
    pub fn new(origin: Vec3, u: Vec3, v: Vec3, bsdf: Box<dyn Bsdf>) -> Self {
        let cross = u.cross(v);
        Self {
            origin,
            u,
            v,
            normal: cross.normalize(),
            inv_area: 1.0 / cross.length(),
            bsdf,
            emitter: None,
        }
    }

    pub fn with_emitter(mut self, emitter: Box<dyn Emitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

impl Primitive for Parallelogram {
    fn intersect(&self, ray: &Ray, tests: &mut u32) -> Option<PrimitiveHit> {
        *tests += 1;
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < 1e-9 {
            return None;
        }
        let t = self.normal.dot(self.origin - ray.origin) / denom;
        if !ray.contains(t) {
            return None;
        }

        // Decompose the in-plane offset onto the (possibly
        // non-orthogonal) edge vectors
        let q = ray.at(t) - self.origin;
        let uu = self.u.dot(self.u);
        let uv = self.u.dot(self.v);
        let vv = self.v.dot(self.v);
        let qu = q.dot(self.u);
        let qv = q.dot(self.v);
        let det = uu * vv - uv * uv;
        let a = (qu * vv - qv * uv) / det;
        let b = (qv * uu - qu * uv) / det;
        if !(0.0..=1.0).contains(&a) || !(0.0..=1.0).contains(&b) {
            return None;
        }

        Some(PrimitiveHit {
            t,
            p: ray.at(t),
            n: self.normal,
            uv: Vec2::new(a, b),
        })
    }

    fn sample_surface(&self, sample: Vec2) -> SurfaceSample {
        SurfaceSample {
            p: self.origin + sample.x * self.u + sample.y * self.v,
            n: self.normal,
        }
    }

    fn inv_area(&self) -> f32 {
        self.inv_area
    }

    fn bsdf(&self) -> &dyn Bsdf {
        self.bsdf.as_ref()
    }

    fn emitter(&self) -> Option<&dyn Emitter> {
        self.emitter.as_deref()
    }
}

/// Indexed triangle mesh with optional shading normals and uvs.
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    indices: Vec<[u32; 3]>,
    normals: Option<Vec<Vec3>>,
    uvs: Option<Vec<Vec2>>,
    /// Cumulative triangle areas for uniform surface sampling
    area_cdf: Vec<f32>,
    total_area: f32,
    bsdf: Box<dyn Bsdf>,
    emitter: Option<Box<dyn Emitter>>,
}

impl TriangleMesh {
    pub fn new(
        vertices: Vec<Vec3>,
        indices: Vec<[u32; 3]>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<Vec2>>,
        bsdf: Box<dyn Bsdf>,
    ) -> Self {
        let mut area_cdf = Vec::with_capacity(indices.len());
        let mut total_area = 0.0;
        for tri in &indices {
            let [a, b, c] = tri.map(|i| vertices[i as usize]);
            total_area += 0.5 * (b - a).cross(c - a).length();
            area_cdf.push(total_area);
        }
        Self {
            vertices,
            indices,
            normals,
            uvs,
            area_cdf,
            total_area,
            bsdf,
            emitter: None,
        }
    }

    pub fn with_emitter(mut self, emitter: Box<dyn Emitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn total_area(&self) -> f32 {
        self.total_area
    }

    fn triangle(&self, index: usize) -> [Vec3; 3] {
        self.indices[index].map(|i| self.vertices[i as usize])
    }
}

/// Möller-Trumbore ray-triangle test; returns (t, u, v) barycentrics.
fn intersect_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<(f32, f32, f32)> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let det = edge1.dot(h);

    // Ray parallel to the triangle plane
    if det.abs() < 1e-9 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - v0;
    let u = s.dot(h) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    if !ray.contains(t) {
        return None;
    }
    Some((t, u, v))
}

impl Primitive for TriangleMesh {
    fn intersect(&self, ray: &Ray, tests: &mut u32) -> Option<PrimitiveHit> {
        let mut clipped = *ray;
        let mut best: Option<(usize, f32, f32, f32)> = None;
        for index in 0..self.indices.len() {
            *tests += 1;
            let [v0, v1, v2] = self.triangle(index);
            if let Some((t, u, v)) = intersect_triangle(&clipped, v0, v1, v2) {
                clipped.maxt = t;
                best = Some((index, t, u, v));
            }
        }

        let (index, t, u, v) = best?;
        let [i0, i1, i2] = self.indices[index];
        let [v0, v1, v2] = self.triangle(index);
        let w = 1.0 - u - v;

        let n = match &self.normals {
            Some(normals) => (w * normals[i0 as usize]
                + u * normals[i1 as usize]
                + v * normals[i2 as usize])
                .normalize(),
            None => (v1 - v0).cross(v2 - v0).normalize(),
        };
        let uv = match &self.uvs {
            Some(uvs) => w * uvs[i0 as usize] + u * uvs[i1 as usize] + v * uvs[i2 as usize],
            None => Vec2::new(u, v),
        };

        Some(PrimitiveHit {
            t,
            p: ray.at(t),
            n,
            uv,
        })
    }

    fn sample_surface(&self, sample: Vec2) -> SurfaceSample {
        // Pick a triangle proportional to area, then warp to uniform
        // barycentrics
        let target = sample.x * self.total_area;
        let index = self
            .area_cdf
            .partition_point(|&cum| cum < target)
            .min(self.indices.len() - 1);

        // Reuse sample.x within the chosen cdf segment
        let low = if index == 0 { 0.0 } else { self.area_cdf[index - 1] };
        let remapped = ((target - low) / (self.area_cdf[index] - low)).clamp(0.0, 1.0);

        let su = remapped.sqrt();
        let u = 1.0 - su;
        let v = sample.y * su;
        let [v0, v1, v2] = self.triangle(index);
        SurfaceSample {
            p: u * v0 + v * v1 + (1.0 - u - v) * v2,
            n: (v1 - v0).cross(v2 - v0).normalize(),
        }
    }

    fn inv_area(&self) -> f32 {
        1.0 / self.total_area
    }

    fn bsdf(&self) -> &dyn Bsdf {
        self.bsdf.as_ref()
    }

    fn emitter(&self) -> Option<&dyn Emitter> {
        self.emitter.as_deref()
    }
}
