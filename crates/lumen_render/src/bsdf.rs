//! Material (BSDF) abstraction.
//!
//! All directions are unit vectors in the local shading frame (z up,
//! pointing away from the surface). `eval` returns the BSDF value in
//! the solid-angle measure without the outgoing cosine; integrators
//! multiply the cosine explicitly where the transport equation needs
//! it. Discrete events (ideal reflection/refraction) carry no
//! solid-angle density: their `eval`/`pdf` are identically zero and
//! the sample weight cancels the selection probability by
//! construction.

use crate::texture::Texture;
use crate::{valid_density, Color};
use lumen_math::{warp, Frame, Vec2, Vec3, INV_PI, INV_TWO_PI};

/// Measure associated with a sampled scattering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Continuous density with respect to solid angle
    SolidAngle,
    /// One of a finite set of deterministic outcomes
    Discrete,
}

/// Result of importance-sampling a BSDF.
#[derive(Debug, Clone, Copy)]
pub struct BsdfSample {
    /// Sampled outgoing direction (local frame)
    pub wo: Vec3,
    /// Importance weight: eval * cos(theta_o) / pdf, or unit for
    /// discrete events. Zero signals a failed sample.
    pub weight: Color,
    /// Measure of the sampled event
    pub measure: Measure,
    /// Relative index of refraction across the sampled interface
    pub eta: f32,
}

impl BsdfSample {
    /// A failed sample; integrators treat this as path termination.
    pub fn invalid() -> Self {
        Self {
            wo: Vec3::Z,
            weight: Color::ZERO,
            measure: Measure::SolidAngle,
            eta: 1.0,
        }
    }
}

/// Surface scattering model.
pub trait Bsdf: Send + Sync {
    /// Evaluate the BSDF for a pair of local directions (solid-angle
    /// measure, no cosine factor).
    fn eval(&self, wi: Vec3, wo: Vec3, uv: Vec2) -> Color;

    /// Density of `sample` with respect to solid angle.
    fn pdf(&self, wi: Vec3, wo: Vec3) -> f32;

    /// Importance-sample an outgoing direction for the given incoming
    /// direction.
    fn sample(&self, wi: Vec3, uv: Vec2, sample: Vec2) -> BsdfSample;

    /// Approximate albedo, used by hemisphere-sampling integrators.
    fn albedo(&self, uv: Vec2) -> Color;

    /// Whether `sample` draws cosine-weighted directions; integrators
    /// use this to pick the matching hemisphere pdf.
    fn uses_cosine(&self) -> bool {
        false
    }
}

/// Unpolarized Fresnel reflectance at a dielectric interface.
///
/// `cos_theta_i` is measured against the geometric normal; negative
/// values mean the interaction starts inside the object.
pub fn fresnel_dielectric(mut cos_theta_i: f32, ext_ior: f32, int_ior: f32) -> f32 {
    let mut eta_i = ext_ior;
    let mut eta_t = int_ior;
    if (ext_ior - int_ior).abs() < 1e-4 {
        return 0.0;
    }
    if cos_theta_i < 0.0 {
        std::mem::swap(&mut eta_i, &mut eta_t);
        cos_theta_i = -cos_theta_i;
    }

    // Snell's law gives the squared sine of the transmitted angle
    let eta = eta_i / eta_t;
    let sin_theta_t2 = eta * eta * (1.0 - cos_theta_i * cos_theta_i);
    if sin_theta_t2 > 1.0 {
        return 1.0; // total internal reflection
    }
    let cos_theta_t = (1.0 - sin_theta_t2).sqrt();

    let rs = (eta_i * cos_theta_i - eta_t * cos_theta_t) / (eta_i * cos_theta_i + eta_t * cos_theta_t);
    let rp = (eta_t * cos_theta_i - eta_i * cos_theta_t) / (eta_t * cos_theta_i + eta_i * cos_theta_t);
    (rs * rs + rp * rp) / 2.0
}

fn refract(wi: Vec3, n: Vec3, mut eta: f32) -> Vec3 {
    let cos_theta_i = wi.dot(n);
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
    }
    let cos_theta_t2 = 1.0 - (1.0 - cos_theta_i * cos_theta_i) * (eta * eta);
    if cos_theta_t2 <= 0.0 {
        return Vec3::ZERO;
    }
    let sign = if cos_theta_i >= 0.0 { 1.0 } else { -1.0 };
    n * (-cos_theta_i * eta + sign * cos_theta_t2.sqrt()) + wi * eta
}

/// Lambertian material with an optional per-texel albedo override.
pub struct Diffuse {
    albedo: Color,
    texture: Option<Texture>,
    use_cosine: bool,
}

impl Diffuse {
    pub fn new(albedo: Color, use_cosine: bool) -> Self {
        Self {
            albedo,
            texture: None,
            use_cosine,
        }
    }

    /// Override the constant albedo with a texture lookup.
    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }
}

impl Bsdf for Diffuse {
    fn eval(&self, wi: Vec3, wo: Vec3, uv: Vec2) -> Color {
        // Smooth BRDF: zero when queried on the backside
        if Frame::cos_theta(wi) <= 0.0 || Frame::cos_theta(wo) <= 0.0 {
            return Color::ZERO;
        }
        self.albedo(uv) * INV_PI
    }

    fn pdf(&self, wi: Vec3, wo: Vec3) -> f32 {
        if Frame::cos_theta(wi) <= 0.0 || Frame::cos_theta(wo) <= 0.0 {
            return 0.0;
        }
        if self.use_cosine {
            Frame::cos_theta(wo) * INV_PI
        } else {
            INV_TWO_PI
        }
    }

    fn sample(&self, wi: Vec3, uv: Vec2, sample: Vec2) -> BsdfSample {
        if Frame::cos_theta(wi) <= 0.0 {
            return BsdfSample::invalid();
        }
        let wo = if self.use_cosine {
            warp::square_to_cosine_hemisphere(sample)
        } else {
            warp::square_to_uniform_hemisphere(sample)
        };
        let pdf = self.pdf(wi, wo);
        if !valid_density(pdf) {
            return BsdfSample::invalid();
        }
        BsdfSample {
            wo,
            weight: self.eval(wi, wo, uv) * Frame::cos_theta(wo) / pdf,
            measure: Measure::SolidAngle,
            eta: 1.0,
        }
    }

    fn albedo(&self, uv: Vec2) -> Color {
        match &self.texture {
            Some(texture) => texture.lookup(uv.x, uv.y),
            None => self.albedo,
        }
    }

    fn uses_cosine(&self) -> bool {
        self.use_cosine
    }
}

/// Ideal dielectric (smooth glass) interface.
pub struct Dielectric {
    int_ior: f32,
    ext_ior: f32,
}

impl Dielectric {
    pub fn new(int_ior: f32, ext_ior: f32) -> Self {
        Self { int_ior, ext_ior }
    }
}

impl Bsdf for Dielectric {
    fn eval(&self, _wi: Vec3, _wo: Vec3, _uv: Vec2) -> Color {
        // Discrete BSDFs always evaluate to zero
        Color::ZERO
    }

    fn pdf(&self, _wi: Vec3, _wo: Vec3) -> f32 {
        0.0
    }

    fn sample(&self, wi: Vec3, _uv: Vec2, sample: Vec2) -> BsdfSample {
        let cos_theta_i = Frame::cos_theta(wi);
        let kr = fresnel_dielectric(cos_theta_i, self.ext_ior, self.int_ior);
        if sample.x < kr {
            // Specular reflection about the local normal
            BsdfSample {
                wo: Vec3::new(-wi.x, -wi.y, wi.z),
                weight: Color::ONE,
                measure: Measure::Discrete,
                eta: 1.0,
            }
        } else {
            let mut n = Vec3::Z;
            let mut eta = self.int_ior / self.ext_ior;
            if cos_theta_i < 0.0 {
                eta = self.ext_ior / self.int_ior;
                n = -Vec3::Z;
            }
            let wo = refract(-wi, n, eta);
            BsdfSample {
                wo,
                weight: Color::ONE,
                measure: Measure::Discrete,
                eta,
            }
        }
    }

    fn albedo(&self, _uv: Vec2) -> Color {
        Color::splat(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{IndependentSampler, Sampler};
    use std::f32::consts::PI;

    fn hemi_dir(theta: f32, phi: f32) -> Vec3 {
        Vec3::new(
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        )
    }

    #[test]
    fn test_fresnel_normal_incidence() {
        // ((n1 - n2)/(n1 + n2))^2 for glass/air is about 4%
        let kr = fresnel_dielectric(1.0, 1.0, 1.5);
        assert!((kr - 0.04).abs() < 0.005, "kr = {kr}");
    }

    #[test]
    fn test_fresnel_total_internal_reflection() {
        // From inside glass at a grazing angle
        let kr = fresnel_dielectric(-0.1, 1.0, 1.5);
        assert_eq!(kr, 1.0);
    }

    #[test]
    fn test_fresnel_matched_media() {
        assert_eq!(fresnel_dielectric(0.7, 1.5, 1.5), 0.0);
    }

    #[test]
    fn test_diffuse_reciprocity() {
        let bsdf = Diffuse::new(Color::new(0.4, 0.5, 0.6), true);
        let wi = hemi_dir(0.3, 1.0);
        let wo = hemi_dir(1.1, 4.0);
        let uv = Vec2::ZERO;
        assert_eq!(bsdf.eval(wi, wo, uv), bsdf.eval(wo, wi, uv));
    }

    #[test]
    fn test_diffuse_zero_below_horizon() {
        let bsdf = Diffuse::new(Color::splat(0.5), true);
        let wi = hemi_dir(0.3, 0.0);
        let below = Vec3::new(0.0, 0.5, -0.5).normalize();
        assert_eq!(bsdf.eval(wi, below, Vec2::ZERO), Color::ZERO);
        assert_eq!(bsdf.pdf(wi, below), 0.0);
        assert_eq!(bsdf.eval(below, wi, Vec2::ZERO), Color::ZERO);
    }

    #[test]
    fn test_diffuse_sample_consistency() {
        // weight == eval * cos / pdf for both sampling modes
        for use_cosine in [false, true] {
            let bsdf = Diffuse::new(Color::splat(0.7), use_cosine);
            let mut sampler = IndependentSampler::new(11, 1);
            let wi = hemi_dir(0.5, 2.0);
            for _ in 0..1000 {
                let s = bsdf.sample(wi, Vec2::ZERO, sampler.next_2d());
                assert_eq!(s.measure, Measure::SolidAngle);
                let pdf = bsdf.pdf(wi, s.wo);
                let expected =
                    bsdf.eval(wi, s.wo, Vec2::ZERO) * Frame::cos_theta(s.wo) / pdf;
                assert!((s.weight - expected).length() < 1e-5);
            }
        }
    }

    #[test]
    fn test_diffuse_estimator_mean_is_albedo() {
        // E[weight] = albedo for both modes (mode invariance)
        for use_cosine in [false, true] {
            let albedo = 0.65;
            let bsdf = Diffuse::new(Color::splat(albedo), use_cosine);
            let mut sampler = IndependentSampler::new(3, 1);
            let wi = Vec3::Z;
            let n = 100_000;
            let mut mean = Color::ZERO;
            for _ in 0..n {
                mean += bsdf.sample(wi, Vec2::ZERO, sampler.next_2d()).weight;
            }
            mean /= n as f32;
            assert!(
                (mean.x - albedo).abs() < 0.01,
                "use_cosine = {use_cosine}, mean = {mean}"
            );
        }
    }

    #[test]
    fn test_diffuse_energy_conservation() {
        // Integral of eval * cos over the hemisphere equals the albedo
        let albedo = 0.8;
        let bsdf = Diffuse::new(Color::splat(albedo), true);
        let wi = hemi_dir(0.4, 0.0);
        let n_theta = 256;
        let n_phi = 256;
        let mut total = 0.0;
        for i in 0..n_theta {
            let theta = (i as f32 + 0.5) * 0.5 * PI / n_theta as f32;
            for j in 0..n_phi {
                let phi = (j as f32 + 0.5) * 2.0 * PI / n_phi as f32;
                let wo = hemi_dir(theta, phi);
                total += bsdf.eval(wi, wo, Vec2::ZERO).x
                    * theta.cos()
                    * theta.sin()
                    * (0.5 * PI / n_theta as f32)
                    * (2.0 * PI / n_phi as f32);
            }
        }
        assert!((total - albedo).abs() < 0.01, "integral = {total}");
        assert!(total <= 1.0);
    }

    #[test]
    fn test_diffuse_texture_override() {
        let texture = Texture::from_pixels(1, 1, vec![Color::new(0.9, 0.1, 0.2)]);
        let bsdf = Diffuse::new(Color::splat(0.5), true).with_texture(texture);
        assert_eq!(bsdf.albedo(Vec2::new(0.5, 0.5)), Color::new(0.9, 0.1, 0.2));
    }

    #[test]
    fn test_dielectric_discrete_measure() {
        let bsdf = Dielectric::new(1.5046, 1.000277);
        let wi = hemi_dir(0.7, 1.3);
        let wo = hemi_dir(0.2, 0.4);
        assert_eq!(bsdf.eval(wi, wo, Vec2::ZERO), Color::ZERO);
        assert_eq!(bsdf.pdf(wi, wo), 0.0);
    }

    #[test]
    fn test_dielectric_sample_unit_weight() {
        let bsdf = Dielectric::new(1.5046, 1.000277);
        let mut sampler = IndependentSampler::new(5, 1);
        let wi = hemi_dir(0.6, 0.0);
        for _ in 0..1000 {
            let s = bsdf.sample(wi, Vec2::ZERO, sampler.next_2d());
            assert_eq!(s.measure, Measure::Discrete);
            assert_eq!(s.weight, Color::ONE);
            assert!((s.wo.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_dielectric_reflection_mirrors_tangent() {
        let bsdf = Dielectric::new(10.0, 1.0); // high IOR: mostly reflective
        let wi = hemi_dir(1.4, 0.0); // grazing, kr near 1
        let s = bsdf.sample(wi, Vec2::ZERO, Vec2::new(0.0, 0.0));
        assert!((s.wo - Vec3::new(-wi.x, -wi.y, wi.z)).length() < 1e-6);
    }

    #[test]
    fn test_dielectric_refraction_bends_down() {
        let bsdf = Dielectric::new(1.5, 1.0);
        let wi = hemi_dir(0.3, 0.0);
        // sample.x = 0.99 forces the refraction branch at near-normal incidence
        let s = bsdf.sample(wi, Vec2::ZERO, Vec2::new(0.99, 0.0));
        assert!(Frame::cos_theta(s.wo) < 0.0, "wo = {:?}", s.wo);
        assert!((s.eta - 1.5).abs() < 1e-6);
    }
}
