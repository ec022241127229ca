//! Rough dielectric/diffuse microfacet material.
//!
//! A convex combination of a Lambertian base lobe and a Beckmann
//! specular lobe. The specular weight is `ks = 1 - max_channel(kd)`,
//! which keeps the sum energy-conserving without modelling the true
//! interreflection between the lobes.

use crate::bsdf::{fresnel_dielectric, Bsdf, BsdfSample, Measure};
use crate::{valid_density, Color};
use lumen_math::{warp, Frame, Vec2, Vec3, INV_PI};

pub struct Microfacet {
    alpha: f32,
    int_ior: f32,
    ext_ior: f32,
    kd: Color,
    ks: f32,
}

impl Microfacet {
    pub fn new(alpha: f32, int_ior: f32, ext_ior: f32, kd: Color) -> Self {
        Self {
            alpha,
            int_ior,
            ext_ior,
            kd,
            ks: 1.0 - kd.max_element(),
        }
    }

    /// Smith masking-shadowing term for one direction, rational
    /// Beckmann approximation. Zero when the facet faces away from wv.
    fn g1(&self, wv: Vec3, wh: Vec3) -> f32 {
        let c = wv.dot(wh) / Frame::cos_theta(wv);
        if c <= 0.0 {
            return 0.0;
        }
        let b = 1.0 / (self.alpha * Frame::tan_theta(wv));
        if b < 1.6 {
            (3.535 * b + 2.181 * b * b) / (1.0 + 2.276 * b + 2.577 * b * b)
        } else {
            1.0
        }
    }
}

impl Bsdf for Microfacet {
    fn eval(&self, wi: Vec3, wo: Vec3, _uv: Vec2) -> Color {
        if Frame::cos_theta(wi) <= 0.0 || Frame::cos_theta(wo) <= 0.0 {
            return Color::ZERO;
        }
        let wh = (wi + wo).normalize();
        let cos_theta_i = Frame::cos_theta(wi);
        let cos_theta_o = Frame::cos_theta(wo);
        let d = warp::square_to_beckmann_pdf(wh, self.alpha);
        let f = fresnel_dielectric(wh.dot(wi), self.ext_ior, self.int_ior);
        let g = self.g1(wi, wh) * self.g1(wo, wh);
        self.kd * INV_PI + Color::splat(self.ks * d * f * g / (4.0 * cos_theta_i * cos_theta_o))
    }

    fn pdf(&self, wi: Vec3, wo: Vec3) -> f32 {
        if Frame::cos_theta(wi) <= 0.0 || Frame::cos_theta(wo) <= 0.0 {
            return 0.0;
        }
        // Exact mixture of the two lobes' own densities: the Beckmann
        // half-vector density times the half-direction Jacobian, plus
        // the cosine-weighted diffuse density.
        let wh = (wi + wo).normalize();
        let d = warp::square_to_beckmann_pdf(wh, self.alpha);
        let jacobian = 1.0 / (4.0 * wh.dot(wo).abs());
        self.ks * d * jacobian + (1.0 - self.ks) * Frame::cos_theta(wo) * INV_PI
    }

    fn sample(&self, wi: Vec3, uv: Vec2, sample: Vec2) -> BsdfSample {
        if Frame::cos_theta(wi) <= 0.0 {
            return BsdfSample::invalid();
        }

        let wo = if sample.x > self.ks {
            // Diffuse lobe, remap the routing coordinate into [0,1)
            let remapped = Vec2::new((sample.x - self.ks) / (1.0 - self.ks), sample.y);
            warp::square_to_cosine_hemisphere(remapped)
        } else {
            // Specular lobe: sample a half vector, reflect wi about it
            let remapped = Vec2::new(sample.x / self.ks, sample.y);
            let wh = warp::square_to_beckmann(remapped, self.alpha);
            (2.0 * wh.dot(wi) * wh - wi).normalize()
        };

        let cos_theta = Frame::cos_theta(wo);
        if cos_theta <= 0.0 {
            return BsdfSample::invalid();
        }
        let pdf = self.pdf(wi, wo);
        if !valid_density(pdf) {
            return BsdfSample::invalid();
        }
        BsdfSample {
            wo,
            weight: self.eval(wi, wo, uv) * cos_theta / pdf,
            measure: Measure::SolidAngle,
            eta: 1.0,
        }
    }

    fn albedo(&self, _uv: Vec2) -> Color {
        self.kd
    }

    fn uses_cosine(&self) -> bool {
        true
    }
}
