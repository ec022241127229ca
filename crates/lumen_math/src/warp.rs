//! Sampling warps.
//!
//! Pure functions mapping uniformly distributed points on `[0,1]^2` to
//! points or directions under a target density, each paired with the
//! density function of the produced sample. The density is expressed in
//! the measure the corresponding transport computation divides by (area
//! on the plane, solid angle on the sphere, half-vector solid angle for
//! Beckmann) and is exactly zero outside the support.

use crate::{Vec2, Vec3, INV_FOUR_PI, INV_PI, INV_TWO_PI};
use std::f32::consts::PI;

/// Identity warp: uniform density on the unit square.
pub fn square_to_uniform_square(sample: Vec2) -> Vec2 {
    sample
}

pub fn square_to_uniform_square_pdf(p: Vec2) -> f32 {
    if p.x >= 0.0 && p.x <= 1.0 && p.y >= 0.0 && p.y <= 1.0 {
        1.0
    } else {
        0.0
    }
}

fn tent(x: f32) -> f32 {
    if x < 0.5 {
        (2.0 * x).sqrt() - 1.0
    } else {
        1.0 - (2.0 - 2.0 * x).sqrt()
    }
}

fn tent_pdf(t: f32) -> f32 {
    if (-1.0..=1.0).contains(&t) {
        1.0 - t.abs()
    } else {
        0.0
    }
}

/// Tent warp over `[-1,1]^2`, separable in x and y.
pub fn square_to_tent(sample: Vec2) -> Vec2 {
    Vec2::new(tent(sample.x), tent(sample.y))
}

pub fn square_to_tent_pdf(p: Vec2) -> f32 {
    tent_pdf(p.x) * tent_pdf(p.y)
}

/// Uniform density on the unit disk, radius/angle decomposition.
pub fn square_to_uniform_disk(sample: Vec2) -> Vec2 {
    let radius = sample.x.sqrt();
    let angle = sample.y * 2.0 * PI;
    Vec2::new(radius * angle.cos(), radius * angle.sin())
}

pub fn square_to_uniform_disk_pdf(p: Vec2) -> f32 {
    if p.length_squared() <= 1.0 {
        INV_PI
    } else {
        0.0
    }
}

/// Uniform density on the unit sphere.
pub fn square_to_uniform_sphere(sample: Vec2) -> Vec3 {
    let phi = sample.x * 2.0 * PI;
    let cos_theta = 1.0 - 2.0 * sample.y;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

pub fn square_to_uniform_sphere_pdf(_v: Vec3) -> f32 {
    INV_FOUR_PI
}

/// Uniform density on the upper hemisphere (z >= 0).
pub fn square_to_uniform_hemisphere(sample: Vec2) -> Vec3 {
    let cos_theta = sample.y;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * sample.x;
    Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta)
}

pub fn square_to_uniform_hemisphere_pdf(v: Vec3) -> f32 {
    if v.z < 0.0 {
        0.0
    } else {
        INV_TWO_PI
    }
}

/// Cosine-weighted density on the upper hemisphere, built by lifting a
/// uniform disk sample onto the hemisphere cap.
pub fn square_to_cosine_hemisphere(sample: Vec2) -> Vec3 {
    let bottom = square_to_uniform_disk(sample);
    let z = (1.0 - bottom.length_squared()).max(0.0).sqrt();
    Vec3::new(bottom.x, bottom.y, z)
}

pub fn square_to_cosine_hemisphere_pdf(v: Vec3) -> f32 {
    if v.z < 0.0 {
        0.0
    } else {
        v.z * INV_PI
    }
}

/// Beckmann half-vector distribution with roughness alpha.
pub fn square_to_beckmann(sample: Vec2, alpha: f32) -> Vec3 {
    let phi = 2.0 * PI * sample.x;
    let theta = (-alpha * alpha * (1.0 - sample.y).ln()).sqrt().atan();
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Solid-angle density of `square_to_beckmann`.
pub fn square_to_beckmann_pdf(m: Vec3, alpha: f32) -> f32 {
    if m.z <= 0.0 {
        return 0.0;
    }
    let alpha2 = alpha * alpha;
    let cos_theta = m.z;
    let tan_theta2 = (m.x * m.x + m.y * m.y) / (cos_theta * cos_theta);
    let cos_theta3 = cos_theta * cos_theta * cos_theta;
    INV_PI * (-tan_theta2 / alpha2).exp() / (alpha2 * cos_theta3)
}
