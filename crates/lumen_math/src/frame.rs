//! Orthonormal shading frame.
//!
//! Directions are expressed in a local coordinate system where the z axis
//! is the (shading) normal. All BSDF and warp math operates in this frame.

use crate::Vec3;

/// An orthonormal basis attached to a surface point.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub s: Vec3,
    pub t: Vec3,
    pub n: Vec3,
}

impl Frame {
    /// Build a frame around a unit normal.
    pub fn from_normal(n: Vec3) -> Self {
        // Duff et al. branchless basis, stable for all normals
        let sign = 1.0_f32.copysign(n.z);
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;
        let s = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
        let t = Vec3::new(b, sign + n.y * n.y * a, -n.y);
        Self { s, t, n }
    }

    /// Transform a world-space direction into the local frame.
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.s), v.dot(self.t), v.dot(self.n))
    }

    /// Transform a local direction back to world space.
    #[inline]
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        v.x * self.s + v.y * self.t + v.z * self.n
    }

    /// Cosine of the angle between a local direction and the normal.
    #[inline]
    pub fn cos_theta(v: Vec3) -> f32 {
        v.z
    }

    /// Squared sine of the angle between a local direction and the normal.
    #[inline]
    pub fn sin_theta2(v: Vec3) -> f32 {
        (1.0 - v.z * v.z).max(0.0)
    }

    /// Tangent of the angle between a local direction and the normal.
    #[inline]
    pub fn tan_theta(v: Vec3) -> f32 {
        Self::sin_theta2(v).sqrt() / v.z
    }
}
