//! Axis-aligned bounding box.

use crate::{Ray, Vec3};

/// An axis-aligned box given by its two corners.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from two corner points (in any order).
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create an AABB from a center and half-extents.
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Side lengths of the box.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Test whether a point lies inside the box (boundary inclusive).
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Test if a ray intersects this box within its valid range.
    ///
    /// Slab method, one axis at a time.
    pub fn intersect(&self, ray: &Ray) -> bool {
        let mut t_min = ray.mint;
        let mut t_max = ray.maxt;

        for axis in 0..3 {
            let adinv = 1.0 / ray.direction[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * adinv;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return false;
            }
        }
        true
    }
}
