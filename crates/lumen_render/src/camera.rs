//! Perspective camera.

use lumen_math::{warp, Ray, Vec2, Vec3};

/// Look-at perspective camera with an optional thin-lens aperture.
pub struct Camera {
    resolution: (u32, u32),
    eye: Vec3,
    /// Camera basis: right / up / forward
    u: Vec3,
    v: Vec3,
    w: Vec3,
    /// Half extents of the image plane at unit distance
    half_width: f32,
    half_height: f32,
    aperture_radius: f32,
    focus_distance: f32,
}

impl Camera {
    /// `vfov_degrees` is the full vertical field of view. A zero
    /// `aperture_radius` gives a pinhole camera; otherwise rays
    /// converge on the plane `focus_distance` along the view axis.
    pub fn new(
        resolution: (u32, u32),
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        vfov_degrees: f32,
        aperture_radius: f32,
        focus_distance: f32,
    ) -> Self {
        let w = (target - eye).normalize();
        let u = w.cross(up).normalize();
        let v = u.cross(w);
        let half_height = (0.5 * vfov_degrees.to_radians()).tan();
        let aspect = resolution.0 as f32 / resolution.1 as f32;
        Self {
            resolution,
            eye,
            u,
            v,
            w,
            half_width: half_height * aspect,
            half_height,
            aperture_radius,
            focus_distance,
        }
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Map a raster-space sample position (in pixels, origin at the
    /// top-left corner) plus an aperture sample to a primary ray.
    pub fn generate_ray(&self, pixel_sample: Vec2, aperture_sample: Vec2) -> Ray {
        let ndc_x = 2.0 * pixel_sample.x / self.resolution.0 as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * pixel_sample.y / self.resolution.1 as f32;
        let direction =
            (self.w + ndc_x * self.half_width * self.u + ndc_y * self.half_height * self.v)
                .normalize();

        if self.aperture_radius == 0.0 {
            return Ray::new(self.eye, direction);
        }

        // Thin lens: jitter the origin on the aperture disk and aim
        // at the in-focus point of the pinhole ray
        let lens = self.aperture_radius * warp::square_to_uniform_disk(aperture_sample);
        let origin = self.eye + lens.x * self.u + lens.y * self.v;
        let focus = self.eye + direction * (self.focus_distance / direction.dot(self.w));
        Ray::new(origin, (focus - origin).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinhole() -> Camera {
        Camera::new(
            (200, 100),
            Vec3::ZERO,
            -Vec3::Z,
            Vec3::Y,
            90.0,
            0.0,
            1.0,
        )
    }

    #[test]
    fn test_center_ray_is_view_axis() {
        let camera = pinhole();
        let ray = camera.generate_ray(Vec2::new(100.0, 50.0), Vec2::splat(0.5));
        assert_eq!(ray.origin, Vec3::ZERO);
        assert!((ray.direction - -Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_corner_rays_span_fov() {
        // 90 degrees vertical: the top-center ray makes 45 degrees
        // with the axis
        let camera = pinhole();
        let ray = camera.generate_ray(Vec2::new(100.0, 0.0), Vec2::splat(0.5));
        let cos = ray.direction.dot(-Vec3::Z);
        assert!((cos - (0.5f32.sqrt())).abs() < 1e-4, "cos = {cos}");
        // Top of the image points up
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn test_raster_x_increases_rightward() {
        let camera = pinhole();
        let left = camera.generate_ray(Vec2::new(0.0, 50.0), Vec2::splat(0.5));
        let right = camera.generate_ray(Vec2::new(200.0, 50.0), Vec2::splat(0.5));
        // Looking down -Z with +Y up, +X is to the right
        assert!(left.direction.x < 0.0);
        assert!(right.direction.x > 0.0);
    }

    #[test]
    fn test_thin_lens_converges_at_focus_plane() {
        let camera = Camera::new(
            (100, 100),
            Vec3::ZERO,
            -Vec3::Z,
            Vec3::Y,
            60.0,
            0.1,
            3.0,
        );
        // All lens samples of the same pixel position must pass
        // through the same point on the focus plane
        let pixel = Vec2::new(30.0, 70.0);
        let at_focus = |ray: &Ray| {
            let t = (-3.0 - ray.origin.z) / ray.direction.z;
            ray.at(t)
        };
        let reference = at_focus(&camera.generate_ray(pixel, Vec2::new(0.1, 0.3)));
        for s in [Vec2::new(0.9, 0.2), Vec2::new(0.5, 0.5), Vec2::new(0.01, 0.99)] {
            let p = at_focus(&camera.generate_ray(pixel, s));
            assert!((p - reference).length() < 1e-4, "p {p} vs {reference}");
        }
    }
}
