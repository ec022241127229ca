// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod aabb;
mod frame;
mod ray;
pub mod warp;

pub use aabb::Aabb;
pub use frame::Frame;
pub use ray::Ray;

/// Ray epsilon used to avoid self-intersection at ray origins.
pub const RAY_EPSILON: f32 = 1e-4;

pub const INV_PI: f32 = std::f32::consts::FRAC_1_PI;
pub const INV_TWO_PI: f32 = 0.5 * std::f32::consts::FRAC_1_PI;
pub const INV_FOUR_PI: f32 = 0.25 * std::f32::consts::FRAC_1_PI;
