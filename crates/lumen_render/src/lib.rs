//! Lumen render core - CPU Monte Carlo light transport.
//!
//! Estimates per-pixel radiance by Monte Carlo integration of the
//! rendering (and, with a participating medium, volume rendering)
//! equation: sampling warps and BSDF/emitter/medium abstractions are
//! combined by integrator state machines, driven over the image by a
//! tile-parallel scheduler.

mod block;
mod bsdf;
mod camera;
mod direct;
mod emitter;
mod filter;
mod integrator;
mod medium;
mod microfacet;
mod path;
mod phase;
mod primitive;
mod renderer;
mod sampler;
mod scene;
mod texture;
mod volpath;

pub use block::{BlockDescriptor, BlockGenerator, ImageBlock, BLOCK_SIZE};
pub use bsdf::{fresnel_dielectric, Bsdf, BsdfSample, Dielectric, Diffuse, Measure};
pub use camera::Camera;
pub use direct::{DirectLighting, DirectSamplingMode};
pub use emitter::{AreaEmitter, Emitter, EmitterQueryRecord};
pub use filter::{BoxFilter, ReconstructionFilter, TentFilter};
pub use integrator::{AmbientOcclusion, Integrator, IntersectionsIntegrator, NormalsIntegrator};
pub use medium::{DensityProfile, Medium, MediumEvent};
pub use microfacet::Microfacet;
pub use path::{PathSamplingMode, PathTracer};
pub use phase::{IsotropicPhase, PhaseFunction};
pub use primitive::{Parallelogram, Primitive, PrimitiveHit, SurfaceSample, TriangleMesh};
pub use renderer::{color_to_rgba, render, RenderOptions, RenderedImage};
pub use sampler::{IndependentSampler, Sampler};
pub use scene::{Intersection, Scene};
pub use texture::Texture;
pub use volpath::VolumePathTracer;

/// Re-export common math types from lumen_math
pub use lumen_math::{Aabb, Frame, Ray, Vec2, Vec3};

/// Radiance / reflectance triple (RGB, linear)
pub type Color = Vec3;

/// Largest of the three color channels, used for RR survival
/// probabilities and specular lobe weights.
#[inline]
pub fn max_channel(c: Color) -> f32 {
    c.x.max(c.y).max(c.z)
}

/// Shared density guard: estimators divide only by densities that are
/// strictly positive and finite, everything else zeroes the local
/// contribution instead of propagating NaN/Inf into the image.
#[inline]
pub fn valid_density(pdf: f32) -> bool {
    pdf > 0.0 && pdf.is_finite()
}
