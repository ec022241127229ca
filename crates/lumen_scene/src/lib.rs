//! Scene description layer for lumen.
//!
//! JSON descriptions are deserialized into typed component structs,
//! validated, and assembled into the immutable render scene. All
//! configuration errors are fatal at build time.

mod desc;
mod error;

use std::path::Path;

pub use desc::{
    BsdfDesc, CameraDesc, IntegratorDesc, MediumDesc, PrimitiveDesc, SamplerDesc, SceneDesc,
};
pub use error::{SceneError, SceneResult};

use lumen_render::Scene;

/// Parse a scene description from a JSON string. Relative texture
/// paths resolve against the working directory.
pub fn parse_scene(json: &str) -> SceneResult<Scene> {
    let desc: SceneDesc = serde_json::from_str(json)?;
    desc.build(None)
}

/// Load and build a scene from a JSON file. Relative texture paths
/// resolve against the file's directory.
pub fn load_scene(path: impl AsRef<Path>) -> SceneResult<Scene> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let desc: SceneDesc = serde_json::from_str(&json)?;
    desc.build(path.parent())
}
