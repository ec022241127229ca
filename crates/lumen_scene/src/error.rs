//! Scene construction errors.

use thiserror::Error;

/// Errors raised while loading or validating a scene description.
///
/// Configuration problems are fatal at build time and carry the
/// offending component and value so the description can be fixed.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed scene description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to load texture {path}: {message}")]
    Texture { path: String, message: String },

    #[error("Invalid {component} configuration: {message}")]
    Invalid { component: &'static str, message: String },
}

impl SceneError {
    pub fn invalid(component: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            component,
            message: message.into(),
        }
    }
}

pub type SceneResult<T> = Result<T, SceneError>;
