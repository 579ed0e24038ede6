use thiserror::Error;

/// Errors raised by scene operations.
///
/// Every variant is a contract violation reported before the scene is
/// mutated, so a failed call leaves the registry as it was.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Unsupported primitive kind: {0}")]
    UnsupportedKind(String),

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Parent cycle detected at {0}")]
    Cycle(String),

    #[error("Viewport session has been torn down")]
    SessionClosed,
}

impl SceneError {
    pub(crate) fn primitive_not_found(key: impl std::fmt::Debug) -> Self {
        SceneError::NotFound {
            what: "Primitive",
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn connector_not_found(key: impl std::fmt::Debug) -> Self {
        SceneError::NotFound {
            what: "Connector",
            key: format!("{key:?}"),
        }
    }
}

/// Asset loading and adoption errors
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Expected exactly one root primitive, found {0}")]
    AmbiguousRoot(usize),

    #[error("Invalid reference in asset graph: {0}")]
    InvalidReference(String),
}

/// Frame presentation errors reported by a render backend
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Render surface lost or outdated")]
    SurfaceLost,

    #[error("Out of memory")]
    OutOfMemory,

    #[error("Timed out acquiring the next frame")]
    Timeout,

    #[error("Render backend error: {0}")]
    Other(String),
}

pub type Result<T, E = SceneError> = std::result::Result<T, E>;
