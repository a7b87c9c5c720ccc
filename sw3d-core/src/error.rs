/// Error types for geometry construction and scene configuration
use std::path::PathBuf;

/// Geometry inputs that cannot produce a well-formed result
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid gear parameters: {reason}")]
    InvalidGearParameters { reason: String },
    #[error("degenerate plane: the three points are collinear or coincident")]
    DegeneratePlane,
    #[error("light lies on the shadow plane; the projection is undefined")]
    LightOnPlane,
}

impl GeometryError {
    pub(crate) fn gear(reason: impl Into<String>) -> Self {
        GeometryError::InvalidGearParameters {
            reason: reason.into(),
        }
    }
}

/// Scene file loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
