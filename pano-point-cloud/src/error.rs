/// Error types for the conversion pipeline
use std::fmt;
use std::path::PathBuf;

/// The three failure classes a conversion run can end in.
/// Displayed as the name of the stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    InvalidConfig,
    Write,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Decode => write!(f, "decode"),
            ErrorKind::InvalidConfig => write!(f, "configuration"),
            ErrorKind::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read panorama metadata {path}: {source}")]
    SidecarRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse panorama metadata {path}: {source}")]
    SidecarParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported output extension for {0} (expected .ply or .xyz)")]
    UnsupportedExtension(PathBuf),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode preview {path}: {source}")]
    PreviewEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to serialise run metadata {path}: {source}")]
    MetadataEncode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Decode { .. }
            | PipelineError::SidecarRead { .. }
            | PipelineError::SidecarParse { .. } => ErrorKind::Decode,
            PipelineError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            PipelineError::UnsupportedExtension(_)
            | PipelineError::Write { .. }
            | PipelineError::PreviewEncode { .. }
            | PipelineError::MetadataEncode { .. } => ErrorKind::Write,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
