//! Store errors

use std::path::PathBuf;

#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the snapshot file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A document could not be (de)serialized.
    Serialize(serde_json::Error),
    /// The snapshot or a stored document has an unexpected shape.
    Corrupt { path: PathBuf, message: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Serialize(e) => write!(f, "document serialization failed: {e}"),
            Self::Corrupt { path, message } => {
                write!(f, "corrupt store {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize(e) => Some(e),
            Self::Corrupt { .. } => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e)
    }
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
