//! Error type for artifact store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving, fetching, or publishing artifacts.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reference string could not be parsed.
    #[error("invalid artifact reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Artifact name contains characters outside `[A-Za-z0-9._-]`.
    #[error("invalid artifact name '{0}': must be [A-Za-z0-9._-] only")]
    InvalidName(String),

    /// Artifact type is empty or whitespace.
    #[error("invalid artifact type '{0}': must be non-empty")]
    InvalidType(String),

    /// No artifact (or no such version) exists for the reference.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Stored file no longer matches the digest recorded in its manifest.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Caller asked for a single file but the version holds several.
    #[error("artifact {artifact} holds {count} files; expected exactly one")]
    AmbiguousFile { artifact: String, count: usize },

    /// Publishing under an existing name with a different artifact type.
    #[error("artifact {name} has type '{existing}', cannot publish as '{requested}'")]
    TypeMismatch {
        name: String,
        existing: String,
        requested: String,
    },

    /// Publish request carried no files.
    #[error("artifact {0} must contain at least one file")]
    EmptyArtifact(String),

    /// Two files in a publish request share the same file name.
    #[error("artifact {name} lists file '{file}' more than once")]
    DuplicateFile { name: String, file: String },

    /// Manifest on disk does not conform to the manifest schema.
    #[error("invalid manifest {path}: {messages}")]
    InvalidManifest { path: PathBuf, messages: String },

    /// Filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Manifest or run record (de)serialization failed.
    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }
}
