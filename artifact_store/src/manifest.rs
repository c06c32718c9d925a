//! Artifact version manifests (`artifacts/<name>/v<N>/manifest.json`).

use std::fs::{self, File};
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::StoreError;

const MANIFEST_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/artifact_manifest/v1.schema.json"
));

/// Immutable description of one published artifact version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactManifest {
    pub name: String,
    pub version: u32,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    /// SHA-256 over the per-file digests, used to detect unchanged content.
    pub digest: String,
    pub files: Vec<ManifestFile>,
    pub metadata: Map<String, Value>,
    pub created_at: String,
    pub producer_run_id: Option<String>,
}

/// One file stored under a version's `files/` directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFile {
    pub name: String,
    pub size: u64,
    pub sha256: String,
}

impl ArtifactManifest {
    /// Stable `name:vN` identifier.
    pub fn id(&self) -> String {
        format!("{}:v{}", self.name, self.version)
    }
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn file_sha256(path: &Path) -> Result<String, StoreError> {
    let mut file =
        File::open(path).map_err(|err| StoreError::io(format!("open {}", path.display()), err))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|err| StoreError::io(format!("hash {}", path.display()), err))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Combined digest over file names and their digests, independent of input order.
pub fn content_digest(files: &[ManifestFile]) -> String {
    let mut entries: Vec<&ManifestFile> = files.iter().collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    let mut hasher = Sha256::new();
    for entry in entries {
        hasher.update(entry.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(entry.sha256.as_bytes());
        hasher.update([b'\n']);
    }
    hex::encode(hasher.finalize())
}

/// Load a manifest and validate it against the manifest schema.
pub fn load_manifest(path: &Path) -> Result<ArtifactManifest, StoreError> {
    debug!(path = %path.display(), "loading manifest");
    let contents = fs::read_to_string(path)
        .map_err(|err| StoreError::io(format!("read manifest {}", path.display()), err))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|err| StoreError::json(format!("parse manifest {}", path.display()), err))?;
    validate_schema(path, &value)?;
    serde_json::from_value(value)
        .map_err(|err| StoreError::json(format!("deserialize manifest {}", path.display()), err))
}

/// Write a manifest as pretty-printed JSON with trailing newline.
pub fn write_manifest(path: &Path, manifest: &ArtifactManifest) -> Result<(), StoreError> {
    let mut buf = serde_json::to_string_pretty(manifest)
        .map_err(|err| StoreError::json("serialize manifest", err))?;
    buf.push('\n');
    fs::write(path, buf)
        .map_err(|err| StoreError::io(format!("write manifest {}", path.display()), err))
}

fn validate_schema(path: &Path, manifest: &Value) -> Result<(), StoreError> {
    let schema: Value = serde_json::from_str(MANIFEST_SCHEMA)
        .map_err(|err| StoreError::json("parse manifest schema", err))?;
    let compiled =
        jsonschema::validator_for(&schema).map_err(|err| StoreError::InvalidManifest {
            path: path.to_path_buf(),
            messages: format!("invalid schema: {err}"),
        })?;
    if compiled.is_valid(manifest) {
        return Ok(());
    }
    let messages = compiled
        .iter_errors(manifest)
        .map(|err| err.to_string())
        .collect::<Vec<_>>();
    Err(StoreError::InvalidManifest {
        path: path.to_path_buf(),
        messages: messages.join("; "),
    })
}
