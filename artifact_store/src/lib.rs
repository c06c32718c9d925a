//! Versioned artifact store with run bookkeeping.
//!
//! An artifact is a named, immutable, versioned snapshot of one or more files.
//! Jobs interact with the store through the [`ArtifactStore`] trait:
//!
//! - a run is started with a job type and records its configuration,
//! - input artifacts are fetched by reference (`name`, `name:latest`, `name:vN`),
//! - outputs are published as new versions linked to the producing run,
//! - the run is finished with a final status.
//!
//! [`local::LocalArtifactStore`] implements the trait on the local filesystem.

pub mod error;
pub mod local;
pub mod manifest;
pub mod reference;
pub mod run;

use std::path::PathBuf;

use serde_json::{Map, Value};

pub use error::StoreError;
pub use local::LocalArtifactStore;
pub use reference::{ArtifactRef, VersionSelector};
pub use run::{RunRecord, RunStatus};

/// Parameters for publishing a new artifact version.
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    pub name: &'a str,
    pub artifact_type: &'a str,
    pub description: &'a str,
    pub files: &'a [PathBuf],
    /// Free-form descriptive metadata stored in the manifest.
    pub metadata: Map<String, Value>,
}

/// A published (or deduplicated) artifact version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactVersion {
    pub name: String,
    pub version: u32,
    pub digest: String,
    /// False when identical content already existed and no version was added.
    pub created: bool,
}

impl ArtifactVersion {
    /// Stable `name:vN` identifier.
    pub fn id(&self) -> String {
        format!("{}:v{}", self.name, self.version)
    }
}

/// Abstraction over artifact storage backends.
///
/// Every method that takes a run updates it in place and persists it, so the
/// run record always reflects what the job has done so far.
pub trait ArtifactStore {
    /// Begin a run for `job_type`.
    fn start_run(&self, job_type: &str) -> Result<RunRecord, StoreError>;

    /// Merge `config` into the run's recorded configuration.
    fn record_config(&self, run: &mut RunRecord, config: Map<String, Value>)
    -> Result<(), StoreError>;

    /// Resolve `reference` to the local path of its single file.
    fn fetch(&self, run: &mut RunRecord, reference: &ArtifactRef) -> Result<PathBuf, StoreError>;

    /// Publish files as a new version of `request.name`.
    fn publish(
        &self,
        run: &mut RunRecord,
        request: &PublishRequest<'_>,
    ) -> Result<ArtifactVersion, StoreError>;

    /// Mark the run finished (or failed).
    fn finish_run(&self, run: &mut RunRecord, status: RunStatus) -> Result<(), StoreError>;
}
