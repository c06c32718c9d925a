//! Filesystem-backed artifact store.
//!
//! Layout under the store root:
//!
//! ```text
//! artifacts/<name>/v<N>/manifest.json
//! artifacts/<name>/v<N>/files/<file>
//! runs/<run_id>/run.json
//! ```
//!
//! A version directory is staged under a hidden name and renamed into place
//! once its files and manifest are complete, so a visible `v<N>` is always
//! whole.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::manifest::{
    ArtifactManifest, ManifestFile, content_digest, file_sha256, load_manifest, write_manifest,
};
use crate::reference::{ArtifactRef, VersionSelector, validate_name, validate_type};
use crate::run::{RunRecord, RunStatus, generate_run_id, load_run, write_run};
use crate::{ArtifactStore, ArtifactVersion, PublishRequest};

const MANIFEST_FILE: &str = "manifest.json";
const FILES_DIR: &str = "files";

#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn artifacts_dir(&self) -> PathBuf {
        self.root.join("artifacts")
    }

    fn artifact_dir(&self, name: &str) -> PathBuf {
        self.artifacts_dir().join(name)
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.artifact_dir(name).join(format!("v{version}"))
    }

    pub fn run_path(&self, run_id: &str) -> PathBuf {
        self.root.join("runs").join(run_id).join("run.json")
    }

    /// Load a persisted run record by id.
    pub fn load_run(&self, run_id: &str) -> Result<RunRecord, StoreError> {
        load_run(&self.run_path(run_id))
    }

    /// Published version numbers for `name`, ascending.
    pub fn versions(&self, name: &str) -> Result<Vec<u32>, StoreError> {
        validate_name(name)?;
        let dir = self.artifact_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        let entries = fs::read_dir(&dir)
            .map_err(|err| StoreError::io(format!("read {}", dir.display()), err))?;
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io("read entry", err))?;
            let file_name = entry.file_name();
            let Some(version) = file_name
                .to_str()
                .and_then(|name| name.strip_prefix('v'))
                .and_then(|digits| digits.parse::<u32>().ok())
            else {
                continue;
            };
            if entry.path().join(MANIFEST_FILE).is_file() {
                versions.push(version);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// Resolve a reference to its manifest.
    pub fn resolve(&self, reference: &ArtifactRef) -> Result<ArtifactManifest, StoreError> {
        let versions = self.versions(&reference.name)?;
        let version = match reference.selector {
            VersionSelector::Latest => versions.last().copied(),
            VersionSelector::Version(version) => versions.contains(&version).then_some(version),
        }
        .ok_or_else(|| StoreError::NotFound(reference.to_string()))?;
        debug!(reference = %reference, version, "resolved artifact reference");
        load_manifest(&self.version_dir(&reference.name, version).join(MANIFEST_FILE))
    }

    /// All manifests in the store, ordered by name then version.
    pub fn list(&self) -> Result<Vec<ArtifactManifest>, StoreError> {
        let dir = self.artifacts_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = BTreeSet::new();
        let entries = fs::read_dir(&dir)
            .map_err(|err| StoreError::io(format!("read {}", dir.display()), err))?;
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io("read entry", err))?;
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str()
                && validate_name(name).is_ok()
            {
                names.insert(name.to_string());
            }
        }

        let mut manifests = Vec::new();
        for name in names {
            for version in self.versions(&name)? {
                manifests.push(load_manifest(
                    &self.version_dir(&name, version).join(MANIFEST_FILE),
                )?);
            }
        }
        Ok(manifests)
    }

    /// Local paths of a version's files, after verifying their checksums.
    pub fn verified_files(&self, manifest: &ArtifactManifest) -> Result<Vec<PathBuf>, StoreError> {
        let files_dir = self
            .version_dir(&manifest.name, manifest.version)
            .join(FILES_DIR);
        let mut paths = Vec::with_capacity(manifest.files.len());
        for file in &manifest.files {
            let path = files_dir.join(&file.name);
            let actual = file_sha256(&path)?;
            if actual != file.sha256 {
                return Err(StoreError::ChecksumMismatch {
                    path,
                    expected: file.sha256.clone(),
                    actual,
                });
            }
            paths.push(path);
        }
        Ok(paths)
    }

    fn describe_files(
        &self,
        request: &PublishRequest<'_>,
    ) -> Result<Vec<ManifestFile>, StoreError> {
        if request.files.is_empty() {
            return Err(StoreError::EmptyArtifact(request.name.to_string()));
        }
        let mut seen = BTreeSet::new();
        let mut files = Vec::with_capacity(request.files.len());
        for path in request.files {
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| StoreError::InvalidName(path.display().to_string()))?
                .to_string();
            if !seen.insert(file_name.clone()) {
                return Err(StoreError::DuplicateFile {
                    name: request.name.to_string(),
                    file: file_name,
                });
            }
            let size = fs::metadata(path)
                .map_err(|err| StoreError::io(format!("stat {}", path.display()), err))?
                .len();
            files.push(ManifestFile {
                name: file_name,
                size,
                sha256: file_sha256(path)?,
            });
        }
        Ok(files)
    }

    fn stage_version(
        &self,
        request: &PublishRequest<'_>,
        manifest: &ArtifactManifest,
        run_id: &str,
    ) -> Result<(), StoreError> {
        let artifact_dir = self.artifact_dir(&manifest.name);
        let staging = artifact_dir.join(format!(".staging-v{}-{}", manifest.version, run_id));
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .map_err(|err| StoreError::io(format!("remove {}", staging.display()), err))?;
        }
        let files_dir = staging.join(FILES_DIR);
        fs::create_dir_all(&files_dir)
            .map_err(|err| StoreError::io(format!("create {}", files_dir.display()), err))?;

        for (source, file) in request.files.iter().zip(&manifest.files) {
            let target = files_dir.join(&file.name);
            fs::copy(source, &target).map_err(|err| {
                StoreError::io(
                    format!("copy {} to {}", source.display(), target.display()),
                    err,
                )
            })?;
        }
        write_manifest(&staging.join(MANIFEST_FILE), manifest)?;

        let target = self.version_dir(&manifest.name, manifest.version);
        fs::rename(&staging, &target)
            .map_err(|err| StoreError::io(format!("commit version {}", target.display()), err))
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn start_run(&self, job_type: &str) -> Result<RunRecord, StoreError> {
        let run = RunRecord::new(generate_run_id(), job_type);
        write_run(&self.run_path(&run.run_id), &run)?;
        info!(run_id = %run.run_id, job_type, "run started");
        Ok(run)
    }

    fn record_config(
        &self,
        run: &mut RunRecord,
        config: Map<String, Value>,
    ) -> Result<(), StoreError> {
        run.config.extend(config);
        write_run(&self.run_path(&run.run_id), run)
    }

    #[instrument(skip_all, fields(run_id = %run.run_id, reference = %reference))]
    fn fetch(&self, run: &mut RunRecord, reference: &ArtifactRef) -> Result<PathBuf, StoreError> {
        let manifest = self.resolve(reference)?;
        let mut paths = self.verified_files(&manifest)?;
        if paths.len() != 1 {
            return Err(StoreError::AmbiguousFile {
                artifact: manifest.id(),
                count: paths.len(),
            });
        }
        let path = paths.remove(0);

        let id = manifest.id();
        if !run.used.contains(&id) {
            run.used.push(id.clone());
        }
        write_run(&self.run_path(&run.run_id), run)?;
        debug!(artifact = %id, path = %path.display(), "artifact fetched");
        Ok(path)
    }

    #[instrument(skip_all, fields(run_id = %run.run_id, name = request.name))]
    fn publish(
        &self,
        run: &mut RunRecord,
        request: &PublishRequest<'_>,
    ) -> Result<ArtifactVersion, StoreError> {
        validate_name(request.name)?;
        validate_type(request.artifact_type)?;
        let files = self.describe_files(request)?;
        let digest = content_digest(&files);

        let latest = match self.versions(request.name)?.last() {
            Some(&version) => Some(load_manifest(
                &self.version_dir(request.name, version).join(MANIFEST_FILE),
            )?),
            None => None,
        };

        if let Some(existing) = &latest {
            if existing.artifact_type != request.artifact_type {
                return Err(StoreError::TypeMismatch {
                    name: request.name.to_string(),
                    existing: existing.artifact_type.clone(),
                    requested: request.artifact_type.to_string(),
                });
            }
            if existing.digest == digest {
                info!(artifact = %existing.id(), "content unchanged; reusing existing version");
                let id = existing.id();
                if !run.logged.contains(&id) {
                    run.logged.push(id);
                }
                write_run(&self.run_path(&run.run_id), run)?;
                return Ok(ArtifactVersion {
                    name: existing.name.clone(),
                    version: existing.version,
                    digest,
                    created: false,
                });
            }
        }

        let version = latest.as_ref().map_or(0, |existing| existing.version + 1);
        let manifest = ArtifactManifest {
            name: request.name.to_string(),
            version,
            artifact_type: request.artifact_type.to_string(),
            description: request.description.to_string(),
            digest: digest.clone(),
            files,
            metadata: request.metadata.clone(),
            created_at: Utc::now().to_rfc3339(),
            producer_run_id: Some(run.run_id.clone()),
        };
        self.stage_version(request, &manifest, &run.run_id)?;

        run.logged.push(manifest.id());
        write_run(&self.run_path(&run.run_id), run)?;
        info!(artifact = %manifest.id(), digest = %digest, "artifact published");
        Ok(ArtifactVersion {
            name: manifest.name,
            version,
            digest,
            created: true,
        })
    }

    fn finish_run(&self, run: &mut RunRecord, status: RunStatus) -> Result<(), StoreError> {
        run.status = status;
        run.finished_at = Some(Utc::now().to_rfc3339());
        write_run(&self.run_path(&run.run_id), run)?;
        info!(run_id = %run.run_id, status = ?status, "run finished");
        Ok(())
    }
}
