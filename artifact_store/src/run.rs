//! Run bookkeeping persisted to `runs/<run_id>/run.json`.

use std::fs;
use std::path::Path;

use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Record of one job invocation: its config and the artifacts it used and logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub run_id: String,
    pub job_type: String,
    pub status: RunStatus,
    pub config: Map<String, Value>,
    /// Artifact ids (`name:vN`) consumed by this run.
    pub used: Vec<String>,
    /// Artifact ids (`name:vN`) produced by this run.
    pub logged: Vec<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl RunRecord {
    pub fn new(run_id: impl Into<String>, job_type: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            job_type: job_type.into(),
            status: RunStatus::Running,
            config: Map::new(),
            used: Vec::new(),
            logged: Vec::new(),
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
        }
    }
}

/// Generate a run id like `run-20260118_120000-ab12cd`.
pub fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let mut rng = rand::thread_rng();
    let short_id = std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(6)
        .collect::<String>()
        .to_lowercase();
    format!("run-{timestamp}-{short_id}")
}

pub fn load_run(path: &Path) -> Result<RunRecord, StoreError> {
    let contents = fs::read_to_string(path)
        .map_err(|err| StoreError::io(format!("read run {}", path.display()), err))?;
    serde_json::from_str(&contents)
        .map_err(|err| StoreError::json(format!("parse run {}", path.display()), err))
}

/// Atomically write a run record (temp file + rename).
pub fn write_run(path: &Path, run: &RunRecord) -> Result<(), StoreError> {
    debug!(
        path = %path.display(),
        run_id = %run.run_id,
        status = ?run.status,
        "writing run record"
    );
    let mut buf =
        serde_json::to_string_pretty(run).map_err(|err| StoreError::json("serialize run", err))?;
    buf.push('\n');
    let parent = path.parent().ok_or_else(|| {
        StoreError::io(
            format!("run path missing parent {}", path.display()),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        )
    })?;
    fs::create_dir_all(parent)
        .map_err(|err| StoreError::io(format!("create directory {}", parent.display()), err))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .map_err(|err| StoreError::io(format!("write temp run {}", tmp_path.display()), err))?;
    fs::rename(&tmp_path, path)
        .map_err(|err| StoreError::io(format!("replace run {}", path.display()), err))
}
