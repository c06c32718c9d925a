//! Job configuration stored in `basic_cleaning.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "basic_cleaning.toml";

/// Cleaning job configuration (TOML).
///
/// Every section is optional; missing fields take the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CleaningConfig {
    pub store: StoreConfig,
    pub output: OutputConfig,
    pub run: RunConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory of the local artifact store.
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the cleaned CSV is written to before publishing.
    pub dir: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    /// Job type recorded on the run.
    pub job_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".artifacts"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file_name: "clean_sample.csv".to_string(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            job_type: "basic_cleaning".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl CleaningConfig {
    pub fn validate(&self) -> Result<()> {
        if self.store.root.as_os_str().is_empty() {
            return Err(anyhow!("store.root must be non-empty"));
        }
        let file_name = self.output.file_name.trim();
        if file_name.is_empty() {
            return Err(anyhow!("output.file_name must be non-empty"));
        }
        if file_name.contains('/') || file_name.contains('\\') || file_name == ".." {
            return Err(anyhow!(
                "output.file_name must be a bare file name (got '{}')",
                self.output.file_name
            ));
        }
        if self.run.job_type.trim().is_empty() {
            return Err(anyhow!("run.job_type must be non-empty"));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(anyhow!("logging.filter must be non-empty"));
        }
        Ok(())
    }

    /// Where the cleaned CSV is written.
    pub fn output_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.file_name)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CleaningConfig::default()`.
pub fn load_config(path: &Path) -> Result<CleaningConfig> {
    if !path.exists() {
        let cfg = CleaningConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CleaningConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &CleaningConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
