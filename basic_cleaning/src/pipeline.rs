//! Orchestration for one cleaning run.
//!
//! fetch input artifact -> load CSV -> clean -> write CSV -> publish artifact.
//! The run is finished as `failed` when any stage errors, and the original
//! error is returned.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use artifact_store::{
    ArtifactRef, ArtifactStore, ArtifactVersion, PublishRequest, RunRecord, RunStatus,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::core::rules::{CleanReport, CleaningParams, PriceRange, clean};
use crate::io::config::CleaningConfig;
use crate::io::csv_table::{read_table, write_table};

/// Validated command-line inputs for a cleaning run.
#[derive(Debug, Clone)]
pub struct CleaningArgs {
    pub input_artifact: ArtifactRef,
    pub output_artifact_name: String,
    pub output_type: String,
    pub output_description: String,
    pub price: PriceRange,
}

impl CleaningArgs {
    /// Arguments as recorded on the run.
    pub fn config_map(&self) -> Result<Map<String, Value>> {
        to_object(
            &RecordedArgs {
                input_artifact: self.input_artifact.to_string(),
                output_artifact_name: &self.output_artifact_name,
                output_type: &self.output_type,
                output_description: &self.output_description,
                min_price: self.price.min(),
                max_price: self.price.max(),
            },
            "run config",
        )
    }
}

#[derive(Serialize)]
struct RecordedArgs<'a> {
    input_artifact: String,
    output_artifact_name: &'a str,
    output_type: &'a str,
    output_description: &'a str,
    min_price: f64,
    max_price: f64,
}

#[derive(Serialize)]
struct PublishedMetadata<'a> {
    input_artifact: String,
    min_price: f64,
    max_price: f64,
    cleaning: &'a CleanReport,
}

fn to_object<T: Serialize>(value: &T, what: &str) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).with_context(|| format!("serialize {what}"))? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("{what} serialized to {other}, expected an object")),
    }
}

/// Result of a successful cleaning run.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub run_id: String,
    pub artifact: ArtifactVersion,
    pub output_path: PathBuf,
    pub report: CleanReport,
}

/// Run the full cleaning job against `store`.
#[instrument(skip_all, fields(input = %args.input_artifact, output = %args.output_artifact_name))]
pub fn run_cleaning<S: ArtifactStore>(
    store: &S,
    args: &CleaningArgs,
    config: &CleaningConfig,
) -> Result<CleanOutcome> {
    let mut run = store
        .start_run(&config.run.job_type)
        .context("start run")?;

    match execute(store, &mut run, args, config) {
        Ok(outcome) => {
            store
                .finish_run(&mut run, RunStatus::Finished)
                .context("finish run")?;
            Ok(outcome)
        }
        Err(err) => {
            if let Err(finish_err) = store.finish_run(&mut run, RunStatus::Failed) {
                warn!(run_id = %run.run_id, error = %finish_err, "could not mark run failed");
            }
            Err(err)
        }
    }
}

fn execute<S: ArtifactStore>(
    store: &S,
    run: &mut RunRecord,
    args: &CleaningArgs,
    config: &CleaningConfig,
) -> Result<CleanOutcome> {
    store
        .record_config(run, args.config_map()?)
        .context("record run config")?;

    info!(reference = %args.input_artifact, "fetching input artifact");
    let input_path = store
        .fetch(run, &args.input_artifact)
        .with_context(|| format!("fetch {}", args.input_artifact))?;

    info!(path = %input_path.display(), "reading input csv");
    let table = read_table(&input_path)?;

    let params = CleaningParams::new(args.price);
    let (cleaned, report) = clean(table, &params).context("clean listings")?;
    info!(
        rows_in = report.rows_in,
        dropped_by_price = report.dropped_by_price,
        unparseable_dates = report.unparseable_dates,
        filled_last_review = report.filled_last_review,
        filled_reviews_per_month = report.filled_reviews_per_month,
        filled_name = report.filled_name,
        filled_host_name = report.filled_host_name,
        dropped_by_location = report.dropped_by_location,
        rows_out = report.rows_out,
        "cleaning complete"
    );

    let output_path = config.output_path();
    write_table(&output_path, &cleaned)?;
    info!(path = %output_path.display(), rows = cleaned.len(), "clean csv written");

    let files = vec![output_path.clone()];
    let artifact = store
        .publish(
            run,
            &PublishRequest {
                name: &args.output_artifact_name,
                artifact_type: &args.output_type,
                description: &args.output_description,
                files: &files,
                metadata: publish_metadata(args, &report)?,
            },
        )
        .with_context(|| format!("publish {}", args.output_artifact_name))?;
    info!(artifact = %artifact.id(), created = artifact.created, "artifact published");

    Ok(CleanOutcome {
        run_id: run.run_id.clone(),
        artifact,
        output_path,
        report,
    })
}

fn publish_metadata(args: &CleaningArgs, report: &CleanReport) -> Result<Map<String, Value>> {
    to_object(
        &PublishedMetadata {
            input_artifact: args.input_artifact.to_string(),
            min_price: args.price.min(),
            max_price: args.price.max(),
            cleaning: report,
        },
        "artifact metadata",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{SAMPLE_CSV, seed_store};
    use artifact_store::{LocalArtifactStore, StoreError};
    use std::path::Path;

    fn args(min: f64, max: f64) -> CleaningArgs {
        CleaningArgs {
            input_artifact: ArtifactRef::latest("sample.csv"),
            output_artifact_name: "clean_sample.csv".to_string(),
            output_type: "clean_sample".to_string(),
            output_description: "Data with outliers and null values removed".to_string(),
            price: PriceRange::new(min, max).expect("price range"),
        }
    }

    fn config(root: &Path) -> CleaningConfig {
        let mut cfg = CleaningConfig::default();
        cfg.store.root = root.join("store");
        cfg.output.dir = root.join("out");
        cfg
    }

    #[test]
    fn config_map_records_every_argument() {
        let config = args(10.0, 350.0).config_map().expect("config map");
        let mut keys: Vec<&str> = config.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "input_artifact",
                "max_price",
                "min_price",
                "output_artifact_name",
                "output_description",
                "output_type",
            ]
        );
        assert_eq!(config["input_artifact"], "sample.csv:latest");
        assert_eq!(config["min_price"], 10.0);
    }

    #[test]
    fn cleans_and_publishes_sample() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path());
        seed_store(&cfg.store.root, "sample.csv", SAMPLE_CSV).expect("seed");
        let store = LocalArtifactStore::new(&cfg.store.root);

        let outcome = run_cleaning(&store, &args(10.0, 350.0), &cfg).expect("run");

        assert_eq!(outcome.artifact.id(), "clean_sample.csv:v0");
        assert_eq!(outcome.report.rows_in, 7);
        assert_eq!(outcome.report.dropped_by_price, 1);
        assert_eq!(outcome.report.dropped_by_location, 1);
        assert_eq!(outcome.report.rows_out, 5);

        let cleaned = read_table(&outcome.output_path).expect("read output");
        assert_eq!(cleaned.len(), 5);
        for column in ["last_review", "reviews_per_month", "name", "host_name"] {
            let index = cleaned.column_index(column).expect("column");
            assert!(cleaned.column(index).all(|cell| cell.is_some()), "{column}");
        }

        let manifest = store
            .resolve(&ArtifactRef::latest("clean_sample.csv"))
            .expect("resolve");
        assert_eq!(manifest.artifact_type, "clean_sample");
        assert_eq!(manifest.producer_run_id.as_deref(), Some(outcome.run_id.as_str()));
        assert_eq!(manifest.metadata["cleaning"]["rows_out"], 5);

        let run = store.load_run(&outcome.run_id).expect("run record");
        assert_eq!(run.status, RunStatus::Finished);
        assert_eq!(run.job_type, "basic_cleaning");
        assert_eq!(run.used, vec!["sample.csv:v0"]);
        assert_eq!(run.logged, vec!["clean_sample.csv:v0"]);
        assert_eq!(run.config["max_price"], 350.0);
    }

    #[test]
    fn rerun_on_same_input_reuses_version() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path());
        seed_store(&cfg.store.root, "sample.csv", SAMPLE_CSV).expect("seed");
        let store = LocalArtifactStore::new(&cfg.store.root);

        let first = run_cleaning(&store, &args(10.0, 350.0), &cfg).expect("first");
        let second = run_cleaning(&store, &args(10.0, 350.0), &cfg).expect("second");
        assert_eq!(first.artifact.version, second.artifact.version);
        assert!(!second.artifact.created);
        assert_ne!(first.run_id, second.run_id);
    }

    #[test]
    fn missing_column_fails_run_without_publishing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path());
        seed_store(&cfg.store.root, "sample.csv", "id,price\n1,50\n").expect("seed");
        let store = LocalArtifactStore::new(&cfg.store.root);

        let err = run_cleaning(&store, &args(10.0, 350.0), &cfg).unwrap_err();
        assert!(format!("{err:#}").contains("missing required column"));
        assert!(store.versions("clean_sample.csv").expect("versions").is_empty());
    }

    #[test]
    fn unknown_input_is_a_store_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path());
        let store = LocalArtifactStore::new(&cfg.store.root);

        let err = run_cleaning(&store, &args(10.0, 350.0), &cfg).unwrap_err();
        assert!(err.chain().any(|cause| matches!(
            cause.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound(_))
        )));
    }

    /// Delegates to a local store but fails every publish.
    struct FailingPublish(LocalArtifactStore);

    impl ArtifactStore for FailingPublish {
        fn start_run(&self, job_type: &str) -> Result<RunRecord, StoreError> {
            self.0.start_run(job_type)
        }

        fn record_config(
            &self,
            run: &mut RunRecord,
            config: Map<String, Value>,
        ) -> Result<(), StoreError> {
            self.0.record_config(run, config)
        }

        fn fetch(
            &self,
            run: &mut RunRecord,
            reference: &ArtifactRef,
        ) -> Result<PathBuf, StoreError> {
            self.0.fetch(run, reference)
        }

        fn publish(
            &self,
            _run: &mut RunRecord,
            _request: &PublishRequest<'_>,
        ) -> Result<ArtifactVersion, StoreError> {
            Err(StoreError::NotFound("store offline".to_string()))
        }

        fn finish_run(&self, run: &mut RunRecord, status: RunStatus) -> Result<(), StoreError> {
            self.0.finish_run(run, status)
        }
    }

    #[test]
    fn publish_failure_marks_run_failed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path());
        seed_store(&cfg.store.root, "sample.csv", SAMPLE_CSV).expect("seed");
        let local = LocalArtifactStore::new(&cfg.store.root);
        let store = FailingPublish(local.clone());

        let err = run_cleaning(&store, &args(10.0, 350.0), &cfg).unwrap_err();
        assert!(format!("{err:#}").contains("publish clean_sample.csv"));

        let runs_dir = cfg.store.root.join("runs");
        let failed: Vec<RunRecord> = std::fs::read_dir(&runs_dir)
            .expect("runs dir")
            .map(|entry| entry.expect("entry").file_name())
            .filter_map(|id| local.load_run(&id.to_string_lossy()).ok())
            .filter(|run| run.job_type == "basic_cleaning")
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].status, RunStatus::Failed);
        assert!(failed[0].logged.is_empty());
    }
}
