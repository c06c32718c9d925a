//! CLI tests for the `basic-cleaning` binary.
//!
//! Seeds a store in a temp dir, writes `basic_cleaning.toml` pointing at it,
//! and checks output, run records, and exit codes.

use std::path::Path;
use std::process::{Command, Output};

use artifact_store::{ArtifactRef, LocalArtifactStore, RunStatus};
use basic_cleaning::exit_codes;
use basic_cleaning::io::config::{CleaningConfig, DEFAULT_CONFIG_PATH, write_config};
use basic_cleaning::io::csv_table::read_table;
use basic_cleaning::test_support::{SAMPLE_CSV, seed_store};

fn write_job_config(dir: &Path) -> CleaningConfig {
    let mut cfg = CleaningConfig::default();
    cfg.store.root = dir.join("store");
    cfg.output.dir = dir.join("out");
    cfg.logging.filter = "warn".to_string();
    write_config(&dir.join(DEFAULT_CONFIG_PATH), &cfg).expect("write config");
    cfg
}

fn run_clean(dir: &Path, input: &str, min_price: &str, max_price: &str) -> Output {
    run_clean_as(dir, input, "clean_sample", min_price, max_price)
}

fn run_clean_as(
    dir: &Path,
    input: &str,
    output_type: &str,
    min_price: &str,
    max_price: &str,
) -> Output {
    Command::new(env!("CARGO_BIN_EXE_basic-cleaning"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(["--input_artifact", input])
        .args(["--output_artifact_name", "clean_sample.csv"])
        .args(["--output_type", output_type])
        .args([
            "--output_description",
            "Data with outliers and null values removed",
        ])
        .args(["--min_price", min_price])
        .args(["--max_price", max_price])
        .output()
        .expect("basic-cleaning")
}

#[test]
fn cleans_sample_and_publishes_artifact() {
    let temp = tempfile::tempdir().expect("tempdir");
    let cfg = write_job_config(temp.path());
    seed_store(&cfg.store.root, "sample.csv", SAMPLE_CSV).expect("seed");

    let output = run_clean(temp.path(), "sample.csv:latest", "10", "350");
    assert_eq!(output.status.code(), Some(exit_codes::OK), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("published: artifact=clean_sample.csv:v0 run=run-"));
    assert!(stdout.contains(" rows=5 "));

    let cleaned = read_table(&cfg.output_path()).expect("read output");
    assert_eq!(cleaned.len(), 5);
    let price = cleaned.numeric_column("price").expect("price");
    assert!(price.iter().flatten().all(|p| (10.0..=350.0).contains(p)));
    let last_review = cleaned.column_index("last_review").expect("column");
    let dates: Vec<Option<&str>> = cleaned.column(last_review).collect();
    assert!(dates.contains(&Some("2010-01-01")));
    assert!(!dates.contains(&Some("not-a-date")));

    let store = LocalArtifactStore::new(&cfg.store.root);
    let manifest = store
        .resolve(&ArtifactRef::latest("clean_sample.csv"))
        .expect("resolve");
    let run_id = manifest.producer_run_id.clone().expect("producer run");
    let run = store.load_run(&run_id).expect("run record");
    assert_eq!(run.status, RunStatus::Finished);
    assert_eq!(run.used, vec!["sample.csv:v0"]);
}

#[test]
fn inverted_price_range_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let cfg = write_job_config(temp.path());
    seed_store(&cfg.store.root, "sample.csv", SAMPLE_CSV).expect("seed");

    let output = run_clean(temp.path(), "sample.csv:latest", "350", "10");
    assert_eq!(output.status.code(), Some(exit_codes::USAGE));
    assert!(!cfg.output_path().exists());
}

#[test]
fn non_numeric_price_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_job_config(temp.path());

    let output = run_clean(temp.path(), "sample.csv:latest", "ten", "350");
    assert_eq!(output.status.code(), Some(exit_codes::USAGE));
}

#[test]
fn blank_output_type_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let cfg = write_job_config(temp.path());
    seed_store(&cfg.store.root, "sample.csv", SAMPLE_CSV).expect("seed");

    for output_type in ["", "  "] {
        let output = run_clean_as(temp.path(), "sample.csv:latest", output_type, "10", "350");
        assert_eq!(output.status.code(), Some(exit_codes::USAGE));
    }
    assert!(!cfg.output_path().exists());

    let store = LocalArtifactStore::new(&cfg.store.root);
    assert!(store.versions("clean_sample.csv").expect("versions").is_empty());
    assert_eq!(store.list().expect("list").len(), 1);
}

#[test]
fn unknown_input_artifact_is_a_store_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let cfg = write_job_config(temp.path());

    let output = run_clean(temp.path(), "sample.csv:v4", "10", "350");
    assert_eq!(output.status.code(), Some(exit_codes::STORE));
    assert!(String::from_utf8_lossy(&output.stderr).contains("sample.csv:v4"));
    assert!(!cfg.output_path().exists());
}

#[test]
fn missing_column_is_an_input_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let cfg = write_job_config(temp.path());
    seed_store(&cfg.store.root, "sample.csv", "id,price\n1,50\n").expect("seed");

    let output = run_clean(temp.path(), "sample.csv", "10", "350");
    assert_eq!(output.status.code(), Some(exit_codes::INPUT));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing required column"));

    let store = LocalArtifactStore::new(&cfg.store.root);
    assert!(store.versions("clean_sample.csv").expect("versions").is_empty());
}
