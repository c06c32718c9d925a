//! Command-line access to a local artifact store.
//!
//! Used to seed raw datasets into the store and inspect what jobs published.

use std::path::PathBuf;

use anyhow::{Context, Result};
use artifact_store::reference::{validate_name, validate_type};
use artifact_store::{ArtifactRef, ArtifactStore, LocalArtifactStore, PublishRequest, RunStatus};
use clap::{Parser, Subcommand};
use serde_json::Map;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "artifacts", version, about = "Inspect and seed a local artifact store")]
struct Cli {
    /// Store root directory.
    #[arg(long, global = true, default_value = ".artifacts")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish a local file as a new artifact version.
    Put {
        file: PathBuf,
        #[arg(long, value_parser = parse_name)]
        name: String,
        #[arg(long = "type", value_parser = parse_type)]
        artifact_type: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Print every artifact version as `name:vN type digest`.
    List,
    /// Print the manifest of a reference (`name`, `name:latest`, `name:vN`).
    Show { reference: String },
}

fn parse_name(raw: &str) -> Result<String, String> {
    validate_name(raw).map_err(|err| err.to_string())?;
    Ok(raw.to_string())
}

fn parse_type(raw: &str) -> Result<String, String> {
    validate_type(raw).map_err(|err| err.to_string())?;
    Ok(raw.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let store = LocalArtifactStore::new(&cli.root);
    match cli.command {
        Command::Put {
            file,
            name,
            artifact_type,
            description,
        } => put(&store, file, &name, &artifact_type, &description),
        Command::List => list(&store),
        Command::Show { reference } => show(&store, &reference),
    }
}

fn put<S: ArtifactStore>(
    store: &S,
    file: PathBuf,
    name: &str,
    artifact_type: &str,
    description: &str,
) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("{} is not a file", file.display());
    }
    let mut run = store.start_run("upload").context("start upload run")?;
    let files = vec![file];
    let published = store.publish(
        &mut run,
        &PublishRequest {
            name,
            artifact_type,
            description,
            files: &files,
            metadata: Map::new(),
        },
    );
    let version = match published {
        Ok(version) => {
            store
                .finish_run(&mut run, RunStatus::Finished)
                .context("finish upload run")?;
            version
        }
        Err(err) => {
            if let Err(finish_err) = store.finish_run(&mut run, RunStatus::Failed) {
                warn!(run_id = %run.run_id, error = %finish_err, "could not mark run failed");
            }
            return Err(err).with_context(|| format!("publish {name}"));
        }
    };
    info!(artifact = %version.id(), created = version.created, "upload complete");
    println!(
        "put: artifact={} created={} run={}",
        version.id(),
        version.created,
        run.run_id
    );
    Ok(())
}

fn list(store: &LocalArtifactStore) -> Result<()> {
    for manifest in store.list().context("list artifacts")? {
        println!(
            "{} {} {}",
            manifest.id(),
            manifest.artifact_type,
            manifest.digest
        );
    }
    Ok(())
}

fn show(store: &LocalArtifactStore, reference: &str) -> Result<()> {
    let reference = ArtifactRef::parse(reference)?;
    let manifest = store
        .resolve(&reference)
        .with_context(|| format!("resolve {reference}"))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&manifest).context("serialize manifest")?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_store::{ArtifactVersion, RunRecord, StoreError};
    use serde_json::Value;

    #[test]
    fn parse_put() {
        let cli = Cli::parse_from([
            "artifacts",
            "put",
            "sample.csv",
            "--name",
            "sample.csv",
            "--type",
            "raw_data",
        ]);
        assert!(matches!(
            cli.command,
            Command::Put { ref name, ref artifact_type, ref description, .. }
                if name == "sample.csv" && artifact_type == "raw_data" && description.is_empty()
        ));
        assert_eq!(cli.root, PathBuf::from(".artifacts"));
    }

    #[test]
    fn parse_show_with_root() {
        let cli = Cli::parse_from(["artifacts", "show", "sample.csv:v0", "--root", "/tmp/store"]);
        assert!(matches!(
            cli.command,
            Command::Show { ref reference } if reference == "sample.csv:v0"
        ));
        assert_eq!(cli.root, PathBuf::from("/tmp/store"));
    }

    #[test]
    fn put_rejects_blank_type() {
        let result = Cli::try_parse_from([
            "artifacts",
            "put",
            "sample.csv",
            "--name",
            "sample.csv",
            "--type",
            " ",
        ]);
        assert!(result.is_err());
    }

    /// Every publish and every finish fails.
    struct Unavailable;

    impl ArtifactStore for Unavailable {
        fn start_run(&self, job_type: &str) -> Result<RunRecord, StoreError> {
            Ok(RunRecord::new("run-test", job_type))
        }

        fn record_config(
            &self,
            _run: &mut RunRecord,
            _config: Map<String, Value>,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        fn fetch(
            &self,
            _run: &mut RunRecord,
            reference: &ArtifactRef,
        ) -> Result<PathBuf, StoreError> {
            Err(StoreError::NotFound(reference.to_string()))
        }

        fn publish(
            &self,
            _run: &mut RunRecord,
            request: &PublishRequest<'_>,
        ) -> Result<ArtifactVersion, StoreError> {
            Err(StoreError::TypeMismatch {
                name: request.name.to_string(),
                existing: "raw_data".to_string(),
                requested: request.artifact_type.to_string(),
            })
        }

        fn finish_run(&self, _run: &mut RunRecord, _status: RunStatus) -> Result<(), StoreError> {
            Err(StoreError::Io {
                context: "write run".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
    }

    #[test]
    fn put_reports_publish_error_when_finish_also_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("sample.csv");
        std::fs::write(&source, "price\n1\n").expect("write");

        let err = put(&Unavailable, source, "sample.csv", "clean_sample", "").unwrap_err();
        assert!(
            err.chain()
                .any(|cause| matches!(
                    cause.downcast_ref::<StoreError>(),
                    Some(StoreError::TypeMismatch { .. })
                ))
        );
        assert!(format!("{err:#}").contains("publish sample.csv"));
    }
}
