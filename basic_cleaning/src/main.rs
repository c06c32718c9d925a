//! Basic cleaning job.
//!
//! Downloads the raw listings artifact, drops price and location outliers,
//! fills missing values, and publishes `clean_sample.csv` as a new artifact
//! version.

use std::path::PathBuf;

use anyhow::Result;
use artifact_store::reference::{validate_name, validate_type};
use artifact_store::{ArtifactRef, LocalArtifactStore, StoreError};
use basic_cleaning::core::rules::PriceRange;
use basic_cleaning::exit_codes;
use basic_cleaning::io::config::{DEFAULT_CONFIG_PATH, load_config};
use basic_cleaning::logging;
use basic_cleaning::pipeline::{CleaningArgs, run_cleaning};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

#[derive(Parser)]
#[command(
    name = "basic-cleaning",
    version,
    about = "A very basic data cleaning"
)]
struct Cli {
    /// Input artifact reference (`name`, `name:latest`, or `name:vN`).
    #[arg(long = "input_artifact", value_parser = parse_reference)]
    input_artifact: ArtifactRef,

    /// Output artifact name.
    #[arg(long = "output_artifact_name", value_parser = parse_artifact_name)]
    output_artifact_name: String,

    /// Output artifact type.
    #[arg(long = "output_type", value_parser = parse_artifact_type)]
    output_type: String,

    /// Output artifact description.
    #[arg(long = "output_description")]
    output_description: String,

    /// Minimum price (inclusive).
    #[arg(long = "min_price", value_parser = parse_price, allow_negative_numbers = true)]
    min_price: f64,

    /// Maximum price (inclusive).
    #[arg(long = "max_price", value_parser = parse_price, allow_negative_numbers = true)]
    max_price: f64,

    /// Job configuration file; defaults apply when it does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn parse_reference(raw: &str) -> Result<ArtifactRef, String> {
    ArtifactRef::parse(raw).map_err(|err| err.to_string())
}

fn parse_artifact_name(raw: &str) -> Result<String, String> {
    validate_name(raw).map_err(|err| err.to_string())?;
    Ok(raw.to_string())
}

fn parse_artifact_type(raw: &str) -> Result<String, String> {
    validate_type(raw).map_err(|err| err.to_string())?;
    Ok(raw.to_string())
}

fn parse_price(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !value.is_finite() {
        return Err(format!("'{raw}' is not a finite number"));
    }
    Ok(value)
}

fn main() {
    let cli = Cli::parse();
    let price = match PriceRange::new(cli.min_price, cli.max_price) {
        Ok(price) => price,
        Err(err) => Cli::command()
            .error(ErrorKind::ValueValidation, err.to_string())
            .exit(),
    };

    let code = match run(cli, price) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli, price: PriceRange) -> Result<()> {
    let config = load_config(&cli.config)?;
    logging::init(&config.logging.filter);

    let store = LocalArtifactStore::new(&config.store.root);
    let args = CleaningArgs {
        input_artifact: cli.input_artifact,
        output_artifact_name: cli.output_artifact_name,
        output_type: cli.output_type,
        output_description: cli.output_description,
        price,
    };
    let outcome = run_cleaning(&store, &args, &config)?;
    println!(
        "published: artifact={} run={} rows={} path={}",
        outcome.artifact.id(),
        outcome.run_id,
        outcome.report.rows_out,
        outcome.output_path.display()
    );
    Ok(())
}

/// Store failures map to [`exit_codes::STORE`]; everything else is an input error.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.is::<StoreError>()) {
        exit_codes::STORE
    } else {
        exit_codes::INPUT
    }
}
