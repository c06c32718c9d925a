//! Test-only helpers for building tables and seeding artifact stores.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use artifact_store::{ArtifactStore, ArtifactVersion, LocalArtifactStore, PublishRequest, RunStatus};
use serde_json::Map;

use crate::core::rules::REQUIRED_COLUMNS;
use crate::core::table::{Row, Table};

/// Build a table from string literals; `None` cells are null.
pub fn table(headers: &[&str], rows: &[&[Option<&str>]]) -> Table {
    let headers = headers.iter().map(|h| h.to_string()).collect();
    let rows = rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.map(str::to_string)).collect())
        .collect();
    Table::new(headers, rows).expect("well-formed test table")
}

/// A listings row in [`REQUIRED_COLUMNS`] order.
///
/// Empty numeric arguments become null cells.
pub fn listing(
    price: &str,
    longitude: &str,
    latitude: &str,
    last_review: Option<&str>,
    reviews_per_month: Option<&str>,
    name: Option<&str>,
    host_name: Option<&str>,
) -> Row {
    let numeric = |raw: &str| (!raw.is_empty()).then(|| raw.to_string());
    vec![
        numeric(price),
        last_review.map(str::to_string),
        reviews_per_month.map(str::to_string),
        name.map(str::to_string),
        host_name.map(str::to_string),
        numeric(longitude),
        numeric(latitude),
    ]
}

/// Table with [`REQUIRED_COLUMNS`] headers and the given rows.
pub fn listings_table(rows: &[Row]) -> Table {
    let headers = REQUIRED_COLUMNS.iter().map(|h| h.to_string()).collect();
    Table::new(headers, rows.to_vec()).expect("well-formed listings table")
}

/// Raw listings CSV covering fills, price outliers, and out-of-area rows.
pub const SAMPLE_CSV: &str = "\
id,name,host_id,host_name,neighbourhood_group,latitude,longitude,room_type,price,minimum_nights,last_review,reviews_per_month
2539,Clean & quiet apt home by the park,2787,John,Brooklyn,40.64749,-73.97237,Private room,149,1,2018-10-19,0.21
2595,,2845,Jennifer,Manhattan,40.75362,-73.98377,Entire home/apt,225,1,2019-05-21,0.38
3647,THE VILLAGE OF HARLEM,4632,,Manhattan,40.80902,-73.94190,Private room,150,3,,
3831,Cozy Entire Floor of Brownstone,4869,LisaRoxanne,Brooklyn,40.68514,-73.95976,Entire home/apt,89,1,not-a-date,4.64
5022,Entire Apt: Spacious Studio/Loft,7192,Laura,Manhattan,40.79851,-73.94399,Entire home/apt,80,10,2018-11-19,NaN
5099,Large Cozy 1 BR Apartment,7322,Chris,Manhattan,40.74767,-73.97500,Entire home/apt,2000,3,2019-06-22,0.59
5121,BlissArtsSpace!,7356,Garon,Brooklyn,42.68688,-73.95596,Private room,60,45,2017-10-05,0.40
";

/// Publish `contents` as `name` (type `raw_data`) into a store rooted at `root`.
pub fn seed_store(root: &Path, name: &str, contents: &str) -> Result<ArtifactVersion> {
    let store = LocalArtifactStore::new(root);
    let staging = tempfile::tempdir().context("staging dir")?;
    let source = staging.path().join(name);
    fs::write(&source, contents).with_context(|| format!("write {}", source.display()))?;

    let mut run = store.start_run("upload")?;
    let files = vec![source];
    let version = store.publish(
        &mut run,
        &PublishRequest {
            name,
            artifact_type: "raw_data",
            description: "Raw listings",
            files: &files,
            metadata: Map::new(),
        },
    )?;
    store.finish_run(&mut run, RunStatus::Finished)?;
    Ok(version)
}
