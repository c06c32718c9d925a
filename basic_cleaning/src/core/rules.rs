//! The fixed cleaning rule sequence.
//!
//! Steps run in this order and each one sees the previous step's output:
//!
//! 1. drop rows whose `price` is outside `[min, max]`
//! 2. parse `last_review` as a date (unparseable -> null)
//! 3. fill `last_review` nulls with 2010-01-01
//! 4. fill `reviews_per_month` nulls with `0`
//! 5. fill `name` nulls with `-`
//! 6. fill `host_name` nulls with `-`
//! 7. drop rows outside the longitude/latitude bounding box
//!
//! Filtering is silent: dropped rows are counted in [`CleanReport`], never
//! reported as errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::core::error::CleanError;
use crate::core::table::Table;

pub const PRICE: &str = "price";
pub const LAST_REVIEW: &str = "last_review";
pub const REVIEWS_PER_MONTH: &str = "reviews_per_month";
pub const NAME: &str = "name";
pub const HOST_NAME: &str = "host_name";
pub const LONGITUDE: &str = "longitude";
pub const LATITUDE: &str = "latitude";

/// Columns that must be present in every input.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    PRICE,
    LAST_REVIEW,
    REVIEWS_PER_MONTH,
    NAME,
    HOST_NAME,
    LONGITUDE,
    LATITUDE,
];

pub const REVIEWS_FILL: &str = "0";
pub const TEXT_FILL: &str = "-";

const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d";
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Result<Self, CleanError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(CleanError::InvalidPriceRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Inclusive longitude/latitude bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

impl GeoBounds {
    /// New York City area.
    pub const NYC: GeoBounds = GeoBounds {
        min_longitude: -74.25,
        max_longitude: -73.50,
        min_latitude: 40.5,
        max_latitude: 41.2,
    };

    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        self.min_longitude <= longitude
            && longitude <= self.max_longitude
            && self.min_latitude <= latitude
            && latitude <= self.max_latitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningParams {
    pub price: PriceRange,
    pub geo: GeoBounds,
    pub default_review_date: NaiveDate,
}

impl CleaningParams {
    /// Params with the fixed NYC bounds and 2010-01-01 default review date.
    pub fn new(price: PriceRange) -> Self {
        Self {
            price,
            geo: GeoBounds::NYC,
            default_review_date: DEFAULT_REVIEW_DATE,
        }
    }
}

pub const DEFAULT_REVIEW_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2010, 1, 1) {
    Some(date) => date,
    None => panic!("2010-01-01 is a valid date"),
};

/// Per-step counts from one cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub rows_in: usize,
    pub dropped_by_price: usize,
    /// Non-null `last_review` values that did not parse as dates.
    pub unparseable_dates: usize,
    pub filled_last_review: usize,
    pub filled_reviews_per_month: usize,
    pub filled_name: usize,
    pub filled_host_name: usize,
    pub dropped_by_location: usize,
    pub rows_out: usize,
}

/// Apply the cleaning rules to `table`.
///
/// Fails before touching any row if a required column is missing or if
/// `price`, `longitude`, or `latitude` hold non-numeric values.
pub fn clean(
    mut table: Table,
    params: &CleaningParams,
) -> Result<(Table, CleanReport), CleanError> {
    for column in REQUIRED_COLUMNS {
        table.column_index(column)?;
    }
    let prices = table.numeric_column(PRICE)?;
    table.numeric_column(LONGITUDE)?;
    table.numeric_column(LATITUDE)?;

    let mut report = CleanReport {
        rows_in: table.len(),
        ..CleanReport::default()
    };

    let keep: Vec<bool> = prices
        .iter()
        .map(|price| price.is_some_and(|price| params.price.contains(price)))
        .collect();
    report.dropped_by_price = table.retain(&keep);

    let last_review = table.column_index(LAST_REVIEW)?;
    let mut unparseable = 0;
    table.map_column(last_review, |cell| {
        let raw = cell?;
        let parsed = parse_date(raw);
        if parsed.is_none() {
            unparseable += 1;
        }
        parsed.map(|date| date.format(DATE_OUTPUT_FORMAT).to_string())
    });
    report.unparseable_dates = unparseable;

    let default_date = params
        .default_review_date
        .format(DATE_OUTPUT_FORMAT)
        .to_string();
    report.filled_last_review = table.fill_nulls(last_review, &default_date);

    let reviews = table.column_index(REVIEWS_PER_MONTH)?;
    report.filled_reviews_per_month = table.fill_nulls(reviews, REVIEWS_FILL);

    let name = table.column_index(NAME)?;
    report.filled_name = table.fill_nulls(name, TEXT_FILL);

    let host_name = table.column_index(HOST_NAME)?;
    report.filled_host_name = table.fill_nulls(host_name, TEXT_FILL);

    let longitudes = table.numeric_column(LONGITUDE)?;
    let latitudes = table.numeric_column(LATITUDE)?;
    let keep: Vec<bool> = longitudes
        .iter()
        .zip(&latitudes)
        .map(|(longitude, latitude)| match (longitude, latitude) {
            (Some(longitude), Some(latitude)) => params.geo.contains(*longitude, *latitude),
            _ => false,
        })
        .collect();
    report.dropped_by_location = table.retain(&keep);

    report.rows_out = table.len();
    Ok((table, report))
}

/// Parse a date cell; time components are discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|datetime| datetime.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
}
