use polars::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::domain::DashboardError;
use crate::report::{duplicate_count, null_counts};

pub const PRODUCT_ID: &str = "ProductID";
pub const WEIGHT: &str = "Weight";
pub const FAT_CONTENT: &str = "FatContent";
pub const VISIBILITY: &str = "Visibility";
pub const PRODUCT_TYPE: &str = "ProductType";
pub const MRP: &str = "MRP";
pub const OUTLET_ID: &str = "OutletID";
pub const ESTABLISHMENT_YEAR: &str = "EstablishmentYear";
pub const OUTLET_SIZE: &str = "OutletSize";
pub const LOCATION_TYPE: &str = "LocationType";
pub const OUTLET_TYPE: &str = "OutletType";
pub const OUTLET_SALES: &str = "OutletSales";

pub const COLUMN_DESCRIPTIONS: [(&str, &str); 12] = [
    (PRODUCT_ID, "unique product identifier"),
    (WEIGHT, "weight of the product"),
    (FAT_CONTENT, "whether the product is low fat or not"),
    (
        VISIBILITY,
        "share of the total display area of all products in the outlet allocated to this product",
    ),
    (PRODUCT_TYPE, "category the product belongs to"),
    (MRP, "maximum retail (list) price of the product"),
    (OUTLET_ID, "unique outlet identifier"),
    (ESTABLISHMENT_YEAR, "year the outlet was established"),
    (OUTLET_SIZE, "size of the outlet in terms of ground area"),
    (LOCATION_TYPE, "type of city the outlet is located in"),
    (OUTLET_TYPE, "whether the outlet is a grocery store or some kind of supermarket"),
    (OUTLET_SALES, "sales of the product in the particular outlet (target variable)"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct CleaningReport {
    pub nulls_before: Vec<(String, usize)>,
    pub nulls_after: Vec<(String, usize)>,
    pub duplicates: usize,
}

/// The cleaned table together with what cleaning found. Read-only once built.
#[derive(Debug)]
pub struct Dataset {
    pub name: String,
    pub frame: DataFrame,
    pub cleaning: CleaningReport,
}

impl Dataset {
    #[instrument(skip(size_fill))]
    pub fn load(path: PathBuf, size_fill: &str) -> Result<Self, DashboardError> {
        let path = check_file(path)?;
        let start_time = Instant::now();
        let raw = load_csv(&path)?.collect()?;
        info!(
            "Loaded {} rows x {} columns in {}ms ...",
            raw.height(),
            raw.width(),
            start_time.elapsed().as_millis()
        );

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        Ok(Self::from_frame(name, raw, size_fill)?)
    }

    pub fn from_frame(name: String, raw: DataFrame, size_fill: &str) -> PolarsResult<Self> {
        let (frame, cleaning) = clean(raw, size_fill)?;
        Ok(Self {
            name,
            frame,
            cleaning,
        })
    }
}

/// Fills missing weights with the mean weight and missing outlet sizes with
/// `size_fill`. Duplicates are counted but kept.
///
/// A weight column without a single value is read as text by the CSV reader,
/// so it is cast to float first and stays all null.
pub fn clean(raw: DataFrame, size_fill: &str) -> PolarsResult<(DataFrame, CleaningReport)> {
    let nulls_before = null_counts(&raw);
    let weight = || col(WEIGHT).cast(DataType::Float64);
    let frame = raw
        .lazy()
        .with_columns([
            weight().fill_null(weight().mean()),
            col(OUTLET_SIZE).fill_null(lit(size_fill)),
        ])
        .collect()?;
    let nulls_after = null_counts(&frame);
    let duplicates = duplicate_count(&frame)?;

    let filled: usize = nulls_before.iter().map(|(_, n)| n).sum::<usize>()
        - nulls_after.iter().map(|(_, n)| n).sum::<usize>();
    info!("Cleaning filled {filled} null values, found {duplicates} duplicate rows");
    for (name, count) in nulls_after.iter().filter(|(_, n)| *n > 0) {
        debug!("Column '{name}' still has {count} null values");
    }

    Ok((
        frame,
        CleaningReport {
            nulls_before,
            nulls_after,
            duplicates,
        },
    ))
}

fn check_file(path: PathBuf) -> Result<PathBuf, DashboardError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DashboardError::FileNotFound(path.display().to_string()),
        ErrorKind::PermissionDenied => {
            DashboardError::PermissionDenied(path.display().to_string())
        }
        _ => DashboardError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(DashboardError::LoadingFailed(format!(
            "{} is not a file!",
            path.display()
        )));
    }
    debug!("Input file has {} bytes", metadata.len());
    Ok(path)
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .with_infer_schema_length(None)
        .finish()
}
