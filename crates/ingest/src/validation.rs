use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use polars::prelude::*;
use supply_chain_core::RawFileSpec;
use tracing::{debug, error, info, warn};

use crate::types::{Result, ResultExt};

pub fn file_exists(path: &Path) -> bool {
    let exists = path.is_file();
    if exists {
        debug!("file exists: {}", path.display());
    } else {
        warn!("file not found: {}", path.display());
    }
    exists
}

/// Checks every configured file and returns the logical names that are missing.
pub fn validate_required_files(files: &[RawFileSpec]) -> (bool, Vec<String>) {
    let missing = files
        .iter()
        .filter(|spec| !file_exists(spec.path()))
        .map(|spec| spec.name().to_string())
        .collect::<Vec<_>>();
    let all_present = missing.is_empty();
    if all_present {
        info!("all {} required files found", files.len());
    } else {
        error!("missing files: {:?}", missing);
    }
    (all_present, missing)
}

pub fn validate_columns(df: &DataFrame, expected: &[String], name: &str) -> (bool, Vec<String>) {
    let actual = df.get_column_names().into_iter().collect::<BTreeSet<_>>();
    let missing = expected
        .iter()
        .filter(|column| !actual.contains(column.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    if missing.is_empty() {
        debug!("{}: all expected columns present", name);
    } else {
        warn!("{}: missing columns: {:?}", name, missing);
    }
    (missing.is_empty(), missing)
}

pub fn check_minimum_rows(df: &DataFrame, min_rows: usize, name: &str) -> bool {
    let rows = df.height();
    let meets = rows >= min_rows;
    if meets {
        debug!("{}: {} rows (>= {} required)", name, rows, min_rows);
    } else {
        warn!("{}: only {} rows (< {} required)", name, rows, min_rows);
    }
    meets
}

/// Percentage of null values per column, rounded to two decimals.
///
/// A table without rows reports 0.0 for every column.
pub fn calculate_missing_percentage(df: &DataFrame) -> BTreeMap<String, f64> {
    let rows = df.height();
    df.get_columns()
        .iter()
        .map(|series| {
            let pct = if rows == 0 {
                0.0
            } else {
                round2(series.null_count() as f64 / rows as f64 * 100.0)
            };
            (series.name().to_string(), pct)
        })
        .collect()
}

pub fn check_missing_values(
    df: &DataFrame,
    max_missing_pct: f64,
    name: &str,
) -> (bool, BTreeMap<String, f64>) {
    let exceeding = calculate_missing_percentage(df)
        .into_iter()
        .filter(|(_, pct)| *pct > max_missing_pct)
        .collect::<BTreeMap<_, _>>();
    let passes = exceeding.is_empty();
    if passes {
        debug!("{}: missing values within acceptable range", name);
    } else {
        warn!(
            "{}: columns exceeding {}% missing: {:?}",
            name, max_missing_pct, exceeding
        );
    }
    (passes, exceeding)
}

/// Number of rows that repeat an earlier row exactly.
pub fn check_duplicates(df: &DataFrame, name: &str) -> Result<(usize, bool)> {
    let duplicates = count_duplicate_rows(df).at("check_duplicates")?;
    if duplicates > 0 {
        warn!("{}: found {} duplicate rows", name, duplicates);
    } else {
        debug!("{}: no duplicate rows", name);
    }
    Ok((duplicates, duplicates > 0))
}

pub(crate) fn count_duplicate_rows(df: &DataFrame) -> PolarsResult<usize> {
    if df.width() == 0 {
        return Ok(0);
    }
    let unique = df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    Ok(df.height() - unique.height())
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn format_percentages(columns: &BTreeMap<String, f64>) -> String {
    columns
        .iter()
        .map(|(column, pct)| format!("{}={:.2}%", column, pct))
        .collect::<Vec<_>>()
        .join(", ")
}
