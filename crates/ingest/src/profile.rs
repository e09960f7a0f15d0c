use polars::prelude::*;
use supply_chain_core::DataProfile;
use tracing::debug;

use crate::types::{Result, ResultExt};
use crate::validation::{calculate_missing_percentage, count_duplicate_rows, round2};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Summarizes shape, types, nulls, duplicates and memory footprint of a table.
pub fn generate_data_profile(df: &DataFrame, name: &str) -> Result<DataProfile> {
    let (rows, columns) = df.shape();
    let column_names = df
        .get_column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let dtypes = df
        .get_columns()
        .iter()
        .map(|series| (series.name().to_string(), series.dtype().to_string()))
        .collect();
    let missing_values = df
        .get_columns()
        .iter()
        .map(|series| (series.name().to_string(), series.null_count()))
        .collect();
    let duplicate_rows = count_duplicate_rows(df).at("generate_data_profile")?;
    let memory_usage_mb = round2(df.estimated_size() as f64 / BYTES_PER_MB);

    debug!(
        "{}: profiled {} rows, {} duplicates, {:.2} MB",
        name, rows, duplicate_rows, memory_usage_mb
    );
    Ok(DataProfile {
        name: name.to_string(),
        shape: (rows, columns),
        rows,
        columns,
        column_names,
        dtypes,
        missing_values,
        missing_percentage: calculate_missing_percentage(df),
        duplicate_rows,
        memory_usage_mb,
    })
}
