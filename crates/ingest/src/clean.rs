use polars::prelude::*;
use supply_chain_core::CleaningOptions;
use tracing::{debug, info};

use crate::types::{Result, ResultExt};

pub const PROMOTION_COLUMN: &str = "onpromotion";

/// Applies the enabled cleaning steps in order: all-null rows, duplicates,
/// then promotion flag coercion.
pub fn clean_table(df: DataFrame, options: &CleaningOptions, name: &str) -> Result<DataFrame> {
    info!("preprocessing {}", name);
    let before = df.shape();
    let mut df = df;
    if options.drop_all_nan_rows {
        df = drop_all_null_rows(&df).at("preprocess_dataframe")?;
        debug!("{}: dropped all-null rows", name);
    }
    if options.drop_duplicates {
        df = drop_duplicate_rows(df).at("preprocess_dataframe")?;
        debug!("{}: dropped duplicate rows", name);
    }
    if options.convert_onpromotion_to_bool && df.get_column_names().contains(&PROMOTION_COLUMN) {
        coerce_promotion_flag(&mut df).at("preprocess_dataframe")?;
        debug!("{}: converted {} to boolean", name, PROMOTION_COLUMN);
    }
    let after = df.shape();
    if before != after {
        info!("{}: shape changed {:?} -> {:?}", name, before, after);
    }
    Ok(df)
}

pub fn drop_all_null_rows(df: &DataFrame) -> PolarsResult<DataFrame> {
    if df.width() == 0 {
        return Ok(df.clone());
    }
    let mut all_null = BooleanChunked::full("all_null", true, df.height());
    for series in df.get_columns() {
        all_null = &all_null & &series.is_null();
    }
    df.filter(&!all_null)
}

/// Keeps the first occurrence of every distinct row, preserving order.
pub fn drop_duplicate_rows(df: DataFrame) -> PolarsResult<DataFrame> {
    if df.width() == 0 {
        return Ok(df);
    }
    df.lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()
}

/// Replaces the promotion column with booleans; nulls become `false`.
///
/// A missing flag means "not on promotion"; a null never coerces to `true`.
pub fn coerce_promotion_flag(df: &mut DataFrame) -> PolarsResult<()> {
    let series = df.column(PROMOTION_COLUMN)?;
    let flags: BooleanChunked = match series.dtype() {
        DataType::Boolean => series
            .bool()?
            .into_iter()
            .map(|value| Some(value.unwrap_or(false)))
            .collect(),
        DataType::String => series
            .str()?
            .into_iter()
            .map(|value| Some(value.is_some_and(truthy)))
            .collect(),
        dtype if dtype.is_numeric() => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|value| Some(value.is_some_and(|number| number != 0.0)))
            .collect(),
        DataType::Null => BooleanChunked::full(PROMOTION_COLUMN, false, series.len()),
        other => {
            return Err(PolarsError::InvalidOperation(
                format!("cannot convert {} column of type {} to boolean", PROMOTION_COLUMN, other)
                    .into(),
            ));
        }
    };
    df.with_column(flags.with_name(PROMOTION_COLUMN).into_series())?;
    Ok(())
}

fn truthy(value: &str) -> bool {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => true,
        "false" | "f" | "no" | "n" | "0" | "" => false,
        _ => match value.parse::<f64>() {
            Ok(number) => number != 0.0,
            Err(_) => true,
        },
    }
}
