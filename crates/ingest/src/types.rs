use std::io;
use std::panic::Location;

use polars::prelude::PolarsError;
use supply_chain_core::ArtifactError;
use thiserror::Error;

/// Underlying causes of ingest failures.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required files: {}", .0.join(", "))]
    MissingFiles(Vec<String>),
    #[error("date column `{column}` not found in {file}")]
    MissingDateColumn { file: String, column: String },
    #[error("{0}")]
    Artifact(#[from] ArtifactError),
}

/// An [`IngestError`] tagged with the operation and source location that raised it.
#[derive(Debug, Error)]
#[error("error in [{file}] at line [{line}] during {operation}: {source}")]
pub struct LocatedError {
    pub operation: &'static str,
    pub file: &'static str,
    pub line: u32,
    #[source]
    pub source: IngestError,
}

impl LocatedError {
    #[track_caller]
    pub fn new(operation: &'static str, source: impl Into<IngestError>) -> Self {
        let location = Location::caller();
        Self {
            operation,
            file: location.file(),
            line: location.line(),
            source: source.into(),
        }
    }
}

pub trait ResultExt<T> {
    /// Wraps the error with `operation` and the caller's file and line.
    fn at(self, operation: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<IngestError>,
{
    #[track_caller]
    fn at(self, operation: &'static str) -> Result<T> {
        let location = Location::caller();
        self.map_err(|err| LocatedError {
            operation,
            file: location.file(),
            line: location.line(),
            source: err.into(),
        })
    }
}

pub type Result<T> = std::result::Result<T, LocatedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_records_caller_location() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.at("read_csv_file").expect_err("error");
        assert_eq!(err.operation, "read_csv_file");
        assert!(err.file.ends_with("types.rs"));
        let message = err.to_string();
        assert!(message.contains("read_csv_file"));
        assert!(message.contains("gone"));
    }
}
