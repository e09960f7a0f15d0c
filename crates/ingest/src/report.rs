use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Local;
use serde::Serialize;
use supply_chain_core::{FileProcessingResult, IngestionSummary, ValidationResult};
use tracing::info;

use crate::types::{Result, ResultExt};
use crate::validation::round2;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Run-scoped record of everything that happened during one ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub timestamp: String,
    pub files_processed: BTreeMap<String, FileProcessingResult>,
    pub validation_results: BTreeMap<String, ValidationResult>,
    pub errors: Vec<String>,
    pub duration_seconds: f64,
    pub summary: IngestionSummary,
}

impl IngestionReport {
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            files_processed: BTreeMap::new(),
            validation_results: BTreeMap::new(),
            errors: Vec::new(),
            duration_seconds: 0.0,
            summary: IngestionSummary::default(),
        }
    }

    pub fn record(&mut self, name: &str, result: FileProcessingResult) {
        if let Some(validation) = result.validation() {
            self.validation_results
                .insert(name.to_string(), validation.clone());
        }
        self.files_processed.insert(name.to_string(), result);
    }

    pub fn record_error(&mut self, name: &str, message: &str) {
        self.errors.push(format!("{}: {}", name, message));
    }

    pub fn successful(&self) -> usize {
        self.files_processed
            .values()
            .filter(|result| result.is_success())
            .count()
    }

    /// Stamps duration and summary once every file has been processed.
    pub fn finish(&mut self, duration_seconds: f64) {
        self.duration_seconds = round2(duration_seconds);
        self.summary = IngestionSummary::from_counts(self.files_processed.len(), self.successful());
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).at("generate_ingestion_report")?;
        fs::write(path, json).at("generate_ingestion_report")?;
        info!("ingestion report saved to {}", path.display());
        Ok(())
    }
}

impl Default for IngestionReport {
    fn default() -> Self {
        Self::new()
    }
}
