use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::DataFrame;
use supply_chain_core::{
    ArtifactParts, DataIngestionArtifact, FileProcessingResult, IngestionConfig, RawFileSpec,
    ValidationResult,
};
use tracing::{error, info};

use crate::clean::clean_table;
use crate::frame_io::{read_csv_table, save_table};
use crate::paths::create_directories;
use crate::profile::generate_data_profile;
use crate::report::{IngestionReport, timestamp_now};
use crate::types::{IngestError, LocatedError, Result, ResultExt};
use crate::validation::{
    check_duplicates, check_minimum_rows, check_missing_values, format_percentages,
    validate_columns, validate_required_files,
};

const BANNER: &str = "============================================================";

/// Reads, validates, cleans, profiles and persists every configured raw file.
///
/// One engine drives one run: [`DataIngestion::initiate_data_ingestion`]
/// consumes it together with its report.
pub struct DataIngestion {
    config: IngestionConfig,
    report: IngestionReport,
}

impl DataIngestion {
    pub fn new(config: IngestionConfig) -> Self {
        info!(
            "data ingestion configured for {} files -> {}",
            config.raw_files.len(),
            config.artifact_dir.display()
        );
        Self {
            config,
            report: IngestionReport::new(),
        }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Fails with the full list of missing logical names when any raw file is absent.
    pub fn validate_raw_files(&self) -> Result<()> {
        info!("validating raw data files");
        let (all_present, missing) = validate_required_files(&self.config.raw_files);
        if !all_present {
            return Err(LocatedError::new(
                "validate_raw_files",
                IngestError::MissingFiles(missing),
            ));
        }
        Ok(())
    }

    pub fn validate_dataframe(&self, df: &DataFrame, name: &str) -> Result<ValidationResult> {
        let mut result = ValidationResult::new(name, df.shape());
        if !self.config.enable_validation {
            info!("validation disabled for {}", name);
            return Ok(result);
        }
        info!("validating {}", name);
        let rules = &self.config.validation;

        if let Some(expected) = rules.required_columns.get(name) {
            let (all_present, missing) = validate_columns(df, expected, name);
            if !all_present {
                result.fail(format!("Missing required columns: {}", missing.join(", ")));
            }
        }

        if let Some(&min_rows) = rules.min_rows.get(name)
            && !check_minimum_rows(df, min_rows, name)
        {
            result.fail(format!(
                "Row count {} below minimum {}",
                df.height(),
                min_rows
            ));
        }

        let (passes, exceeding) = check_missing_values(df, rules.max_missing_percentage, name);
        if !passes {
            result.warn(format!(
                "Columns with high missing values: {}",
                format_percentages(&exceeding)
            ));
        }

        if rules.check_duplicates {
            let (count, has_duplicates) = check_duplicates(df, name)?;
            if has_duplicates {
                result.duplicate_rows = Some(count);
            }
        }

        info!("validation complete for {}", name);
        Ok(result)
    }

    /// Runs one file through read, validate, clean, profile and save.
    ///
    /// Failures are captured in the returned result and the report's error
    /// list rather than propagated.
    pub fn process_single_file(&mut self, spec: &RawFileSpec) -> FileProcessingResult {
        info!("{}", BANNER);
        info!("processing: {}", spec.name());
        info!("{}", BANNER);
        match self.run_file_steps(spec) {
            Ok(result) => {
                info!("successfully processed {}", spec.name());
                result
            }
            Err(err) => {
                error!("error processing {}: {}", spec.name(), err);
                let message = err.to_string();
                self.report.record_error(spec.name(), &message);
                FileProcessingResult::Failure {
                    file: spec.name().to_string(),
                    error: message,
                }
            }
        }
    }

    fn run_file_steps(&self, spec: &RawFileSpec) -> Result<FileProcessingResult> {
        let name = spec.name();
        let df = read_csv_table(spec.path(), spec.date_columns(), self.config.chunk_size)?;
        let validation = self.validate_dataframe(&df, name)?;
        let df = clean_table(df, &self.config.cleaning, name)?;
        let profile = if self.config.reporting.include_profiling {
            Some(generate_data_profile(&df, name)?)
        } else {
            None
        };
        let output_file = self.save_processed_data(&df, name)?;
        Ok(FileProcessingResult::Success {
            input_file: spec.path().to_path_buf(),
            output_file,
            shape: df.shape(),
            validation,
            profile,
        })
    }

    fn save_processed_data(&self, df: &DataFrame, name: &str) -> Result<PathBuf> {
        let output_path = self.config.output_path(name);
        save_table(df, &output_path, self.config.save_format)?;
        Ok(output_path)
    }

    /// Processes every configured file in order and returns the run artifact.
    ///
    /// Only a missing raw file or an unusable artifact directory aborts the
    /// run; individual file failures are reported in the artifact.
    pub fn initiate_data_ingestion(mut self) -> Result<DataIngestionArtifact> {
        info!("{}", BANNER);
        info!("STARTING DATA INGESTION PIPELINE");
        info!("{}", BANNER);
        let start = Instant::now();

        create_directories(&[&self.config.artifact_dir]).at("initiate_data_ingestion")?;
        self.validate_raw_files()?;

        let specs = self.config.raw_files.clone();
        let mut processed_files = BTreeMap::new();
        for spec in &specs {
            let result = self.process_single_file(spec);
            if let Some(output) = result.output_file() {
                processed_files.insert(spec.name().to_string(), output.to_path_buf());
            }
            self.report.record(spec.name(), result);
        }

        let duration_seconds = start.elapsed().as_secs_f64();
        self.report.finish(duration_seconds);
        let summary = self.report.summary;

        let report_path = if self.config.reporting.generate_report {
            let path = self.config.report_path();
            self.report.write(&path)?;
            Some(path)
        } else {
            None
        };

        info!("{}", BANNER);
        info!("DATA INGESTION COMPLETE");
        info!(
            "processed {}/{} files in {:.2}s",
            summary.successful, summary.total_files, duration_seconds
        );
        if summary.failed > 0 {
            error!("{} files failed", summary.failed);
        }
        info!("{}", BANNER);

        let report = self.report;
        let artifact = DataIngestionArtifact::new(ArtifactParts {
            success: summary.all_success,
            artifact_dir: self.config.artifact_dir,
            processed_files,
            report_path,
            timestamp: timestamp_now(),
            duration_seconds,
            files_processed_count: summary.successful,
            files_failed_count: summary.failed,
            validation_results: report.validation_results,
            errors: report.errors,
            summary,
        })
        .at("initiate_data_ingestion")?;
        info!("{}", artifact.status_message());
        Ok(artifact)
    }
}

/// Convenience wrapper that builds an engine and runs it once.
pub fn ingest(config: IngestionConfig) -> Result<DataIngestionArtifact> {
    DataIngestion::new(config).initiate_data_ingestion()
}

/// Reads and profiles a single CSV without persisting anything.
pub fn profile_csv(path: &Path, date_columns: &[String]) -> Result<supply_chain_core::DataProfile> {
    let df = read_csv_table(path, date_columns, None)?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("table");
    generate_data_profile(&df, name)
}
