use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving ingestion configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("logical file name must not be empty")]
    EmptyFileName,
    #[error("path for `{0}` must not be empty")]
    EmptyPath(String),
    #[error("duplicate logical file name `{0}`")]
    DuplicateFileName(String),
    #[error("no raw files configured")]
    NoRawFiles,
    #[error("{key} references unknown file `{name}`")]
    UnknownFile { key: &'static str, name: String },
    #[error("max_missing_percentage must be within 0..=100, got {0}")]
    InvalidPercentage(f64),
    #[error("unsupported save format `{0}`")]
    UnsupportedFormat(String),
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid artifact: {0}")]
pub struct ArtifactError(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Parquet,
    Csv,
    Ipc,
}

impl SaveFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
            Self::Ipc => "ipc",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
            Self::Ipc => "arrow",
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "parquet" => Ok(Self::Parquet),
            "csv" => Ok(Self::Csv),
            "ipc" => Ok(Self::Ipc),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A logical raw file and where it lives on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawFileSpec {
    name: String,
    path: PathBuf,
    date_columns: Vec<String>,
}

impl RawFileSpec {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        date_columns: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyFileName);
        }
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath(name));
        }
        Ok(Self {
            name,
            path,
            date_columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn date_columns(&self) -> &[String] {
        &self.date_columns
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationRules {
    pub max_missing_percentage: f64,
    pub check_duplicates: bool,
    pub min_rows: BTreeMap<String, usize>,
    pub required_columns: BTreeMap<String, Vec<String>>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_missing_percentage: 30.0,
            check_duplicates: true,
            min_rows: BTreeMap::new(),
            required_columns: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningOptions {
    pub drop_all_nan_rows: bool,
    pub drop_duplicates: bool,
    pub convert_onpromotion_to_bool: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            drop_all_nan_rows: true,
            drop_duplicates: true,
            convert_onpromotion_to_bool: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingOptions {
    pub generate_report: bool,
    pub include_profiling: bool,
}

impl Default for ReportingOptions {
    fn default() -> Self {
        Self {
            generate_report: true,
            include_profiling: true,
        }
    }
}

/// Fully resolved settings for one ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionConfig {
    pub raw_files: Vec<RawFileSpec>,
    pub artifact_dir: PathBuf,
    pub save_format: SaveFormat,
    pub enable_validation: bool,
    pub chunk_size: Option<NonZeroUsize>,
    pub validation: ValidationRules,
    pub cleaning: CleaningOptions,
    pub reporting: ReportingOptions,
}

impl IngestionConfig {
    /// Builds a config with default rules for the given files.
    pub fn new(
        raw_files: Vec<RawFileSpec>,
        artifact_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            raw_files,
            artifact_dir: artifact_dir.into(),
            save_format: SaveFormat::default(),
            enable_validation: true,
            chunk_size: None,
            validation: ValidationRules::default(),
            cleaning: CleaningOptions::default(),
            reporting: ReportingOptions::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.raw_files.is_empty() {
            return Err(ConfigError::NoRawFiles);
        }
        if self.artifact_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("artifact_dir".to_string()));
        }
        let mut names = BTreeSet::new();
        for spec in &self.raw_files {
            if !names.insert(spec.name()) {
                return Err(ConfigError::DuplicateFileName(spec.name().to_string()));
            }
        }
        let pct = self.validation.max_missing_percentage;
        if !(0.0..=100.0).contains(&pct) {
            return Err(ConfigError::InvalidPercentage(pct));
        }
        for name in self.validation.min_rows.keys() {
            if !names.contains(name.as_str()) {
                return Err(ConfigError::UnknownFile {
                    key: "validation.min_rows",
                    name: name.clone(),
                });
            }
        }
        for name in self.validation.required_columns.keys() {
            if !names.contains(name.as_str()) {
                return Err(ConfigError::UnknownFile {
                    key: "validation.required_columns",
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn raw_file(&self, name: &str) -> Option<&RawFileSpec> {
        self.raw_files.iter().find(|spec| spec.name() == name)
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.artifact_dir.join(format!(
            "{}_ingested.{}",
            name,
            self.save_format.extension()
        ))
    }

    pub fn report_path(&self) -> PathBuf {
        self.artifact_dir.join("ingestion_report.json")
    }
}

/// Outcome of the quality checks for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub file: String,
    pub shape: (usize, usize),
    pub checks_passed: bool,
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_rows: Option<usize>,
}

impl ValidationResult {
    pub fn new(file: impl Into<String>, shape: (usize, usize)) -> Self {
        Self {
            file: file.into(),
            shape,
            checks_passed: true,
            issues: Vec::new(),
            duplicate_rows: None,
        }
    }

    /// Records an issue that fails the checks.
    pub fn fail(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
        self.checks_passed = false;
    }

    pub fn warn(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    pub name: String,
    pub shape: (usize, usize),
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub dtypes: BTreeMap<String, String>,
    pub missing_values: BTreeMap<String, usize>,
    pub missing_percentage: BTreeMap<String, f64>,
    pub duplicate_rows: usize,
    pub memory_usage_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileProcessingResult {
    Success {
        input_file: PathBuf,
        output_file: PathBuf,
        shape: (usize, usize),
        validation: ValidationResult,
        profile: Option<DataProfile>,
    },
    #[serde(rename = "failed")]
    Failure { file: String, error: String },
}

impl FileProcessingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn output_file(&self) -> Option<&Path> {
        match self {
            Self::Success { output_file, .. } => Some(output_file),
            Self::Failure { .. } => None,
        }
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            Self::Success { validation, .. } => Some(validation),
            Self::Failure { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionSummary {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub all_success: bool,
}

impl IngestionSummary {
    pub fn from_counts(total_files: usize, successful: usize) -> Self {
        let failed = total_files.saturating_sub(successful);
        Self {
            total_files,
            successful,
            failed,
            all_success: successful == total_files,
        }
    }
}

/// Inputs for [`DataIngestionArtifact::new`].
#[derive(Debug, Clone)]
pub struct ArtifactParts {
    pub success: bool,
    pub artifact_dir: PathBuf,
    pub processed_files: BTreeMap<String, PathBuf>,
    pub report_path: Option<PathBuf>,
    pub timestamp: String,
    pub duration_seconds: f64,
    pub files_processed_count: usize,
    pub files_failed_count: usize,
    pub validation_results: BTreeMap<String, ValidationResult>,
    pub errors: Vec<String>,
    pub summary: IngestionSummary,
}

/// Public result of an ingestion run, handed to the next pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataIngestionArtifact {
    success: bool,
    artifact_dir: PathBuf,
    processed_files: BTreeMap<String, PathBuf>,
    report_path: Option<PathBuf>,
    timestamp: String,
    duration_seconds: f64,
    files_processed_count: usize,
    files_failed_count: usize,
    validation_results: BTreeMap<String, ValidationResult>,
    errors: Vec<String>,
    summary: IngestionSummary,
}

impl DataIngestionArtifact {
    pub fn new(parts: ArtifactParts) -> Result<Self, ArtifactError> {
        let summary = parts.summary;
        if summary.successful != parts.files_processed_count
            || summary.failed != parts.files_failed_count
        {
            return Err(ArtifactError(format!(
                "summary counts {}/{} do not match processed {} / failed {}",
                summary.successful,
                summary.failed,
                parts.files_processed_count,
                parts.files_failed_count
            )));
        }
        if summary.total_files != parts.files_processed_count + parts.files_failed_count {
            return Err(ArtifactError(format!(
                "total files {} does not equal processed + failed",
                summary.total_files
            )));
        }
        if parts.processed_files.len() != parts.files_processed_count {
            return Err(ArtifactError(format!(
                "{} output paths for {} processed files",
                parts.processed_files.len(),
                parts.files_processed_count
            )));
        }
        if parts.success != summary.all_success {
            return Err(ArtifactError(
                "success flag disagrees with summary".to_string(),
            ));
        }
        if !parts.duration_seconds.is_finite() || parts.duration_seconds < 0.0 {
            return Err(ArtifactError(format!(
                "invalid duration {}",
                parts.duration_seconds
            )));
        }
        Ok(Self {
            success: parts.success,
            artifact_dir: parts.artifact_dir,
            processed_files: parts.processed_files,
            report_path: parts.report_path,
            timestamp: parts.timestamp,
            duration_seconds: parts.duration_seconds,
            files_processed_count: parts.files_processed_count,
            files_failed_count: parts.files_failed_count,
            validation_results: parts.validation_results,
            errors: parts.errors,
            summary,
        })
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn processed_files(&self) -> &BTreeMap<String, PathBuf> {
        &self.processed_files
    }

    pub fn report_path(&self) -> Option<&Path> {
        self.report_path.as_deref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn files_processed_count(&self) -> usize {
        self.files_processed_count
    }

    pub fn files_failed_count(&self) -> usize {
        self.files_failed_count
    }

    pub fn validation_results(&self) -> &BTreeMap<String, ValidationResult> {
        &self.validation_results
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn summary(&self) -> IngestionSummary {
        self.summary
    }

    pub fn status_message(&self) -> String {
        if self.success {
            format!(
                "Successfully processed {} files in {:.2}s",
                self.files_processed_count, self.duration_seconds
            )
        } else {
            format!(
                "Processed {} files with {} failures",
                self.files_processed_count, self.files_failed_count
            )
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> RawFileSpec {
        RawFileSpec::new(name, format!("data/raw/{name}.csv"), Vec::new()).expect("spec")
    }

    fn parts(successful: usize, total: usize) -> ArtifactParts {
        let summary = IngestionSummary::from_counts(total, successful);
        let processed_files = (0..successful)
            .map(|idx| (format!("f{idx}"), PathBuf::from(format!("out/f{idx}.parquet"))))
            .collect();
        ArtifactParts {
            success: summary.all_success,
            artifact_dir: PathBuf::from("out"),
            processed_files,
            report_path: None,
            timestamp: "2025-12-30 15:30:00".to_string(),
            duration_seconds: 45.5,
            files_processed_count: successful,
            files_failed_count: summary.failed,
            validation_results: BTreeMap::new(),
            errors: Vec::new(),
            summary,
        }
    }

    #[test]
    fn raw_file_spec_rejects_empty_name_and_path() {
        assert_eq!(
            RawFileSpec::new(" ", "a.csv", Vec::new()),
            Err(ConfigError::EmptyFileName)
        );
        assert_eq!(
            RawFileSpec::new("train", "", Vec::new()),
            Err(ConfigError::EmptyPath("train".to_string()))
        );
    }

    #[test]
    fn config_rejects_duplicate_names() {
        let err = IngestionConfig::new(vec![spec("train"), spec("train")], "out")
            .expect_err("duplicate");
        assert_eq!(err, ConfigError::DuplicateFileName("train".to_string()));
    }

    #[test]
    fn config_rejects_rules_for_unknown_files() {
        let mut config = IngestionConfig::new(vec![spec("train")], "out").expect("config");
        config.validation.min_rows.insert("oil".to_string(), 10);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownFile { name, .. }) if name == "oil"
        ));
    }

    #[test]
    fn config_rejects_out_of_range_percentage() {
        let mut config = IngestionConfig::new(vec![spec("train")], "out").expect("config");
        config.validation.max_missing_percentage = 120.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidPercentage(120.0))
        );
    }

    #[test]
    fn output_path_uses_format_extension() {
        let mut config = IngestionConfig::new(vec![spec("train")], "out").expect("config");
        assert_eq!(
            config.output_path("train"),
            PathBuf::from("out/train_ingested.parquet")
        );
        config.save_format = SaveFormat::Ipc;
        assert_eq!(
            config.output_path("train"),
            PathBuf::from("out/train_ingested.arrow")
        );
    }

    #[test]
    fn save_format_parses_closed_set() {
        assert_eq!("CSV".parse::<SaveFormat>(), Ok(SaveFormat::Csv));
        assert_eq!(
            "pickle".parse::<SaveFormat>(),
            Err(ConfigError::UnsupportedFormat("pickle".to_string()))
        );
    }

    #[test]
    fn summary_counts_failures() {
        let summary = IngestionSummary::from_counts(7, 6);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_success);
    }

    #[test]
    fn artifact_status_message() {
        let artifact = DataIngestionArtifact::new(parts(7, 7)).expect("artifact");
        assert_eq!(
            artifact.status_message(),
            "Successfully processed 7 files in 45.50s"
        );
        let artifact = DataIngestionArtifact::new(parts(6, 7)).expect("artifact");
        assert_eq!(artifact.status_message(), "Processed 6 files with 1 failures");
    }

    #[test]
    fn artifact_rejects_inconsistent_counts() {
        let mut bad = parts(7, 7);
        bad.files_processed_count = 6;
        assert!(DataIngestionArtifact::new(bad).is_err());

        let mut bad = parts(6, 7);
        bad.success = true;
        assert!(DataIngestionArtifact::new(bad).is_err());
    }

    #[test]
    fn failure_result_serializes_with_failed_status() {
        let result = FileProcessingResult::Failure {
            file: "oil".to_string(),
            error: "boom".to_string(),
        };
        let value = serde_json::to_value(&result).expect("json");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["file"], "oil");
    }
}
