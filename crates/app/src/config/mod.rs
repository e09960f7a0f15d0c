use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use ingest::{REQUIRED_RAW_FILES, default_raw_file_path};
use serde::{Deserialize, Serialize};
use supply_chain_core::{
    CleaningOptions, ConfigError, IngestionConfig, RawFileSpec, ReportingOptions, SaveFormat,
    ValidationRules,
};
use tracing::{info, warn};

use crate::error::Result;
use crate::startup::ProjectPaths;

/// One configured raw file; `path` defaults to `{raw_data_dir}/{name}.csv`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawFileEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// On-disk schema of `configs/data_ingestion.toml` (or `.yaml`).
///
/// Scalars come before tables so the TOML rendering stays valid.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestionSettings {
    pub save_format: SaveFormat,
    pub enable_validation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    pub drop_all_nan_rows: bool,
    pub drop_duplicates: bool,
    pub convert_onpromotion_to_bool: bool,
    pub generate_report: bool,
    pub include_profiling: bool,
    pub raw_data_dir: PathBuf,
    pub artifact_dir: PathBuf,
    pub date_columns: BTreeMap<String, Vec<String>>,
    pub validation: ValidationRules,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raw_files: Vec<RawFileEntry>,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        let date_columns = ["train", "test", "holidays_events", "oil", "transactions"]
            .into_iter()
            .map(|name| (name.to_string(), vec!["date".to_string()]))
            .collect();
        Self {
            save_format: SaveFormat::default(),
            enable_validation: true,
            chunk_size: None,
            drop_all_nan_rows: true,
            drop_duplicates: true,
            convert_onpromotion_to_bool: true,
            generate_report: true,
            include_profiling: true,
            raw_data_dir: PathBuf::from("data/raw"),
            artifact_dir: PathBuf::from("artifacts/data_ingestion"),
            date_columns,
            validation: ValidationRules::default(),
            raw_files: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Toml,
    Yaml,
}

fn format_for(path: &Path) -> Format {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Format::Yaml,
        _ => Format::Toml,
    }
}

impl IngestionSettings {
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings = match format_for(path) {
            Format::Toml => toml::from_str(contents)?,
            Format::Yaml => serde_yaml::from_str(contents)?,
        };
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("loading data ingestion config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents, path)
    }

    /// Loads `path` when present, otherwise falls back to the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            return Self::load(path);
        }
        info!("no config at {}, using defaults", path.display());
        Ok(Self::default())
    }

    pub fn render(&self, path: &Path) -> Result<String> {
        let contents = match format_for(path) {
            Format::Toml => toml::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        };
        Ok(contents)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render(path)?)?;
        Ok(())
    }

    /// Configured raw files, or the seven standard ones when none are listed.
    pub fn raw_file_entries(&self) -> Vec<RawFileEntry> {
        if !self.raw_files.is_empty() {
            return self.raw_files.clone();
        }
        REQUIRED_RAW_FILES
            .iter()
            .map(|name| RawFileEntry {
                name: name.to_string(),
                path: None,
            })
            .collect()
    }

    /// Resolves relative paths against the project root and validates the result.
    pub fn into_config(self, paths: &ProjectPaths) -> Result<IngestionConfig> {
        let raw_data_dir = paths.resolve(&self.raw_data_dir);
        let entries = self.raw_file_entries();
        for name in self.date_columns.keys() {
            if !entries.iter().any(|entry| &entry.name == name) {
                warn!("date_columns entry `{}` names no configured file, ignoring", name);
            }
        }
        let raw_files = entries
            .into_iter()
            .map(|entry| {
                let path = match entry.path {
                    Some(path) => paths.resolve(&path),
                    None => default_raw_file_path(&raw_data_dir, &entry.name),
                };
                let date_columns = self
                    .date_columns
                    .get(&entry.name)
                    .cloned()
                    .unwrap_or_default();
                RawFileSpec::new(entry.name, path, date_columns)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let chunk_size = match self.chunk_size {
            Some(size) => Some(NonZeroUsize::new(size).ok_or(ConfigError::ZeroChunkSize)?),
            None => None,
        };
        let config = IngestionConfig {
            raw_files,
            artifact_dir: paths.resolve(&self.artifact_dir),
            save_format: self.save_format,
            enable_validation: self.enable_validation,
            chunk_size,
            validation: self.validation,
            cleaning: CleaningOptions {
                drop_all_nan_rows: self.drop_all_nan_rows,
                drop_duplicates: self.drop_duplicates,
                convert_onpromotion_to_bool: self.convert_onpromotion_to_bool,
            },
            reporting: ReportingOptions {
                generate_report: self.generate_report,
                include_profiling: self.include_profiling,
            },
        };
        config.validate()?;
        info!(
            "config resolved: format={} validation={} files={}",
            config.save_format,
            config.enable_validation,
            config.raw_files.len()
        );
        Ok(config)
    }
}

/// Loads the project's config file and resolves it into an [`IngestionConfig`].
pub fn load_ingestion_config(paths: &ProjectPaths, file: &Path) -> Result<IngestionConfig> {
    IngestionSettings::load_or_default(file)?.into_config(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn defaults_cover_seven_files() {
        let paths = ProjectPaths::new("/srv/supply");
        let config = IngestionSettings::default()
            .into_config(&paths)
            .expect("config");
        assert_eq!(config.raw_files.len(), 7);
        assert_eq!(config.raw_files[0].name(), "train");
        assert_eq!(
            config.raw_files[0].path(),
            Path::new("/srv/supply/data/raw/train.csv")
        );
        assert_eq!(config.raw_files[0].date_columns(), ["date".to_string()]);
        assert!(config.raw_file("items").expect("items").date_columns().is_empty());
        assert_eq!(
            config.artifact_dir,
            PathBuf::from("/srv/supply/artifacts/data_ingestion")
        );
        assert_eq!(config.save_format, SaveFormat::Parquet);
        assert_eq!(config.validation.max_missing_percentage, 30.0);
    }

    #[test]
    fn toml_overrides_are_applied() {
        let contents = r#"
save_format = "csv"
chunk_size = 1000
drop_duplicates = false

[validation]
max_missing_percentage = 50.0

[validation.min_rows]
train = 1000
"#;
        let settings =
            IngestionSettings::parse(contents, Path::new("data_ingestion.toml")).expect("parse");
        let config = settings
            .into_config(&ProjectPaths::new("/p"))
            .expect("config");
        assert_eq!(config.save_format, SaveFormat::Csv);
        assert_eq!(config.chunk_size.map(NonZeroUsize::get), Some(1000));
        assert!(!config.cleaning.drop_duplicates);
        assert_eq!(config.validation.max_missing_percentage, 50.0);
        assert_eq!(config.validation.min_rows["train"], 1000);
        assert!(config.validation.check_duplicates);
    }

    #[test]
    fn yaml_is_accepted() {
        let contents = "save_format: ipc\nenable_validation: false\nraw_files:\n  - name: oil\n    path: /data/oil.csv\ndate_columns:\n  oil: [date]\n";
        let config = IngestionSettings::parse(contents, Path::new("data_ingestion.yaml"))
            .expect("parse")
            .into_config(&ProjectPaths::new("/p"))
            .expect("config");
        assert_eq!(config.save_format, SaveFormat::Ipc);
        assert!(!config.enable_validation);
        assert_eq!(config.raw_files.len(), 1);
        assert_eq!(config.raw_files[0].path(), Path::new("/data/oil.csv"));
    }

    #[test]
    fn invalid_values_fail_the_load() {
        let paths = ProjectPaths::new("/p");
        let toml_path = Path::new("c.toml");
        assert!(IngestionSettings::parse("save_format = \"pickle\"", toml_path).is_err());
        assert!(IngestionSettings::parse("unknown_key = 1", toml_path).is_err());

        let zero = IngestionSettings::parse("chunk_size = 0", toml_path).expect("parse");
        assert!(matches!(
            zero.into_config(&paths),
            Err(AppError::Config(ConfigError::ZeroChunkSize))
        ));

        let pct = IngestionSettings::parse(
            "[validation]\nmax_missing_percentage = 150.0",
            toml_path,
        )
        .expect("parse");
        assert!(matches!(
            pct.into_config(&paths),
            Err(AppError::Config(ConfigError::InvalidPercentage(_)))
        ));

        let dup = IngestionSettings::parse(
            "[[raw_files]]\nname = \"oil\"\n\n[[raw_files]]\nname = \"oil\"\n",
            toml_path,
        )
        .expect("parse");
        assert!(matches!(
            dup.into_config(&paths),
            Err(AppError::Config(ConfigError::DuplicateFileName(_)))
        ));
    }

    #[test]
    fn date_columns_for_unconfigured_files_are_ignored() {
        let settings = IngestionSettings::parse(
            "[[raw_files]]\nname = \"items\"\n",
            Path::new("c.toml"),
        )
        .expect("parse");
        let config = settings
            .into_config(&ProjectPaths::new("/p"))
            .expect("config");
        assert_eq!(config.raw_files.len(), 1);
        assert!(config.raw_files[0].date_columns().is_empty());
        assert_eq!(config.raw_files[0].path(), Path::new("/p/data/raw/items.csv"));
    }

    #[test]
    fn written_defaults_load_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        for file in ["configs/data_ingestion.toml", "configs/data_ingestion.yaml"] {
            let path = dir.path().join(file);
            IngestionSettings::default().write(&path).expect("write");
            let loaded = IngestionSettings::load(&path).expect("load");
            assert_eq!(loaded, IngestionSettings::default());
        }
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings =
            IngestionSettings::load_or_default(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(settings, IngestionSettings::default());
    }
}
