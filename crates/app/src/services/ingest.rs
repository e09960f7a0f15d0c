use std::path::Path;

use ingest::DataIngestion;
use supply_chain_core::{DataIngestionArtifact, DataProfile, IngestionConfig};
use tracing::info;

use crate::error::Result;
use crate::services::SharedConfig;

#[derive(Clone)]
pub struct IngestService {
    config: SharedConfig,
}

impl IngestService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Runs a fresh ingestion engine over the configured files.
    pub fn run(&self) -> Result<DataIngestionArtifact> {
        info!("initializing data ingestion component");
        let engine = DataIngestion::new(self.config.as_ref().clone());
        info!("executing data ingestion pipeline");
        Ok(engine.initiate_data_ingestion()?)
    }

    /// Logical names of configured files that are not on disk.
    pub fn missing_files(&self) -> Vec<String> {
        ingest::validate_required_files(&self.config.raw_files).1
    }

    pub fn profile(&self, path: &Path) -> Result<DataProfile> {
        let date_columns = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|name| self.config.raw_file(name))
            .map(|spec| spec.date_columns().to_vec())
            .unwrap_or_default();
        Ok(ingest::profile_csv(path, &date_columns)?)
    }
}
