use std::path::PathBuf;

use supply_chain_core::DataIngestionArtifact;
use tracing::{error, info};

use crate::config::load_ingestion_config;
use crate::error::{AppError, Result};
use crate::services::PipelineServices;
use crate::startup::ProjectPaths;

const BANNER: &str = "============================================================";

/// Runs the training stages in order and keeps each stage's artifact.
pub struct TrainingPipeline {
    paths: ProjectPaths,
    config_file: PathBuf,
    data_ingestion_artifact: Option<DataIngestionArtifact>,
}

impl TrainingPipeline {
    pub fn new(paths: ProjectPaths) -> Self {
        let config_file = paths.config_file.clone();
        Self::with_config_file(paths, config_file)
    }

    pub fn with_config_file(paths: ProjectPaths, config_file: PathBuf) -> Self {
        info!("{}", BANNER);
        info!("INITIALIZING TRAINING PIPELINE");
        info!("{}", BANNER);
        Self {
            paths,
            config_file,
            data_ingestion_artifact: None,
        }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn data_ingestion_artifact(&self) -> Option<&DataIngestionArtifact> {
        self.data_ingestion_artifact.as_ref()
    }

    pub fn services(&self) -> Result<PipelineServices> {
        info!("loading data ingestion configuration");
        let config = load_ingestion_config(&self.paths, &self.config_file)?;
        Ok(PipelineServices::new(config))
    }

    /// Stage 1. Fails when the run aborts or any file could not be ingested.
    pub fn start_data_ingestion(&mut self) -> Result<&DataIngestionArtifact> {
        info!("{}", BANNER);
        info!("STAGE 1: DATA INGESTION");
        info!("{}", BANNER);
        let services = self.services()?;
        let artifact = services.ingest.run().inspect_err(|err| {
            error!("data ingestion stage failed: {}", err);
        })?;

        info!("{}", BANNER);
        info!("DATA INGESTION STAGE COMPLETED");
        info!("{}", BANNER);
        info!("{}", artifact.status_message());
        info!("artifact directory: {}", artifact.artifact_dir().display());
        info!("processed files: {}", artifact.processed_files().len());
        if let Some(report) = artifact.report_path() {
            info!("report saved at: {}", report.display());
        }

        let artifact = self.data_ingestion_artifact.insert(artifact);
        if !artifact.success() {
            let err = AppError::IngestionFailed {
                errors: artifact.errors().to_vec(),
            };
            error!("{}", err);
            return Err(err);
        }
        Ok(artifact)
    }

    pub fn run_pipeline(&mut self) -> Result<()> {
        info!("{}", BANNER);
        info!("STARTING TRAINING PIPELINE");
        info!("{}", BANNER);
        let artifact = self.start_data_ingestion()?;
        let processed = artifact.files_processed_count();
        let duration = artifact.duration_seconds();
        info!("{}", BANNER);
        info!("TRAINING PIPELINE COMPLETED SUCCESSFULLY");
        info!("processed {} files in {:.2}s", processed, duration);
        info!("{}", BANNER);
        Ok(())
    }
}
