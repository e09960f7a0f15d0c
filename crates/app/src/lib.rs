pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod services;
pub mod startup;

pub use config::{IngestionSettings, RawFileEntry, load_ingestion_config};
pub use error::{AppError, Result};
pub use logging::Logging;
pub use pipeline::TrainingPipeline;
pub use services::{IngestService, PipelineServices};
pub use startup::{
    CONFIG_FILE_NAME, HOME_ENV_VAR, ProjectPaths, ensure_project_dirs, resolve_project_root,
};
