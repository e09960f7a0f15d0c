mod ingest;

use std::sync::Arc;

use supply_chain_core::IngestionConfig;

pub use self::ingest::IngestService;

type SharedConfig = Arc<IngestionConfig>;

/// Service registry for pipeline stages.
#[derive(Clone)]
pub struct PipelineServices {
    pub ingest: IngestService,
}

impl PipelineServices {
    pub fn new(config: IngestionConfig) -> Self {
        let shared = Arc::new(config);
        Self {
            ingest: IngestService::new(shared),
        }
    }
}
