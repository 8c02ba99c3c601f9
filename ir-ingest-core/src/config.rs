use tracing::{debug, info};

use crate::batch::BatchSizeError;
use crate::dataset::FieldMapping;

pub const DEFAULT_BATCH_SIZE: usize = 256;
pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_MIN_RELEVANCE: i64 = 1;

/// Everything the ingestion pipeline needs besides its source and backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Name of the dataset to create in the backend.
    pub dataset_name: String,
    /// Name of the corpus the dataset belongs to (created only if `add_corpus`).
    pub corpus_name: String,
    pub batch_size: usize,
    pub language: String,
    pub min_relevance: i64,
    /// Create the corpus and upload its documents before the dataset.
    pub add_corpus: bool,
    pub fields: FieldMapping,
}

impl IngestConfig {
    pub fn new(dataset_name: impl Into<String>, corpus_name: impl Into<String>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            corpus_name: corpus_name.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            language: DEFAULT_LANGUAGE.to_string(),
            min_relevance: DEFAULT_MIN_RELEVANCE,
            add_corpus: false,
            fields: FieldMapping::default(),
        }
    }

    pub fn validate(&self) -> Result<(), BatchSizeError> {
        if self.batch_size == 0 {
            return Err(BatchSizeError(self.batch_size));
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            dataset_name = %self.dataset_name,
            corpus_name = %self.corpus_name,
            batch_size = self.batch_size,
            add_corpus = self.add_corpus,
            "Loaded IngestConfig"
        );
        debug!(?self, "IngestConfig loaded (full debug)");
    }
}
