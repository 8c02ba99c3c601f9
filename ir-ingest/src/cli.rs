//! Command-line interface for ir-ingest.
//!
//! Parses arguments, opens the dataset from the local library and runs the
//! ingestion pipeline against the HTTP backend. All pipeline logic lives in
//! `ir-ingest-core`; this module is glue.
//!
//! Flags keep their snake_case spelling (`--batch_size`, `--add_corpus`, ...);
//! kebab-case aliases are accepted as well.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::upload::HttpBackend;
use ir_ingest_core::config::{
    IngestConfig, DEFAULT_BATCH_SIZE, DEFAULT_LANGUAGE, DEFAULT_MIN_RELEVANCE,
};
use ir_ingest_core::dataset::{FieldMapping, LocalDataset};
use ir_ingest_core::ingest::{ingest, IngestReport};

/// Upload an IR dataset (documents, queries, qrels) to an ir-explorer backend.
#[derive(Parser, Debug)]
#[command(name = "ir-ingest", version)]
pub struct Cli {
    /// Dataset identifier in the local dataset library, e.g. `msmarco-passage/dev`
    #[arg(value_name = "DATASET_ID")]
    pub dataset_id: String,

    /// Name of the dataset in the backend
    #[arg(value_name = "DATASET_NAME")]
    pub dataset_name: String,

    /// Name of the corpus in the backend
    #[arg(value_name = "CORPUS_NAME")]
    pub corpus_name: String,

    /// How many items to add at once
    #[arg(long = "batch_size", alias = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Corpus language
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Minimum relevance score for the dataset
    #[arg(
        long = "min_relevance",
        alias = "min-relevance",
        default_value_t = DEFAULT_MIN_RELEVANCE,
        allow_negative_numbers = true
    )]
    pub min_relevance: i64,

    /// Create the corpus and upload its documents
    #[arg(long = "add_corpus", alias = "add-corpus")]
    pub add_corpus: bool,

    /// Backend hostname
    #[arg(long, env = "IR_BACKEND_HOSTNAME", default_value = "localhost")]
    pub hostname: String,

    /// Backend port
    #[arg(long, env = "IR_BACKEND_PORT", default_value_t = 8103)]
    pub port: u16,

    /// Root directory of the local dataset library
    #[arg(
        long = "datasets_dir",
        alias = "datasets-dir",
        env = "IR_DATASETS_HOME",
        default_value = "datasets"
    )]
    pub datasets_dir: PathBuf,

    /// Attribute name to use for getting the document text
    #[arg(long = "document_text_attr", alias = "document-text-attr", default_value = "text")]
    pub document_text_attr: String,

    /// Attribute name to use for getting the document title
    #[arg(long = "document_title_attr", alias = "document-title-attr", default_value = "title")]
    pub document_title_attr: String,

    /// Attribute name to use for getting the query text
    #[arg(long = "query_text_attr", alias = "query-text-attr", default_value = "text")]
    pub query_text_attr: String,

    /// Attribute name to use for getting the query description
    #[arg(
        long = "query_description_attr",
        alias = "query-description-attr",
        default_value = "description"
    )]
    pub query_description_attr: String,
}

impl From<&Cli> for IngestConfig {
    fn from(cli: &Cli) -> Self {
        IngestConfig {
            dataset_name: cli.dataset_name.clone(),
            corpus_name: cli.corpus_name.clone(),
            batch_size: cli.batch_size,
            language: cli.language.clone(),
            min_relevance: cli.min_relevance,
            add_corpus: cli.add_corpus,
            fields: FieldMapping {
                document_text: cli.document_text_attr.clone(),
                document_title: cli.document_title_attr.clone(),
                query_text: cli.query_text_attr.clone(),
                query_description: cli.query_description_attr.clone(),
            },
        }
    }
}

/// Async entrypoint shared by `main()` and the integration tests.
///
/// Configuration problems (bad batch size, unknown dataset) are reported
/// before the backend is contacted.
pub async fn run(cli: Cli) -> Result<IngestReport> {
    tracing::info!(dataset_id = %cli.dataset_id, "Starting ir-ingest");

    let config = IngestConfig::from(&cli);
    config.trace_loaded();
    config.validate().context("invalid --batch_size")?;

    let dataset = LocalDataset::open(&cli.datasets_dir, &cli.dataset_id, config.fields.clone())
        .with_context(|| format!("cannot load dataset '{}'", cli.dataset_id))?;
    let backend = HttpBackend::new(&cli.hostname, cli.port)
        .context("failed to construct HTTP client")?;

    match ingest(&config, &dataset, &backend).await {
        Ok(report) => {
            tracing::info!(?report, "Ingestion complete");
            println!("{report}");
            Ok(report)
        }
        Err(e) => {
            tracing::error!(error = %e, "Ingestion failed");
            Err(e).context(format!(
                "ingesting '{}' into {}",
                cli.dataset_id,
                backend.base_url()
            ))
        }
    }
}
