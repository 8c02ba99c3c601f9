//! High-level pipeline: streams a dataset into the backend, batch by batch.
//!
//! The stages run strictly in order, each one only after the previous one
//! has finished:
//!   1. (optional) create the corpus and upload its documents
//!   2. create the dataset
//!   3. upload the queries
//!   4. upload the relevance judgments
//!
//! Document and query text fields are sanitized on the way through; qrels are
//! sent exactly as read, including judgments below `min_relevance` (the
//! backend applies that threshold).
//!
//! # Error Handling
//! Fail-fast. The first configuration, source or backend error aborts the run.
//! Nothing already sent is rolled back.
//!
//! # Navigation
//! - Main entrypoint: [`ingest`]
//! - Supporting types: [`IngestReport`], [`StageReport`], [`IngestError`]

use std::fmt;
use tracing::{debug, error, info};

use crate::batch::{batched, BatchSizeError};
use crate::config::IngestConfig;
use crate::contract::{Backend, BackendError, DatasetSource, Document, NewCorpus, NewDataset, Query};
use crate::dataset::SourceError;
use crate::progress::{estimated_batches, stage_bar};
use crate::sanitize::{sanitize, sanitize_str};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid configuration: {0}")]
    Config(#[from] BatchSizeError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: BackendError,
    },
}

/// What one stage sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    pub batches: usize,
    pub items: usize,
}

impl StageReport {
    fn record(&mut self, batch_len: usize) {
        self.batches += 1;
        self.items += batch_len;
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub corpus_name: String,
    pub dataset_name: String,
    /// `None` when the corpus was not requested.
    pub documents: Option<StageReport>,
    pub queries: StageReport,
    pub qrels: StageReport,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingestion complete.")?;
        match &self.documents {
            Some(docs) => writeln!(
                f,
                "  corpus '{}': {} documents in {} batches",
                self.corpus_name, docs.items, docs.batches
            )?,
            None => writeln!(f, "  corpus '{}': documents not uploaded", self.corpus_name)?,
        }
        writeln!(
            f,
            "  dataset '{}': {} queries in {} batches",
            self.dataset_name, self.queries.items, self.queries.batches
        )?;
        write!(
            f,
            "  dataset '{}': {} qrels in {} batches",
            self.dataset_name, self.qrels.items, self.qrels.batches
        )
    }
}

fn backend_error(operation: &'static str) -> impl FnOnce(BackendError) -> IngestError {
    move |source| {
        error!(operation, error = %source, "[INGEST][ERROR] Backend call failed");
        IngestError::Backend { operation, source }
    }
}

fn clean_document(doc: Document) -> Document {
    Document {
        id: doc.id,
        title: sanitize(doc.title),
        text: sanitize_str(&doc.text),
    }
}

fn clean_query(query: Query) -> Query {
    Query {
        id: query.id,
        text: sanitize_str(&query.text),
        description: sanitize(query.description),
    }
}

/// Run the whole pipeline for one dataset.
pub async fn ingest<S, B>(
    config: &IngestConfig,
    source: &S,
    backend: &B,
) -> Result<IngestReport, IngestError>
where
    S: DatasetSource + ?Sized,
    B: Backend + ?Sized,
{
    config.validate()?;
    info!(
        dataset = %config.dataset_name,
        corpus = %config.corpus_name,
        "[INGEST] Starting ingestion pipeline"
    );

    let documents = if config.add_corpus {
        Some(upload_corpus(config, source, backend).await?)
    } else {
        info!("[INGEST] Corpus upload not requested, skipping documents");
        None
    };

    backend
        .create_dataset(NewDataset {
            name: &config.dataset_name,
            corpus_name: &config.corpus_name,
            min_relevance: config.min_relevance,
        })
        .await
        .map_err(backend_error("create_dataset"))?;
    info!(dataset = %config.dataset_name, "[INGEST] Dataset created");

    let queries = upload_queries(config, source, backend).await?;
    let qrels = upload_qrels(config, source, backend).await?;

    info!("[INGEST] Ingestion pipeline complete");
    Ok(IngestReport {
        corpus_name: config.corpus_name.clone(),
        dataset_name: config.dataset_name.clone(),
        documents,
        queries,
        qrels,
    })
}

async fn upload_corpus<S, B>(
    config: &IngestConfig,
    source: &S,
    backend: &B,
) -> Result<StageReport, IngestError>
where
    S: DatasetSource + ?Sized,
    B: Backend + ?Sized,
{
    backend
        .create_corpus(NewCorpus {
            name: &config.corpus_name,
            language: &config.language,
        })
        .await
        .map_err(backend_error("create_corpus"))?;
    info!(corpus = %config.corpus_name, language = %config.language, "[INGEST] Corpus created");

    let total = source.docs_count()?;
    let bar = stage_bar("Adding documents", estimated_batches(total, config.batch_size));
    let mut report = StageReport::default();
    for batch in batched(source.docs_iter()?, config.batch_size)? {
        let docs = batch
            .into_iter()
            .map(|doc| doc.map(clean_document))
            .collect::<Result<Vec<_>, _>>()?;
        backend
            .add_documents(&config.corpus_name, &docs)
            .await
            .map_err(backend_error("add_documents"))?;
        report.record(docs.len());
        debug!(batch = report.batches, size = docs.len(), "[INGEST] Documents batch sent");
        bar.inc(1);
    }
    bar.finish();
    info!(batches = report.batches, documents = report.items, "[INGEST] Documents uploaded");
    Ok(report)
}

async fn upload_queries<S, B>(
    config: &IngestConfig,
    source: &S,
    backend: &B,
) -> Result<StageReport, IngestError>
where
    S: DatasetSource + ?Sized,
    B: Backend + ?Sized,
{
    let total = source.queries_count()?;
    let bar = stage_bar("Adding queries", estimated_batches(total, config.batch_size));
    let mut report = StageReport::default();
    for batch in batched(source.queries_iter()?, config.batch_size)? {
        let queries = batch
            .into_iter()
            .map(|query| query.map(clean_query))
            .collect::<Result<Vec<_>, _>>()?;
        backend
            .add_queries(&config.corpus_name, &config.dataset_name, &queries)
            .await
            .map_err(backend_error("add_queries"))?;
        report.record(queries.len());
        debug!(batch = report.batches, size = queries.len(), "[INGEST] Queries batch sent");
        bar.inc(1);
    }
    bar.finish();
    info!(batches = report.batches, queries = report.items, "[INGEST] Queries uploaded");
    Ok(report)
}

async fn upload_qrels<S, B>(
    config: &IngestConfig,
    source: &S,
    backend: &B,
) -> Result<StageReport, IngestError>
where
    S: DatasetSource + ?Sized,
    B: Backend + ?Sized,
{
    let total = source.qrels_count()?;
    let bar = stage_bar("Adding QRels", estimated_batches(total, config.batch_size));
    let mut report = StageReport::default();
    for batch in batched(source.qrels_iter()?, config.batch_size)? {
        let qrels = batch.into_iter().collect::<Result<Vec<_>, _>>()?;
        backend
            .add_qrels(&config.corpus_name, &config.dataset_name, &qrels)
            .await
            .map_err(backend_error("add_qrels"))?;
        report.record(qrels.len());
        debug!(batch = report.batches, size = qrels.len(), "[INGEST] QRels batch sent");
        bar.inc(1);
    }
    bar.finish();
    info!(batches = report.batches, qrels = report.items, "[INGEST] QRels uploaded");
    Ok(report)
}
