//! # contract: data model and the two seams of the ingestion pipeline
//!
//! This module defines the records that flow through the pipeline
//! ([`Document`], [`Query`], [`QRel`]), the request types for creating a
//! corpus or dataset, and the two traits the orchestrator is written against:
//!
//! - [`DatasetSource`]: where records come from (a local dataset library, or an
//!   in-memory fixture in tests).
//! - [`Backend`]: where batches go (the HTTP client in the CLI crate, or a
//!   `mockall` mock).
//!
//! ## Mocking & Testing
//! - [`Backend`] is annotated for `mockall`; with the `test-export-mocks`
//!   feature (on by default) `MockBackend` is exported for integration tests
//!   in dependent crates.
//!
//! ## Wire format
//! All records derive `Serialize` with the exact field names the backend
//! expects. Optional fields serialise as `null` when absent.

use async_trait::async_trait;
use serde::Serialize;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::dataset::SourceError;

/// A document of a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Unique within a corpus.
    pub id: String,
    pub title: Option<String>,
    pub text: String,
}

/// A query of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    /// Unique within a dataset.
    pub id: String,
    pub text: String,
    pub description: Option<String>,
}

/// A relevance judgment relating one query to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QRel {
    pub query_id: String,
    pub document_id: String,
    pub relevance: i64,
}

/// Request body for creating a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewCorpus<'a> {
    pub name: &'a str,
    /// Language tag of the corpus, e.g. `English`.
    pub language: &'a str,
}

/// Request body for creating a dataset bound to a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewDataset<'a> {
    pub name: &'a str,
    pub corpus_name: &'a str,
    pub min_relevance: i64,
}

/// Error type for [`Backend`] calls. Transport failures of any kind are
/// boxed; the pipeline does not distinguish between them.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Forward-only iterator over the records of one dataset stage.
pub type RecordIter<'a, T> = Box<dyn Iterator<Item = Result<T, SourceError>> + Send + 'a>;

/// Read access to one dataset: counts and lazy iterators per record kind.
///
/// Counts are only used for progress display; iteration always runs to
/// exhaustion of the returned iterator.
pub trait DatasetSource {
    fn docs_count(&self) -> Result<usize, SourceError>;
    fn docs_iter(&self) -> Result<RecordIter<'_, Document>, SourceError>;

    fn queries_count(&self) -> Result<usize, SourceError>;
    fn queries_iter(&self) -> Result<RecordIter<'_, Query>, SourceError>;

    fn qrels_count(&self) -> Result<usize, SourceError>;
    fn qrels_iter(&self) -> Result<RecordIter<'_, QRel>, SourceError>;
}

/// The ingestion endpoints of the remote backend.
///
/// Each call is a single request/response exchange. Implementors must not
/// inspect the response for application-level success; only transport-level
/// failures are returned as errors.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Create a named corpus.
    async fn create_corpus<'a>(&self, req: NewCorpus<'a>) -> Result<(), BackendError>;

    /// Append documents to an existing corpus.
    async fn add_documents(
        &self,
        corpus_name: &str,
        documents: &[Document],
    ) -> Result<(), BackendError>;

    /// Create a named dataset bound to a corpus.
    async fn create_dataset<'a>(&self, req: NewDataset<'a>) -> Result<(), BackendError>;

    /// Append queries to a dataset.
    async fn add_queries(
        &self,
        corpus_name: &str,
        dataset_name: &str,
        queries: &[Query],
    ) -> Result<(), BackendError>;

    /// Append relevance judgments to a dataset.
    async fn add_qrels(
        &self,
        corpus_name: &str,
        dataset_name: &str,
        qrels: &[QRel],
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_serialises_absent_title_as_null() {
        let doc = Document {
            id: "d1".into(),
            title: None,
            text: "body".into(),
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"id": "d1", "title": null, "text": "body"})
        );
    }

    #[test]
    fn qrel_uses_document_id_on_the_wire() {
        let qrel = QRel {
            query_id: "q1".into(),
            document_id: "d1".into(),
            relevance: 2,
        };
        assert_eq!(
            serde_json::to_value(&qrel).unwrap(),
            json!({"query_id": "q1", "document_id": "d1", "relevance": 2})
        );
    }
}
