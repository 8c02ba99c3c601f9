//! # HTTP backend client
//!
//! Implements [`Backend`] from `ir-ingest-core` against the ingestion
//! endpoints of an ir-explorer backend:
//!
//! | call | request |
//! |---|---|
//! | `create_corpus` | `POST /create_corpus` with `{"name", "language"}` |
//! | `add_documents` | `POST /add_documents?corpus_name=…` with a JSON array |
//! | `create_dataset` | `POST /create_dataset` with `{"name", "corpus_name", "min_relevance"}` |
//! | `add_queries` | `POST /add_queries?corpus_name=…&dataset_name=…` with a JSON array |
//! | `add_qrels` | `POST /add_qrels?corpus_name=…&dataset_name=…` with a JSON array |
//!
//! Response status codes are logged, never acted upon. Only transport
//! failures (connection, timeout, unreadable response) become errors.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

pub use ir_ingest_core::contract::{Document, NewCorpus, NewDataset, QRel, Query};
use ir_ingest_core::contract::{Backend, BackendError};

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Client for `http://{hostname}:{port}`.
    pub fn new(hostname: &str, port: u16) -> Result<Self, reqwest::Error> {
        Self::with_base_url(format!("http://{hostname}:{port}"))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured client, e.g. one with custom proxy settings.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Initialized HttpBackend");
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B>(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
        body: &B,
    ) -> Result<(), BackendError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut request = self.client.post(&url).json(body);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, url = %url, "Request failed");
            e
        })?;
        let status = response.status();
        let content = response.bytes().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to read response body");
            e
        })?;

        if status.is_success() {
            debug!(endpoint, %status, bytes = content.len(), "Backend accepted request");
        } else {
            warn!(
                endpoint,
                %status,
                body = %String::from_utf8_lossy(&content),
                "Backend returned a non-success status"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_corpus<'a>(&self, req: NewCorpus<'a>) -> Result<(), BackendError> {
        info!(corpus = req.name, language = req.language, "Creating corpus");
        self.post("create_corpus", &[], &req).await
    }

    async fn add_documents(
        &self,
        corpus_name: &str,
        documents: &[Document],
    ) -> Result<(), BackendError> {
        debug!(corpus = corpus_name, count = documents.len(), "Adding documents");
        self.post("add_documents", &[("corpus_name", corpus_name)], documents)
            .await
    }

    async fn create_dataset<'a>(&self, req: NewDataset<'a>) -> Result<(), BackendError> {
        info!(
            dataset = req.name,
            corpus = req.corpus_name,
            min_relevance = req.min_relevance,
            "Creating dataset"
        );
        self.post("create_dataset", &[], &req).await
    }

    async fn add_queries(
        &self,
        corpus_name: &str,
        dataset_name: &str,
        queries: &[Query],
    ) -> Result<(), BackendError> {
        debug!(dataset = dataset_name, count = queries.len(), "Adding queries");
        self.post(
            "add_queries",
            &[("corpus_name", corpus_name), ("dataset_name", dataset_name)],
            queries,
        )
        .await
    }

    async fn add_qrels(
        &self,
        corpus_name: &str,
        dataset_name: &str,
        qrels: &[QRel],
    ) -> Result<(), BackendError> {
        debug!(dataset = dataset_name, count = qrels.len(), "Adding qrels");
        self.post(
            "add_qrels",
            &[("corpus_name", corpus_name), ("dataset_name", dataset_name)],
            qrels,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_built_from_host_and_port() {
        let backend = HttpBackend::new("example.org", 8103).unwrap();
        assert_eq!(backend.base_url(), "http://example.org:8103");
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let backend = HttpBackend::with_base_url("http://localhost:1234/").unwrap();
        assert_eq!(backend.base_url(), "http://localhost:1234");
    }
}
