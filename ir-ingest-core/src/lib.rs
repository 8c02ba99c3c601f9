#![doc = "ir-ingest-core: core logic library for ir-ingest."]

//! This crate contains the data model, the dataset reader and the ingestion
//! pipeline. The HTTP transport lives in the `ir-ingest` binary crate and is
//! plugged in through the [`contract::Backend`] trait.
//!
//! # Usage
//! Open a [`dataset::LocalDataset`], build an [`config::IngestConfig`] and
//! call [`ingest::ingest`] with any [`contract::Backend`].

pub mod batch;
pub mod config;
pub mod contract;
pub mod dataset;
pub mod ingest;
pub mod progress;
pub mod sanitize;
