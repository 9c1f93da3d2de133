//! This crate provides a read-only analytics API over two tabular datasets
//! held in an S3-compatible object store: night-time radiance statistics and
//! municipal GDP figures, both keyed by (municipality, date). Datasets are
//! fetched as CSV, decoded into typed in-memory tables and cached with a TTL;
//! the HTTP API exposes filtered listings, per-municipality detail,
//! aggregated statistics, rankings, CSV downloads and joined views of the
//! two datasets.
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the
//!   [hyper] HTTP library.
//! * [Serde](serde) performs serialisation of JSON response data.
//! * [AWS SDK for S3](aws-sdk-s3) is used to interact with S3-compatible
//!   object stores.
//! * [csv] decodes the dataset payloads and encodes downloads.
//! * [time] parses and formats the day-granularity dates the datasets use.

pub mod aggregate;
pub mod app;
pub mod app_state;
pub mod cache;
pub mod cli;
pub mod coerce;
pub mod dataset;
pub mod decode;
pub mod error;
pub mod filter;
pub mod join;
pub mod models;
pub mod query;
pub mod render;
pub mod s3_client;
pub mod server;
pub mod table;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
