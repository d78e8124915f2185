/// Core library for the talentsift candidate screening pipeline.
///
/// This crate contains all business logic: configuration management,
/// error types, the SQLite-backed work queue, blob storage adapters,
/// the LLM client, document text extraction, the scoring engine, and
/// the pipeline runtime used by the CLI binary.
pub mod blobstore;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod schema;
pub mod scoring;
pub mod storage;

pub use error::*;

/// Returns the version of the talentsift-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
