//! Relevance scoring of a query against indexed documents.

mod bm25;

use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;

pub use bm25::Bm25Ranker;

/// A scoring strategy over a growing document collection.
///
/// Documents must be processed in a fixed order (the analyzer uses
/// identifier order) because implementations may cache corpus statistics
/// as documents arrive. Scoring is read-only and safe to run in parallel
/// once every document has been processed.
pub trait Ranker: Send + Sync {
    /// Registers a document and updates corpus statistics.
    fn process_document(&mut self, doc: Arc<Document>) -> Result<()>;

    /// Relevance of `query` to `doc`. Always finite and non-negative; exactly
    /// zero when no query term matches.
    fn score(&self, query: &str, doc: &Document) -> f64;
}
