//! Suggests internal links between the documents of a markdown corpus.
//!
//! Every document is tokenized into word n-grams, indexed by a [`Ranker`]
//! and then scored, as a whole, against every other document. Where the
//! score clears the threshold, the phrase of the source that is most frequent
//! in the target becomes a [`Suggestion`], which [`Analyzer::apply`] can turn
//! into a markdown link.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod link;
pub mod ranker;
pub mod tokenizer;

pub use analyzer::{Analyzer, ApplyReport, CorpusStats, SkippedSplice, Suggestion};
pub use cache::TermCache;
pub use config::{Mode, Settings, SplicePolicy};
pub use document::{Document, TermFrequencies};
pub use error::{Error, Result};
pub use link::{insert_link, SpliceError};
pub use ranker::{Bm25Ranker, Ranker};
pub use tokenizer::{NgramRange, Occurrence, Tokenizer};
