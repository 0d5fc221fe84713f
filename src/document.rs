use std::collections::HashMap;

/// Term (word or space-joined n-gram) to occurrence count.
pub type TermFrequencies = HashMap<String, usize>;

/// One prose file of the corpus, as seen by the ranker.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path relative to the corpus root, `/`-separated.
    pub id: String,
    /// Full text, scored as a query when this document is a link source.
    pub content: String,
    pub term_frequencies: TermFrequencies,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        term_frequencies: TermFrequencies,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            term_frequencies,
        }
    }

    /// Document length for BM25: distinct terms, not tokens.
    pub fn distinct_terms(&self) -> usize {
        self.term_frequencies.len()
    }

    pub fn frequency(&self, term: &str) -> Option<usize> {
        self.term_frequencies.get(term).copied()
    }
}
