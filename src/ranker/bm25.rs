use std::collections::HashMap;
use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;

use super::Ranker;

const K1: f64 = 1.2;
const B: f64 = 0.75;

/// BM25 with a phrase-length boost.
///
/// IDF values are computed once, when a term is first seen, from the corpus
/// as it stood at that moment. Later documents do not refresh them, so
/// scores depend on processing order.
#[derive(Debug, Default)]
pub struct Bm25Ranker {
    max_ngram: usize,
    documents: Vec<Arc<Document>>,
    document_frequency: HashMap<String, usize>,
    idf: HashMap<String, f64>,
    total_distinct_terms: usize,
    avg_doc_len: f64,
}

impl Bm25Ranker {
    pub fn new(max_ngram: usize) -> Self {
        Self {
            max_ngram: max_ngram.max(1),
            ..Self::default()
        }
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    /// Mean distinct-term count over processed documents.
    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> + '_ {
        self.documents.iter().map(|doc| doc.as_ref())
    }

    /// Every contiguous n-gram of the lowercased, whitespace-split query, up
    /// to the configured maximum length.
    fn query_terms(&self, query: &str) -> Vec<(String, usize)> {
        let lowered = query.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        let limit = words.len().min(self.max_ngram);

        let mut terms = Vec::new();
        for n in 1..=limit {
            for window in words.windows(n) {
                terms.push((window.join(" "), n));
            }
        }
        terms
    }
}

impl Ranker for Bm25Ranker {
    fn process_document(&mut self, doc: Arc<Document>) -> Result<()> {
        for term in doc.term_frequencies.keys() {
            *self.document_frequency.entry(term.clone()).or_insert(0) += 1;
        }
        self.total_distinct_terms += doc.distinct_terms();
        self.documents.push(Arc::clone(&doc));

        let n = self.documents.len() as f64;
        self.avg_doc_len = self.total_distinct_terms as f64 / n;

        // Only the new document can introduce terms without a cached IDF.
        for term in doc.term_frequencies.keys() {
            if self.idf.contains_key(term) {
                continue;
            }
            let df = self.document_frequency.get(term).copied().unwrap_or(0) as f64;
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
            self.idf.insert(term.clone(), idf);
        }

        Ok(())
    }

    fn score(&self, query: &str, doc: &Document) -> f64 {
        if self.avg_doc_len <= 0.0 {
            return 0.0;
        }

        let doc_len = doc.distinct_terms() as f64;
        let norm = 1.0 - B + B * doc_len / self.avg_doc_len;

        let mut matched = false;
        let mut score = 0.0;

        for (term, word_count) in self.query_terms(query) {
            let Some(tf) = doc.frequency(&term) else {
                continue;
            };
            let Some(idf) = self.idf(&term) else {
                continue;
            };

            matched = true;
            let tf = tf as f64;
            let length_boost = 1.0 + 0.5 * (word_count as f64 - 1.0);
            score += idf * (tf * (K1 + 1.0)) / (tf + K1 * norm) * length_boost;
        }

        if !matched {
            return 0.0;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TermFrequencies;

    fn doc(id: &str, terms: &[(&str, usize)]) -> Arc<Document> {
        let table: TermFrequencies = terms.iter().map(|(t, n)| (t.to_string(), *n)).collect();
        Arc::new(Document::new(id, "", table))
    }

    fn two_doc_ranker() -> (Bm25Ranker, Arc<Document>, Arc<Document>) {
        let doc1 = doc(
            "doc1.md",
            &[
                ("test", 1),
                ("document", 1),
                ("test document", 1),
                ("document go", 1),
                ("go", 1),
                ("programming", 1),
                ("go programming", 1),
            ],
        );
        let doc2 = doc(
            "doc2.md",
            &[
                ("another", 1),
                ("document", 1),
                ("programming", 1),
                ("languages", 1),
                ("another document", 1),
                ("document programming", 1),
                ("programming languages", 1),
            ],
        );

        let mut ranker = Bm25Ranker::new(3);
        ranker.process_document(Arc::clone(&doc1)).unwrap();
        ranker.process_document(Arc::clone(&doc2)).unwrap();
        (ranker, doc1, doc2)
    }

    #[test]
    fn test_phrase_match_ranks_higher() {
        let (ranker, doc1, doc2) = two_doc_ranker();

        let partial = ranker.score("programming languages", &doc1);
        let full = ranker.score("programming languages", &doc2);
        assert!(full > partial, "{full} should beat {partial}");

        let exact = ranker.score("test document", &doc1);
        let weak = ranker.score("test document", &doc2);
        assert!(exact > weak, "{exact} should beat {weak}");
    }

    #[test]
    fn test_no_match_is_exactly_zero() {
        let (ranker, doc1, _) = two_doc_ranker();
        assert_eq!(ranker.score("nonexistent", &doc1), 0.0);
        assert_eq!(ranker.score("", &doc1), 0.0);
    }

    #[test]
    fn test_empty_corpus_scores_zero() {
        let empty = doc("empty.md", &[]);
        let mut ranker = Bm25Ranker::new(3);
        ranker.process_document(Arc::clone(&empty)).unwrap();

        assert_eq!(ranker.avg_doc_len(), 0.0);
        assert_eq!(ranker.score("test", &empty), 0.0);

        let unprocessed = Bm25Ranker::new(3);
        assert_eq!(unprocessed.score("test", &empty), 0.0);
    }

    #[test]
    fn test_exact_score() {
        let only = doc("only.md", &[("rust", 2)]);
        let mut ranker = Bm25Ranker::new(1);
        ranker.process_document(Arc::clone(&only)).unwrap();

        // N = 1, df = 1 -> ln(1 + 0.5 / 1.5); doc_len == avg so norm == 1.
        let idf = (1.0_f64 + 0.5 / 1.5).ln();
        let expected = idf * (2.0 * 2.2) / (2.0 + 1.2);
        assert!((ranker.score("Rust", &only) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_length_boost() {
        let phrase = doc("phrase.md", &[("static site", 1)]);
        let word = doc("word.md", &[("static", 1)]);
        let mut ranker = Bm25Ranker::new(2);
        ranker.process_document(Arc::clone(&phrase)).unwrap();
        ranker.process_document(Arc::clone(&word)).unwrap();

        // Equal tf and length, so each score is idf times the boost.
        let bigram = ranker.score("static site", &phrase);
        let unigram = ranker.score("static", &word);
        assert!((bigram - 1.5 * ranker.idf("static site").unwrap()).abs() < 1e-12);
        assert!((unigram - ranker.idf("static").unwrap()).abs() < 1e-12);
    }

    #[test]
    fn test_query_ngrams_capped_by_max() {
        let phrase = doc("phrase.md", &[("static site generator", 1)]);
        let mut ranker = Bm25Ranker::new(2);
        ranker.process_document(Arc::clone(&phrase)).unwrap();
        assert_eq!(ranker.score("static site generator", &phrase), 0.0);
    }

    #[test]
    fn test_idf_is_not_refreshed() {
        let first = doc("a.md", &[("shared", 1)]);
        let second = doc("b.md", &[("shared", 1), ("fresh", 1)]);
        let mut ranker = Bm25Ranker::new(1);

        ranker.process_document(Arc::clone(&first)).unwrap();
        let early = ranker.idf("shared").unwrap();
        ranker.process_document(Arc::clone(&second)).unwrap();

        // Computed with N = 1, df = 1 and kept as the corpus grew.
        assert_eq!(ranker.idf("shared"), Some(early));
        assert!((early - (1.0_f64 + 0.5 / 1.5).ln()).abs() < 1e-12);
        // First seen with N = 2, df = 1.
        let fresh = ranker.idf("fresh").unwrap();
        assert!((fresh - (1.0_f64 + 1.5 / 1.5).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_average_length_tracks_corpus() {
        let mut ranker = Bm25Ranker::new(3);
        ranker.process_document(doc("a.md", &[("one", 1), ("two", 3)])).unwrap();
        ranker.process_document(doc("b.md", &[("three", 1)])).unwrap();
        ranker.process_document(doc("c.md", &[])).unwrap();
        assert_eq!(ranker.len(), 3);
        assert!((ranker.avg_doc_len() - 1.0).abs() < 1e-12);
        assert_eq!(
            ranker.documents().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            vec!["a.md", "b.md", "c.md"]
        );
    }

    #[test]
    fn test_term_without_idf_contributes_nothing() {
        let indexed = doc("indexed.md", &[("alpha", 1)]);
        let outsider = doc("outsider.md", &[("alpha", 1), ("beta", 4)]);
        let mut ranker = Bm25Ranker::new(1);
        ranker.process_document(Arc::clone(&indexed)).unwrap();

        assert_eq!(ranker.score("beta", &outsider), 0.0);
        assert!(ranker.score("alpha beta", &outsider) > 0.0);
    }
}
