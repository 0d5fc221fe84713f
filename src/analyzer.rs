//! Pairs every source document with every other document and picks one link
//! suggestion per source position.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::TermCache;
use crate::config::{Mode, Settings, SplicePolicy};
use crate::corpus::{document_id, CorpusWalker, SourceFile};
use crate::document::{Document, TermFrequencies};
use crate::error::{Error, Result};
use crate::link::{insert_link, relative_target};
use crate::ranker::{Bm25Ranker, Ranker};
use crate::tokenizer::{Occurrence, Tokenizer, MIN_OCCURRENCE_WORD_LEN};

/// A proposed link from a phrase in one document to another document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub source: String,
    pub target: String,
    pub score: f64,
    /// Normalized term that matched the target's vocabulary.
    pub term: String,
    /// Original text at `position`, the span that becomes the link text.
    pub surface: String,
    pub position: usize,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSplice {
    pub source: String,
    pub position: usize,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ApplyReport {
    pub applied: usize,
    pub files_written: usize,
    pub skipped: Vec<SkippedSplice>,
}

#[derive(Debug, Serialize)]
pub struct CorpusStats {
    pub documents: usize,
    pub distinct_terms: usize,
    pub avg_distinct_terms: f64,
    /// Most widespread terms with their document frequency.
    pub top_terms: Vec<(String, usize)>,
}

pub struct Analyzer {
    root: PathBuf,
    settings: Settings,
    tokenizer: Tokenizer,
    ranker: Box<dyn Ranker>,
    cache: Option<TermCache>,
    documents: Vec<Arc<Document>>,
}

impl Analyzer {
    /// Analyzer scoring with BM25.
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Result<Self> {
        let ranker = Box::new(Bm25Ranker::new(settings.max_ngram));
        Self::with_ranker(root, settings, ranker)
    }

    pub fn with_ranker(
        root: impl Into<PathBuf>,
        settings: Settings,
        ranker: Box<dyn Ranker>,
    ) -> Result<Self> {
        settings.validate()?;
        let cache = settings
            .resolved_cache_dir()
            .map(TermCache::open)
            .transpose()?;

        Ok(Self {
            root: root.into(),
            tokenizer: Tokenizer::new(settings.ngram_range()),
            settings,
            ranker,
            cache,
            documents: Vec::new(),
        })
    }

    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents
            .binary_search_by(|doc| doc.id.as_str().cmp(id))
            .ok()
            .map(|i| self.documents[i].as_ref())
    }

    /// Walks the root, tokenizes every file (in parallel, through the cache)
    /// and registers the documents with the ranker in id order. Documents
    /// already registered are left alone, so loading twice is a no-op.
    pub fn load(&mut self) -> Result<usize> {
        let walker = CorpusWalker::new(&self.root, &self.settings.extensions, &self.settings.exclude)?;
        let files: Vec<SourceFile> = walker
            .files()?
            .into_iter()
            .filter(|file| self.document(&file.id).is_none())
            .collect();

        let loaded = files
            .par_iter()
            .map(|file| self.load_file(file))
            .collect::<Result<Vec<_>>>()?;

        for doc in loaded {
            self.register(doc)?;
        }
        info!(documents = self.documents.len(), root = %self.root.display(), "corpus loaded");
        Ok(self.documents.len())
    }

    /// Adds an in-memory document. Ids must arrive in ascending order to keep
    /// scores reproducible.
    pub fn add_document(&mut self, id: impl Into<String>, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        let table = self.tokenizer.parse(&content);
        self.register(Document::new(id, content, table))
    }

    fn register(&mut self, doc: Document) -> Result<()> {
        let doc = Arc::new(doc);
        self.ranker.process_document(Arc::clone(&doc))?;
        let at = self
            .documents
            .partition_point(|existing| existing.id < doc.id);
        self.documents.insert(at, doc);
        Ok(())
    }

    fn load_file(&self, file: &SourceFile) -> Result<Document> {
        let content = fs::read_to_string(&file.path).map_err(|e| Error::io(&file.path, e))?;
        let range = self.tokenizer.range();

        let cached = match &self.cache {
            Some(cache) => cache.get(&file.path, range)?,
            None => None,
        };
        let table = match cached {
            Some(table) => {
                debug!(document = %file.id, "term table from cache");
                table
            }
            None => {
                debug!(document = %file.id, "parsing document");
                let table = self.tokenizer.parse(&content);
                if let Some(cache) = &self.cache {
                    cache.set(&file.path, range, &table)?;
                }
                table
            }
        };

        Ok(Document::new(file.id.clone(), content, table))
    }

    /// Link suggestions for one requested file or for the whole corpus,
    /// ordered by source id, then position.
    pub fn analyze(&self, mode: &Mode) -> Result<Vec<Suggestion>> {
        let suggestions = match mode {
            Mode::SingleFile(path) => {
                let doc = self
                    .resolve(path)
                    .ok_or_else(|| Error::NotInCorpus(path.display().to_string()))?;
                info!(document = %doc.id, "analyzing single file");
                self.analyze_document(doc)
            }
            Mode::Corpus => self
                .documents
                .par_iter()
                .map(|doc| self.analyze_document(doc))
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect(),
        };
        info!(suggestions = suggestions.len(), "analysis complete");
        Ok(suggestions)
    }

    /// Finds a document by the path a user typed: its id, with or without a
    /// leading `./`, or a path that lies under the root. Paths that exist on
    /// disk are also compared canonically, so `/abs/docs/a.md` matches a
    /// root given as `.`.
    fn resolve(&self, path: &Path) -> Option<&Document> {
        let as_given = path.to_string_lossy().replace('\\', "/");
        let without_dot = as_given.trim_start_matches("./").to_string();

        self.document(&as_given)
            .or_else(|| self.document(&without_dot))
            .or_else(|| {
                let relative = path.strip_prefix(&self.root).ok()?;
                self.document(&document_id(relative))
            })
            .or_else(|| {
                let root = fs::canonicalize(&self.root).ok()?;
                let path = fs::canonicalize(path).ok()?;
                let relative = path.strip_prefix(&root).ok()?;
                self.document(&document_id(relative))
            })
    }

    /// Suggestions with `source` as the link source, one per position.
    pub fn analyze_document(&self, source: &Document) -> Vec<Suggestion> {
        let occurrences = self
            .tokenizer
            .find_occurrences(&source.content, MIN_OCCURRENCE_WORD_LEN);

        // First occurrence of each term, terms in lexical order.
        let mut first_seen: BTreeMap<&str, &Occurrence> = BTreeMap::new();
        for occ in &occurrences {
            first_seen.entry(occ.term.as_str()).or_insert(occ);
        }

        let mut by_position: BTreeMap<usize, Suggestion> = BTreeMap::new();
        for target in &self.documents {
            if target.id == source.id {
                continue;
            }
            let score = self.ranker.score(&source.content, target);
            if score < self.settings.min_score {
                continue;
            }
            let Some(best) = best_occurrence(&first_seen, &target.term_frequencies) else {
                continue;
            };

            let replace = by_position
                .get(&best.position)
                .map_or(true, |existing| score > existing.score);
            if replace {
                by_position.insert(
                    best.position,
                    Suggestion {
                        source: source.id.clone(),
                        target: target.id.clone(),
                        score,
                        term: best.term.clone(),
                        surface: best.surface.clone(),
                        position: best.position,
                        context: best.context.clone(),
                    },
                );
            }
        }

        debug!(document = %source.id, suggestions = by_position.len(), "document analyzed");
        by_position.into_values().collect()
    }

    /// Splices suggested links into their source files. Each file is read
    /// and written once; links go in from the highest position down so that
    /// earlier positions stay valid.
    pub fn apply(&self, suggestions: &[Suggestion]) -> Result<ApplyReport> {
        let mut by_source: BTreeMap<&str, Vec<&Suggestion>> = BTreeMap::new();
        for suggestion in suggestions {
            by_source.entry(suggestion.source.as_str()).or_default().push(suggestion);
        }

        let mut report = ApplyReport::default();
        for (source, mut pending) in by_source {
            pending.sort_by(|a, b| b.position.cmp(&a.position));

            let path = self.root.join(source);
            let mut content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            let mut changed = false;

            for suggestion in pending {
                let target = relative_target(source, &suggestion.target);
                match insert_link(&content, &suggestion.surface, &target, suggestion.position) {
                    Ok(updated) => {
                        content = updated;
                        changed = true;
                        report.applied += 1;
                    }
                    Err(e) => match self.settings.on_splice_error {
                        SplicePolicy::Abort => {
                            return Err(Error::Splice {
                                document: source.to_string(),
                                source: e,
                            });
                        }
                        SplicePolicy::Skip => {
                            warn!(document = %source, position = suggestion.position, error = %e, "skipping link");
                            report.skipped.push(SkippedSplice {
                                source: source.to_string(),
                                position: suggestion.position,
                                reason: e.to_string(),
                            });
                        }
                    },
                }
            }

            if changed {
                fs::write(&path, &content).map_err(|e| Error::io(&path, e))?;
                report.files_written += 1;
            }
        }

        Ok(report)
    }

    pub fn stats(&self, top: usize) -> CorpusStats {
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        let mut total = 0;
        for doc in &self.documents {
            total += doc.distinct_terms();
            for term in doc.term_frequencies.keys() {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let mut top_terms: Vec<(String, usize)> = document_frequency
            .iter()
            .map(|(term, df)| (term.to_string(), *df))
            .collect();
        top_terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_terms.truncate(top);

        CorpusStats {
            documents: self.documents.len(),
            distinct_terms: document_frequency.len(),
            avg_distinct_terms: if self.documents.is_empty() {
                0.0
            } else {
                total as f64 / self.documents.len() as f64
            },
            top_terms,
        }
    }
}

/// The source term most frequent in the target. Terms are visited in lexical
/// order and only a strictly higher frequency replaces the current pick.
fn best_occurrence<'a>(
    first_seen: &BTreeMap<&str, &'a Occurrence>,
    target: &TermFrequencies,
) -> Option<&'a Occurrence> {
    let mut best: Option<(&'a Occurrence, usize)> = None;
    for (term, occ) in first_seen {
        let Some(&freq) = target.get(*term) else {
            continue;
        };
        if best.map_or(true, |(_, max)| freq > max) {
            best = Some((*occ, freq));
        }
    }
    best.map(|(occ, _)| occ)
}
