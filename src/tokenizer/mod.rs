//! Positional n-gram tokenizer for markdown prose.
//!
//! Turns raw markdown into significant words and multi-word phrases with
//! byte-exact positions in the original content. Front matter, fenced and
//! indented code blocks, inline code and raw HTML are never indexed.

mod frontmatter;
mod stopwords;

use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::TermFrequencies;

pub use frontmatter::split_front_matter;
pub use stopwords::{is_stop_word, significant};

/// Words shorter than this never become occurrences, whatever the caller asks for.
pub const MIN_OCCURRENCE_WORD_LEN: usize = 3;

/// Characters of context kept on each side of an occurrence.
const CONTEXT_CHARS: usize = 50;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+").expect("word pattern is valid"));

/// Punctuation stripped from both ends of a word.
fn is_trim_char(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | '!' | '?' | ';' | ':' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\''
            | '*' | '_' | '<' | '>' | '&' | '\\' | '`' | '~' | '“' | '”' | '‘' | '’'
    )
}

/// Literal inline-markup characters. Left at a word edge they end the phrase segment.
fn is_markup_char(c: char) -> bool {
    matches!(c, '!' | '*' | '_' | '<' | '&' | '\\' | '[' | ']' | '`')
}

/// Inclusive range of phrase lengths, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgramRange {
    min: usize,
    max: usize,
}

impl NgramRange {
    /// Clamps `min` to at least 1 and `max` to at least `min`.
    pub fn new(min: usize, max: usize) -> Self {
        let min = min.max(1);
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for NgramRange {
    fn default() -> Self {
        Self::new(2, 3)
    }
}

/// One concrete appearance of a term in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Normalized term: lowercased words joined by single spaces.
    pub term: String,
    /// Byte offset in the original content, front matter included.
    pub position: usize,
    /// The original text of the span, from the first word to the end of the last.
    pub surface: String,
    pub context: String,
}

#[derive(Debug)]
struct Word {
    term: String,
    start: usize,
    end: usize,
}

#[derive(Debug)]
struct Span {
    term: String,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    range: NgramRange,
}

impl Tokenizer {
    pub fn new(range: NgramRange) -> Self {
        Self { range }
    }

    pub fn range(&self) -> NgramRange {
        self.range
    }

    /// Term-frequency table of every n-gram in range. No word-length floor applies here.
    pub fn parse(&self, content: &str) -> TermFrequencies {
        let (_, body) = split_front_matter(content);
        let mut table = TermFrequencies::new();
        for span in self.spans(body, 1) {
            *table.entry(span.term).or_insert(0) += 1;
        }
        table
    }

    /// Every n-gram occurrence whose words have at least `max(3, min_word_len)`
    /// characters, ordered by position. Occurrences sharing a position keep
    /// generation order, shorter phrases first.
    pub fn find_occurrences(&self, content: &str, min_word_len: usize) -> Vec<Occurrence> {
        let (offset, body) = split_front_matter(content);
        let floor = min_word_len.max(MIN_OCCURRENCE_WORD_LEN);

        let mut occurrences: Vec<Occurrence> = self
            .spans(body, floor)
            .into_iter()
            .map(|span| Occurrence {
                position: offset + span.start,
                surface: body[span.start..span.end].to_string(),
                context: extract_context(body, span.start, span.end),
                term: span.term,
            })
            .collect();

        occurrences.sort_by_key(|occ| occ.position);
        occurrences
    }

    /// N-gram spans in body coordinates, in generation order.
    fn spans(&self, body: &str, min_chars: usize) -> Vec<Span> {
        let mut spans = Vec::new();
        for run in text_runs(body) {
            for segment in phrase_segments(body, run, min_chars) {
                self.push_ngrams(&segment, &mut spans);
            }
        }
        spans
    }

    fn push_ngrams(&self, words: &[Word], spans: &mut Vec<Span>) {
        if words.len() < self.range.min {
            return;
        }
        // A minimum of one means plain words, whatever the maximum.
        let longest = if self.range.min == 1 {
            1
        } else {
            self.range.max.min(words.len())
        };
        for n in self.range.min..=longest {
            for window in words.windows(n) {
                let term = window
                    .iter()
                    .map(|w| w.term.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                spans.push(Span {
                    term,
                    start: window[0].start,
                    end: window[n - 1].end,
                });
            }
        }
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Folds the markdown event stream into maximal runs of touching text events.
#[derive(Default)]
struct RunAccumulator {
    runs: Vec<Range<usize>>,
    open: Option<Range<usize>>,
    in_code_block: bool,
    /// Nesting of links and images. Their text is already linked or is alt text.
    link_depth: usize,
}

impl RunAccumulator {
    fn push(mut self, event: Event<'_>, range: Range<usize>) -> Self {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                self.close();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => self.in_code_block = false,
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => {
                self.close();
                self.link_depth += 1;
            }
            Event::End(TagEnd::Link | TagEnd::Image) => {
                self.close();
                self.link_depth = self.link_depth.saturating_sub(1);
            }
            Event::Text(_) if !self.in_code_block && self.link_depth == 0 => match self.open.as_mut() {
                Some(open) if open.end == range.start => open.end = range.end,
                _ => {
                    self.close();
                    self.open = Some(range);
                }
            },
            _ => self.close(),
        }
        self
    }

    fn close(&mut self) {
        if let Some(run) = self.open.take() {
            if !run.is_empty() {
                self.runs.push(run);
            }
        }
    }

    fn finish(mut self) -> Vec<Range<usize>> {
        self.close();
        self.runs
    }
}

/// Byte ranges of prose text runs in `body`, in document order.
fn text_runs(body: &str) -> Vec<Range<usize>> {
    Parser::new_ext(body, markdown_options())
        .into_offset_iter()
        .fold(RunAccumulator::default(), |acc, (event, range)| {
            acc.push(event, range)
        })
        .finish()
}

/// Splits one text run into segments of significant words. N-grams are only
/// formed inside a segment.
fn phrase_segments(body: &str, run: Range<usize>, min_chars: usize) -> Vec<Vec<Word>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for m in WORD_RE.find_iter(&body[run.clone()]) {
        let token = m.as_str();
        let after_lead = token.trim_start_matches(is_trim_char);
        let lead = token.len() - after_lead.len();
        let core = after_lead.trim_end_matches(is_trim_char);
        let trail = &after_lead[core.len()..];

        if token[..lead].contains(is_markup_char) && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }

        if let Some(term) = significant(core, min_chars) {
            let start = run.start + m.start() + lead;
            current.push(Word {
                term,
                start,
                end: start + core.len(),
            });
        }

        if trail.contains(is_markup_char) && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Text around `start..end`, whitespace collapsed, with `...` on truncated sides.
pub fn extract_context(body: &str, start: usize, end: usize) -> String {
    let from = body[..start]
        .char_indices()
        .rev()
        .take(CONTEXT_CHARS)
        .last()
        .map_or(start, |(i, _)| i);
    let to = body[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map_or(body.len(), |(i, _)| end + i);

    let snippet = body[from..to].split_whitespace().collect::<Vec<_>>().join(" ");

    let mut context = String::with_capacity(snippet.len() + 6);
    if from > 0 {
        context.push_str("...");
    }
    context.push_str(&snippet);
    if to < body.len() {
        context.push_str("...");
    }
    context
}
