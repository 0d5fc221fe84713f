//! Closed-class English function words that never become terms.

use std::collections::HashSet;
use std::sync::LazyLock;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // Articles
        "a", "an", "the",
        // Conjunctions
        "and", "but", "or", "nor", "for", "yet", "so", "because", "if", "unless", "while",
        "where", "when", "whether",
        // Pronouns
        "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my",
        "your", "his", "its", "our", "their", "mine", "yours", "hers", "ours", "theirs", "this",
        "that", "these", "those", "who", "whom", "whose", "which", "what",
        // Auxiliary verbs
        "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
        "do", "does", "did", "doing", "will", "would", "shall", "should", "may", "might", "must",
        "can", "could",
        // Other function words
        "there", "here", "now", "then", "today", "tomorrow", "yesterday", "not", "no", "yes",
        "okay", "oh", "well", "just", "very", "much", "many", "more", "most", "some", "any", "all",
        "both", "each", "few", "several", "too", "rather", "quite",
    ]
    .into_iter()
    .collect()
});

/// Expects an already lowercased word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

fn is_numeric(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_digit())
}

/// Returns the lowercased term when `word` carries lexical meaning and has
/// at least `min_chars` characters. Empty and all-digit words never qualify.
pub fn significant(word: &str, min_chars: usize) -> Option<String> {
    if word.is_empty() || is_numeric(word) || word.chars().count() < min_chars {
        return None;
    }
    let term = word.to_lowercase();
    if is_stop_word(&term) {
        return None;
    }
    Some(term)
}
