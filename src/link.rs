//! Splicing markdown links into document text.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpliceError {
    #[error("position {position} is out of range for content length {len}")]
    OutOfRange { position: usize, len: usize },

    #[error("'{term}' at position {position} would exceed content length {len}")]
    PastEnd {
        term: String,
        position: usize,
        len: usize,
    },

    #[error("text at position {position} is '{found}', not '{expected}'")]
    Mismatch {
        position: usize,
        expected: String,
        found: String,
    },
}

/// Wraps the exact span `content[position..position + term.len()]` in a
/// markdown link to `target`. Fails unless those bytes equal `term`; every
/// other byte is kept as is.
pub fn insert_link(
    content: &str,
    term: &str,
    target: &str,
    position: usize,
) -> Result<String, SpliceError> {
    let len = content.len();
    if position >= len {
        return Err(SpliceError::OutOfRange { position, len });
    }
    let end = position + term.len();
    if end > len {
        return Err(SpliceError::PastEnd {
            term: term.to_string(),
            position,
            len,
        });
    }

    match content.get(position..end) {
        Some(actual) if actual == term => {}
        actual => {
            let found = actual.map_or_else(
                || String::from_utf8_lossy(&content.as_bytes()[position..end]).into_owned(),
                str::to_string,
            );
            return Err(SpliceError::Mismatch {
                position,
                expected: term.to_string(),
                found,
            });
        }
    }

    let link = format!("[{}]({})", term, link_destination(target));
    let mut result = String::with_capacity(len + link.len() - term.len());
    result.push_str(&content[..position]);
    result.push_str(&link);
    result.push_str(&content[end..]);
    Ok(result)
}

/// Destinations with spaces or parentheses need the `<...>` form.
fn link_destination(target: &str) -> String {
    if target.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{target}>")
    } else {
        target.to_string()
    }
}

/// Reference to `target_id` as seen from the directory of `source_id`.
/// Both ids are `/`-separated paths relative to the same root.
pub fn relative_target(source_id: &str, target_id: &str) -> String {
    let source_dir: Vec<&str> = match source_id.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target: Vec<&str> = target_id.split('/').collect();
    let target_dir = &target[..target.len() - 1];

    let common = source_dir
        .iter()
        .zip(target_dir)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; source_dir.len() - common];
    parts.extend_from_slice(&target[common..]);
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_link() {
        let cases = [
            ("This is a test document", "test", 10, "This is a [test](target.md) document"),
            ("Test document", "Test", 0, "[Test](target.md) document"),
            ("This is a test", "test", 10, "This is a [test](target.md)"),
            (
                "This is a test document about testing",
                "test document",
                10,
                "This is a [test document](target.md) about testing",
            ),
        ];
        for (content, term, position, expected) in cases {
            let result = insert_link(content, term, "target.md", position).unwrap();
            assert_eq!(result, expected);
        }
    }

    #[test]
    fn test_out_of_range() {
        let err = insert_link("Short text", "word", "target.md", 20).unwrap_err();
        assert_eq!(err, SpliceError::OutOfRange { position: 20, len: 10 });
    }

    #[test]
    fn test_past_end() {
        let err = insert_link("Short text", "texts", "target.md", 6).unwrap_err();
        assert!(matches!(err, SpliceError::PastEnd { position: 6, .. }));
    }

    #[test]
    fn test_mismatch() {
        let err = insert_link("This is a test", "wrong", "target.md", 9).unwrap_err();
        assert_eq!(
            err,
            SpliceError::Mismatch {
                position: 9,
                expected: "wrong".to_string(),
                found: " test".to_string(),
            }
        );
    }

    #[test]
    fn test_stale_position_fails() {
        let content = "This is a test document";
        let linked = insert_link(content, "test", "target.md", 10).unwrap();
        assert_eq!(&linked[10..][.."[test](target.md)".len()], "[test](target.md)");
        // The old position now points at the link syntax
        assert!(insert_link(&linked, "test", "target.md", 10).is_err());
    }

    #[test]
    fn test_mismatch_inside_multibyte_char() {
        let err = insert_link("café au lait", "é", "t.md", 4).unwrap_err();
        assert!(matches!(err, SpliceError::Mismatch { position: 4, .. }));
        assert!(insert_link("café au lait", "é", "t.md", 3).is_ok());
    }

    #[test]
    fn test_destination_with_spaces() {
        let result = insert_link("see notes here", "notes", "my notes.md", 4).unwrap();
        assert_eq!(result, "see [notes](<my notes.md>) here");
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(relative_target("a.md", "b.md"), "b.md");
        assert_eq!(relative_target("a.md", "guides/setup.md"), "guides/setup.md");
        assert_eq!(relative_target("guides/setup.md", "a.md"), "../a.md");
        assert_eq!(relative_target("guides/setup.md", "guides/usage.md"), "usage.md");
        assert_eq!(relative_target("x/y/z.md", "x/w/v.md"), "../w/v.md");
    }
}
