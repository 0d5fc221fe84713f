//! Leading metadata block detection (`---` YAML or `+++` TOML fences).

const FENCES: [&str; 2] = ["---", "+++"];

/// Splits off a leading front-matter block.
///
/// Returns the number of bytes skipped and the remaining body. The opening
/// fence must start the content (anything after it on the same line is
/// ignored); the block ends at the first later line that starts with the same
/// fence, including that line's newline. Without a closing fence nothing is
/// skipped.
pub fn split_front_matter(content: &str) -> (usize, &str) {
    if content.len() <= 3 {
        return (0, content);
    }
    let Some(fence) = FENCES.iter().find(|f| content.starts_with(**f)) else {
        return (0, content);
    };
    let Some(newline) = content[3..].find('\n') else {
        return (0, content);
    };

    let mut line_start = 3 + newline + 1;
    while line_start < content.len() {
        let rest = &content[line_start..];
        let line_len = rest.find('\n').map_or(rest.len(), |nl| nl + 1);
        if rest.starts_with(*fence) {
            let skipped = line_start + line_len;
            return (skipped, &content[skipped..]);
        }
        line_start += line_len;
    }

    (0, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_front_matter() {
        let content = "---\ntitle: Test\n---\nBody text";
        let (skipped, body) = split_front_matter(content);
        assert_eq!(skipped, 20);
        assert_eq!(body, "Body text");
    }

    #[test]
    fn test_toml_front_matter() {
        let content = "+++\ntitle = \"x\"\n+++\nBody";
        let (skipped, body) = split_front_matter(content);
        assert_eq!(body, "Body");
        assert_eq!(&content[skipped..], "Body");
    }

    #[test]
    fn test_opening_line_may_carry_text() {
        let content = "--- # Test\ntitle: Test\n---\nThis is a test document";
        let (skipped, body) = split_front_matter(content);
        assert_eq!(skipped, 27);
        assert_eq!(body, "This is a test document");
    }

    #[test]
    fn test_closing_fence_at_end_of_content() {
        let (skipped, body) = split_front_matter("---\na: 1\n---");
        assert_eq!(skipped, 12);
        assert_eq!(body, "");
    }

    #[test]
    fn test_mismatched_fence_is_not_closing() {
        let content = "---\na: 1\n+++\nstill metadata?";
        assert_eq!(split_front_matter(content), (0, content));
    }

    #[test]
    fn test_no_front_matter() {
        for content in ["", "---", "Plain text", "---\nnever closed", "Intro\n---\nafter"] {
            assert_eq!(split_front_matter(content), (0, content));
        }
    }
}
