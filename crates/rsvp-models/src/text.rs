//! Input text utilities shared by the API and the segmenter.

/// Collapse any whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_normalization() {
        assert_eq!(normalize_whitespace("  a\t\tb \n\n c  "), "a b c");
        assert_eq!(normalize_whitespace("\n \t "), "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("speed reading is great"), 4);
        assert_eq!(word_count("   "), 0);
    }
}
