//! Reserved special tokens and word-boundary helpers.
//!
//! The two specials are multi-character strings so that neither can collide
//! with a seeded single-character symbol. Both occupy the first vocabulary
//! slots and can be overridden through the trainer configuration.

/// Default end-of-word marker appended to every word during segmentation.
pub const DEFAULT_END_OF_WORD: &str = "</w>";

/// Default replacement for characters missing from the vocabulary.
pub const DEFAULT_UNKNOWN: &str = "<unk>";

/// Returns true when a token closes a word, i.e. equals or ends with the marker.
#[must_use]
pub fn closes_word(token: &str, marker: &str) -> bool {
    token.ends_with(marker)
}

/// Removes every occurrence of the marker from a reassembled word.
#[must_use]
pub fn strip_marker(word: &str, marker: &str) -> String {
    word.replace(marker, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_marker_closes_word() {
        assert!(closes_word(DEFAULT_END_OF_WORD, DEFAULT_END_OF_WORD));
        assert!(closes_word("cat</w>", DEFAULT_END_OF_WORD));
        assert!(!closes_word("cat", DEFAULT_END_OF_WORD));
    }

    #[test]
    fn strip_marker_removes_all_occurrences() {
        assert_eq!(strip_marker("cat</w>", DEFAULT_END_OF_WORD), "cat");
        assert_eq!(strip_marker("</w>a</w>", DEFAULT_END_OF_WORD), "a");
        assert_eq!(strip_marker("cat", DEFAULT_END_OF_WORD), "cat");
    }
}
