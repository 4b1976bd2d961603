//! Timed word groups.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One or more words displayed together as a single timed unit.
///
/// Produced by the text segmenter and never mutated afterwards: the text is
/// the group's words joined by single spaces, and the duration is the
/// display time in seconds computed by the timing model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WordGroup {
    text: String,
    duration: f64,
}

impl WordGroup {
    /// Create a group. `duration` must be positive.
    pub fn new(text: impl Into<String>, duration: f64) -> Self {
        debug_assert!(duration > 0.0, "word group duration must be positive");
        Self {
            text: text.into(),
            duration,
        }
    }

    /// The display text, words joined by single spaces.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Display duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Number of words in the group.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(WordGroup::new("a b c", 0.2).word_count(), 3);
        assert_eq!(WordGroup::new("word", 0.2).word_count(), 1);
    }
}
