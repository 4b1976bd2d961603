//! Text normalization and word grouping.

use rsvp_models::{ContentError, ContentResult, VideoConfig, WordGroup, MAX_WORD_COUNT};

use crate::timing::TimingModel;

/// Splits normalized text into timed word groups.
///
/// Deterministic: re-invoking with the same text yields the same groups,
/// which keeps re-delivered jobs idempotent.
#[derive(Debug, Clone, Copy)]
pub struct TextSegmenter {
    grouping: usize,
    timing: TimingModel,
}

impl TextSegmenter {
    /// Build a segmenter from a clamped [`VideoConfig`].
    pub fn from_config(config: &VideoConfig) -> Self {
        Self {
            grouping: config.word_grouping as usize,
            timing: TimingModel::new(config.wpm, config.pause_on_punctuation),
        }
    }

    /// Segment raw text into word groups.
    ///
    /// Fails when the text is empty after normalization or its word count
    /// exceeds [`MAX_WORD_COUNT`]; the ceiling is checked before any group
    /// is produced.
    pub fn segment(&self, text: &str) -> ContentResult<Vec<WordGroup>> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Err(ContentError::EmptyText);
        }
        if words.len() > MAX_WORD_COUNT {
            return Err(ContentError::word_limit(words.len()));
        }

        let groups = words
            .chunks(self.grouping.max(1))
            .map(|chunk| {
                let text = chunk.join(" ");
                let duration = self.timing.duration_for(&text);
                WordGroup::new(text, duration)
            })
            .collect();

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter(grouping: u32) -> TextSegmenter {
        let config = VideoConfig {
            word_grouping: grouping,
            ..VideoConfig::default()
        }
        .clamped();
        TextSegmenter::from_config(&config)
    }

    #[test]
    fn test_single_word_grouping() {
        let groups = segmenter(1).segment("a b c d e").unwrap();
        let texts: Vec<&str> = groups.iter().map(|g| g.text()).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_grouping_of_three_with_short_tail() {
        let groups = segmenter(3).segment("a b c d e").unwrap();
        let texts: Vec<&str> = groups.iter().map(|g| g.text()).collect();
        assert_eq!(texts, vec!["a b c", "d e"]);
    }

    #[test]
    fn test_segmenter_collapses_runs() {
        let groups = segmenter(2).segment("one   two\nthree").unwrap();
        let texts: Vec<&str> = groups.iter().map(|g| g.text()).collect();
        assert_eq!(texts, vec!["one two", "three"]);
    }

    #[test]
    fn test_empty_text_rejected() {
        assert_eq!(segmenter(1).segment("   "), Err(ContentError::EmptyText));
    }

    #[test]
    fn test_word_ceiling_rejected_before_grouping() {
        let text = vec!["w"; MAX_WORD_COUNT + 1].join(" ");
        let err = segmenter(3).segment(&text).unwrap_err();
        assert_eq!(err, ContentError::word_limit(MAX_WORD_COUNT + 1));
    }

    #[test]
    fn test_durations_come_from_timing_model() {
        let groups = segmenter(1).segment("Hello. world").unwrap();
        assert_eq!(groups[0].duration(), (60.0 / 300.0) * 2.5);
        assert_eq!(groups[1].duration(), 60.0 / 300.0);
    }

    #[test]
    fn test_deterministic() {
        let seg = segmenter(2);
        assert_eq!(seg.segment("a b c d"), seg.segment("a b c d"));
    }
}
