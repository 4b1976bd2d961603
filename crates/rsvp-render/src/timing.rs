//! Display duration model.

/// Computes display durations for word groups.
///
/// The model is pure: identical inputs always yield the identical duration.
/// The per-frame durations it produces also define the nominal runtime of
/// the encoded video, so callers must not round or perturb them.
#[derive(Debug, Clone, Copy)]
pub struct TimingModel {
    wpm: u32,
    pause_on_punctuation: bool,
}

impl TimingModel {
    pub fn new(wpm: u32, pause_on_punctuation: bool) -> Self {
        Self {
            wpm,
            pause_on_punctuation,
        }
    }

    /// Display duration in seconds for a word group's text.
    ///
    /// Sentence-ending punctuation (`.` `!` `?`) holds the frame for 2.5x
    /// the base duration, clause punctuation (`,` `;` `:`) for 1.5x.
    /// Otherwise multi-word groups extend dwell time by 0.8x per word,
    /// floored at the base duration.
    pub fn duration_for(&self, text: &str) -> f64 {
        let base = 60.0 / self.wpm as f64;

        if self.pause_on_punctuation {
            let trimmed = text.trim_end();
            if trimmed.ends_with(['.', '!', '?']) {
                return base * 2.5;
            }
            if trimmed.ends_with([',', ';', ':']) {
                return base * 1.5;
            }
        }

        let word_count = text.split_whitespace().count();
        base * (word_count as f64 * 0.8).max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_punctuation_pause() {
        let timing = TimingModel::new(300, true);
        assert_eq!(timing.duration_for("Hello."), (60.0 / 300.0) * 2.5);
        assert_eq!(timing.duration_for("really?"), 0.5);
        assert_eq!(timing.duration_for("go!  "), 0.5);
    }

    #[test]
    fn test_clause_punctuation_pause() {
        let timing = TimingModel::new(300, true);
        assert_eq!(timing.duration_for("first,"), (60.0 / 300.0) * 1.5);
        assert_eq!(timing.duration_for("second;"), 0.3);
        assert_eq!(timing.duration_for("third:"), 0.3);
    }

    #[test]
    fn test_plain_word_floors_at_base() {
        let timing = TimingModel::new(300, true);
        // word_count = 1 means max(1, 0.8) = 1
        assert_eq!(timing.duration_for("word"), 60.0 / 300.0);
    }

    #[test]
    fn test_multi_word_groups_extend_dwell() {
        let timing = TimingModel::new(300, true);
        let base = 60.0 / 300.0;
        assert_eq!(timing.duration_for("two words"), base * (2.0 * 0.8));
        assert_eq!(timing.duration_for("three more words"), base * (3.0 * 0.8));
    }

    #[test]
    fn test_pause_flag_disabled() {
        let timing = TimingModel::new(300, false);
        assert_eq!(timing.duration_for("Hello."), 60.0 / 300.0);
    }

    #[test]
    fn test_reproducible() {
        let timing = TimingModel::new(437, true);
        let a = timing.duration_for("exactly the same, input");
        let b = timing.duration_for("exactly the same, input");
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
