//! Optimal Recognition Point location.

/// Fixation index for a word of `len` characters.
///
/// Short words fixate near the start third, long words proportionally
/// earlier. The result is always a valid character position: 0 for
/// single-character (or empty) input, strictly less than `len` otherwise.
pub fn fixation_index(len: usize) -> usize {
    match len {
        0 | 1 => 0,
        2..=9 => len / 3,
        _ => len / 4,
    }
}

/// Fixation index for a word group's display text.
///
/// Internal spaces are stripped before measuring, matching the
/// per-character positioning the compositor applies to the spaced string.
pub fn recognition_index(text: &str) -> usize {
    let len = text.chars().filter(|c| !c.is_whitespace()).count();
    fixation_index(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_fixation_points() {
        assert_eq!(fixation_index(3), 1);
        assert_eq!(fixation_index(9), 3);
        assert_eq!(fixation_index(10), 2);
        assert_eq!(fixation_index(16), 4);
    }

    #[test]
    fn test_short_input() {
        assert_eq!(fixation_index(0), 0);
        assert_eq!(fixation_index(1), 0);
    }

    #[test]
    fn test_index_always_in_bounds() {
        for len in 1..200 {
            let idx = fixation_index(len);
            assert!(idx < len, "index {idx} out of bounds for length {len}");
        }
    }

    #[test]
    fn test_spaces_stripped_before_measuring() {
        // "speed read" measures as 9 characters, not 10
        assert_eq!(recognition_index("speed read"), 3);
        assert_eq!(recognition_index("speedread!"), 2);
    }
}
