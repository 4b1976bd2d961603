//! Progress percent bands.
//!
//! The 0-100 range is partitioned across pipeline stages: frame rendering
//! fills 0-80, the encode transition sits at 85, the external encode maps
//! into 85-95, and artifact upload holds 95 until the terminal state.

/// Frames rendered so far map into the 0-80 band.
pub const RENDER_BAND_END: u8 = 80;
/// Percent reported when handing the manifest to the encoder.
pub const ENCODE_BAND_START: u8 = 85;
/// Percent reported when the encoder finishes.
pub const ENCODE_BAND_END: u8 = 95;
/// Percent reported while uploading the artifact.
pub const UPLOAD_PERCENT: u8 = 95;

/// Frame-render progress updates are published every this many frames, to
/// bound status-store write overhead on large jobs.
pub const PROGRESS_STRIDE: usize = 100;

/// Percent for `current` of `total` frames rendered.
pub fn render_percent(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((current as f64 / total as f64) * RENDER_BAND_END as f64) as u8
}

/// Percent for an encode completion fraction in [0, 1].
pub fn encode_percent(fraction: f64) -> u8 {
    let span = (ENCODE_BAND_END - ENCODE_BAND_START) as f64;
    ENCODE_BAND_START + (fraction.clamp(0.0, 1.0) * span) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_band() {
        assert_eq!(render_percent(0, 400), 0);
        assert_eq!(render_percent(100, 400), 20);
        assert_eq!(render_percent(400, 400), 80);
        assert_eq!(render_percent(0, 0), 0);
    }

    #[test]
    fn test_encode_band() {
        assert_eq!(encode_percent(0.0), 85);
        assert_eq!(encode_percent(0.5), 90);
        assert_eq!(encode_percent(1.0), 95);
        assert_eq!(encode_percent(7.0), 95);
        assert_eq!(encode_percent(-1.0), 85);
    }
}
