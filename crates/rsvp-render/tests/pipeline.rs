//! End-to-end rendering pipeline tests (no external encoder).

use rsvp_models::{ContentError, VideoConfig};
use rsvp_render::{FontLibrary, FrameCompositor, FrameSequence, TextSegmenter, VideoEncoder};

fn config() -> VideoConfig {
    VideoConfig {
        wpm: 1000,
        word_grouping: 1,
        width: 640,
        height: 360,
        ..VideoConfig::default()
    }
    .clamped()
}

#[tokio::test]
async fn test_text_to_manifest_pipeline() {
    let config = config();
    let segmenter = TextSegmenter::from_config(&config);
    let groups = segmenter.segment("Speed reading is great.").unwrap();

    // One frame per word group, in input order.
    assert_eq!(groups.len(), 4);
    let texts: Vec<&str> = groups.iter().map(|g| g.text()).collect();
    assert_eq!(texts, vec!["Speed", "reading", "is", "great."]);

    let dir = tempfile::tempdir().unwrap();
    let frames_dir = dir.path().join("frames");
    tokio::fs::create_dir_all(&frames_dir).await.unwrap();

    let compositor = FrameCompositor::new(&config, &FontLibrary::empty());
    let mut sequence = FrameSequence::new();

    for (i, group) in groups.iter().enumerate() {
        let path = frames_dir.join(format!("frame_{:06}.png", i));
        compositor.compose(group.text(), &path).unwrap();
        sequence.push(path, group.duration());
    }

    // Frame count equals group count and every frame exists on disk.
    assert_eq!(sequence.len(), groups.len());
    for entry in sequence.entries() {
        assert!(entry.path.exists());
    }

    // Manifest duration sum equals the timing model's sum: three plain
    // words at 0.06s plus the sentence-ending group at 0.15s.
    let expected: f64 = groups.iter().map(|g| g.duration()).sum();
    assert!((sequence.total_duration() - expected).abs() < 1e-12);
    assert!((expected - (3.0 * 0.06 + 0.15)).abs() < 1e-9);

    // The manifest ends with the final frame repeated.
    let manifest_path = dir.path().join("concat.txt");
    sequence.write_concat_manifest(&manifest_path).await.unwrap();
    let manifest = tokio::fs::read_to_string(&manifest_path).await.unwrap();
    let last_line = manifest.lines().last().unwrap();
    assert!(last_line.starts_with("file "));
    assert!(last_line.contains("frame_000003.png"));

    // The encoder would consume exactly this manifest.
    let args = VideoEncoder::new().build_args(&manifest_path, &dir.path().join("output.mp4"));
    assert!(args.iter().any(|a| a == manifest_path.to_str().unwrap()));
}

#[test]
fn test_word_ceiling_rejected_before_rendering() {
    let config = config();
    let segmenter = TextSegmenter::from_config(&config);
    let text = vec!["word"; 100_001].join(" ");

    match segmenter.segment(&text) {
        Err(ContentError::WordLimit { found, limit }) => {
            assert_eq!(found, 100_001);
            assert_eq!(limit, 100_000);
        }
        other => panic!("expected word limit error, got {:?}", other.map(|g| g.len())),
    }
}

#[test]
fn test_grouping_changes_frame_count_not_order() {
    let grouped = VideoConfig {
        word_grouping: 2,
        ..config()
    }
    .clamped();

    let groups = TextSegmenter::from_config(&grouped)
        .segment("Speed reading is great.")
        .unwrap();
    let texts: Vec<&str> = groups.iter().map(|g| g.text()).collect();
    assert_eq!(texts, vec!["Speed reading", "is great."]);
}
