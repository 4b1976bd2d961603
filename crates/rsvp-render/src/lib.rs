//! Rendering pipeline for RSVP videos.
//!
//! This crate turns normalized text into an encoded video:
//! - [`segment`]: whitespace normalization and word grouping
//! - [`timing`]: per-group display durations from wpm and punctuation
//! - [`orp`]: the Optimal Recognition Point index within a group
//! - [`font`]: font selection with a built-in bitmap fallback
//! - [`frame`]: per-group frame composition with the ORP centered
//! - [`manifest`]: the concat manifest handed to the encoder
//! - [`encode`]: the FFmpeg invocation

pub mod encode;
pub mod error;
pub mod font;
pub mod frame;
pub mod manifest;
pub mod orp;
pub mod segment;
pub mod timing;

pub use encode::VideoEncoder;
pub use error::{RenderError, RenderResult};
pub use font::{FontFace, FontLibrary};
pub use frame::FrameCompositor;
pub use manifest::{FrameEntry, FrameSequence};
pub use orp::{fixation_index, recognition_index};
pub use segment::TextSegmenter;
pub use timing::TimingModel;
