//! Image encoders for rendered frames.

pub mod png;
pub mod webp;

pub use png::encode_png;
pub use webp::{encode_animated_webp, frame_duration_ms};

/// Container an output is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Webp,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }
}
