//! Media decoder backed by external `ffmpeg`/`ffprobe` processes.
//!
//! Decodes to tightly packed RGBA (top row first) and publishes into the pipeline's
//! [`oldfilm_core::FrameSlot`], raising playback events on the supplied sink.
#![deny(missing_debug_implementations)]

mod ffmpeg;
mod probe;
mod source;

use std::io;

use oldfilm_core::EngineError;
use serde::{Deserialize, Serialize};

pub use ffmpeg::{resolve_tool_path, FFMPEG_ENV, FFPROBE_ENV};
pub use probe::{parse_frame_rate, parse_probe, MediaInfo};
pub use source::FfmpegSource;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoConfig {
    /// Input file path.
    pub file: String,

    /// Restart from the beginning at end of stream.
    #[serde(default = "default_loop", rename = "loop")]
    pub r#loop: bool,

    /// Optional explicit ffmpeg binary path.
    #[serde(default)]
    pub ffmpeg_path: Option<String>,

    /// Optional explicit ffprobe binary path.
    #[serde(default)]
    pub ffprobe_path: Option<String>,
}

fn default_loop() -> bool {
    true
}

impl VideoConfig {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            r#loop: default_loop(),
            ffmpeg_path: None,
            ffprobe_path: None,
        }
    }

    pub fn validate(&self) -> Result<(), VideoError> {
        if self.file.trim().is_empty() {
            return Err(VideoError::InvalidConfig("file is empty".into()));
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum VideoError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("ffprobe failed: {0}")]
    Probe(String),

    #[error("no video stream in {0}")]
    NoVideoStream(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl From<VideoError> for EngineError {
    fn from(e: VideoError) -> Self {
        EngineError::Media(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_looping() {
        let cfg: VideoConfig = serde_json::from_str(r#"{ "file": "clip.mp4" }"#).expect("parse");
        assert_eq!(cfg, VideoConfig::new("clip.mp4"));
        assert!(cfg.r#loop);
    }

    #[test]
    fn empty_file_is_rejected() {
        let err = VideoConfig::new("  ").validate().expect_err("empty");
        assert!(matches!(err, VideoError::InvalidConfig(_)));
        assert!(matches!(EngineError::from(err), EngineError::Media(_)));
    }
}
