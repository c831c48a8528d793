//! Clipscribe - A Rust CLI tool for turning video URLs into text transcripts
//!
//! This library provides the pieces of the chain: extracting audio from platforms
//! like YouTube or direct media URLs, splitting the audio into size-bounded MP3
//! segments, and transcribing each segment through a Whisper-compatible HTTP API.

pub mod audio;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod segment;
pub mod transcribe;
pub mod utils;

pub use audio::{AudioBuffer, AudioCodec, Bitrate, FfmpegCodec, PcmSpec};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{AudioInfo, MediaExtractor};
pub use segment::{AudioSplitter, SegmentPlan};
pub use transcribe::{TranscriptionPipeline, TranscriptionResult};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to clipscribe
#[derive(thiserror::Error, Debug)]
pub enum ClipscribeError {
    #[error("Unsupported URL format: {0}")]
    UnsupportedUrl(String),

    #[error("Invalid bitrate {0:?}: expected an integer kbps value like \"192k\"")]
    InvalidBitrate(String),

    #[error("Invalid segment plan: {0}")]
    InvalidSegmentPlan(String),
}
