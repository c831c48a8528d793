use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

use crate::audio::FfmpegCodec;
use crate::config::Config;
use crate::extractors::local::LocalFileExtractor;
use crate::extractors::youtube::YoutubeExtractor;
use crate::extractors::{AudioInfo, ExtractorRegistry, MediaExtractor};
use crate::segment::{collect_segments, AudioSplitter, SegmentPlan};

pub mod client;

pub use client::WhisperClient;

/// Transcription result with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// The combined transcript, one space between segment texts
    pub transcript: String,

    /// Per-segment transcripts, in playback order
    pub segments: Vec<SegmentTranscript>,

    /// Information about the source audio
    pub audio_info: AudioInfo,

    /// Directory holding the segment files, if preserved
    pub segments_dir: Option<PathBuf>,

    /// Transcription metadata
    pub metadata: TranscriptionMetadata,
}

/// Transcript of a single exported segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentTranscript {
    /// Position in the segment sequence
    pub index: usize,

    /// Segment file name, e.g. `segment_0.mp3`
    pub file_name: String,

    /// Transcribed text
    pub text: String,
}

/// Metadata about the transcription run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionMetadata {
    /// Model the segments were transcribed with
    pub model: String,

    /// Number of segment files submitted
    pub segment_count: usize,

    /// Number of segments that transcribed successfully
    pub transcribed_count: usize,

    /// Timestamp when the run completed
    pub completed_at: DateTime<Utc>,
}

/// Main transcription pipeline: resolve input, split, transcribe, join.
pub struct TranscriptionPipeline {
    config: Config,
    registry: ExtractorRegistry,
    client: WhisperClient,
    temp_dir: TempDir,
    quiet: bool,
}

impl TranscriptionPipeline {
    /// Create a new transcription pipeline.
    ///
    /// The API key is resolved from the environment here, once; everything
    /// downstream works off the returned pipeline's explicit state.
    pub fn new(config: Config, quiet: bool) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        let client = WhisperClient::new(&config.api, api_key)?;

        let temp_dir = match &config.app.temp_dir {
            Some(dir) => TempDir::new_in(dir),
            None => TempDir::new(),
        }
        .context("Failed to create temporary directory")?;

        Ok(Self {
            config,
            registry: ExtractorRegistry::new(),
            client,
            temp_dir,
            quiet,
        })
    }

    /// Transcribe audio from a URL or local file path.
    pub async fn transcribe_from_input(&self, input: &str) -> Result<TranscriptionResult> {
        let bitrate = self.config.bitrate()?;
        let plan = SegmentPlan::new(self.config.split.max_size_mb, bitrate)?;

        let (audio_info, audio_path) = self.resolve_input(input).await?;

        if let Some(title) = &audio_info.title {
            tracing::info!("Source: {}", title);
        }
        if let Some(seconds) = audio_info.duration_seconds {
            tracing::info!("Duration: {}", crate::utils::format_duration(seconds));
        }

        let segments_dir = if self.config.app.keep_segments {
            std::env::current_dir()?.join("segments")
        } else {
            self.temp_dir.path().join("segments")
        };

        let splitter = AudioSplitter::new(FfmpegCodec::new(), self.quiet);
        splitter
            .split(&audio_path, &segments_dir, &plan, bitrate)
            .await?;

        // Re-enumerate from disk in numeric order; lexical order would shuffle
        // segment_10 ahead of segment_2.
        let segment_files = collect_segments(&segments_dir)?;
        let segments = self.transcribe_segments(&segment_files).await;

        let transcript = segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let metadata = TranscriptionMetadata {
            model: self.client.model().to_string(),
            segment_count: segment_files.len(),
            transcribed_count: segments.len(),
            completed_at: Utc::now(),
        };

        Ok(TranscriptionResult {
            transcript,
            segments,
            audio_info,
            segments_dir: self.config.app.keep_segments.then_some(segments_dir),
            metadata,
        })
    }

    /// Submit segment files in order, skipping the ones that fail.
    ///
    /// A failed segment is logged and dropped from the combined transcript;
    /// the rest of the chain continues.
    async fn transcribe_segments(&self, segment_files: &[PathBuf]) -> Vec<SegmentTranscript> {
        let progress = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(segment_files.len() as u64)
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut segments = Vec::with_capacity(segment_files.len());

        for (index, file) in segment_files.iter().enumerate() {
            let file_name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            progress.set_message(format!("Transcribing {}", file_name));
            tracing::info!("Transcribing {}...", file.display());

            match self.client.transcribe_file(file).await {
                Ok(text) => {
                    segments.push(SegmentTranscript {
                        index,
                        file_name,
                        text,
                    });
                }
                Err(error) => {
                    tracing::warn!("Failed to transcribe {}: {:#}", file.display(), error);
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();

        segments
    }

    /// Turn the input into a local MP3 work file plus its metadata.
    async fn resolve_input(&self, input: &str) -> Result<(AudioInfo, PathBuf)> {
        if self.registry.is_local_file(input) {
            let local = LocalFileExtractor::new();
            let audio_info = local.extract_audio_info(input).await?;

            let work_path = self.work_file_path("mp3");
            local
                .prepare_audio(Path::new(input), &work_path, self.config.bitrate()?)
                .await?;

            return Ok((audio_info, work_path));
        }

        tracing::info!("Extracting audio information from URL: {}", input);
        let audio_info = self.registry.extract_audio_info(input).await?;
        let audio_path = self.download_audio(&audio_info).await?;

        Ok((audio_info, audio_path))
    }

    /// Download the audio described by `audio_info` into the temp dir.
    async fn download_audio(&self, audio_info: &AudioInfo) -> Result<PathBuf> {
        let audio_path = self.work_file_path(audio_info.format.as_str());

        tracing::info!("Downloading audio to: {}", audio_path.display());

        // YouTube downloads are delegated back to yt-dlp, which extracts the
        // audio track itself.
        if let Some(url) = audio_info.download_url.strip_prefix("yt-dlp://") {
            let progress = if self.quiet {
                ProgressBar::hidden()
            } else {
                ProgressBar::new_spinner()
            };
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            progress.set_message("Downloading audio with yt-dlp...");

            let quality = self.config.bitrate()?.kbps();
            YoutubeExtractor::new()
                .download_audio_direct(url, &audio_path, quality)
                .await?;

            progress.finish_with_message("Download complete");
            return Ok(audio_path);
        }

        let progress = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(audio_info.file_size.unwrap_or(0))
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_message("Downloading audio...");

        let response = reqwest::get(&audio_info.download_url).await?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to download audio: HTTP {}", response.status());
        }

        let total_size = response.content_length().unwrap_or(0);
        progress.set_length(total_size);

        let mut file = fs_err::File::create(&audio_path)?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        use std::io::Write;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            progress.set_position(downloaded);
        }

        progress.finish_with_message("Download complete");

        Ok(audio_path)
    }

    fn work_file_path(&self, extension: &str) -> PathBuf {
        let filename = format!(
            "audio_{}.{}",
            &Uuid::new_v4().to_string()[..8],
            extension
        );
        self.temp_dir.path().join(filename)
    }
}
