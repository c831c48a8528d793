use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;

use super::{AudioFormat, AudioInfo, MediaExtractor};
use crate::audio::Bitrate;

/// Extractor for audio and video files already on disk.
///
/// Metadata comes from ffprobe; conversion to MP3 (when needed) goes through
/// ffmpeg. Pure MP3 inputs are copied untouched.
pub struct LocalFileExtractor;

impl LocalFileExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Check if the file exists and is accessible
    async fn validate_file(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            anyhow::bail!("File does not exist: {}", path.display());
        }

        if !path.is_file() {
            anyhow::bail!("Path is not a file: {}", path.display());
        }

        match fs::metadata(path).await {
            Ok(metadata) => {
                if metadata.len() == 0 {
                    anyhow::bail!("File is empty: {}", path.display());
                }
            }
            Err(e) => {
                anyhow::bail!("Cannot access file {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    /// Get duration and title using ffprobe
    async fn get_file_info(&self, path: &Path) -> Result<(Option<f64>, String)> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                &path.to_string_lossy(),
            ])
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to analyze file with ffprobe: {}", error);
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;

        let duration = info["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok());

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Local File")
            .to_string();

        let empty_vec = vec![];
        let streams = info["streams"].as_array().unwrap_or(&empty_vec);
        let has_audio = streams
            .iter()
            .any(|stream| stream["codec_type"].as_str() == Some("audio"));

        if !has_audio {
            anyhow::bail!("File does not contain any audio streams: {}", path.display());
        }

        Ok((duration, title))
    }

    /// Determine audio format from file extension
    fn get_audio_format(&self, path: &Path) -> AudioFormat {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(AudioFormat::from_extension)
            .unwrap_or(AudioFormat::Mp3)
    }

    /// Place a splittable MP3 for `source_path` at `target_path`.
    ///
    /// MP3 sources are copied as-is; everything else (other audio formats,
    /// video containers) is converted with ffmpeg at `bitrate`.
    pub async fn prepare_audio(
        &self,
        source_path: &Path,
        target_path: &Path,
        bitrate: Bitrate,
    ) -> Result<AudioFormat> {
        tracing::debug!(
            "Preparing local audio file: {} -> {}",
            source_path.display(),
            target_path.display()
        );

        let source_format = self.get_audio_format(source_path);
        let is_mp3 = matches!(
            source_path.extension().and_then(|ext| ext.to_str()),
            Some("mp3")
        ) && matches!(source_format, AudioFormat::Mp3);

        if is_mp3 {
            fs::copy(source_path, target_path).await?;
            Ok(AudioFormat::Mp3)
        } else {
            self.convert_to_mp3(source_path, target_path, bitrate).await?;
            Ok(AudioFormat::Mp3)
        }
    }

    /// Convert file to MP3 using ffmpeg
    async fn convert_to_mp3(
        &self,
        source_path: &Path,
        target_path: &Path,
        bitrate: Bitrate,
    ) -> Result<()> {
        tracing::debug!("Converting {} to MP3 at {}", source_path.display(), bitrate);

        let output = Command::new("ffmpeg")
            .args(["-i", &source_path.to_string_lossy()])
            .args(["-vn", "-acodec", "libmp3lame"])
            .args(["-ab", &bitrate.to_string()])
            .args(["-ar", "44100"])
            .arg("-y")
            .arg(target_path)
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to convert file with ffmpeg: {}", error);
        }

        Ok(())
    }
}

#[async_trait]
impl MediaExtractor for LocalFileExtractor {
    async fn extract_audio_info(&self, path: &str) -> Result<AudioInfo> {
        let file_path = Path::new(path);

        self.validate_file(file_path).await?;

        let (duration_seconds, title) = self.get_file_info(file_path).await?;

        let metadata = fs::metadata(file_path).await?;
        let file_size = Some(metadata.len());

        let format = self.get_audio_format(file_path);

        let absolute_path = file_path
            .canonicalize()
            .unwrap_or_else(|_| file_path.to_path_buf());
        let download_url = format!("local-file://{}", absolute_path.display());

        Ok(AudioInfo {
            download_url,
            duration_seconds,
            title: Some(title),
            format,
            file_size,
            original_url: path.to_string(),
        })
    }

    fn supports_url(&self, _url: &str) -> bool {
        // Local paths are routed explicitly by the pipeline, never matched as URLs
        false
    }

    fn platform_name(&self) -> &'static str {
        "Local File"
    }
}

impl Default for LocalFileExtractor {
    fn default() -> Self {
        Self::new()
    }
}
