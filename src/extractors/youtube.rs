use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioFormat, AudioInfo, MediaExtractor};
use crate::Result;

/// YouTube audio extractor using yt-dlp
pub struct YoutubeExtractor {
    yt_dlp_path: String,
}

impl YoutubeExtractor {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error);
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)?;

        Ok(info)
    }

    /// Download the audio track directly, extracting it to MP3 at `quality_kbps`.
    ///
    /// yt-dlp drives its own ffmpeg postprocessor here, so the file landing at
    /// `output_path` is already a playable MP3.
    pub async fn download_audio_direct(
        &self,
        url: &str,
        output_path: &std::path::Path,
        quality_kbps: u32,
    ) -> Result<()> {
        tracing::debug!("Downloading audio for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--output", &output_path.to_string_lossy()])
            .args(["--extract-audio", "--audio-format", "mp3"])
            .args(["--audio-quality", &quality_kbps.to_string()])
            .args(["--format", "bestaudio/best"])
            .args(["--no-playlist", "--no-warnings", "--newline"])
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to download audio: {}", error);
        }

        Ok(())
    }
}

#[async_trait]
impl MediaExtractor for YoutubeExtractor {
    async fn extract_audio_info(&self, url: &str) -> Result<AudioInfo> {
        if !self.check_availability().await {
            anyhow::bail!(
                "yt-dlp is not available. Please install it: https://github.com/yt-dlp/yt-dlp"
            );
        }

        let info = self.get_video_info(url).await?;

        let title = info["title"].as_str().map(|s| s.to_string());
        let duration_seconds = info["duration"].as_f64();

        // The actual download goes through download_audio_direct(), so the
        // download URL is a marker rather than a fetchable address.
        let download_url = format!("yt-dlp://{}", url);

        Ok(AudioInfo {
            download_url,
            duration_seconds,
            title,
            format: AudioFormat::Mp3,
            file_size: None,
            original_url: url.to_string(),
        })
    }

    fn supports_url(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        url_lower.contains("youtube.com/watch")
            || url_lower.contains("youtu.be/")
            || url_lower.contains("youtube.com/embed/")
            || url_lower.contains("youtube.com/v/")
            || url_lower.contains("m.youtube.com/")
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}

impl Default for YoutubeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_common_youtube_urls() {
        let extractor = YoutubeExtractor::new();
        assert!(extractor.supports_url("https://www.youtube.com/watch?v=abc123"));
        assert!(extractor.supports_url("https://youtu.be/abc123"));
        assert!(extractor.supports_url("https://m.youtube.com/watch?v=abc123"));
        assert!(!extractor.supports_url("https://vimeo.com/12345"));
    }
}
