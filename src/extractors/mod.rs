use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub mod direct;
pub mod local;
pub mod youtube;

use crate::{ClipscribeError, Result};

/// Information about extracted audio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Direct download URL for the audio
    pub download_url: String,

    /// Duration of the audio in seconds, if available
    pub duration_seconds: Option<f64>,

    /// Title or description of the media
    pub title: Option<String>,

    /// Audio format (mp3, m4a, wav, etc.)
    pub format: AudioFormat,

    /// File size in bytes if available
    pub file_size: Option<u64>,

    /// Original URL that was processed
    pub original_url: String,
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Flac,
    Ogg,
    Webm,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Webm => "webm",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" | "aac" => Some(AudioFormat::M4a),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "ogg" => Some(AudioFormat::Ogg),
            "webm" => Some(AudioFormat::Webm),
            _ => None,
        }
    }
}

/// Trait for extracting audio from different platforms
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Extract audio information from a URL
    async fn extract_audio_info(&self, url: &str) -> Result<AudioInfo>;

    /// Check if this extractor supports the given URL
    fn supports_url(&self, url: &str) -> bool;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}

/// Registry for managing multiple extractors
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn MediaExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new registry with default extractors
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: Vec::new(),
        };

        registry.register(Box::new(youtube::YoutubeExtractor::new()));
        registry.register(Box::new(direct::DirectExtractor::new()));

        registry
    }

    /// Register a new extractor
    pub fn register(&mut self, extractor: Box<dyn MediaExtractor>) {
        self.extractors.push(extractor);
    }

    /// Find an extractor that supports the given URL
    pub fn find_extractor(&self, url: &str) -> Option<&dyn MediaExtractor> {
        self.extractors
            .iter()
            .find(|extractor| extractor.supports_url(url))
            .map(|boxed| boxed.as_ref())
    }

    /// List all supported platforms
    pub fn list_platforms(&self) -> Vec<&'static str> {
        self.extractors
            .iter()
            .map(|extractor| extractor.platform_name())
            .collect()
    }

    /// Check if input is a local file path rather than a URL
    pub fn is_local_file(&self, input: &str) -> bool {
        if input.starts_with("http://") || input.starts_with("https://") {
            return false;
        }

        let path = Path::new(input);
        if path.exists() {
            return true;
        }

        // Looks like a file path even if it does not exist yet
        let has_extension = path.extension().is_some();
        let has_path_separators = input.contains('/') || input.contains('\\');
        let starts_with_dot = input.starts_with("./") || input.starts_with(".\\");

        has_extension || has_path_separators || starts_with_dot
    }

    /// Extract audio info using the appropriate extractor
    pub async fn extract_audio_info(&self, url: &str) -> Result<AudioInfo> {
        let extractor = self
            .find_extractor(url)
            .ok_or_else(|| ClipscribeError::UnsupportedUrl(url.to_string()))?;

        extractor.extract_audio_info(url).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate and normalize URLs
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}
