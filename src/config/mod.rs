use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::audio::Bitrate;

/// Default transcription endpoint (OpenAI-compatible).
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Environment variable the API key is read from unless overridden.
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transcription API configuration
    pub api: ApiConfig,

    /// Audio splitting configuration
    pub split: SplitConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Transcription request URL
    pub endpoint: String,

    /// Model name sent with each transcription request
    pub model: String,

    /// Name of the environment variable holding the API key.
    ///
    /// The key itself never lands in the config file; it is resolved from the
    /// environment exactly once, when the pipeline starts.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Maximum approximate size per segment in MB
    pub max_size_mb: u64,

    /// MP3 encoding bitrate, e.g. "192k"
    pub bitrate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Temporary directory for downloads and segments
    pub temp_dir: Option<PathBuf>,

    /// Keep segment files after transcription
    pub keep_segments: bool,

    /// Default output format
    pub default_output_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                model: "whisper-1".to_string(),
                api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            },
            split: SplitConfig {
                max_size_mb: 250,
                bitrate: "192k".to_string(),
            },
            app: AppConfig {
                temp_dir: None,
                keep_segments: false,
                default_output_format: "text".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // A config.yaml in the working directory wins, for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("clipscribe").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.endpoint.is_empty() {
            anyhow::bail!("Transcription endpoint must be configured");
        }

        url::Url::parse(&self.api.endpoint)
            .with_context(|| format!("Invalid transcription endpoint: {}", self.api.endpoint))?;

        if self.api.model.is_empty() {
            anyhow::bail!("Transcription model must be configured");
        }

        if self.split.max_size_mb == 0 {
            anyhow::bail!("Maximum segment size must be positive");
        }

        self.bitrate()?;

        Ok(())
    }

    /// Parsed segment encoding bitrate
    pub fn bitrate(&self) -> Result<Bitrate> {
        let bitrate = self.split.bitrate.parse::<Bitrate>()?;
        Ok(bitrate)
    }

    /// Resolve the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Result<String> {
        std::env::var(&self.api.api_key_env).with_context(|| {
            format!(
                "Transcription API key not found; set the {} environment variable",
                self.api.api_key_env
            )
        })
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Endpoint: {}", self.api.endpoint);
        println!("  Model: {}", self.api.model);
        println!("  API Key Env: {}", self.api.api_key_env);
        println!("  Max Segment Size: {} MB", self.split.max_size_mb);
        println!("  Bitrate: {}", self.split.bitrate);
        println!("  Keep Segments: {}", self.app.keep_segments);
        println!("  Default Format: {}", self.app.default_output_format);
    }
}
