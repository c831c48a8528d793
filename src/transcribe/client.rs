use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::config::ApiConfig;

/// Response body of a successful transcription request.
#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// HTTP client for a Whisper-compatible `audio/transcriptions` endpoint.
///
/// Each segment is uploaded as a multipart form with a `file` part and a
/// `model` field, authenticated with a bearer token. Requests are not retried;
/// the caller decides what a failed segment means.
pub struct WhisperClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl WhisperClient {
    pub fn new(api: &ApiConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: api.endpoint.clone(),
            model: api.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Upload one audio file and return its transcript text.
    pub async fn transcribe_file(&self, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        tracing::debug!("Uploading {} to {}", file_name, self.endpoint);

        let bytes = fs_err::read(path)?;

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed to send")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            anyhow::bail!("Request failed with status code {}: {}", status, body);
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_response_parsing() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text": "hello world", "language": "en"}"#).unwrap();
        assert_eq!(parsed.text, "hello world");
    }

    #[test]
    fn test_response_requires_text_field() {
        let result =
            serde_json::from_str::<TranscriptionResponse>(r#"{"transcript": "hello"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_captures_config() {
        let config = Config::default();
        let client = WhisperClient::new(&config.api, "sk-test".to_string()).unwrap();
        assert_eq!(client.model(), "whisper-1");
    }
}
