use std::path::Path;
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{AudioBuffer, AudioCodec, Bitrate, PcmSpec};
use crate::Result;

/// ffmpeg-backed implementation of [`AudioCodec`].
///
/// Decoding runs one ffmpeg process that emits raw interleaved s16le PCM on
/// stdout; encoding runs one process that reads raw PCM from stdin and writes
/// an MP3 through libmp3lame. Every input format ffmpeg understands is
/// accepted, which keeps this crate free of per-container decoding logic.
pub struct FfmpegCodec {
    ffmpeg_path: String,
    spec: PcmSpec,
}

impl FfmpegCodec {
    pub fn new() -> Self {
        Self::with_spec(PcmSpec::new(44100, 2))
    }

    /// Use a specific PCM shape for decoded output.
    pub fn with_spec(spec: PcmSpec) -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            spec,
        }
    }
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCodec for FfmpegCodec {
    async fn decode(&self, path: &Path) -> Result<AudioBuffer> {
        tracing::debug!("Decoding {} to raw PCM", path.display());

        let output = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-vn", "-f", "s16le", "-acodec", "pcm_s16le"])
            .args(["-ar", &self.spec.sample_rate.to_string()])
            .args(["-ac", &self.spec.channels.to_string()])
            .arg("pipe:1")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("failed to run ffmpeg")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg failed to decode {}: {}", path.display(), error.trim());
        }

        let samples = output
            .stdout
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(AudioBuffer::new(self.spec, samples))
    }

    async fn encode(
        &self,
        samples: &[i16],
        spec: PcmSpec,
        bitrate: Bitrate,
        path: &Path,
    ) -> Result<()> {
        tracing::debug!("Encoding {} samples to {}", samples.len(), path.display());

        let mut child = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-f", "s16le"])
            .args(["-ar", &spec.sample_rate.to_string()])
            .args(["-ac", &spec.channels.to_string()])
            .args(["-i", "pipe:0", "-vn", "-acodec", "libmp3lame"])
            .args(["-b:a", &bitrate.to_string()])
            .arg("-y")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn ffmpeg")?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("ffmpeg stdin was not captured"))?;

        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }

        stdin
            .write_all(&bytes)
            .await
            .context("failed to stream PCM to ffmpeg")?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg failed to encode {}: {}", path.display(), error.trim());
        }

        Ok(())
    }
}
