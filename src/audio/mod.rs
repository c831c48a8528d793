use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;

use crate::{ClipscribeError, Result};

pub mod ffmpeg;

pub use ffmpeg::FfmpegCodec;

/// MP3 encoding bitrate, stored in kilobits per second.
///
/// Parsed from the conventional `"192k"` notation. A zero rate is rejected at
/// parse time since it would make every derived segment duration zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitrate(u32);

impl Bitrate {
    pub fn kbps(&self) -> u32 {
        self.0
    }

    pub fn bps(&self) -> u64 {
        self.0 as u64 * 1000
    }
}

impl FromStr for Bitrate {
    type Err = ClipscribeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let kbps = s
            .strip_suffix('k')
            .and_then(|digits| digits.parse::<u32>().ok())
            .ok_or_else(|| ClipscribeError::InvalidBitrate(s.to_string()))?;

        if kbps == 0 {
            return Err(ClipscribeError::InvalidBitrate(s.to_string()));
        }

        Ok(Bitrate(kbps))
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}k", self.0)
    }
}

/// Shape of a decoded PCM stream: sample rate and interleaved channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmSpec {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Number of interleaved samples per frame of audio.
    pub fn samples_per_frame(&self) -> usize {
        self.channels as usize
    }
}

/// An immutable, fully decoded audio buffer.
///
/// Samples are interleaved 16-bit PCM. The buffer is loaded once per split
/// operation and only read from afterwards; sub-ranges are borrowed, never
/// copied, until they reach the encoder.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    spec: PcmSpec,
    samples: Vec<i16>,
}

impl AudioBuffer {
    /// Build a buffer from interleaved samples, dropping any trailing partial frame.
    pub fn new(spec: PcmSpec, mut samples: Vec<i16>) -> Self {
        let per_frame = spec.samples_per_frame();
        let whole = samples.len() / per_frame * per_frame;
        samples.truncate(whole);

        Self { spec, samples }
    }

    pub fn spec(&self) -> PcmSpec {
        self.spec
    }

    pub fn frame_count(&self) -> u64 {
        (self.samples.len() / self.spec.samples_per_frame()) as u64
    }

    /// Total duration in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.frame_count() * 1000 / self.spec.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Borrow the interleaved samples covering `[start_ms, end_ms)`.
    ///
    /// Both bounds are clamped to the buffer, so a range running past the end
    /// yields a truncated final slice rather than an error.
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> &[i16] {
        let total = self.frame_count();
        let start_frame = self.ms_to_frame(start_ms).min(total);
        let end_frame = self.ms_to_frame(end_ms).min(total).max(start_frame);

        let per_frame = self.spec.samples_per_frame();
        &self.samples[start_frame as usize * per_frame..end_frame as usize * per_frame]
    }

    fn ms_to_frame(&self, ms: u64) -> u64 {
        ms * self.spec.sample_rate as u64 / 1000
    }
}

/// Decode/encode collaborator for the splitter.
///
/// The production implementation shells out to ffmpeg; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioCodec: Send + Sync {
    /// Decode an entire audio file into memory.
    async fn decode(&self, path: &Path) -> Result<AudioBuffer>;

    /// Encode interleaved PCM samples to an MP3 file at the given bitrate.
    async fn encode(
        &self,
        samples: &[i16],
        spec: PcmSpec,
        bitrate: Bitrate,
        path: &Path,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(spec: PcmSpec, frames: usize) -> AudioBuffer {
        let samples = vec![100i16; frames * spec.samples_per_frame()];
        AudioBuffer::new(spec, samples)
    }

    #[test]
    fn test_bitrate_parses_kbps_notation() {
        let bitrate: Bitrate = "192k".parse().unwrap();
        assert_eq!(bitrate.kbps(), 192);
        assert_eq!(bitrate.bps(), 192_000);
        assert_eq!(bitrate.to_string(), "192k");
    }

    #[test]
    fn test_bitrate_rejects_malformed_input() {
        assert!("".parse::<Bitrate>().is_err());
        assert!("k".parse::<Bitrate>().is_err());
        assert!("192".parse::<Bitrate>().is_err());
        assert!("fastk".parse::<Bitrate>().is_err());
        assert!("192kbps".parse::<Bitrate>().is_err());
        assert!("-5k".parse::<Bitrate>().is_err());
    }

    #[test]
    fn test_bitrate_rejects_zero() {
        let err = "0k".parse::<Bitrate>().unwrap_err();
        assert!(err.to_string().contains("0k"));
    }

    #[test]
    fn test_duration_from_frames() {
        let buffer = tone(PcmSpec::new(44100, 2), 44100);
        assert_eq!(buffer.duration_ms(), 1000);
        assert_eq!(buffer.frame_count(), 44100);
    }

    #[test]
    fn test_empty_buffer_has_zero_duration() {
        let buffer = AudioBuffer::new(PcmSpec::new(44100, 2), Vec::new());
        assert!(buffer.is_empty());
        assert_eq!(buffer.duration_ms(), 0);
        assert!(buffer.slice_ms(0, 1000).is_empty());
    }

    #[test]
    fn test_trailing_partial_frame_is_dropped() {
        let buffer = AudioBuffer::new(PcmSpec::new(8000, 2), vec![1, 2, 3]);
        assert_eq!(buffer.frame_count(), 1);
    }

    #[test]
    fn test_slice_is_frame_aligned() {
        let spec = PcmSpec::new(1000, 2);
        let buffer = tone(spec, 500);

        let slice = buffer.slice_ms(0, 250);
        assert_eq!(slice.len(), 250 * 2);
    }

    #[test]
    fn test_slice_clamps_past_end() {
        let spec = PcmSpec::new(1000, 1);
        let buffer = tone(spec, 100);

        assert_eq!(buffer.slice_ms(50, 10_000).len(), 50);
        assert!(buffer.slice_ms(500, 600).is_empty());
    }

    #[test]
    fn test_adjacent_slices_tile_the_buffer() {
        let spec = PcmSpec::new(44100, 2);
        let buffer = tone(spec, 44100);

        let first = buffer.slice_ms(0, 333);
        let second = buffer.slice_ms(333, 666);
        let third = buffer.slice_ms(666, 1000);
        assert_eq!(
            first.len() + second.len() + third.len(),
            44100 * 2,
            "slices must cover every sample exactly once"
        );
    }
}
