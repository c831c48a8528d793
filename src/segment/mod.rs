use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::audio::{AudioCodec, Bitrate};
use crate::{ClipscribeError, Result};

/// File name prefix shared by the exporter and the segment collector.
const SEGMENT_PREFIX: &str = "segment_";

/// File extension of exported segments.
const SEGMENT_EXTENSION: &str = "mp3";

/// Derived per-segment duration for a byte budget at a given encoding bitrate.
///
/// The duration is an approximation: the real encoded size of a segment
/// depends on content and container overhead and is never checked against the
/// budget after export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    segment_duration_ms: u64,
}

impl SegmentPlan {
    /// Compute the plan for a maximum segment size in MB at `bitrate`.
    ///
    /// `segment_duration_ms = max_size_bytes * 8 * 1000 / bitrate_bps`. A plan
    /// whose duration comes out as zero is rejected outright; walking the
    /// source in zero-length steps would never terminate.
    pub fn new(max_size_mb: u64, bitrate: Bitrate) -> Result<Self> {
        if max_size_mb == 0 {
            return Err(
                ClipscribeError::InvalidSegmentPlan("max segment size must be positive".into())
                    .into(),
            );
        }

        let max_size_bytes = max_size_mb
            .checked_mul(1024 * 1024)
            .and_then(|bytes| bytes.checked_mul(8))
            .and_then(|bits| bits.checked_mul(1000))
            .ok_or_else(|| {
                ClipscribeError::InvalidSegmentPlan(format!(
                    "max segment size of {} MB is too large",
                    max_size_mb
                ))
            })?;

        let segment_duration_ms = max_size_bytes / bitrate.bps();

        if segment_duration_ms == 0 {
            return Err(ClipscribeError::InvalidSegmentPlan(format!(
                "segment duration computed as zero for {} MB at {}",
                max_size_mb, bitrate
            ))
            .into());
        }

        Ok(Self {
            segment_duration_ms,
        })
    }

    pub fn segment_duration_ms(&self) -> u64 {
        self.segment_duration_ms
    }

    /// Number of segments a source of `total_duration_ms` splits into.
    pub fn segment_count(&self, total_duration_ms: u64) -> u64 {
        (total_duration_ms + self.segment_duration_ms - 1) / self.segment_duration_ms
    }

    /// Walk `[0, total_duration_ms)` in duration-sized windows.
    ///
    /// Ranges are contiguous, non-overlapping, and strictly increasing; the
    /// final range is clamped to the source duration. A zero-length source
    /// yields no ranges at all.
    pub fn ranges(&self, total_duration_ms: u64) -> SegmentRanges {
        SegmentRanges {
            next_start_ms: 0,
            total_duration_ms,
            segment_duration_ms: self.segment_duration_ms,
        }
    }
}

/// A contiguous `[start_ms, end_ms)` window of the source audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SegmentRange {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Iterator over the segment windows of a [`SegmentPlan`].
#[derive(Debug, Clone)]
pub struct SegmentRanges {
    next_start_ms: u64,
    total_duration_ms: u64,
    segment_duration_ms: u64,
}

impl Iterator for SegmentRanges {
    type Item = SegmentRange;

    fn next(&mut self) -> Option<SegmentRange> {
        if self.next_start_ms >= self.total_duration_ms {
            return None;
        }

        let start_ms = self.next_start_ms;
        let end_ms = (start_ms + self.segment_duration_ms).min(self.total_duration_ms);
        self.next_start_ms = end_ms;

        Some(SegmentRange { start_ms, end_ms })
    }
}

/// Name of the exported file for a zero-based segment index.
///
/// Indices are not zero-padded, so lexical sort diverges from numeric order
/// past ten segments; consumers go through [`collect_segments`] instead of
/// sorting names.
pub fn segment_file_name(index: usize) -> String {
    format!("{}{}.{}", SEGMENT_PREFIX, index, SEGMENT_EXTENSION)
}

/// Splits a decoded audio source into independently encoded segment files.
pub struct AudioSplitter<C> {
    codec: C,
    quiet: bool,
}

impl<C: AudioCodec> AudioSplitter<C> {
    pub fn new(codec: C, quiet: bool) -> Self {
        Self { codec, quiet }
    }

    /// Export `input` as `segment_<index>.mp3` files under `output_dir`.
    ///
    /// The source is decoded once up front; a decode failure aborts before
    /// anything is written. The output directory is created if missing. A
    /// failed segment export aborts the remaining segments and leaves the
    /// already written files in place.
    pub async fn split(
        &self,
        input: &Path,
        output_dir: &Path,
        plan: &SegmentPlan,
        bitrate: Bitrate,
    ) -> Result<Vec<PathBuf>> {
        let buffer = self.codec.decode(input).await?;
        let total_duration_ms = buffer.duration_ms();

        fs_err::create_dir_all(output_dir)?;

        let count = plan.segment_count(total_duration_ms);
        tracing::info!(
            "Splitting {} ({} ms) into {} segments of up to {} ms",
            input.display(),
            total_duration_ms,
            count,
            plan.segment_duration_ms()
        );

        let progress = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(count)
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_message("Exporting segments...");

        let mut written = Vec::with_capacity(count as usize);

        for (index, range) in plan.ranges(total_duration_ms).enumerate() {
            let samples = buffer.slice_ms(range.start_ms, range.end_ms);
            let path = output_dir.join(segment_file_name(index));

            self.codec
                .encode(samples, buffer.spec(), bitrate, &path)
                .await?;

            tracing::info!("Exported {}", path.display());
            progress.inc(1);
            written.push(path);
        }

        progress.finish_and_clear();

        Ok(written)
    }
}

/// Enumerate the segment files in `dir`, in numeric index order.
pub fn collect_segments(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in fs_err::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();

        let Some(name) = file_name.to_str() else {
            continue;
        };

        if let Some(index) = parse_segment_index(name) {
            found.push((index, entry.path()));
        }
    }

    found.sort_by_key(|(index, _)| *index);

    Ok(found.into_iter().map(|(_, path)| path).collect())
}

fn parse_segment_index(name: &str) -> Option<u64> {
    name.strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(".mp3")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioBuffer, Bitrate, MockAudioCodec, PcmSpec};
    use std::sync::{Arc, Mutex};

    fn bitrate(s: &str) -> Bitrate {
        s.parse().unwrap()
    }

    #[test]
    fn test_plan_matches_reference_computation() {
        // 1 MB at 128 kbps: (1 * 1024 * 1024 * 8 * 1000) / 128000 = 65536 ms.
        let plan = SegmentPlan::new(1, bitrate("128k")).unwrap();
        assert_eq!(plan.segment_duration_ms(), 65536);
    }

    #[test]
    fn test_plan_rejects_zero_size() {
        assert!(SegmentPlan::new(0, bitrate("192k")).is_err());
    }

    #[test]
    fn test_plan_rejects_overflowing_size() {
        assert!(SegmentPlan::new(u64::MAX / 1024, bitrate("192k")).is_err());
    }

    #[test]
    fn test_plan_rejects_zero_duration() {
        // An absurdly high bitrate against a 1 MB budget underflows to zero ms.
        let err = SegmentPlan::new(1, bitrate("4294967295k")).unwrap_err();
        assert!(err.to_string().contains("segment duration"));
    }

    #[test]
    fn test_ten_minute_source_yields_ten_segments() {
        let plan = SegmentPlan::new(1, bitrate("128k")).unwrap();
        let ranges: Vec<_> = plan.ranges(600_000).collect();

        assert_eq!(plan.segment_count(600_000), 10);
        assert_eq!(ranges.len(), 10);
        assert_eq!(ranges[0].start_ms, 0);
        // The final segment is truncated by the source length.
        assert_eq!(ranges[9].duration_ms(), 600_000 - 9 * 65536);
        assert_eq!(ranges[9].end_ms, 600_000);
    }

    #[test]
    fn test_ranges_are_contiguous_and_cover_source() {
        let plan = SegmentPlan::new(3, bitrate("192k")).unwrap();
        let total = 1_234_567;
        let ranges: Vec<_> = plan.ranges(total).collect();

        assert_eq!(ranges.first().unwrap().start_ms, 0);
        assert_eq!(ranges.last().unwrap().end_ms, total);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
        }
        assert_eq!(ranges.len() as u64, plan.segment_count(total));
    }

    #[test]
    fn test_exact_multiple_has_no_remainder_segment() {
        let plan = SegmentPlan::new(1, bitrate("128k")).unwrap();
        let ranges: Vec<_> = plan.ranges(65536 * 4).collect();

        assert_eq!(ranges.len(), 4);
        assert!(ranges.iter().all(|r| r.duration_ms() == 65536));
    }

    #[test]
    fn test_zero_duration_source_yields_no_ranges() {
        let plan = SegmentPlan::new(250, bitrate("192k")).unwrap();
        assert_eq!(plan.ranges(0).count(), 0);
        assert_eq!(plan.segment_count(0), 0);
    }

    #[test]
    fn test_segment_file_names_are_sequential_without_padding() {
        assert_eq!(segment_file_name(0), "segment_0.mp3");
        assert_eq!(segment_file_name(10), "segment_10.mp3");
    }

    #[test]
    fn test_parse_segment_index() {
        assert_eq!(parse_segment_index("segment_7.mp3"), Some(7));
        assert_eq!(parse_segment_index("segment_12.mp3"), Some(12));
        assert_eq!(parse_segment_index("segment_x.mp3"), None);
        assert_eq!(parse_segment_index("transcript.txt"), None);
        assert_eq!(parse_segment_index("segment_3.wav"), None);
    }

    #[test]
    fn test_collect_segments_sorts_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for index in 0..12 {
            fs_err::write(dir.path().join(segment_file_name(index)), b"").unwrap();
        }
        fs_err::write(dir.path().join("transcript.txt"), b"").unwrap();
        fs_err::write(dir.path().join("segment_x.mp3"), b"").unwrap();

        let segments = collect_segments(dir.path()).unwrap();
        let names: Vec<_> = segments
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        // Lexical sort would put segment_10 and segment_11 before segment_2.
        assert_eq!(names[0], "segment_0.mp3");
        assert_eq!(names[2], "segment_2.mp3");
        assert_eq!(names[10], "segment_10.mp3");
        assert_eq!(names[11], "segment_11.mp3");
        assert_eq!(segments.len(), 12);
    }

    #[tokio::test]
    async fn test_split_exports_reference_segment_sequence() {
        // 1 kHz mono: one frame per millisecond, 600 s total.
        let spec = PcmSpec::new(1000, 1);
        let buffer = AudioBuffer::new(spec, vec![0i16; 600_000]);

        let mut codec = MockAudioCodec::new();
        codec
            .expect_decode()
            .times(1)
            .return_once(move |_| Ok(buffer));

        let recorded = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&recorded);
        codec
            .expect_encode()
            .times(10)
            .returning(move |samples, _, _, path| {
                sink.lock()
                    .unwrap()
                    .push((samples.len(), path.to_path_buf()));
                Ok(())
            });

        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let plan = SegmentPlan::new(1, bitrate("128k")).unwrap();

        let splitter = AudioSplitter::new(codec, true);
        let written = splitter
            .split(Path::new("input.mp3"), &output_dir, &plan, bitrate("128k"))
            .await
            .unwrap();

        assert_eq!(written.len(), 10);
        assert!(output_dir.exists());

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded[0].0, 65536);
        assert_eq!(recorded[9].0, 600_000 - 9 * 65536);
        assert!(recorded[0].1.ends_with("segment_0.mp3"));
        assert!(recorded[9].1.ends_with("segment_9.mp3"));
    }

    #[tokio::test]
    async fn test_split_empty_source_writes_nothing() {
        let mut codec = MockAudioCodec::new();
        codec
            .expect_decode()
            .times(1)
            .return_once(|_| Ok(AudioBuffer::new(PcmSpec::new(44100, 2), Vec::new())));
        codec.expect_encode().times(0);

        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let plan = SegmentPlan::new(250, bitrate("192k")).unwrap();

        let splitter = AudioSplitter::new(codec, true);
        let written = splitter
            .split(Path::new("input.mp3"), &output_dir, &plan, bitrate("192k"))
            .await
            .unwrap();

        assert!(written.is_empty());
        assert!(output_dir.exists());
    }

    #[tokio::test]
    async fn test_split_aborts_before_writing_on_decode_failure() {
        let mut codec = MockAudioCodec::new();
        codec
            .expect_decode()
            .times(1)
            .return_once(|_| Err(anyhow::anyhow!("corrupt input")));
        codec.expect_encode().times(0);

        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let plan = SegmentPlan::new(1, bitrate("128k")).unwrap();

        let splitter = AudioSplitter::new(codec, true);
        let result = splitter
            .split(Path::new("input.mp3"), &output_dir, &plan, bitrate("128k"))
            .await;

        assert!(result.is_err());
        assert!(!output_dir.exists(), "nothing should be created on decode failure");
    }

    #[tokio::test]
    async fn test_split_propagates_encode_failure() {
        let spec = PcmSpec::new(1000, 1);
        let buffer = AudioBuffer::new(spec, vec![0i16; 131_072 + 1000]);

        let mut codec = MockAudioCodec::new();
        codec
            .expect_decode()
            .times(1)
            .return_once(move |_| Ok(buffer));

        let calls = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&calls);
        codec.expect_encode().times(2).returning(move |_, _, _, _| {
            let mut calls = counter.lock().unwrap();
            *calls += 1;
            if *calls == 2 {
                Err(anyhow::anyhow!("disk full"))
            } else {
                Ok(())
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let plan = SegmentPlan::new(2, bitrate("128k")).unwrap();

        let splitter = AudioSplitter::new(codec, true);
        let result = splitter
            .split(Path::new("input.mp3"), dir.path(), &plan, bitrate("128k"))
            .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 2, "remaining segments are abandoned");
    }
}
