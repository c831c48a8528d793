use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "clipscribe",
    about = "Clipscribe - Download audio from video URLs, split it into size-bounded segments, and transcribe it",
    version,
    long_about = "A CLI tool that chains audio extraction (yt-dlp/ffmpeg), size-bounded MP3 segmentation, and speech-to-text through a Whisper-compatible HTTP API into a single transcript."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the audio track of a video URL as MP3
    Fetch {
        /// Video URL (YouTube or direct media)
        #[arg(value_name = "URL")]
        url: String,

        /// Directory the MP3 is written into (default: current directory)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Audio quality in kbps
        #[arg(short = 'Q', long, value_name = "KBPS", default_value = "192")]
        quality: u32,
    },

    /// Split a local audio file into size-bounded MP3 segments
    Split {
        /// Audio file to split
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Directory the segments are written into
        #[arg(short, long, value_name = "DIR", default_value = "segments")]
        output_dir: PathBuf,

        /// Maximum approximate segment size in MB
        #[arg(long, value_name = "MB")]
        max_size_mb: Option<u64>,

        /// MP3 encoding bitrate, e.g. 192k
        #[arg(long, value_name = "RATE")]
        bitrate: Option<String>,
    },

    /// Transcribe audio from a URL or local file
    Transcribe {
        /// URL or file path to transcribe
        #[arg(value_name = "URL_OR_FILE")]
        input: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Keep the segment files after transcription
        #[arg(long)]
        keep_segments: bool,

        /// Transcription model to request
        #[arg(long, value_name = "MODEL")]
        model: Option<String>,

        /// Maximum approximate segment size in MB
        #[arg(long, value_name = "MB")]
        max_size_mb: Option<u64>,

        /// MP3 encoding bitrate, e.g. 192k
        #[arg(long, value_name = "RATE")]
        bitrate: Option<String>,
    },

    /// Show or initialize the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported platforms
    Platforms,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with per-segment texts and metadata
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
