use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipscribe::audio::{Bitrate, FfmpegCodec};
use clipscribe::cli::{Cli, Commands};
use clipscribe::config::Config;
use clipscribe::extractors::youtube::YoutubeExtractor;
use clipscribe::extractors::MediaExtractor;
use clipscribe::output;
use clipscribe::segment::{AudioSplitter, SegmentPlan};
use clipscribe::transcribe::TranscriptionPipeline;
use clipscribe::utils;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_directive = if cli.verbose {
        "clipscribe=debug"
    } else {
        "clipscribe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Check for required external dependencies (non-fatal; tools may still appear later)
    let missing_deps = utils::check_dependencies().await;
    if !missing_deps.is_empty() {
        eprintln!("{} Dependency check warnings:", style("!").yellow().bold());
        for dep in missing_deps {
            eprintln!("   - {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let config = Config::load().await?;

    match cli.command {
        Commands::Fetch {
            url,
            output_dir,
            quality,
        } => {
            fetch(&url, output_dir, quality).await?;
        }
        Commands::Split {
            input,
            output_dir,
            max_size_mb,
            bitrate,
        } => {
            split(&config, &input, &output_dir, max_size_mb, bitrate, cli.quiet).await?;
        }
        Commands::Transcribe {
            input,
            output,
            format,
            keep_segments,
            model,
            max_size_mb,
            bitrate,
        } => {
            let mut config = config;
            if let Some(max_size_mb) = max_size_mb {
                config.split.max_size_mb = max_size_mb;
            }
            if let Some(bitrate) = bitrate {
                config.split.bitrate = bitrate;
            }
            if let Some(model) = model {
                config.api.model = model;
            }
            config.app.keep_segments |= keep_segments;
            config.validate()?;

            let pipeline = TranscriptionPipeline::new(config, cli.quiet)?;

            tracing::info!("Starting transcription for: {}", input);

            let result = pipeline.transcribe_from_input(&input).await?;

            match output {
                Some(path) => {
                    output::save_to_file(&result, &path, &format).await?;
                    println!("Transcription saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format)?;
                }
            }

            if let Some(dir) = &result.segments_dir {
                println!("Segments kept in: {}", dir.display());
            }

            if result.metadata.transcribed_count < result.metadata.segment_count {
                eprintln!(
                    "{} {} of {} segments failed to transcribe and are missing from the transcript",
                    style("!").yellow().bold(),
                    result.metadata.segment_count - result.metadata.transcribed_count,
                    result.metadata.segment_count
                );
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.save().await?;
                println!("Configuration written to: {}", Config::config_path()?.display());
            }
        }
        Commands::Platforms => {
            println!("Supported inputs:");
            println!("  - YouTube (youtube.com, youtu.be)");
            println!("  - Direct audio/video URLs");
            println!("  - Local audio files (mp3, m4a, wav, flac, ogg)");
            println!("  - Local video files (anything ffmpeg can read)");
        }
    }

    Ok(())
}

/// Download the audio track of a video URL as MP3 into `output_dir`.
async fn fetch(url: &str, output_dir: Option<PathBuf>, quality: u32) -> Result<()> {
    let youtube = YoutubeExtractor::new();
    if !youtube.supports_url(url) {
        anyhow::bail!("Invalid YouTube URL. Please enter a valid URL.");
    }

    let output_dir = match output_dir {
        Some(dir) => {
            if !dir.is_dir() {
                anyhow::bail!("Output directory '{}' does not exist.", dir.display());
            }
            dir
        }
        None => std::env::current_dir()?,
    };

    let info = youtube.extract_audio_info(url).await?;
    let title = info
        .title
        .clone()
        .unwrap_or_else(|| format!("audio_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));

    let target = output_dir.join(format!("{}.mp3", utils::sanitize_filename(&title)));

    tracing::info!("Downloading {} to {}", url, target.display());
    youtube.download_audio_direct(url, &target, quality).await?;

    println!(
        "{} Download and conversion to MP3 completed",
        style("ok").green().bold()
    );
    println!("Saved to: {}", target.display());

    Ok(())
}

/// Split a local audio file into size-bounded MP3 segments.
async fn split(
    config: &Config,
    input: &PathBuf,
    output_dir: &PathBuf,
    max_size_mb: Option<u64>,
    bitrate: Option<String>,
    quiet: bool,
) -> Result<()> {
    // Validate the plan before touching the input so bad parameters fail fast
    let bitrate: Bitrate = bitrate
        .as_deref()
        .unwrap_or(&config.split.bitrate)
        .parse()?;
    let plan = SegmentPlan::new(max_size_mb.unwrap_or(config.split.max_size_mb), bitrate)?;

    utils::check_file_accessible(input)?;

    let splitter = AudioSplitter::new(FfmpegCodec::new(), quiet);
    let written = splitter.split(input, output_dir, &plan, bitrate).await?;

    println!(
        "{} Wrote {} segments to {}",
        style("ok").green().bold(),
        written.len(),
        output_dir.display()
    );

    Ok(())
}
