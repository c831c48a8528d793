use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use tempfile::tempdir;

/// Build the binary command with an isolated config location.
///
/// Config discovery consults the working directory and the user config dir;
/// pointing both at throwaway directories keeps test runs from touching (or
/// depending on) a real configuration.
fn clipscribe(work_dir: &std::path::Path, config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("clipscribe").unwrap();
    cmd.current_dir(work_dir)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("OPENAI_API_KEY");
    cmd
}

#[test]
fn help_lists_the_chain_subcommands() -> Result<(), Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("clipscribe")?;
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("split"))
        .stdout(predicate::str::contains("transcribe"));
    Ok(())
}

#[test]
fn platforms_lists_supported_inputs() -> Result<(), Box<dyn Error>> {
    let work = tempdir()?;
    let config = tempdir()?;

    clipscribe(work.path(), config.path())
        .arg("platforms")
        .assert()
        .success()
        .stdout(predicate::str::contains("YouTube"));
    Ok(())
}

#[test]
fn split_rejects_zero_bitrate_before_reading_input() -> Result<(), Box<dyn Error>> {
    let work = tempdir()?;
    let config = tempdir()?;

    // The input file deliberately does not exist: plan validation must fail first.
    clipscribe(work.path(), config.path())
        .args(["split", "missing.mp3", "--bitrate", "0k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bitrate"));
    Ok(())
}

#[test]
fn split_rejects_malformed_bitrate() -> Result<(), Box<dyn Error>> {
    let work = tempdir()?;
    let config = tempdir()?;

    clipscribe(work.path(), config.path())
        .args(["split", "missing.mp3", "--bitrate", "fast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bitrate"));
    Ok(())
}

#[test]
fn split_rejects_zero_max_size() -> Result<(), Box<dyn Error>> {
    let work = tempdir()?;
    let config = tempdir()?;

    clipscribe(work.path(), config.path())
        .args(["split", "missing.mp3", "--max-size-mb", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive"));
    Ok(())
}

#[test]
fn split_fails_on_missing_input_file() -> Result<(), Box<dyn Error>> {
    let work = tempdir()?;
    let config = tempdir()?;

    clipscribe(work.path(), config.path())
        .args(["split", "missing.mp3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}

#[test]
fn transcribe_requires_an_api_key() -> Result<(), Box<dyn Error>> {
    let work = tempdir()?;
    let config = tempdir()?;

    clipscribe(work.path(), config.path())
        .args(["transcribe", "https://www.youtube.com/watch?v=abc123"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
    Ok(())
}

#[test]
fn transcribe_rejects_invalid_bitrate_override() -> Result<(), Box<dyn Error>> {
    let work = tempdir()?;
    let config = tempdir()?;

    clipscribe(work.path(), config.path())
        .args([
            "transcribe",
            "https://www.youtube.com/watch?v=abc123",
            "--bitrate",
            "0k",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bitrate"));
    Ok(())
}

#[test]
fn config_show_prints_defaults() -> Result<(), Box<dyn Error>> {
    let work = tempdir()?;
    let config = tempdir()?;

    clipscribe(work.path(), config.path())
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("250 MB"))
        .stdout(predicate::str::contains("192k"));
    Ok(())
}
