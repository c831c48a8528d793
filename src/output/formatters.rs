use anyhow::Result;

use crate::transcribe::TranscriptionResult;

/// Plain text output: the combined transcript, newline-terminated.
pub fn format_as_text(result: &TranscriptionResult) -> String {
    let mut content = result.transcript.clone();
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content
}

/// JSON output: the full result including per-segment texts and metadata.
pub fn format_as_json(result: &TranscriptionResult) -> Result<String> {
    let json = serde_json::to_string_pretty(result)?;
    Ok(json)
}
