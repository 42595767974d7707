//! Speaker diarization through an external helper process.
//!
//! Diarization models live outside this crate; the helper is any command
//! that takes an audio path and writes RTTM records to stdout (the pyannote
//! wrapper script being the usual choice).

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::DiarizationSegment;

/// Helper command used when none is configured.
pub const DEFAULT_DIARIZE_COMMAND: &str = "pyannote-rttm";

/// Produces ordered speaker-attributed intervals for one audio file.
pub trait Diarizer {
    fn diarize(&self, audio: &Path) -> Result<Vec<DiarizationSegment>>;
}

/// Diarizer that runs an external command and parses RTTM from its stdout.
pub struct RttmDiarizer {
    command: String,
}

impl RttmDiarizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for RttmDiarizer {
    fn default() -> Self {
        Self::new(DEFAULT_DIARIZE_COMMAND)
    }
}

impl Diarizer for RttmDiarizer {
    fn diarize(&self, audio: &Path) -> Result<Vec<DiarizationSegment>> {
        debug!(command = %self.command, path = %audio.display(), "running diarization helper");

        let output = Command::new(&self.command)
            .arg(audio)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Diarize(format!(
                        "helper command {:?} not found — install it or pass a different one",
                        self.command
                    ))
                } else {
                    Error::Diarize(format!("failed to run {:?}: {e}", self.command))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let truncated: String = stderr.chars().take(1000).collect();
            return Err(Error::Diarize(format!(
                "{:?} exited with {}: {truncated}",
                self.command, output.status
            )));
        }

        parse_rttm(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse RTTM speaker records.
///
/// Record layout: `SPEAKER <file> <chan> <start> <duration> <ortho> <stype>
/// <label> <conf> <slat>`. Comment lines and non-SPEAKER record types are
/// skipped; a SPEAKER record that won't parse is an error.
fn parse_rttm(input: &str) -> Result<Vec<DiarizationSegment>> {
    let mut segments = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.first() != Some(&"SPEAKER") {
            continue;
        }
        if fields.len() < 8 {
            return Err(Error::Diarize(format!("short RTTM record: {line:?}")));
        }

        let start: f64 = fields[3]
            .parse()
            .map_err(|_| Error::Diarize(format!("bad start time in RTTM record: {line:?}")))?;
        let duration: f64 = fields[4]
            .parse()
            .map_err(|_| Error::Diarize(format!("bad duration in RTTM record: {line:?}")))?;

        segments.push(DiarizationSegment {
            start,
            end: start + duration,
            label: fields[7].to_string(),
        });
    }

    Ok(segments)
}
