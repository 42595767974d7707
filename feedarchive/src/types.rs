use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One downloadable archive unit within a feed's day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSegmentRef {
    pub feed_id: String,
    pub date: NaiveDate,
    pub segment_id: String,
}

/// A successfully materialized local audio file.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub feed_id: String,
    pub date: NaiveDate,
}

/// One unit of recognized speech from the transcription engine.
///
/// `seek` is the engine's decode-window offset for the segment, carried
/// through to the structured output unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub seek: i64,
}

/// One interval of attributed speaker time from the diarization engine.
///
/// Labels are opaque tokens; they are only stable within the file they
/// came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationSegment {
    pub start: f64,
    pub end: f64,
    pub label: String,
}

/// A transcription segment with its resolved speaker identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub seek: i64,
    pub speaker: String,
}

/// A complete speaker-labeled transcript for one audio file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedTranscript {
    pub text: String,
    pub segments: Vec<FusedSegment>,
}

impl FusedTranscript {
    /// Structured projection: all fields, pretty-printed JSON.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable projection: a speaker header line whenever the
    /// speaker changes, then one `[H:MM:SS] - text` line per segment.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let mut current_speaker: Option<&str> = None;

        for seg in &self.segments {
            if current_speaker != Some(seg.speaker.as_str()) {
                out.push_str(&seg.speaker);
                out.push('\n');
                current_speaker = Some(&seg.speaker);
            }
            out.push_str(&format!(
                "[{}] - {}\n",
                format_clock_time(seg.start),
                seg.text
            ));
        }

        out
    }
}

/// Format seconds as a wall-clock offset `H:MM:SS`, truncated to whole
/// seconds. Hours are not zero-padded.
pub(crate) fn format_clock_time(seconds: f64) -> String {
    let total = seconds as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h}:{m:02}:{s:02}")
}
