//! Transcript pass over a directory of downloaded archive audio.
//!
//! Each audio file gets diarized, transcribed, fused, and written out twice
//! under `transcripts/`: a structured JSON file with every field, and a
//! plain-text rendering grouped by speaker. A file that fails is logged and
//! skipped; the rest of the directory is still processed.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::diarize::Diarizer;
use crate::error::Result;
use crate::fuse::fuse;
use crate::transcribe::Transcriber;

const TRANSCRIPTS_SUBDIR: &str = "transcripts";

/// Transcribe every audio file in `dir`, writing results into
/// `dir/transcripts/`.
///
/// With no diarizer, fusion runs against an empty speaker sequence and every
/// entry carries the unknown-speaker identifier.
pub fn transcribe_directory(
    dir: &Path,
    transcriber: &dyn Transcriber,
    diarizer: Option<&dyn Diarizer>,
) -> Result<()> {
    let audio_files = list_audio_files(dir)?;
    if audio_files.is_empty() {
        info!(dir = %dir.display(), "no audio files to transcribe");
        return Ok(());
    }

    let transcript_dir = dir.join(TRANSCRIPTS_SUBDIR);
    std::fs::create_dir_all(&transcript_dir)?;

    for audio_path in &audio_files {
        info!(path = %audio_path.display(), "transcribing");
        if let Err(e) = transcribe_one(audio_path, &transcript_dir, transcriber, diarizer) {
            warn!(path = %audio_path.display(), error = %e, "transcription failed, skipping file");
        }
    }

    Ok(())
}

fn transcribe_one(
    audio_path: &Path,
    transcript_dir: &Path,
    transcriber: &dyn Transcriber,
    diarizer: Option<&dyn Diarizer>,
) -> Result<()> {
    let diarization = match diarizer {
        Some(d) => d.diarize(audio_path)?,
        None => Vec::new(),
    };
    let transcription = transcriber.transcribe(audio_path)?;

    let transcript = fuse(&transcription, &diarization);

    let base = audio_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".into());

    std::fs::write(
        transcript_dir.join(format!("{base}.json")),
        transcript.to_json_pretty()?,
    )?;
    std::fs::write(transcript_dir.join(format!("{base}.txt")), transcript.to_text())?;

    Ok(())
}

/// Audio files in `dir`, sorted by name — the combined day file is included
/// when present.
fn list_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "mp3") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{DiarizationSegment, TranscriptionSegment};

    struct StubTranscriber {
        fail_on: Option<&'static str>,
    }

    impl Transcriber for StubTranscriber {
        fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptionSegment>> {
            if let Some(name) = self.fail_on {
                if audio.file_name().is_some_and(|f| f == name) {
                    return Err(Error::Transcription("injected".into()));
                }
            }
            Ok(vec![TranscriptionSegment {
                start: 0.0,
                end: 2.0,
                text: "unit ten nine".into(),
                seek: 0,
            }])
        }
    }

    struct StubDiarizer;

    impl Diarizer for StubDiarizer {
        fn diarize(&self, _audio: &Path) -> Result<Vec<DiarizationSegment>> {
            Ok(vec![DiarizationSegment {
                start: 0.0,
                end: 3.0,
                label: "pya-7".into(),
            }])
        }
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_writes_both_projections_per_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.mp3"));
        touch(&dir.path().join("b.mp3"));

        transcribe_directory(
            dir.path(),
            &StubTranscriber { fail_on: None },
            Some(&StubDiarizer),
        )
        .unwrap();

        for base in ["a", "b"] {
            let json_path = dir.path().join(format!("transcripts/{base}.json"));
            let txt = std::fs::read_to_string(dir.path().join(format!("transcripts/{base}.txt")))
                .unwrap();
            assert!(json_path.exists());
            assert_eq!(txt, "SPEAKER_00\n[0:00:00] - unit ten nine\n");
        }

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("transcripts/a.json")).unwrap())
                .unwrap();
        assert_eq!(json["segments"][0]["speaker"], "SPEAKER_00");
        assert_eq!(json["text"], "unit ten nine ");
    }

    #[test]
    fn test_failed_file_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("bad.mp3"));
        touch(&dir.path().join("good.mp3"));

        transcribe_directory(
            dir.path(),
            &StubTranscriber {
                fail_on: Some("bad.mp3"),
            },
            Some(&StubDiarizer),
        )
        .unwrap();

        assert!(!dir.path().join("transcripts/bad.json").exists());
        assert!(dir.path().join("transcripts/good.json").exists());
    }

    #[test]
    fn test_no_diarizer_labels_unknown() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.mp3"));

        transcribe_directory(dir.path(), &StubTranscriber { fail_on: None }, None).unwrap();

        let txt = std::fs::read_to_string(dir.path().join("transcripts/a.txt")).unwrap();
        assert!(txt.starts_with("SPEAKER_00\n"));
    }

    #[test]
    fn test_empty_directory_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        transcribe_directory(dir.path(), &StubTranscriber { fail_on: None }, None).unwrap();
        assert!(!dir.path().join(TRANSCRIPTS_SUBDIR).exists());
    }
}
