//! Fuse transcription and diarization segments and print both projections.
//!
//! Usage: cargo run --example fuse

use feedarchive::{DiarizationSegment, TranscriptionSegment};

fn main() -> feedarchive::Result<()> {
    let transcription = vec![
        TranscriptionSegment {
            start: 0.4,
            end: 2.1,
            text: "engine five one responding".into(),
            seek: 40,
        },
        TranscriptionSegment {
            start: 3.0,
            end: 4.8,
            text: "copy engine five one".into(),
            seek: 300,
        },
        TranscriptionSegment {
            start: 9.2,
            end: 11.0,
            text: "on scene".into(),
            seek: 920,
        },
    ];

    let diarization = vec![
        DiarizationSegment {
            start: 0.0,
            end: 2.5,
            label: "A".into(),
        },
        DiarizationSegment {
            start: 2.8,
            end: 5.0,
            label: "B".into(),
        },
    ];

    let transcript = feedarchive::fuse(&transcription, &diarization);

    println!("{}", transcript.to_text());
    println!("{}", transcript.to_json_pretty()?);

    Ok(())
}
