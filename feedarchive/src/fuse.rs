//! Fuse transcription and diarization output into one labeled transcript.
//!
//! Transcription and diarization run independently over the same audio, so
//! their segment boundaries never line up exactly. For each transcription
//! segment we pick the **first** diarization segment (in diarization order)
//! that overlaps it at all; when several overlap, the earliest listed wins
//! rather than the one with the largest overlap. Scanner transmissions are
//! short and rarely overlap, so overlap existence is a good enough signal
//! and keeps the pairing deterministic on ambiguous input.
//!
//! Raw diarization labels are opaque and unstable across files, so every
//! label (including the unknown-speaker sentinel) is renumbered to
//! `SPEAKER_00`, `SPEAKER_01`, … in first-seen order, scoped to one file.

use std::collections::HashMap;

use crate::types::{DiarizationSegment, FusedSegment, FusedTranscript, TranscriptionSegment};

/// Label used when no diarization segment overlaps a transcription segment.
const UNKNOWN_SPEAKER: &str = "SPEAKER_UNK";

/// Renumbers opaque diarization labels into stable sequential identifiers,
/// in first-seen order. Scoped to a single fusion run.
#[derive(Default)]
struct SpeakerMap {
    ids: HashMap<String, String>,
}

impl SpeakerMap {
    fn resolve(&mut self, label: &str) -> String {
        if let Some(id) = self.ids.get(label) {
            return id.clone();
        }
        let id = format!("SPEAKER_{:02}", self.ids.len());
        self.ids.insert(label.to_string(), id.clone());
        id
    }
}

/// Whether a transcription interval and a diarization interval overlap.
///
/// Three conditions, checked in this order: the transcription start falls
/// inside `[start, end)`, the transcription end falls inside `(start, end]`,
/// or the diarization segment is fully contained in the transcription
/// segment.
fn overlaps(t: &TranscriptionSegment, d: &DiarizationSegment) -> bool {
    (t.start >= d.start && t.start < d.end)
        || (t.end > d.start && t.end <= d.end)
        || (t.start <= d.start && t.end >= d.end)
}

/// Combine transcription segments and diarization segments into one ordered,
/// speaker-labeled transcript.
///
/// Output order is transcription input order and no segment is ever dropped.
/// An empty diarization sequence labels everything with the unknown-speaker
/// sentinel (which is renumbered like any other label). The result is fully
/// deterministic: the same inputs always produce the same output.
pub fn fuse(
    transcription: &[TranscriptionSegment],
    diarization: &[DiarizationSegment],
) -> FusedTranscript {
    let mut speakers = SpeakerMap::default();
    let mut text = String::new();
    let mut segments = Vec::with_capacity(transcription.len());

    for t in transcription {
        let label = diarization
            .iter()
            .find(|d| overlaps(t, d))
            .map_or(UNKNOWN_SPEAKER, |d| d.label.as_str());

        let speaker = speakers.resolve(label);

        text.push_str(&t.text);
        text.push(' ');

        segments.push(FusedSegment {
            text: t.text.clone(),
            start: t.start,
            end: t.end,
            seek: t.seek,
            speaker,
        });
    }

    FusedTranscript { text, segments }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(start: f64, end: f64, text: &str) -> TranscriptionSegment {
        TranscriptionSegment {
            start,
            end,
            text: text.into(),
            seek: (start * 100.0) as i64,
        }
    }

    fn d(start: f64, end: f64, label: &str) -> DiarizationSegment {
        DiarizationSegment {
            start,
            end,
            label: label.into(),
        }
    }

    fn speakers(out: &FusedTranscript) -> Vec<&str> {
        out.segments.iter().map(|s| s.speaker.as_str()).collect()
    }

    #[test]
    fn test_matched_and_unmatched_segments() {
        // Second segment starts after the only diarization interval ends,
        // so it falls through to the sentinel — which still gets the next
        // sequential identifier.
        let out = fuse(
            &[t(0.0, 2.0, "a"), t(3.0, 5.0, "b")],
            &[d(0.0, 2.5, "X")],
        );

        assert_eq!(speakers(&out), ["SPEAKER_00", "SPEAKER_01"]);
        assert_eq!(out.segments[0].text, "a");
        assert_eq!(out.segments[1].text, "b");
        assert_eq!(out.text, "a b ");
    }

    #[test]
    fn test_first_match_wins_over_larger_overlap() {
        // Both diarization segments overlap [1, 4]; "A" only barely, "B"
        // almost entirely. First in diarization order still wins.
        let out = fuse(
            &[t(1.0, 4.0, "hit")],
            &[d(0.0, 1.5, "A"), d(1.5, 4.0, "B")],
        );

        assert_eq!(out.segments[0].speaker, "SPEAKER_00");
        // The winner was "A" — a second segment known to be "A" confirms it.
        let out = fuse(
            &[t(1.0, 4.0, "hit"), t(0.0, 1.2, "also a")],
            &[d(0.0, 1.5, "A"), d(1.5, 4.0, "B")],
        );
        assert_eq!(speakers(&out), ["SPEAKER_00", "SPEAKER_00"]);
    }

    #[test]
    fn test_containment_condition_matches() {
        // Diarization segment strictly inside the transcription segment:
        // neither endpoint of t falls inside d, only the containment rule
        // can match it.
        let out = fuse(&[t(0.0, 10.0, "long")], &[d(4.0, 5.0, "X")]);
        assert_eq!(out.segments[0].speaker, "SPEAKER_00");
        assert_ne!(out.segments[0].speaker, UNKNOWN_SPEAKER);
    }

    #[test]
    fn test_boundary_touch_is_not_overlap() {
        // t ends exactly where d starts and vice versa — the half-open
        // interval checks must not match either side.
        let out = fuse(&[t(0.0, 2.0, "before")], &[d(2.0, 4.0, "X")]);
        assert_eq!(out.segments[0].speaker, "SPEAKER_00");

        let unk = fuse(&[t(0.0, 2.0, "x")], &[]);
        assert_eq!(out.segments[0].speaker, unk.segments[0].speaker);
    }

    #[test]
    fn test_first_seen_order_is_stable() {
        let out = fuse(
            &[
                t(0.0, 1.0, "one"),
                t(1.0, 2.0, "two"),
                t(2.0, 3.0, "three"),
                t(3.0, 4.0, "four"),
            ],
            &[
                d(0.0, 1.0, "B"),
                d(1.0, 2.0, "A"),
                d(2.0, 3.0, "B"),
                d(3.0, 4.0, "A"),
            ],
        );

        // "B" is seen first so it gets SPEAKER_00 no matter how often "A"
        // recurs later.
        assert_eq!(
            speakers(&out),
            ["SPEAKER_00", "SPEAKER_01", "SPEAKER_00", "SPEAKER_01"]
        );
    }

    #[test]
    fn test_empty_transcription_yields_empty_output() {
        let out = fuse(&[], &[d(0.0, 5.0, "X")]);
        assert!(out.segments.is_empty());
        assert!(out.text.is_empty());
    }

    #[test]
    fn test_empty_diarization_labels_everything_unknown() {
        let out = fuse(&[t(0.0, 1.0, "a"), t(1.0, 2.0, "b")], &[]);
        // All entries share the single sentinel-derived identifier.
        assert_eq!(speakers(&out), ["SPEAKER_00", "SPEAKER_00"]);
    }

    #[test]
    fn test_no_segment_is_dropped() {
        let transcription: Vec<_> =
            (0..20).map(|i| t(i as f64, i as f64 + 0.5, "x")).collect();
        let out = fuse(&transcription, &[d(3.0, 4.0, "X")]);
        assert_eq!(out.segments.len(), transcription.len());
    }

    #[test]
    fn test_fusion_is_deterministic() {
        let transcription = [t(0.0, 2.0, "a"), t(2.5, 5.0, "b"), t(6.0, 9.0, "c")];
        let diarization = [d(0.0, 3.0, "P"), d(3.0, 7.0, "Q"), d(7.0, 9.0, "P")];

        let first = fuse(&transcription, &diarization);
        let second = fuse(&transcription, &diarization);

        assert_eq!(first.text, second.text);
        assert_eq!(first.segments, second.segments);
        assert_eq!(
            first.to_json_pretty().unwrap(),
            second.to_json_pretty().unwrap()
        );
    }
}
