//! Decode archive audio into samples whisper.cpp can consume.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Sample rate whisper.cpp expects.
pub(crate) const SAMPLE_RATE: u32 = 16_000;

/// Decode an audio file to 16 kHz mono f32 samples.
///
/// ffmpeg does the decoding, downmixing, and resampling in one subprocess;
/// every format the archive serves (and anything else ffmpeg reads) works.
pub(crate) fn load_samples(path: &Path) -> Result<Vec<f32>> {
    if !path.exists() {
        return Err(Error::AudioNotFound {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), "decoding audio");

    let output = Command::new("ffmpeg")
        .args(["-nostdin", "-i"])
        .arg(path)
        .args([
            "-f",
            "s16le",
            "-ac",
            "1",
            "-acodec",
            "pcm_s16le",
            "-ar",
            &SAMPLE_RATE.to_string(),
            "-",
        ])
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FfmpegNotFound
            } else {
                Error::AudioDecode(format!("failed to run ffmpeg: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::AudioDecode(format!("ffmpeg failed: {stderr}")));
    }

    if output.stdout.is_empty() {
        return Err(Error::AudioDecode("ffmpeg produced no output".into()));
    }

    let samples = pcm_s16le_to_f32(&output.stdout);
    debug!(
        samples = samples.len(),
        duration_secs = format!("{:.1}", samples.len() as f64 / SAMPLE_RATE as f64),
        "audio decoded"
    );

    Ok(samples)
}

/// Convert raw signed 16-bit little-endian PCM to f32 in [-1.0, 1.0].
fn pcm_s16le_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]) as f32 / 32768.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_pcm_conversion() {
        let bytes = [
            0x00, 0x00, // 0
            0xff, 0x7f, // i16::MAX
            0x00, 0x80, // i16::MIN
        ];
        let samples = pcm_s16le_to_f32(&bytes);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - (32767.0 / 32768.0)).abs() < 1e-6);
        assert_eq!(samples[2], -1.0);
    }

    #[test]
    fn test_pcm_conversion_ignores_trailing_byte() {
        let samples = pcm_s16le_to_f32(&[0x00, 0x00, 0x7f]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_samples(&PathBuf::from("/nonexistent/audio.mp3"));
        assert!(matches!(result, Err(Error::AudioNotFound { .. })));
    }
}
