//! Speech-to-text over downloaded archive audio.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio;
use crate::error::{Error, Result};
use crate::model::{default_cache_dir, WhisperModel};
use crate::types::TranscriptionSegment;

/// Primes the decoder for the domain; scanner audio is short clipped
/// phrases over noisy channels, which whisper otherwise mistakes for music
/// or silence.
const INITIAL_PROMPT: &str = "you are listening to police scanner radio traffic";

const BEAM_SIZE: i32 = 5;

/// Produces ordered transcription segments for one audio file.
pub trait Transcriber {
    fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptionSegment>>;
}

/// Options for building a [`WhisperTranscriber`].
pub struct TranscribeOptions {
    pub model: WhisperModel,
    pub gpu: bool,
    pub cache_dir: Option<PathBuf>,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            model: WhisperModel::LargeV3Turbo,
            gpu: false,
            cache_dir: None,
        }
    }
}

impl TranscribeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: WhisperModel) -> Self {
        self.model = model;
        self
    }

    pub fn gpu(mut self, enabled: bool) -> Self {
        self.gpu = enabled;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn resolve_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

/// whisper.cpp-backed transcription, tuned for scanner traffic.
///
/// The model is loaded once; each audio file gets a fresh decode state.
pub struct WhisperTranscriber {
    ctx: WhisperContext,
}

impl WhisperTranscriber {
    /// Ensure the model is cached locally and load it.
    pub async fn new(options: &TranscribeOptions) -> Result<Self> {
        let cache_dir = options.resolve_cache_dir();
        let model_path = options.model.ensure(&cache_dir).await?;

        info!(model = %model_path.display(), "loading whisper model");

        let mut ctx_params = WhisperContextParameters::new();
        ctx_params.use_gpu(options.gpu);

        let ctx = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| Error::Model("model path contains invalid UTF-8".into()))?,
            ctx_params,
        )?;

        Ok(Self { ctx })
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, path: &Path) -> Result<Vec<TranscriptionSegment>> {
        let samples = audio::load_samples(path)?;

        let mut state = self.ctx.create_state()?;

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: BEAM_SIZE,
            patience: -1.0,
        });
        params.set_language(Some("en"));
        params.set_initial_prompt(INITIAL_PROMPT);
        // Each transmission is independent; conditioning on previous text
        // drags hallucinations across silence gaps.
        params.set_no_context(true);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        info!(path = %path.display(), samples = samples.len(), "running transcription");
        state.full(params, &samples)?;

        let num_segments = state.full_n_segments();
        debug!(num_segments, "transcription complete");

        let mut segments = Vec::with_capacity(num_segments as usize);
        for i in 0..num_segments {
            let segment = state
                .get_segment(i)
                .ok_or_else(|| Error::Transcription(format!("segment {i} not found")))?;

            let start_ts = segment.start_timestamp();
            let end_ts = segment.end_timestamp();
            let text = segment
                .to_str_lossy()
                .map_err(|e| Error::Transcription(format!("segment text error: {e}")))?
                .into_owned();

            segments.push(TranscriptionSegment {
                start: start_ts as f64 / 100.0,
                end: end_ts as f64 / 100.0,
                text,
                seek: start_ts,
            });
        }

        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = TranscribeOptions::default();
        assert_eq!(options.model.name(), "large-v3-turbo");
        assert!(!options.gpu);
        assert_eq!(options.resolve_cache_dir(), default_cache_dir());
    }

    #[test]
    fn test_options_cache_dir_override() {
        let options = TranscribeOptions::new().cache_dir("/models");
        assert_eq!(options.resolve_cache_dir(), PathBuf::from("/models"));
    }
}
