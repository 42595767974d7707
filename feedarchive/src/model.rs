//! Whisper ggml model catalog and on-demand download.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::error::{Error, Result};

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Anything smaller than this is an error page, not a model.
const MIN_MODEL_BYTES: u64 = 1_000_000;

/// Whisper model to transcribe with.
#[derive(Debug, Clone)]
pub enum WhisperModel {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV3,
    LargeV3Turbo,
    /// User-provided ggml file.
    Custom(PathBuf),
}

impl WhisperModel {
    /// Parse a model name as given on the command line.
    pub fn parse_name(name: &str) -> Option<Self> {
        match name {
            "tiny" => Some(Self::Tiny),
            "tiny.en" => Some(Self::TinyEn),
            "base" => Some(Self::Base),
            "base.en" => Some(Self::BaseEn),
            "small" => Some(Self::Small),
            "small.en" => Some(Self::SmallEn),
            "medium" => Some(Self::Medium),
            "medium.en" => Some(Self::MediumEn),
            "large-v3" => Some(Self::LargeV3),
            "large-v3-turbo" => Some(Self::LargeV3Turbo),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Tiny => "tiny",
            Self::TinyEn => "tiny.en",
            Self::Base => "base",
            Self::BaseEn => "base.en",
            Self::Small => "small",
            Self::SmallEn => "small.en",
            Self::Medium => "medium",
            Self::MediumEn => "medium.en",
            Self::LargeV3 => "large-v3",
            Self::LargeV3Turbo => "large-v3-turbo",
            Self::Custom(_) => "custom",
        }
    }

    /// Filename as published in the whisper.cpp model repository.
    fn filename(&self) -> String {
        match self {
            Self::Custom(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom-model.bin".into()),
            _ => format!("ggml-{}.bin", self.name()),
        }
    }

    /// Make sure the model file exists locally, downloading into
    /// `cache_dir` if necessary. Returns the path to the model.
    pub async fn ensure(&self, cache_dir: &Path) -> Result<PathBuf> {
        if let Self::Custom(path) = self {
            return if path.exists() {
                Ok(path.clone())
            } else {
                Err(Error::ModelNotFound { path: path.clone() })
            };
        }

        let model_path = cache_dir.join(self.filename());
        if model_path.exists() {
            info!(path = %model_path.display(), "model already cached");
            return Ok(model_path);
        }

        std::fs::create_dir_all(cache_dir).map_err(|e| {
            Error::Model(format!(
                "failed to create cache dir {}: {e}",
                cache_dir.display()
            ))
        })?;

        let url = format!("{MODEL_BASE_URL}/{}", self.filename());
        info!(%url, "downloading model");
        download_model(&url, &model_path).await?;

        Ok(model_path)
    }
}

/// Default model cache: `<cache dir>/feedarchive/models`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("feedarchive")
        .join("models")
}

async fn download_model(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::ModelDownload(format!("HTTP error: {e}")))?;

    let total_size = response.content_length().unwrap_or(0);

    let bar = ProgressBar::new(total_size);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    bar.set_message(format!(
        "Downloading {}",
        dest.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));

    // Download into a temp file and rename on completion so an interrupted
    // download never masquerades as a cached model.
    let tmp_path = dest.with_extension("bin.part");
    let mut file = std::fs::File::create(&tmp_path)?;
    let mut stream = response.bytes_stream();

    use std::io::Write;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        bar.inc(chunk.len() as u64);
    }
    file.flush()?;
    drop(file);

    let file_size = std::fs::metadata(&tmp_path)?.len();
    if file_size < MIN_MODEL_BYTES {
        std::fs::remove_file(&tmp_path).ok();
        return Err(Error::ModelDownload(format!(
            "downloaded file too small ({file_size} bytes) — likely an error page"
        )));
    }

    std::fs::rename(&tmp_path, dest)?;
    bar.finish_and_clear();

    if total_size > 0 && file_size != total_size {
        warn!(
            expected = total_size,
            actual = file_size,
            "file size mismatch — model may be corrupt"
        );
    }

    info!(path = %dest.display(), size = file_size, "model saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_round_trips() {
        for name in [
            "tiny",
            "tiny.en",
            "base",
            "base.en",
            "small",
            "small.en",
            "medium",
            "medium.en",
            "large-v3",
            "large-v3-turbo",
        ] {
            let model = WhisperModel::parse_name(name).unwrap();
            assert_eq!(model.name(), name);
        }
    }

    #[test]
    fn test_parse_name_rejects_unknown() {
        assert!(WhisperModel::parse_name("enormous").is_none());
        assert!(WhisperModel::parse_name("").is_none());
    }

    #[test]
    fn test_filename() {
        assert_eq!(WhisperModel::Tiny.filename(), "ggml-tiny.bin");
        assert_eq!(
            WhisperModel::LargeV3Turbo.filename(),
            "ggml-large-v3-turbo.bin"
        );
        assert_eq!(
            WhisperModel::Custom(PathBuf::from("/models/mine.bin")).filename(),
            "mine.bin"
        );
    }

    #[tokio::test]
    async fn test_ensure_custom_model_must_exist() {
        let missing = WhisperModel::Custom(PathBuf::from("/nonexistent/model.bin"));
        let result = missing.ensure(Path::new("/tmp")).await;
        assert!(matches!(result, Err(Error::ModelNotFound { .. })));
    }

    #[tokio::test]
    async fn test_ensure_custom_model_returns_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mine.bin");
        std::fs::write(&path, b"ggml").unwrap();

        let model = WhisperModel::Custom(path.clone());
        assert_eq!(model.ensure(dir.path()).await.unwrap(), path);
    }
}
