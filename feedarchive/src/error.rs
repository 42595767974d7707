use std::path::PathBuf;

/// All errors that can occur in feedarchive.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive listing failed: {0}")]
    Listing(String),

    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("no audio files found in {dir}")]
    NoFiles { dir: PathBuf },

    #[error("encoder failed: {0}")]
    Encode(String),

    #[error("ffmpeg not found — install with: apt install ffmpeg")]
    FfmpegNotFound,

    #[cfg(feature = "transcribe")]
    #[error("audio decoding error: {0}")]
    AudioDecode(String),

    #[cfg(feature = "transcribe")]
    #[error("audio file not found: {path}")]
    AudioNotFound { path: PathBuf },

    #[cfg(feature = "transcribe")]
    #[error("model error: {0}")]
    Model(String),

    #[cfg(feature = "transcribe")]
    #[error("model not found: {path}")]
    ModelNotFound { path: PathBuf },

    #[cfg(feature = "transcribe")]
    #[error("model download failed: {0}")]
    ModelDownload(String),

    #[cfg(feature = "transcribe")]
    #[error("transcription error: {0}")]
    Transcription(String),

    #[cfg(feature = "transcribe")]
    #[error("diarization failed: {0}")]
    Diarize(String),

    #[cfg(feature = "transcribe")]
    #[error("whisper error: {0}")]
    Whisper(#[from] whisper_rs::WhisperError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
