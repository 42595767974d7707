//! Radio-scanner archive downloader — feed archives in, combined audio and
//! speaker-labeled transcripts out.
//!
//! **feedarchive** handles the full pipeline: authenticated day listings,
//! bounded-concurrency segment downloads, lossless per-day concatenation
//! (via ffmpeg), and speech-to-text (via whisper.cpp) fused with external
//! speaker diarization into one labeled transcript per audio file.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> feedarchive::Result<()> {
//! use feedarchive::auth::{self, JsonFileStore};
//! use feedarchive::{ArchiveClient, DateSpec, DownloadOptions};
//!
//! let store = JsonFileStore::new(JsonFileStore::default_path());
//! let credential = auth::ensure_credential(&store, "user", "secret").await?;
//! let client = ArchiveClient::new(credential)?;
//!
//! // Fetch the last three days of a feed and merge each day into one file.
//! let date_dirs = feedarchive::download_feed(
//!     &client,
//!     "41923",
//!     &DateSpec::PastDays(2),
//!     &DownloadOptions::new().combine(true).jobs(4),
//! )
//! .await?;
//! println!("downloaded {} day(s)", date_dirs.len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod auth;
pub mod combine;
pub mod dates;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod fuse;
pub mod types;

#[cfg(feature = "transcribe")]
pub(crate) mod audio;
#[cfg(feature = "transcribe")]
pub mod diarize;
#[cfg(feature = "transcribe")]
pub mod model;
#[cfg(feature = "transcribe")]
pub mod transcribe;
#[cfg(feature = "transcribe")]
pub mod transcripts;

pub use archive::ArchiveClient;
pub use auth::{Credential, CredentialStore, JsonFileStore};
pub use dates::DateSpec;
pub use driver::{download_feed, DownloadOptions};
pub use error::{Error, Result};
pub use fuse::fuse;
pub use types::{
    ArchiveSegmentRef, DiarizationSegment, DownloadedFile, FusedSegment, FusedTranscript,
    TranscriptionSegment,
};

#[cfg(feature = "transcribe")]
pub use diarize::{Diarizer, RttmDiarizer};
#[cfg(feature = "transcribe")]
pub use model::WhisperModel;
#[cfg(feature = "transcribe")]
pub use transcribe::{TranscribeOptions, Transcriber, WhisperTranscriber};
#[cfg(feature = "transcribe")]
pub use transcripts::transcribe_directory;
