//! Merge a day's downloaded segments into one continuous audio file.
//!
//! Segment filenames embed their start time, so a lexical sort recovers
//! chronological order. The merge itself is a lossless ffmpeg concat (no
//! re-encode); on success the per-segment sources are removed and the
//! combined file is also copied up into the feed directory.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Concatenate every segment file in `dir` into `combined_<feed>_<date>.mp3`.
///
/// Returns [`Error::NoFiles`] (touching nothing) when the directory holds no
/// segment files, and [`Error::Encode`] with the encoder's diagnostics when
/// ffmpeg fails. The concat list file is cleaned up on every exit path.
pub async fn combine_segments(dir: &Path, feed_id: &str, date: NaiveDate) -> Result<PathBuf> {
    let sources = list_segment_files(dir)?;
    if sources.is_empty() {
        return Err(Error::NoFiles {
            dir: dir.to_path_buf(),
        });
    }

    info!(count = sources.len(), dir = %dir.display(), "combining segments");

    let list_path = dir.join("concat_list.txt");
    std::fs::write(&list_path, concat_manifest(&sources))?;
    let _cleanup = CleanupGuard(&list_path);

    let output_name = format!("combined_{feed_id}_{}.mp3", date.format("%Y%m%d"));
    let output_path = dir.join(&output_name);

    let output = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_path)
        .args(["-c", "copy"])
        .arg(&output_path)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FfmpegNotFound
            } else {
                Error::Encode(format!("failed to run ffmpeg: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let truncated: String = stderr.chars().take(1000).collect();
        return Err(Error::Encode(format!("ffmpeg concat failed: {truncated}")));
    }

    for source in &sources {
        std::fs::remove_file(source)?;
    }
    debug!(count = sources.len(), "removed per-segment files");

    if let Some(feed_dir) = dir.parent() {
        std::fs::copy(&output_path, feed_dir.join(&output_name))?;
    }

    info!(path = %output_path.display(), "combined audio written");
    Ok(output_path)
}

/// Segment files in `dir`, lexically sorted, excluding any previous
/// combined output.
fn list_segment_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_mp3 = path.extension().is_some_and(|ext| ext == "mp3");
        let is_combined = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("combined_"));
        if is_mp3 && !is_combined {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// ffmpeg concat-demuxer manifest: one `file '...'` line per source, with
/// embedded single quotes escaped.
fn concat_manifest(sources: &[PathBuf]) -> String {
    let mut manifest = String::new();
    for source in sources {
        let escaped = source.display().to_string().replace('\'', r"'\''");
        manifest.push_str(&format!("file '{escaped}'\n"));
    }
    manifest
}

/// Removes the concat list file when dropped.
struct CleanupGuard<'a>(&'a Path);

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(self.0) {
            warn!(path = %self.0.display(), error = %e, "failed to clean up concat list");
        }
    }
}
