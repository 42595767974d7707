//! Bounded-concurrency download pool.
//!
//! One batch covers one day's segments. Up to `jobs` downloads run at a
//! time; a failed segment is logged and skipped without disturbing its
//! siblings, and the batch only returns once every submitted download has
//! finished one way or the other — callers rely on that barrier before
//! concatenating the day's files.

use std::future::Future;
use std::path::Path;

use futures_util::{stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::archive::ArchiveClient;
use crate::error::Result;
use crate::types::{ArchiveSegmentRef, DownloadedFile};

/// Download every segment in the batch into `out_dir`.
///
/// Returns the files that materialized; failures are logged per segment and
/// excluded. No retry.
pub async fn fetch_all(
    client: &ArchiveClient,
    segments: Vec<ArchiveSegmentRef>,
    out_dir: &Path,
    jobs: usize,
) -> Vec<DownloadedFile> {
    let label = segments
        .first()
        .map(|s| s.date.format("%Y/%m/%d").to_string())
        .unwrap_or_default();

    fetch_with(segments, jobs, &label, |segment| async move {
        client.fetch_segment(&segment, out_dir).await
    })
    .await
}

/// Pool core, generic over the fetch operation so the concurrency and
/// failure-isolation behavior is testable without a network.
async fn fetch_with<F, Fut>(
    segments: Vec<ArchiveSegmentRef>,
    jobs: usize,
    label: &str,
    fetch: F,
) -> Vec<DownloadedFile>
where
    F: Fn(ArchiveSegmentRef) -> Fut,
    Fut: Future<Output = Result<DownloadedFile>>,
{
    let bar = ProgressBar::new(segments.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{wide_bar:.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    bar.set_message(label.to_string());

    let downloaded: Vec<Option<DownloadedFile>> = stream::iter(segments)
        .map(|segment| {
            let bar = bar.clone();
            let segment_id = segment.segment_id.clone();
            let future = fetch(segment);
            async move {
                let result = future.await;
                bar.inc(1);
                match result {
                    Ok(file) => Some(file),
                    Err(e) => {
                        warn!(segment = %segment_id, error = %e, "segment download failed");
                        None
                    }
                }
            }
        })
        .buffer_unordered(jobs.max(1))
        .collect()
        .await;

    bar.finish_and_clear();
    downloaded.into_iter().flatten().collect()
}
