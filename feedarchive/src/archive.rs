//! HTTP client for the archive site: day listings and segment downloads.

use std::path::Path;

use chrono::NaiveDate;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::Credential;
use crate::error::{Error, Result};
use crate::types::{ArchiveSegmentRef, DownloadedFile};

const LISTING_URL: &str = "https://www.broadcastify.com/archives/ajax.php";
const DOWNLOAD_URL: &str = "https://www.broadcastify.com/archives/downloadv2";

/// The site serves browsers, not APIs; a browser UA keeps it happy.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Authenticated client for the archive site.
pub struct ArchiveClient {
    http: reqwest::Client,
    credential: Credential,
}

/// Day listing payload: rows of `[segment_id, start, end]` tuples.
#[derive(Deserialize)]
struct Listing {
    data: Vec<Vec<serde_json::Value>>,
}

impl ArchiveClient {
    pub fn new(credential: Credential) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, credential })
    }

    /// List the archive segment ids available for one feed on one day,
    /// in the order the site reports them.
    ///
    /// One request, no retry; any non-success response or malformed payload
    /// is an [`Error::Listing`].
    pub async fn list_segments(&self, feed_id: &str, date: NaiveDate) -> Result<Vec<String>> {
        let response = self
            .http
            .get(LISTING_URL)
            .query(&[
                ("feedId", feed_id),
                ("date", &date.format("%m/%d/%Y").to_string()),
            ])
            .header(reqwest::header::COOKIE, self.credential.header_value())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Listing(format!(
                "status {} listing feed {feed_id} on {date}",
                response.status()
            )));
        }

        let payload = response.text().await?;
        let ids = parse_listing(&payload)?;
        debug!(feed_id, %date, segments = ids.len(), "listed archive segments");
        Ok(ids)
    }

    /// Download one archive segment into `out_dir`.
    ///
    /// The site redirects to the actual file; the local filename is taken
    /// from the final resolved URL so it keeps the site's chronological
    /// naming.
    pub async fn fetch_segment(
        &self,
        segment: &ArchiveSegmentRef,
        out_dir: &Path,
    ) -> Result<DownloadedFile> {
        let url = format!(
            "{DOWNLOAD_URL}/{}/{}/{}",
            segment.feed_id,
            segment.date.format("%Y%m%d"),
            segment.segment_id
        );

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::COOKIE, self.credential.header_value())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "status {} for segment {} of feed {}",
                response.status(),
                segment.segment_id,
                segment.feed_id
            )));
        }

        let file_name = file_name_from_url(response.url(), &segment.segment_id);
        let path = out_dir.join(file_name);

        let mut file = std::fs::File::create(&path)?;
        let mut stream = response.bytes_stream();

        use std::io::Write;
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?)?;
        }
        file.flush()?;

        info!(path = %path.display(), "downloaded segment");

        Ok(DownloadedFile {
            path,
            feed_id: segment.feed_id.clone(),
            date: segment.date,
        })
    }
}

/// Extract the segment ids from a day-listing payload.
fn parse_listing(payload: &str) -> Result<Vec<String>> {
    let listing: Listing = serde_json::from_str(payload)
        .map_err(|e| Error::Listing(format!("malformed listing payload: {e}")))?;

    listing
        .data
        .iter()
        .map(|row| match row.first() {
            Some(serde_json::Value::String(id)) => Ok(id.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(Error::Listing("empty row in listing payload".into())),
        })
        .collect()
}

/// Local filename for a downloaded segment: the last path component of the
/// resolved URL, falling back to the segment id.
fn file_name_from_url(url: &reqwest::Url, segment_id: &str) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{segment_id}.mp3"))
}
