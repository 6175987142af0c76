//! No-op extractor for graceful degradation

use super::traits::Extractor;
use crate::types::MediaInfo;
use async_trait::async_trait;
use std::path::Path;

/// Extractor used when the backend a platform needs is unavailable
///
/// Every call fails with `Error::NotSupported`, which the pipeline reports to
/// the user as an ordinary per-request failure instead of refusing to start.
///
/// # Examples
///
/// ```
/// use linkgrab::extractor::{Extractor, NoOpExtractor};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() {
/// let extractor = NoOpExtractor;
/// let result = extractor.extract("https://youtu.be/abc", Path::new("/tmp")).await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpExtractor;

#[async_trait]
impl Extractor for NoOpExtractor {
    async fn extract(&self, _url: &str, _download_dir: &Path) -> crate::Result<Option<MediaInfo>> {
        Err(crate::Error::NotSupported(
            "downloading from this platform requires the yt-dlp binary. \
             Set YTDLP_PATH or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
