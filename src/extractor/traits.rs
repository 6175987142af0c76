//! The extractor contract

use crate::types::MediaInfo;
use async_trait::async_trait;
use std::path::Path;

/// Trait for platform-specific media extraction
///
/// An extractor turns a URL into a downloaded artifact. Implementations may
/// shell out to external tools, talk HTTP directly, or refuse gracefully when
/// their backend is unavailable. The pipeline depends only on this contract.
///
/// # Examples
///
/// ```no_run
/// use linkgrab::extractor::{Extractor, YtDlpExtractor};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = YtDlpExtractor::from_path()
///     .expect("yt-dlp binary not found");
///
/// match extractor.extract("https://youtu.be/abc", Path::new("./downloads")).await? {
///     Some(media) => println!("downloaded {} bytes to {:?}", media.file_size, media.file_path),
///     None => println!("nothing to download"),
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Download the media behind `url` into `download_dir`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(media))` with `media.file_path` naming a readable file
    ///   already written under `download_dir`
    /// - `Ok(None)` when the page has nothing extractable; this is a valid
    ///   negative result, not a failure
    ///
    /// # Errors
    ///
    /// Returns an error on network failures, malformed pages, platform-side
    /// refusals or a missing backend. Implementations never return a
    /// partially populated [`MediaInfo`], and remove their own partial files
    /// both before returning an error and when the future is dropped mid-run
    /// (see [`PartialArtifacts`](crate::utils::PartialArtifacts)).
    async fn extract(&self, url: &str, download_dir: &Path) -> crate::Result<Option<MediaInfo>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
