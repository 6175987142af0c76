//! Media extraction
//!
//! This module provides a trait-based architecture for turning URLs into
//! downloaded artifacts. The pipeline only depends on the [`Extractor`]
//! contract; which implementation serves which platform is decided once, at
//! startup, by an [`ExtractorSet`].
//!
//! ## Architecture
//!
//! - [`YtDlpExtractor`]: runs the external `yt-dlp` binary (YouTube, Instagram, TikTok)
//! - [`HttpExtractor`]: downloads URLs that point straight at a media file
//! - [`GenericExtractor`]: HTTP first, then an optional fallback extractor
//! - [`NoOpExtractor`]: refuses every request when a backend is unavailable
//!
//! ## Usage
//!
//! ```no_run
//! use linkgrab::extractor::ExtractorSet;
//! use linkgrab::{Config, Platform};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractors = ExtractorSet::from_config(&Config::default())?;
//!     let extractor = extractors.for_platform(Platform::Youtube);
//!     let media = extractor
//!         .extract("https://youtu.be/abc", Path::new("./downloads"))
//!         .await?;
//!     println!("{:?}", media);
//!     Ok(())
//! }
//! ```

mod http;
mod noop;
mod parser;
mod traits;
mod ytdlp;

pub use http::{GenericExtractor, HttpExtractor};
pub use noop::NoOpExtractor;
pub use parser::{DownloadedFile, ExitStatus, YtDlpOutcome, parse_ytdlp_output};
pub use traits::Extractor;
pub use ytdlp::YtDlpExtractor;

use crate::config::Config;
use crate::types::Platform;
use std::sync::Arc;
use tracing::{info, warn};

/// Binding of every [`Platform`] to the extractor that serves it
///
/// Lookup is total: each platform always has an extractor.
#[derive(Clone)]
pub struct ExtractorSet {
    youtube: Arc<dyn Extractor>,
    instagram: Arc<dyn Extractor>,
    tiktok: Arc<dyn Extractor>,
    generic: Arc<dyn Extractor>,
}

impl ExtractorSet {
    /// Bind every platform to the same extractor
    pub fn uniform(extractor: Arc<dyn Extractor>) -> Self {
        Self {
            youtube: extractor.clone(),
            instagram: extractor.clone(),
            tiktok: extractor.clone(),
            generic: extractor,
        }
    }

    /// Replace the extractor bound to one platform
    #[must_use]
    pub fn with(mut self, platform: Platform, extractor: Arc<dyn Extractor>) -> Self {
        match platform {
            Platform::Youtube => self.youtube = extractor,
            Platform::Instagram => self.instagram = extractor,
            Platform::Tiktok => self.tiktok = extractor,
            Platform::Generic => self.generic = extractor,
        }
        self
    }

    /// Extractor bound to `platform`
    pub fn for_platform(&self, platform: Platform) -> &Arc<dyn Extractor> {
        match platform {
            Platform::Youtube => &self.youtube,
            Platform::Instagram => &self.instagram,
            Platform::Tiktok => &self.tiktok,
            Platform::Generic => &self.generic,
        }
    }

    /// Build the standard bindings from configuration
    ///
    /// yt-dlp is taken from `tools.ytdlp_path`, or searched on PATH when
    /// `tools.search_path` is set. Without it, YouTube, Instagram and TikTok
    /// links fail per request with a "not supported" notice and generic links
    /// are limited to direct media URLs.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let ytdlp = match &config.tools.ytdlp_path {
            Some(path) => Some(YtDlpExtractor::new(path.clone())),
            None if config.tools.search_path => YtDlpExtractor::from_path(),
            None => None,
        };

        let http = HttpExtractor::new(config.http_timeout)?;

        let set = match ytdlp {
            Some(ytdlp) => {
                info!(binary = ?ytdlp.binary_path(), "using yt-dlp for platform extraction");
                let generic_fallback: Arc<dyn Extractor> =
                    Arc::new(ytdlp.clone().for_platform(Platform::Generic));
                Self {
                    youtube: Arc::new(ytdlp.clone().for_platform(Platform::Youtube)),
                    instagram: Arc::new(ytdlp.clone().for_platform(Platform::Instagram)),
                    tiktok: Arc::new(ytdlp.for_platform(Platform::Tiktok)),
                    generic: Arc::new(GenericExtractor::new(http, Some(generic_fallback))),
                }
            }
            None => {
                warn!("yt-dlp not found, only direct media links can be downloaded");
                Self::uniform(Arc::new(NoOpExtractor))
                    .with(Platform::Generic, Arc::new(GenericExtractor::new(http, None)))
            }
        };

        Ok(set)
    }
}

impl std::fmt::Debug for ExtractorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorSet")
            .field("youtube", &self.youtube.name())
            .field("instagram", &self.instagram.name())
            .field("tiktok", &self.tiktok.name())
            .field("generic", &self.generic.name())
            .finish()
    }
}
