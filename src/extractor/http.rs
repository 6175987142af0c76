//! Direct HTTP extraction and the generic fallback extractor

use super::traits::Extractor;
use crate::error::ExtractError;
use crate::types::{MediaInfo, MediaType};
use crate::utils::{
    PartialArtifacts, artifact_token, extension_for_content_type, filename_from_response,
    get_unique_path, media_type_from_content_type, media_type_from_path, sanitize_stem,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Extractor for URLs that point straight at a media file
///
/// The response's `Content-Type` decides: video, image, audio and common
/// document types are streamed to disk; web pages and anything else yield
/// `Ok(None)`.
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: reqwest::Client,
}

impl HttpExtractor {
    /// Create an extractor whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("linkgrab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                crate::Error::Io(std::io::Error::other(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, url: &str, download_dir: &Path) -> crate::Result<Option<MediaInfo>> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let Some(mut media_type) = media_type_from_content_type(&content_type) else {
            debug!(url, %content_type, "response is not a media file");
            return Ok(None);
        };

        let original_name = filename_from_response(&response, url);
        let name_path = original_name.as_deref().map(Path::new);

        // Servers often label real media as octet-stream; trust the extension then.
        if media_type == MediaType::Document
            && let Some(p) = name_path
        {
            media_type = media_type_from_path(p);
        }

        let stem = name_path
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .map(sanitize_stem)
            .unwrap_or_else(|| "download".to_string());
        let extension = name_path
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(|e| sanitize_stem(e).to_ascii_lowercase())
            .or_else(|| extension_for_content_type(&content_type).map(str::to_string))
            .unwrap_or_else(|| "bin".to_string());

        let file_path = get_unique_path(
            &download_dir.join(format!("{}-{}.{}", stem, artifact_token(), extension)),
        )?;

        debug!(url, ?file_path, %content_type, "streaming media file");

        let partial = PartialArtifacts::file(&file_path);
        let mut file = tokio::fs::File::create(&file_path).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        partial.keep();

        Ok(Some(MediaInfo {
            media_type,
            file_path,
            file_size: written,
            caption: original_name.unwrap_or_default(),
            direct_url: Some(url.to_string()),
        }))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Catch-all extractor for hosts without a dedicated one
///
/// Tries a direct HTTP fetch first; when the URL is a page rather than a
/// media file, or the server refuses the plain request with an error status
/// (sites often answer 403/429 to non-browser clients), hands it to the
/// fallback extractor (yt-dlp knows many more sites) if one is configured.
pub struct GenericExtractor {
    http: HttpExtractor,
    fallback: Option<Arc<dyn Extractor>>,
}

impl GenericExtractor {
    /// Create a generic extractor
    pub fn new(http: HttpExtractor, fallback: Option<Arc<dyn Extractor>>) -> Self {
        Self { http, fallback }
    }
}

#[async_trait]
impl Extractor for GenericExtractor {
    async fn extract(&self, url: &str, download_dir: &Path) -> crate::Result<Option<MediaInfo>> {
        match self.http.extract(url, download_dir).await {
            Ok(Some(media)) => return Ok(Some(media)),
            Ok(None) => {}
            Err(crate::Error::Extraction(ExtractError::Http { status, .. }))
                if self.fallback.is_some() =>
            {
                debug!(url, status, "direct fetch refused");
            }
            Err(e) => return Err(e),
        }

        match &self.fallback {
            Some(fallback) => {
                debug!(url, fallback = fallback.name(), "no direct media, trying fallback");
                fallback.extract(url, download_dir).await
            }
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "generic"
    }
}
