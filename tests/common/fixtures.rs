//! Mock reply channel and extractors shared by the integration tests

use async_trait::async_trait;
use linkgrab::extractor::Extractor;
use linkgrab::reply::SendResult;
use linkgrab::{Channel, DeliveryError, ExtractError, MediaInfo, MediaType, ReplyChannel};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One message the bot sent back
#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    /// Text notice
    Text(String),
    /// Binary upload
    Upload {
        /// Channel used
        channel: Channel,
        /// Uploaded file
        path: PathBuf,
        /// Caption attached
        caption: String,
        /// Streaming hint (videos only)
        streaming: bool,
    },
}

/// Reply channel that records every send, optionally rejecting uploads
#[derive(Default)]
pub struct RecordingReply {
    sent: Mutex<Vec<SentMessage>>,
    reject_uploads: bool,
}

impl RecordingReply {
    /// Reply channel that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply channel whose uploads fail like an oversize payload would
    pub fn rejecting_uploads() -> Self {
        Self {
            reject_uploads: true,
            ..Default::default()
        }
    }

    /// Everything sent so far, in order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Text notices sent so far
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                SentMessage::Text(text) => Some(text),
                SentMessage::Upload { .. } => None,
            })
            .collect()
    }

    /// Uploads sent so far
    pub fn uploads(&self) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| matches!(m, SentMessage::Upload { .. }))
            .collect()
    }

    fn upload(&self, channel: Channel, path: &Path, caption: &str, streaming: bool) -> SendResult {
        if self.reject_uploads {
            return Err(DeliveryError::Send {
                channel,
                reason: "Request Entity Too Large".to_string(),
            });
        }
        self.sent.lock().unwrap().push(SentMessage::Upload {
            channel,
            path: path.to_path_buf(),
            caption: caption.to_string(),
            streaming,
        });
        Ok(())
    }
}

#[async_trait]
impl ReplyChannel for RecordingReply {
    async fn send_text(&self, text: &str) -> SendResult {
        self.sent
            .lock()
            .unwrap()
            .push(SentMessage::Text(text.to_string()));
        Ok(())
    }

    async fn send_video(&self, path: &Path, caption: &str, supports_streaming: bool) -> SendResult {
        self.upload(Channel::Video, path, caption, supports_streaming)
    }

    async fn send_photo(&self, path: &Path, caption: &str) -> SendResult {
        self.upload(Channel::Photo, path, caption, false)
    }

    async fn send_audio(&self, path: &Path, caption: &str) -> SendResult {
        self.upload(Channel::Audio, path, caption, false)
    }

    async fn send_document(&self, path: &Path, caption: &str) -> SendResult {
        self.upload(Channel::Document, path, caption, false)
    }
}

/// Extractor that writes a small artifact and reports a fixed MediaInfo for it
///
/// `file_size` is reported as given, independent of the bytes on disk, so
/// size-gate scenarios don't have to write 60 MB files.
pub struct StaticExtractor {
    media_type: MediaType,
    file_size: u64,
    caption: String,
    direct_url: Option<String>,
    file_name: String,
    calls: AtomicUsize,
}

impl StaticExtractor {
    /// Extractor producing `file_name` in the download directory
    pub fn new(media_type: MediaType, file_size: u64, file_name: &str) -> Self {
        Self {
            media_type,
            file_size,
            caption: "c".to_string(),
            direct_url: None,
            file_name: file_name.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Attach a direct link to the reported media
    pub fn with_direct_url(mut self, url: &str) -> Self {
        self.direct_url = Some(url.to_string());
        self
    }

    /// Number of times `extract` ran
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for StaticExtractor {
    async fn extract(&self, _url: &str, download_dir: &Path) -> linkgrab::Result<Option<MediaInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let file_path = download_dir.join(&self.file_name);
        tokio::fs::write(&file_path, b"media bytes").await?;
        Ok(Some(MediaInfo {
            media_type: self.media_type,
            file_path,
            file_size: self.file_size,
            caption: self.caption.clone(),
            direct_url: self.direct_url.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Extractor that never finds anything
#[derive(Default)]
pub struct AbsentExtractor {
    calls: AtomicUsize,
}

impl AbsentExtractor {
    /// Number of times `extract` ran
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for AbsentExtractor {
    async fn extract(&self, _url: &str, _download_dir: &Path) -> linkgrab::Result<Option<MediaInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "absent"
    }
}

/// Extractor that always fails like a broken tool run
pub struct FailingExtractor;

#[async_trait]
impl Extractor for FailingExtractor {
    async fn extract(&self, _url: &str, _download_dir: &Path) -> linkgrab::Result<Option<MediaInfo>> {
        Err(ExtractError::ToolFailed {
            tool: "yt-dlp".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "Private video".to_string(),
        }
        .into())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Number of entries in `dir` (0 when it does not exist)
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
