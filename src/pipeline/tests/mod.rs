use super::*;
use crate::error::{DeliveryError, ExtractError};
use crate::extractor::{Extractor, NoOpExtractor};
use crate::reply::SendResult;
use crate::types::{Channel, DeliveryOutcome, MediaType};
use crate::utils::PartialArtifacts;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;
use tempfile::TempDir;

/// Reply channel that records what was sent and can reject uploads
#[derive(Default)]
struct MockReply {
    texts: Mutex<Vec<String>>,
    uploads: Mutex<Vec<(Channel, PathBuf)>>,
    reject_uploads: bool,
    reject_texts: bool,
}

impl MockReply {
    fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    fn uploads(&self) -> Vec<(Channel, PathBuf)> {
        self.uploads.lock().unwrap().clone()
    }

    fn upload(&self, channel: Channel, path: &Path) -> SendResult {
        if self.reject_uploads {
            return Err(DeliveryError::Send {
                channel,
                reason: "Request Entity Too Large".into(),
            });
        }
        self.uploads.lock().unwrap().push((channel, path.to_path_buf()));
        Ok(())
    }
}

#[async_trait]
impl ReplyChannel for MockReply {
    async fn send_text(&self, text: &str) -> SendResult {
        if self.reject_texts {
            return Err(DeliveryError::Send {
                channel: Channel::Text,
                reason: "chat not found".into(),
            });
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_video(&self, path: &Path, _caption: &str, streaming: bool) -> SendResult {
        assert!(streaming, "videos are always sent with streaming enabled");
        self.upload(Channel::Video, path)
    }

    async fn send_photo(&self, path: &Path, _caption: &str) -> SendResult {
        self.upload(Channel::Photo, path)
    }

    async fn send_audio(&self, path: &Path, _caption: &str) -> SendResult {
        self.upload(Channel::Audio, path)
    }

    async fn send_document(&self, path: &Path, _caption: &str) -> SendResult {
        self.upload(Channel::Document, path)
    }
}

/// Extractor that writes a fixed-size artifact into the download dir
struct FileExtractor {
    media_type: MediaType,
    file_size: u64,
    direct_url: Option<String>,
    calls: AtomicUsize,
}

impl FileExtractor {
    fn new(media_type: MediaType, file_size: u64) -> Self {
        Self {
            media_type,
            file_size,
            direct_url: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for FileExtractor {
    async fn extract(&self, _url: &str, download_dir: &Path) -> Result<Option<MediaInfo>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let file_path = download_dir.join(format!("artifact-{}.bin", n));
        tokio::fs::write(&file_path, b"data").await?;
        Ok(Some(MediaInfo {
            media_type: self.media_type,
            file_path,
            file_size: self.file_size,
            caption: "c".into(),
            direct_url: self.direct_url.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

struct EmptyExtractor;

#[async_trait]
impl Extractor for EmptyExtractor {
    async fn extract(&self, _url: &str, _download_dir: &Path) -> Result<Option<MediaInfo>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "empty"
    }
}

struct FailingExtractor;

#[async_trait]
impl Extractor for FailingExtractor {
    async fn extract(&self, url: &str, _download_dir: &Path) -> Result<Option<MediaInfo>> {
        Err(ExtractError::Http {
            url: url.to_string(),
            status: 403,
        }
        .into())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Extractor that starts a partial download and then stalls
struct SlowExtractor;

#[async_trait]
impl Extractor for SlowExtractor {
    async fn extract(&self, _url: &str, download_dir: &Path) -> Result<Option<MediaInfo>> {
        let _partial = PartialArtifacts::with_prefix(download_dir, "slow-");
        tokio::fs::write(download_dir.join("slow-0001.mp4.part"), b"half").await?;
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

fn test_config(temp_dir: &TempDir) -> Arc<Config> {
    let mut config = Config::default();
    config.delivery.download_dir = temp_dir.path().join("downloads");
    Arc::new(config)
}

fn pipeline_with(temp_dir: &TempDir, extractor: Arc<dyn Extractor>) -> Pipeline {
    Pipeline::new(test_config(temp_dir), ExtractorSet::uniform(extractor))
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

#[tokio::test]
async fn test_invalid_url_short_circuits() {
    let temp_dir = TempDir::new().unwrap();
    let extractor = Arc::new(FileExtractor::new(MediaType::Video, 1));
    let pipeline = pipeline_with(&temp_dir, extractor.clone());
    let mut rx = pipeline.subscribe();
    let reply = MockReply::default();

    let outcome = pipeline.process(&reply, "not a url").await;

    assert_eq!(outcome, RequestOutcome::InvalidUrl);
    assert_eq!(reply.texts(), vec![INVALID_URL_NOTICE.to_string()]);
    assert_eq!(extractor.calls(), 0);
    assert!(!temp_dir.path().join("downloads").exists());

    let events = drain(&mut rx);
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], Event::Received { .. }));
    match &events[1] {
        Event::Failed { stage, error, .. } => {
            assert_eq!(*stage, Stage::Validate);
            assert_eq!(error, "invalid URL: not a url");
        }
        other => panic!("Expected Failed, got: {:?}", other),
    }
    assert!(matches!(
        events[2],
        Event::Done {
            outcome: RequestOutcome::InvalidUrl,
            ..
        }
    ));
}

#[tokio::test]
async fn test_video_within_limit_is_uploaded_and_removed() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(
        &temp_dir,
        Arc::new(FileExtractor::new(MediaType::Video, 10_000_000)),
    );
    let reply = MockReply::default();

    let outcome = pipeline
        .process(&reply, "https://www.youtube.com/watch?v=abc")
        .await;

    assert_eq!(
        outcome,
        RequestOutcome::Delivered {
            channel: Channel::Video
        }
    );
    assert_eq!(reply.texts(), vec![PROCESSING_NOTICE.to_string()]);
    let uploads = reply.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, Channel::Video);
    assert!(!uploads[0].1.exists());
}

#[tokio::test]
async fn test_oversize_video_sends_link_instead() {
    let temp_dir = TempDir::new().unwrap();
    let mut extractor = FileExtractor::new(MediaType::Video, 60_000_000);
    extractor.direct_url = Some("https://cdn/x.mp4".into());
    let pipeline = pipeline_with(&temp_dir, Arc::new(extractor));
    let reply = MockReply::default();

    let outcome = pipeline
        .process(&reply, "https://www.youtube.com/watch?v=abc")
        .await;

    assert_eq!(outcome, RequestOutcome::LinkSent);
    assert!(reply.uploads().is_empty());
    let texts = reply.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[1].contains("https://cdn/x.mp4"));
    assert!(dir_is_empty(&temp_dir.path().join("downloads")));
}

#[tokio::test]
async fn test_nothing_found_sends_notice() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(&temp_dir, Arc::new(EmptyExtractor));
    let mut rx = pipeline.subscribe();
    let reply = MockReply::default();

    let outcome = pipeline.process(&reply, "https://example.com/page").await;

    assert_eq!(outcome, RequestOutcome::NoMedia);
    assert_eq!(
        reply.texts(),
        vec![
            PROCESSING_NOTICE.to_string(),
            crate::delivery::NO_MEDIA_NOTICE.to_string()
        ]
    );

    let events = drain(&mut rx);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, Event::NothingFound { .. }))
    );
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, Event::Cleaned { .. } | Event::CleanupFailed { .. }))
    );
}

#[tokio::test]
async fn test_extraction_failure_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(&temp_dir, Arc::new(FailingExtractor));
    let reply = MockReply::default();

    let outcome = pipeline
        .process(&reply, "https://www.tiktok.com/@u/video/1")
        .await;

    match &outcome {
        RequestOutcome::ExtractionFailed { reason } => assert!(reason.contains("HTTP 403")),
        other => panic!("Expected ExtractionFailed, got: {:?}", other),
    }
    let texts = reply.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[1].starts_with("Error processing your request: "));
    assert!(texts[1].contains("HTTP 403"));
}

#[tokio::test]
async fn test_unsupported_platform_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(&temp_dir, Arc::new(NoOpExtractor));
    let reply = MockReply::default();

    let outcome = pipeline.process(&reply, "https://youtu.be/abc").await;

    assert!(outcome.is_failure());
    assert!(reply.texts()[1].contains("yt-dlp"));
}

#[tokio::test]
async fn test_delivery_failure_still_cleans_up() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(&temp_dir, Arc::new(FileExtractor::new(MediaType::Photo, 4)));
    let mut rx = pipeline.subscribe();
    let reply = MockReply {
        reject_uploads: true,
        ..Default::default()
    };

    let outcome = pipeline
        .process(&reply, "https://www.instagram.com/p/xyz/")
        .await;

    match &outcome {
        RequestOutcome::DeliveryFailed { reason } => {
            assert!(reason.contains("Request Entity Too Large"))
        }
        other => panic!("Expected DeliveryFailed, got: {:?}", other),
    }
    let texts = reply.texts();
    assert!(texts[1].starts_with("Error sending media: "));
    assert!(dir_is_empty(&temp_dir.path().join("downloads")));

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Failed {
            stage: Stage::Deliver,
            ..
        }
    )));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, Event::Cleaned { removed: true, .. }))
    );
}

#[tokio::test]
async fn test_failed_notice_sends_do_not_break_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(&temp_dir, Arc::new(FailingExtractor));
    let reply = MockReply {
        reject_texts: true,
        ..Default::default()
    };

    let outcome = pipeline.process(&reply, "https://example.com/file").await;

    assert!(matches!(outcome, RequestOutcome::ExtractionFailed { .. }));
}

#[tokio::test]
async fn test_extraction_timeout() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.delivery.download_dir = temp_dir.path().to_path_buf();
    config.extract_timeout = Some(Duration::from_millis(50));
    let pipeline = Pipeline::new(
        Arc::new(config),
        ExtractorSet::uniform(Arc::new(SlowExtractor)),
    );
    let reply = MockReply::default();

    let outcome = pipeline.process(&reply, "https://example.com/slow").await;

    match outcome {
        RequestOutcome::ExtractionFailed { reason } => {
            assert!(reason.contains("extract stage timed out"))
        }
        other => panic!("Expected ExtractionFailed, got: {:?}", other),
    }
    assert!(dir_is_empty(temp_dir.path()), "partial download left behind");
}

#[tokio::test]
async fn test_platform_binding_is_respected() {
    let temp_dir = TempDir::new().unwrap();
    let tiktok = Arc::new(FileExtractor::new(MediaType::Video, 1));
    let set = ExtractorSet::uniform(Arc::new(FailingExtractor))
        .with(Platform::Tiktok, tiktok.clone());
    let pipeline = Pipeline::new(test_config(&temp_dir), set);
    let reply = MockReply::default();

    let outcome = pipeline
        .process(&reply, "https://vm.tiktok.com/ZM123/")
        .await;

    assert!(!outcome.is_failure());
    assert_eq!(tiktok.calls(), 1);
}

#[tokio::test]
async fn test_event_sequence_for_successful_request() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(&temp_dir, Arc::new(FileExtractor::new(MediaType::Audio, 4)));
    let mut rx = pipeline.subscribe();
    let reply = MockReply::default();

    pipeline.process(&reply, " https://example.com/a.mp3 ").await;

    let events = drain(&mut rx);
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            Event::Received { .. } => "received",
            Event::Classified { .. } => "classified",
            Event::Extracting { .. } => "extracting",
            Event::Extracted { .. } => "extracted",
            Event::Delivered { .. } => "delivered",
            Event::Cleaned { .. } => "cleaned",
            Event::Done { .. } => "done",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        [
            "received",
            "classified",
            "extracting",
            "extracted",
            "delivered",
            "cleaned",
            "done"
        ]
    );

    let id = events[0].request_id();
    assert!(events.iter().all(|e| e.request_id() == id));
    match &events[4] {
        Event::Delivered { outcome, .. } => {
            assert_eq!(*outcome, DeliveryOutcome::Sent(Channel::Audio))
        }
        other => panic!("Expected Delivered, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_request_ids_are_distinct() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(&temp_dir, Arc::new(EmptyExtractor));
    let mut rx = pipeline.subscribe();
    let reply = MockReply::default();

    pipeline.process(&reply, "https://example.com/1").await;
    pipeline.process(&reply, "https://example.com/2").await;

    let ids: Vec<RequestId> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            Event::Received { id } => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_concurrent_requests_each_clean_their_own_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = Arc::new(pipeline_with(
        &temp_dir,
        Arc::new(FileExtractor::new(MediaType::Document, 4)),
    ));
    let reply = Arc::new(MockReply::default());

    let mut handles = Vec::new();
    for i in 0..8 {
        let pipeline = pipeline.clone();
        let reply = reply.clone();
        handles.push(tokio::spawn(async move {
            pipeline
                .process(reply.as_ref(), &format!("https://example.com/{}", i))
                .await
        }));
    }
    for handle in handles {
        let outcome = handle.await.unwrap();
        assert_eq!(
            outcome,
            RequestOutcome::Delivered {
                channel: Channel::Document
            }
        );
    }

    assert_eq!(reply.uploads().len(), 8);
    assert!(dir_is_empty(&temp_dir.path().join("downloads")));
}

#[test]
fn test_command_texts() {
    assert!(START_TEXT.contains("YouTube, Instagram, TikTok"));
    assert!(HELP_TEXT.starts_with("Just send me a link"));
    assert!(HELP_TEXT.contains("\n- TikTok videos\n"));
    assert!(HELP_TEXT.ends_with("download the media for you!"));
}
