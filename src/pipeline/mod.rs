//! Request pipeline for incoming messages
//!
//! Each message runs through these stages, strictly in order:
//! 1. Validate - reject anything that is not an absolute URL
//! 2. Classify - map the host to a [`Platform`]
//! 3. Extract - run the extractor bound to that platform
//! 4. Deliver - send the media (or a notice) back through the reply channel
//! 5. Cleanup - delete the downloaded artifact, whatever delivery did
//!
//! Every failure is converted into a user-visible notice here; [`Pipeline::process`]
//! never returns an error, so one bad request cannot take down the serving loop.

use crate::cleanup::{CleanupOutcome, cleanup_media};
use crate::config::Config;
use crate::delivery::deliver;
use crate::error::{Error, Result};
use crate::extractor::ExtractorSet;
use crate::link::{classify, parse_url};
use crate::reply::ReplyChannel;
use crate::types::{Event, MediaInfo, Platform, RequestId, RequestOutcome, Stage};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Reply to input that is not a URL
pub const INVALID_URL_NOTICE: &str = "Please send a valid URL";

/// Acknowledgement sent before extraction starts
pub const PROCESSING_NOTICE: &str = "Processing your request, please wait...";

/// Reply to the `/start` command
pub const START_TEXT: &str = "Hi! I'm a media downloader bot. Send me a link from YouTube, \
     Instagram, TikTok, or other platforms.";

/// Reply to the `/help` command
pub const HELP_TEXT: &str = "Just send me a link to download media from. I support:\n\
     - YouTube videos\n\
     - Instagram photos and videos\n\
     - TikTok videos\n\
     - Many other platforms\n\
     \n\
     Simply paste the URL and I'll try to download the media for you!";

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Orchestrator that turns one incoming message into exactly one terminal reply
pub struct Pipeline {
    /// Read-only settings (download directory, size limit, timeouts)
    config: Arc<Config>,
    /// Platform to extractor bindings
    extractors: ExtractorSet,
    /// Event channel for observers
    event_tx: broadcast::Sender<Event>,
    /// Source of request IDs
    next_id: AtomicU64,
}

impl Pipeline {
    /// Create a new pipeline
    pub fn new(config: Arc<Config>, extractors: ExtractorSet) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            extractors,
            event_tx,
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to pipeline events
    ///
    /// Events are dropped when nobody is listening; a slow subscriber sees
    /// `RecvError::Lagged` rather than slowing requests down.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Configuration this pipeline was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extractor bindings in use
    pub fn extractors(&self) -> &ExtractorSet {
        &self.extractors
    }

    /// Process one incoming text message
    ///
    /// Sends an acknowledgement and then exactly one terminal message through
    /// `reply` (only the terminal message for invalid input). Failures to send
    /// notices are logged and otherwise ignored.
    ///
    /// # Arguments
    ///
    /// * `reply` - Channel back to the user who sent the message
    /// * `text` - Raw message text, expected to be a URL
    pub async fn process(&self, reply: &dyn ReplyChannel, text: &str) -> RequestOutcome {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.emit(Event::Received { id });

        let outcome = self.run(id, reply, text.trim()).await;

        info!(request_id = id.0, ?outcome, "request finished");
        self.emit(Event::Done {
            id,
            outcome: outcome.clone(),
        });
        outcome
    }

    async fn run(&self, id: RequestId, reply: &dyn ReplyChannel, url: &str) -> RequestOutcome {
        if let Err(e) = parse_url(url) {
            debug!(request_id = id.0, error = %e, "rejecting non-URL input");
            self.emit(Event::Failed {
                id,
                stage: e.stage().unwrap_or(Stage::Validate),
                error: e.to_string(),
            });
            self.notify(id, reply, INVALID_URL_NOTICE).await;
            return RequestOutcome::InvalidUrl;
        }

        self.notify(id, reply, PROCESSING_NOTICE).await;

        let platform = classify(url);
        info!(request_id = id.0, %platform, url, "processing request");
        self.emit(Event::Classified { id, platform });

        let media = match self.run_extract_stage(id, platform, url).await {
            Ok(media) => media,
            Err(e) => {
                error!(request_id = id.0, %platform, error = %e, "extraction failed");
                let reason = e.to_string();
                self.emit(Event::Failed {
                    id,
                    stage: e.stage().unwrap_or(Stage::Extract),
                    error: reason.clone(),
                });
                self.notify(id, reply, &format!("Error processing your request: {}", reason))
                    .await;
                return RequestOutcome::ExtractionFailed { reason };
            }
        };

        let outcome = self.run_deliver_stage(id, reply, media.as_ref()).await;

        if let Some(media) = &media {
            self.run_cleanup_stage(id, media).await;
        }

        outcome
    }

    async fn run_extract_stage(
        &self,
        id: RequestId,
        platform: Platform,
        url: &str,
    ) -> Result<Option<MediaInfo>> {
        let download_dir = self.config.download_dir();
        tokio::fs::create_dir_all(download_dir).await?;

        let extractor = self.extractors.for_platform(platform);
        debug!(request_id = id.0, extractor = extractor.name(), "running extract stage");
        self.emit(Event::Extracting {
            id,
            extractor: extractor.name().to_string(),
        });

        let media = match self.config.extract_timeout {
            Some(limit) => tokio::time::timeout(limit, extractor.extract(url, download_dir))
                .await
                .map_err(|_| Error::Timeout {
                    stage: Stage::Extract,
                    seconds: limit.as_secs(),
                })??,
            None => extractor.extract(url, download_dir).await?,
        };

        match &media {
            Some(media) => {
                debug!(
                    request_id = id.0,
                    media_type = %media.media_type,
                    file_size = media.file_size,
                    path = ?media.file_path,
                    "extracted media"
                );
                self.emit(Event::Extracted {
                    id,
                    media_type: media.media_type,
                    file_size: media.file_size,
                });
            }
            None => {
                info!(request_id = id.0, "no media found");
                self.emit(Event::NothingFound { id });
            }
        }

        Ok(media)
    }

    async fn run_deliver_stage(
        &self,
        id: RequestId,
        reply: &dyn ReplyChannel,
        media: Option<&MediaInfo>,
    ) -> RequestOutcome {
        match deliver(reply, media, self.config.max_file_size()).await {
            Ok(outcome) => {
                debug!(request_id = id.0, ?outcome, "delivery complete");
                self.emit(Event::Delivered { id, outcome });
                outcome.into()
            }
            Err(e) => {
                warn!(request_id = id.0, error = %e, "delivery failed");
                let reason = e.to_string();
                self.emit(Event::Failed {
                    id,
                    stage: Stage::Deliver,
                    error: reason.clone(),
                });
                self.notify(id, reply, &format!("Error sending media: {}", reason))
                    .await;
                RequestOutcome::DeliveryFailed { reason }
            }
        }
    }

    async fn run_cleanup_stage(&self, id: RequestId, media: &MediaInfo) {
        match cleanup_media(Some(media)).await {
            CleanupOutcome::Removed => self.emit(Event::Cleaned { id, removed: true }),
            CleanupOutcome::Nothing => self.emit(Event::Cleaned { id, removed: false }),
            CleanupOutcome::Failed { reason } => self.emit(Event::CleanupFailed {
                id,
                path: media.file_path.clone(),
                error: reason,
            }),
        }
    }

    /// Send a text notice; a failed send is logged only
    async fn notify(&self, id: RequestId, reply: &dyn ReplyChannel, text: &str) {
        if let Err(e) = reply.send_text(text).await {
            warn!(request_id = id.0, error = %e, "failed to send notice");
        }
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("extractors", &self.extractors)
            .finish_non_exhaustive()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
