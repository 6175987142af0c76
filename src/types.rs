//! Core types for linkgrab

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Unique identifier for one incoming request within a pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source platform a URL belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// youtube.com / youtu.be
    Youtube,
    /// instagram.com
    Instagram,
    /// tiktok.com
    Tiktok,
    /// Anything else
    Generic,
}

impl Platform {
    /// All platforms, in classification priority order
    pub const ALL: [Platform; 4] = [
        Platform::Youtube,
        Platform::Instagram,
        Platform::Tiktok,
        Platform::Generic,
    ];

    /// Lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Generic => "generic",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of media an extractor produced, which selects the delivery channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Video file, size-gated
    Video,
    /// Still image
    Photo,
    /// Audio track
    Audio,
    /// Anything else, sent as a generic file
    Document,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaType::Video => "video",
            MediaType::Photo => "photo",
            MediaType::Audio => "audio",
            MediaType::Document => "document",
        };
        f.write_str(s)
    }
}

/// Result of a successful extraction: a downloaded artifact and how to present it
///
/// Created by an extractor for a single request, consumed once by delivery,
/// and its file is removed by cleanup right after the delivery attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Delivery channel selector
    pub media_type: MediaType,
    /// Local location of the downloaded artifact
    pub file_path: PathBuf,
    /// Size of the artifact in bytes
    pub file_size: u64,
    /// Text shown alongside the media (may be empty)
    #[serde(default)]
    pub caption: String,
    /// Externally reachable URL of the media, offered when the file is too large
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_url: Option<String>,
}

/// Pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// URL validation
    Validate,
    /// Media extraction
    Extract,
    /// Delivery to the user
    Deliver,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Validate => "validate",
            Stage::Extract => "extract",
            Stage::Deliver => "deliver",
        };
        f.write_str(s)
    }
}

/// Reply primitive used to reach the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Plain text notice
    Text,
    /// Video upload
    Video,
    /// Photo upload
    Photo,
    /// Audio upload
    Audio,
    /// Generic file upload
    Document,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Channel::Text => "text",
            Channel::Video => "video",
            Channel::Photo => "photo",
            Channel::Audio => "audio",
            Channel::Document => "document",
        };
        f.write_str(s)
    }
}

/// Branch decision of the delivery selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryPlan {
    /// Extraction found nothing; send the "could not extract" notice
    NoMedia,
    /// Video above the size limit; send this notice instead of the file
    OversizeLink {
        /// Notice text carrying the direct link or a placeholder
        notice: String,
    },
    /// Upload as video
    Video {
        /// Ask the transport to enable streaming playback
        streaming: bool,
    },
    /// Upload as photo
    Photo,
    /// Upload as audio
    Audio,
    /// Upload as generic document
    Document,
}

/// What a completed delivery actually sent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The "could not extract" notice was sent
    NoMedia,
    /// A link notice replaced an oversize video
    LinkSent,
    /// The artifact was uploaded on this channel
    Sent(Channel),
}

/// Terminal result of processing one incoming message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Input was not a URL
    InvalidUrl,
    /// URL was valid but nothing could be extracted
    NoMedia,
    /// Media was uploaded
    Delivered {
        /// Channel used
        channel: Channel,
    },
    /// Video was too large; a link notice was sent instead
    LinkSent,
    /// Extractor failed
    ExtractionFailed {
        /// Failure description shown to the user
        reason: String,
    },
    /// Sending failed after a successful extraction
    DeliveryFailed {
        /// Failure description shown to the user
        reason: String,
    },
}

impl RequestOutcome {
    /// Whether the request ended in a failure notice
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RequestOutcome::ExtractionFailed { .. } | RequestOutcome::DeliveryFailed { .. }
        )
    }
}

impl From<DeliveryOutcome> for RequestOutcome {
    fn from(outcome: DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::NoMedia => RequestOutcome::NoMedia,
            DeliveryOutcome::LinkSent => RequestOutcome::LinkSent,
            DeliveryOutcome::Sent(channel) => RequestOutcome::Delivered { channel },
        }
    }
}

/// Event emitted while a request moves through the pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Message accepted for processing
    Received {
        /// Request ID
        id: RequestId,
    },

    /// URL mapped to a platform
    Classified {
        /// Request ID
        id: RequestId,
        /// Resolved platform
        platform: Platform,
    },

    /// Extractor started
    Extracting {
        /// Request ID
        id: RequestId,
        /// Extractor name
        extractor: String,
    },

    /// Extractor produced an artifact
    Extracted {
        /// Request ID
        id: RequestId,
        /// Kind of media
        media_type: MediaType,
        /// Artifact size in bytes
        file_size: u64,
    },

    /// Extractor found nothing to download
    NothingFound {
        /// Request ID
        id: RequestId,
    },

    /// Delivery finished
    Delivered {
        /// Request ID
        id: RequestId,
        /// What was sent
        outcome: DeliveryOutcome,
    },

    /// A stage failed
    Failed {
        /// Request ID
        id: RequestId,
        /// Stage where failure occurred
        stage: Stage,
        /// Error message
        error: String,
    },

    /// Artifact cleanup ran
    Cleaned {
        /// Request ID
        id: RequestId,
        /// Whether a file was actually removed
        removed: bool,
    },

    /// Artifact could not be removed (never shown to the user)
    CleanupFailed {
        /// Request ID
        id: RequestId,
        /// Artifact path
        path: PathBuf,
        /// Error message
        error: String,
    },

    /// Request reached its terminal state
    Done {
        /// Request ID
        id: RequestId,
        /// Terminal outcome
        outcome: RequestOutcome,
    },
}

impl Event {
    /// Request this event belongs to
    pub fn request_id(&self) -> RequestId {
        match self {
            Event::Received { id }
            | Event::Classified { id, .. }
            | Event::Extracting { id, .. }
            | Event::Extracted { id, .. }
            | Event::NothingFound { id }
            | Event::Delivered { id, .. }
            | Event::Failed { id, .. }
            | Event::Cleaned { id, .. }
            | Event::CleanupFailed { id, .. }
            | Event::Done { id, .. } => *id,
        }
    }
}
