//! Reply capability the pipeline uses to reach the user
//!
//! The pipeline only ever talks to a [`ReplyChannel`]; it never knows which
//! messaging transport sits behind it. [`crate::telegram::TelegramReply`] is
//! the shipped implementation.

use crate::error::DeliveryError;
use async_trait::async_trait;
use std::path::Path;

/// Result of a single send primitive
pub type SendResult = std::result::Result<(), DeliveryError>;

/// Outbound capability set of a messaging transport, scoped to one conversation
///
/// Every method sends exactly one message. Captions may be empty.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Send a plain text notice
    async fn send_text(&self, text: &str) -> SendResult;

    /// Upload a video file
    ///
    /// `supports_streaming` asks the transport to allow playback before the
    /// upload has fully arrived on the client.
    async fn send_video(&self, path: &Path, caption: &str, supports_streaming: bool)
    -> SendResult;

    /// Upload an image
    async fn send_photo(&self, path: &Path, caption: &str) -> SendResult;

    /// Upload an audio track
    async fn send_audio(&self, path: &Path, caption: &str) -> SendResult;

    /// Upload any file as a generic document
    async fn send_document(&self, path: &Path, caption: &str) -> SendResult;
}
