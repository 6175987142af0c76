//! Delivery selector
//!
//! Chooses how an extraction result reaches the user and performs the send.
//! The decision ([`plan_delivery`]) is a pure function of the media and the
//! size limit; [`deliver`] executes it against a [`ReplyChannel`].

use crate::error::DeliveryError;
use crate::reply::ReplyChannel;
use crate::types::{Channel, DeliveryOutcome, DeliveryPlan, MediaInfo, MediaType};
use tracing::debug;

/// Sent when extraction found nothing
pub const NO_MEDIA_NOTICE: &str = "Could not extract media from this URL.";

/// Substituted when an oversize video has no direct link
pub const LINK_UNAVAILABLE: &str = "Not available";

/// Build the notice that replaces an oversize video
pub fn oversize_notice(direct_url: Option<&str>) -> String {
    format!(
        "Video is too large to send. Download link: {}",
        direct_url.unwrap_or(LINK_UNAVAILABLE)
    )
}

/// Decide how `media` is delivered
///
/// Only videos are size-gated; photos, audio and documents are always
/// uploaded and left to the transport to accept or reject.
///
/// # Examples
///
/// ```
/// use linkgrab::delivery::plan_delivery;
/// use linkgrab::{DeliveryPlan, MediaInfo, MediaType};
///
/// let media = MediaInfo {
///     media_type: MediaType::Video,
///     file_path: "/tmp/a.mp4".into(),
///     file_size: 60_000_000,
///     caption: "c".into(),
///     direct_url: Some("https://cdn/x.mp4".into()),
/// };
/// match plan_delivery(Some(&media), 50_000_000) {
///     DeliveryPlan::OversizeLink { notice } => assert!(notice.contains("https://cdn/x.mp4")),
///     other => panic!("unexpected plan {other:?}"),
/// }
/// ```
#[must_use]
pub fn plan_delivery(media: Option<&MediaInfo>, size_limit: u64) -> DeliveryPlan {
    let Some(media) = media else {
        return DeliveryPlan::NoMedia;
    };

    match media.media_type {
        MediaType::Video if media.file_size > size_limit => DeliveryPlan::OversizeLink {
            notice: oversize_notice(media.direct_url.as_deref()),
        },
        MediaType::Video => DeliveryPlan::Video { streaming: true },
        MediaType::Photo => DeliveryPlan::Photo,
        MediaType::Audio => DeliveryPlan::Audio,
        MediaType::Document => DeliveryPlan::Document,
    }
}

/// Send `media` to the user through `reply`
///
/// # Errors
///
/// Returns [`DeliveryError`] when the send primitive fails. The error is a
/// value for the caller to report; nothing is retried here.
pub async fn deliver(
    reply: &dyn ReplyChannel,
    media: Option<&MediaInfo>,
    size_limit: u64,
) -> Result<DeliveryOutcome, DeliveryError> {
    let plan = plan_delivery(media, size_limit);
    debug!(?plan, size_limit, "delivery plan selected");

    let (plan, media) = match (plan, media) {
        (DeliveryPlan::NoMedia, _) | (_, None) => {
            reply.send_text(NO_MEDIA_NOTICE).await?;
            return Ok(DeliveryOutcome::NoMedia);
        }
        (DeliveryPlan::OversizeLink { notice }, Some(_)) => {
            reply.send_text(&notice).await?;
            return Ok(DeliveryOutcome::LinkSent);
        }
        (plan, Some(media)) => (plan, media),
    };

    let path = media.file_path.as_path();
    let caption = media.caption.as_str();

    let channel = match plan {
        DeliveryPlan::Video { streaming } => {
            reply.send_video(path, caption, streaming).await?;
            Channel::Video
        }
        DeliveryPlan::Photo => {
            reply.send_photo(path, caption).await?;
            Channel::Photo
        }
        DeliveryPlan::Audio => {
            reply.send_audio(path, caption).await?;
            Channel::Audio
        }
        DeliveryPlan::Document | DeliveryPlan::NoMedia | DeliveryPlan::OversizeLink { .. } => {
            reply.send_document(path, caption).await?;
            Channel::Document
        }
    };

    Ok(DeliveryOutcome::Sent(channel))
}
