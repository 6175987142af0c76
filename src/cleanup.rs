//! Cleanup stage for removing downloaded artifacts

use crate::types::MediaInfo;
use std::io::ErrorKind;
use tracing::{debug, warn};

/// Result of removing a request's artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The artifact file was deleted
    Removed,
    /// There was nothing to remove (no media, or the file was already gone)
    Nothing,
    /// The file exists but could not be deleted
    Failed {
        /// OS error description
        reason: String,
    },
}

/// Remove the artifact described by `media`, if any
///
/// Never fails the request: errors are logged as warnings and reported back
/// as [`CleanupOutcome::Failed`] so the caller can emit an event. A file that
/// is already missing counts as [`CleanupOutcome::Nothing`].
pub async fn cleanup_media(media: Option<&MediaInfo>) -> CleanupOutcome {
    let Some(media) = media else {
        return CleanupOutcome::Nothing;
    };
    let path = &media.file_path;

    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(?path, "removed artifact");
            CleanupOutcome::Removed
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(?path, "artifact already gone, skipping cleanup");
            CleanupOutcome::Nothing
        }
        Err(e) => {
            warn!(?path, error = %e, "failed to delete artifact");
            CleanupOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
