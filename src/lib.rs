//! # linkgrab
//!
//! Media downloader bot core: a user sends a link, the bot fetches the media
//! behind it and sends it back.
//!
//! Every incoming message runs through the same pipeline:
//! validate URL → classify platform → extract → deliver (size-gated) → clean up.
//!
//! ## Design
//!
//! - **Transport-agnostic** - the pipeline only talks to a [`ReplyChannel`]; Telegram is one implementation
//! - **Pluggable extractors** - each [`Platform`] is bound to an [`Extractor`](extractor::Extractor) once, at startup
//! - **Never silent** - every request ends in exactly one terminal message, failures included
//! - **Event-driven** - observers subscribe to [`Event`]s instead of scraping logs
//!
//! ## Quick Start
//!
//! ```no_run
//! use linkgrab::extractor::ExtractorSet;
//! use linkgrab::{Config, Pipeline};
//! use std::sync::Arc;
//!
//! # async fn example(reply: &dyn linkgrab::ReplyChannel) -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let extractors = ExtractorSet::from_config(&config)?;
//! let pipeline = Pipeline::new(Arc::new(config), extractors);
//!
//! // Subscribe to events
//! let mut events = pipeline.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//! });
//!
//! let outcome = pipeline.process(reply, "https://youtu.be/abc").await;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Artifact removal
pub mod cleanup;
/// Configuration types
pub mod config;
/// Delivery selection and sending
pub mod delivery;
/// Error types
pub mod error;
/// Media extractors and platform bindings
pub mod extractor;
/// URL validation and platform classification
pub mod link;
/// Request pipeline
pub mod pipeline;
/// Reply channel abstraction
pub mod reply;
/// Telegram transport
pub mod telegram;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use cleanup::CleanupOutcome;
pub use config::Config;
pub use error::{DeliveryError, Error, ExtractError, Result};
pub use pipeline::Pipeline;
pub use reply::ReplyChannel;
pub use types::{
    Channel, DeliveryOutcome, DeliveryPlan, Event, MediaInfo, MediaType, Platform, RequestId,
    RequestOutcome, Stage,
};

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Wait for a termination signal (Ctrl+C).
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
