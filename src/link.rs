//! URL validation and platform classification
//!
//! Both functions are synchronous and side-effect-free. [`classify`] is total:
//! anything it cannot attribute to a known platform is [`Platform::Generic`].

use crate::error::{Error, Result};
use crate::types::Platform;
use url::Url;

/// Host fragments checked in priority order; first match wins
const PLATFORM_HOSTS: &[(&str, Platform)] = &[
    ("youtube.com", Platform::Youtube),
    ("youtu.be", Platform::Youtube),
    ("instagram.com", Platform::Instagram),
    ("tiktok.com", Platform::Tiktok),
];

/// Parse an absolute URL that has both a scheme and a host
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// [`Error::InvalidUrl`] carrying the trimmed input when it does not parse or
/// has no host (`mailto:`, `data:`, `file:///...`).
pub fn parse_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    match Url::parse(trimmed) {
        Ok(url) if !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()) => {
            Ok(url)
        }
        _ => Err(Error::InvalidUrl(trimmed.to_string())),
    }
}

/// Check if the string is an absolute URL with both a scheme and a host
///
/// Parse failures are reported as `false`.
///
/// # Examples
///
/// ```
/// use linkgrab::link::is_valid_url;
///
/// assert!(is_valid_url("https://www.youtube.com/watch?v=abc"));
/// assert!(!is_valid_url("not a url"));
/// assert!(!is_valid_url("mailto:someone@example.com"));
/// ```
#[must_use]
pub fn is_valid_url(input: &str) -> bool {
    parse_url(input).is_ok()
}

/// Map a URL to the platform whose extractor should handle it
///
/// The host is lower-cased before matching.
///
/// # Examples
///
/// ```
/// use linkgrab::link::classify;
/// use linkgrab::Platform;
///
/// assert_eq!(classify("https://youtu.be/abc"), Platform::Youtube);
/// assert_eq!(classify("https://example.com/page"), Platform::Generic);
/// ```
#[must_use]
pub fn classify(url: &str) -> Platform {
    let Some(host) = host_of(url) else {
        return Platform::Generic;
    };

    PLATFORM_HOSTS
        .iter()
        .find(|(fragment, _)| host.contains(fragment))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Generic)
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}
