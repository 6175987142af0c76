//! Utility functions for artifact naming and media type detection

use crate::error::{Error, Result};
use crate::types::MediaType;
use rand::Rng;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Longest file stem kept after sanitising
const MAX_STEM_LEN: usize = 80;

#[allow(clippy::expect_used)]
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex is valid"));

/// Generate a short random token for per-request artifact names
///
/// Extractors embed this in output file names so concurrent requests writing
/// to the same download directory never collide.
pub fn artifact_token() -> String {
    let value: u64 = rand::thread_rng().r#gen();
    format!("{:016x}", value)
}

/// Reduce an arbitrary name to a filesystem-safe stem
///
/// # Examples
///
/// ```
/// use linkgrab::utils::sanitize_stem;
///
/// assert_eq!(sanitize_stem("My Video (1080p)!"), "My_Video_1080p");
/// assert_eq!(sanitize_stem("../../etc/passwd"), "etc_passwd");
/// assert_eq!(sanitize_stem("???"), "download");
/// ```
#[must_use]
pub fn sanitize_stem(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "_");
    let trimmed = replaced.trim_matches(|c| c == '_' || c == '.' || c == '-');
    let stem: String = trimmed.chars().take(MAX_STEM_LEN).collect();
    if stem.is_empty() {
        "download".to_string()
    } else {
        stem
    }
}

/// Get a path that does not exist yet, appending ` (1)`, ` (2)`, ... on collision
///
/// # Examples
///
/// ```
/// use linkgrab::utils::get_unique_path;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/linkgrab-doc-test-nonexistent.mp4");
/// assert_eq!(get_unique_path(path).unwrap(), path);
/// ```
pub fn get_unique_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Other(format!("cannot extract file stem from {:?}", path)))?;
    let extension = path.extension().and_then(|e| e.to_str());
    let parent = path
        .parent()
        .ok_or_else(|| Error::Other(format!("cannot extract parent directory of {:?}", path)))?;

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let new_name = match extension {
            Some(ext) => format!("{} ({}).{}", stem, i, ext),
            None => format!("{} ({})", stem, i),
        };
        let new_path = parent.join(new_name);
        if !new_path.exists() {
            return Ok(new_path);
        }
    }

    Err(Error::Other(format!(
        "could not find unique filename for {:?} after {} attempts",
        path, MAX_RENAME_ATTEMPTS
    )))
}

/// Files an in-flight extraction may leave behind, removed on drop unless kept
///
/// An extraction future can be dropped at any await point (the pipeline's
/// extraction timeout, dispatcher shutdown), so cleanup of `.part` files and
/// half-written artifacts lives in `Drop` rather than on the error path.
///
/// # Examples
///
/// ```
/// use linkgrab::utils::PartialArtifacts;
///
/// let dir = tempfile::tempdir().unwrap();
/// let part = dir.path().join("youtube-ab12.mp4.part");
/// std::fs::write(&part, b"half").unwrap();
///
/// drop(PartialArtifacts::with_prefix(dir.path(), "youtube-ab12"));
/// assert!(!part.exists());
/// ```
#[derive(Debug)]
pub struct PartialArtifacts {
    target: PartialTarget,
    armed: bool,
}

#[derive(Debug)]
enum PartialTarget {
    /// Every entry of `dir` whose name starts with `prefix`
    Prefix { dir: PathBuf, prefix: String },
    /// One file
    File(PathBuf),
}

impl PartialArtifacts {
    /// Guard every file in `dir` whose name starts with `prefix`
    pub fn with_prefix(dir: &Path, prefix: &str) -> Self {
        Self {
            target: PartialTarget::Prefix {
                dir: dir.to_path_buf(),
                prefix: prefix.to_string(),
            },
            armed: true,
        }
    }

    /// Guard a single file
    pub fn file(path: &Path) -> Self {
        Self {
            target: PartialTarget::File(path.to_path_buf()),
            armed: true,
        }
    }

    /// The download succeeded; leave the files in place
    pub fn keep(mut self) {
        self.armed = false;
    }

    fn remove(&self) {
        match &self.target {
            PartialTarget::Prefix { dir, prefix } => {
                let entries = match std::fs::read_dir(dir) {
                    Ok(entries) => entries,
                    Err(e) => {
                        debug!(?dir, error = %e, "cannot scan for partial artifacts");
                        return;
                    }
                };
                for entry in entries.flatten() {
                    if entry.file_name().to_string_lossy().starts_with(prefix.as_str()) {
                        remove_partial_file(&entry.path());
                    }
                }
            }
            PartialTarget::File(path) => remove_partial_file(path),
        }
    }
}

impl Drop for PartialArtifacts {
    fn drop(&mut self) {
        if self.armed {
            self.remove();
        }
    }
}

fn remove_partial_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(?path, "removed partial artifact"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(?path, error = %e, "failed to remove partial artifact"),
    }
}

/// Guess the delivery channel from a file extension
///
/// Unknown or missing extensions are [`MediaType::Document`].
#[must_use]
pub fn media_type_from_path(path: &Path) -> MediaType {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" | "mov" | "webm" | "mkv" | "avi" | "3gp" => MediaType::Video,
        "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "heic" => MediaType::Photo,
        "mp3" | "m4a" | "aac" | "ogg" | "opus" | "oga" | "flac" | "wav" => MediaType::Audio,
        _ => MediaType::Document,
    }
}

/// Map a `Content-Type` value to a media type, or `None` when it is not a downloadable file
///
/// HTML, JSON and plain text pages are not media; the generic extractor
/// reports "nothing found" for them.
#[must_use]
pub fn media_type_from_content_type(content_type: &str) -> Option<MediaType> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if essence.starts_with("video/") {
        Some(MediaType::Video)
    } else if essence.starts_with("image/") {
        Some(MediaType::Photo)
    } else if essence.starts_with("audio/") {
        Some(MediaType::Audio)
    } else {
        match essence.as_str() {
            "application/pdf"
            | "application/zip"
            | "application/x-7z-compressed"
            | "application/x-rar-compressed"
            | "application/epub+zip"
            | "application/octet-stream" => Some(MediaType::Document),
            _ => None,
        }
    }
}

/// Default file extension for a content type when the URL carries none
#[must_use]
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    let ext = match essence.to_ascii_lowercase().as_str() {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        "audio/ogg" => "ogg",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        _ => return None,
    };
    Some(ext)
}

/// Extract a file name (stem and extension) from an HTTP response
///
/// Tries the Content-Disposition header first, then the last URL path
/// segment. Returns `None` if neither yields a name.
pub fn filename_from_response(response: &reqwest::Response, url: &str) -> Option<String> {
    if let Some(content_disposition) = response.headers().get(reqwest::header::CONTENT_DISPOSITION)
        && let Ok(value) = content_disposition.to_str()
        && let Some(name) = filename_from_content_disposition(value)
    {
        return Some(name);
    }

    filename_from_url(url)
}

/// Parse `filename=` / `filename*=` out of a Content-Disposition value
fn filename_from_content_disposition(value: &str) -> Option<String> {
    for part in value.split(';') {
        let part = part.trim();
        if let Some(encoded) = part.strip_prefix("filename*=") {
            // charset'lang'encoded-filename
            if let Some(idx) = encoded.rfind('\'')
                && let Ok(decoded) = urlencoding::decode(&encoded[idx + 1..])
            {
                return base_name(decoded.as_ref());
            }
        } else if let Some(name) = part.strip_prefix("filename=") {
            return base_name(name.trim_matches('"'));
        }
    }
    None
}

fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).ok()?;
    base_name(decoded.as_ref())
}

// Strip any directory components a hostile header might carry.
fn base_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
