//! Parser for yt-dlp command output

use crate::error::ExtractError;
use crate::types::MediaType;
use crate::utils::media_type_from_path;
use serde::Deserialize;
use std::path::PathBuf;

/// Exit status of an external command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command exited successfully (exit code 0)
    Success,
    /// The command exited with a non-zero exit code
    Failure,
}

impl ExitStatus {
    /// Returns `true` if the exit status represents success
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<bool> for ExitStatus {
    fn from(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// What a yt-dlp run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YtDlpOutcome {
    /// A file was downloaded
    Downloaded(DownloadedFile),
    /// yt-dlp found nothing it could download at that URL
    NothingFound,
}

/// Details of the file yt-dlp wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Final path of the artifact (after any merge/remux)
    pub file_path: PathBuf,
    /// Title of the media, used as caption
    pub title: String,
    /// Direct media URL, when yt-dlp resolved a single format
    pub direct_url: Option<String>,
    /// Delivery channel derived from codecs and extension
    pub media_type: MediaType,
}

/// stderr fragments meaning "this URL has nothing to download"
const NOTHING_FOUND_MARKERS: &[&str] = &[
    "unsupported url",
    "no video formats found",
    "there is no video in this post",
    "no media found",
    "requested format is not available",
];

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default, rename = "_filename")]
    underscore_filename: Option<String>,
    #[serde(default)]
    requested_downloads: Vec<RawDownload>,
}

#[derive(Debug, Deserialize)]
struct RawDownload {
    #[serde(default)]
    filepath: Option<String>,
}

/// Parse output from `yt-dlp --dump-json --no-simulate`
///
/// # Arguments
///
/// * `stdout` - Standard output; the info JSON is the last line starting with `{`
/// * `stderr` - Standard error, used to classify failures
/// * `exit_status` - Whether the command exited successfully
///
/// # Errors
///
/// - [`ExtractError::ToolFailed`] for a failed run that is not a "nothing found" case
/// - [`ExtractError::MalformedOutput`] when a successful run printed no usable JSON
pub fn parse_ytdlp_output(
    stdout: &[u8],
    stderr: &[u8],
    exit_status: ExitStatus,
) -> Result<YtDlpOutcome, ExtractError> {
    let output = String::from_utf8_lossy(stdout);
    let error_output = String::from_utf8_lossy(stderr);

    if !exit_status.is_success() {
        let lower = error_output.to_lowercase();
        if NOTHING_FOUND_MARKERS.iter().any(|m| lower.contains(m)) {
            return Ok(YtDlpOutcome::NothingFound);
        }
        return Err(ExtractError::ToolFailed {
            tool: "yt-dlp".to_string(),
            status: "non-zero exit status".to_string(),
            stderr: last_error_line(&error_output),
        });
    }

    let json_line = output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
        .ok_or_else(|| ExtractError::MalformedOutput {
            reason: "yt-dlp printed no info JSON".to_string(),
        })?;

    let raw: RawInfo =
        serde_json::from_str(json_line).map_err(|e| ExtractError::MalformedOutput {
            reason: format!("invalid info JSON: {}", e),
        })?;

    let file_path = raw
        .requested_downloads
        .iter()
        .rev()
        .find_map(|d| d.filepath.clone())
        .or(raw.filename)
        .or(raw.underscore_filename)
        .map(PathBuf::from)
        .ok_or_else(|| ExtractError::MalformedOutput {
            reason: "info JSON names no output file".to_string(),
        })?;

    let media_type = media_type_for(
        &file_path,
        raw.vcodec.as_deref(),
        raw.acodec.as_deref(),
    );

    let direct_url = raw.url.filter(|u| u.starts_with("http://") || u.starts_with("https://"));

    Ok(YtDlpOutcome::Downloaded(DownloadedFile {
        file_path,
        title: raw.title.unwrap_or_default(),
        direct_url,
        media_type,
    }))
}

fn has_codec(codec: Option<&str>) -> bool {
    codec.is_some_and(|c| !c.is_empty() && c != "none")
}

fn media_type_for(path: &std::path::Path, vcodec: Option<&str>, acodec: Option<&str>) -> MediaType {
    match media_type_from_path(path) {
        MediaType::Photo => MediaType::Photo,
        by_extension => {
            if has_codec(vcodec) {
                MediaType::Video
            } else if has_codec(acodec) {
                MediaType::Audio
            } else {
                by_extension
            }
        }
    }
}

/// Pick the most informative line from yt-dlp's stderr
fn last_error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "no error output".to_string())
}
