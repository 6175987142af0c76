//! Extractor backed by the external yt-dlp binary

use super::parser::{ExitStatus, YtDlpOutcome, parse_ytdlp_output};
use super::traits::Extractor;
use crate::error::ExtractError;
use crate::types::{MediaInfo, Platform};
use crate::utils::{PartialArtifacts, artifact_token};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Single-file format selection that needs no ffmpeg merge step
const DEFAULT_FORMAT: &str = "b[ext=mp4]/b";

/// Extractor that runs `yt-dlp` to download media
///
/// Each run writes to `<download_dir>/<label>-<random token>.<ext>`, so
/// concurrent requests sharing a download directory never collide. If the
/// extraction future is dropped (for example when the pipeline's extraction
/// timeout fires) the child process is killed and every file carrying the
/// run's prefix is removed.
///
/// # Examples
///
/// ```no_run
/// use linkgrab::extractor::YtDlpExtractor;
/// use linkgrab::Platform;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let extractor = YtDlpExtractor::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH, tuned for one platform
/// let tiktok = YtDlpExtractor::from_path()
///     .expect("yt-dlp not found in PATH")
///     .for_platform(Platform::Tiktok);
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    format: String,
    label: &'static str,
}

impl YtDlpExtractor {
    /// Create a new extractor with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            format: DEFAULT_FORMAT.to_string(),
            label: "media",
        }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// Uses the `which` crate to search for the `yt-dlp` binary.
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Tune format selection and file naming for a platform
    pub fn for_platform(mut self, platform: Platform) -> Self {
        self.format = match platform {
            Platform::Youtube => "b[ext=mp4][filesize<?2G]/b[ext=mp4]/b",
            Platform::Instagram | Platform::Tiktok => "b[ext=mp4]/b",
            Platform::Generic => DEFAULT_FORMAT,
        }
        .to_string();
        self.label = platform.as_str();
        self
    }

    /// Override the yt-dlp format selector
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Path of the binary this extractor runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn command(&self, url: &str, output_template: &Path) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("--no-playlist")
            .arg("--no-progress")
            .arg("--restrict-filenames")
            .arg("--dump-json")
            .arg("--no-simulate")
            .arg("--format")
            .arg(&self.format)
            .arg("--output")
            .arg(output_template)
            .arg("--")
            .arg(url)
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn extract(&self, url: &str, download_dir: &Path) -> crate::Result<Option<MediaInfo>> {
        let prefix = format!("{}-{}", self.label, artifact_token());
        let output_template = download_dir.join(format!("{}.%(ext)s", prefix));

        debug!(
            binary = ?self.binary_path,
            format = %self.format,
            ?output_template,
            "running yt-dlp"
        );

        // Declared before the child so it drops after it: kill first, then sweep.
        let partial = PartialArtifacts::with_prefix(download_dir, &prefix);

        let output = self
            .command(url, &output_template)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        let parsed = parse_ytdlp_output(
            &output.stdout,
            &output.stderr,
            ExitStatus::from(output.status.success()),
        );

        let file = match parsed? {
            YtDlpOutcome::Downloaded(file) => file,
            YtDlpOutcome::NothingFound => return Ok(None),
        };

        let metadata = match tokio::fs::metadata(&file.file_path).await {
            Ok(m) if m.is_file() => m,
            _ => {
                return Err(ExtractError::MissingArtifact {
                    path: file.file_path,
                }
                .into());
            }
        };

        partial.keep();
        Ok(Some(MediaInfo {
            media_type: file.media_type,
            file_path: file.file_path,
            file_size: metadata.len(),
            caption: file.title,
            direct_url: file.direct_url,
        }))
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
