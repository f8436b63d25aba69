//! Subprocess adapters for yt-dlp and ffmpeg.
//!
//! Both tools are driven as plain subprocesses with argument vectors
//! (never a shell string) and a hard timeout per invocation.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::time::timeout;

const TITLE_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);
const TRANSCODE_TIMEOUT: Duration = Duration::from_secs(300);

/// Run a command to completion, failing on a non-zero exit with the
/// trimmed stderr attached.
async fn run_checked(mut command: Command, what: &str, limit: Duration) -> Result<Vec<u8>> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", what))?;

    let output = timeout(limit, child.wait_with_output())
        .await
        .with_context(|| format!("{} timed out after {:?}", what, limit))?
        .with_context(|| format!("Failed to wait for {}", what))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);
        anyhow::bail!(
            "{} failed with exit code {}: {}",
            what,
            exit_code,
            stderr.trim()
        );
    }

    Ok(output.stdout)
}

/// yt-dlp subprocess adapter.
#[derive(Debug, Clone)]
pub struct YtDlp {
    /// Binary name or absolute path
    binary: String,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Resolve the video title (`yt-dlp --print title <url>`).
    pub async fn video_title(&self, url: &str) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command.args(["--print", "title", url]);

        let stdout = run_checked(command, "yt-dlp title lookup", TITLE_TIMEOUT).await?;
        let title = String::from_utf8_lossy(&stdout).trim().to_string();

        if title.is_empty() {
            anyhow::bail!("yt-dlp returned an empty title");
        }
        Ok(title)
    }

    /// Download best audio into the given output template
    /// (`yt-dlp -f bestaudio -o <template> <url>`).
    ///
    /// The template contains yt-dlp's `%(ext)s` placeholder, so the caller
    /// locates the produced file by filename prefix afterwards.
    pub async fn download_best_audio(&self, url: &str, output_template: &Path) -> Result<()> {
        let mut command = Command::new(&self.binary);
        command
            .args(["-f", "bestaudio", "-o"])
            .arg(output_template)
            .arg(url);

        run_checked(command, "yt-dlp audio download", DOWNLOAD_TIMEOUT).await?;
        Ok(())
    }
}

/// ffmpeg subprocess adapter.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: String,
}

impl Ffmpeg {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Transcode any audio input to mono 16 kHz 16-bit PCM WAV.
    pub async fn to_mono_wav(&self, input: &Path, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.binary);
        command
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-ac", "1", "-ar", "16000", "-acodec", "pcm_s16le"])
            .arg(output);

        run_checked(command, "ffmpeg transcode", TRANSCODE_TIMEOUT).await?;
        Ok(())
    }
}
