//! Audio acquisition: download, transcode, read, clean up.
//!
//! yt-dlp writes best-audio to a uniquely-named temp file (the extension
//! is only known after the download), ffmpeg transcodes it to mono
//! 16 kHz PCM WAV, and the WAV bytes are read into memory. Every file
//! carrying this job's timestamp prefix is deleted before returning,
//! on both the success and failure branches.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::fs;
use tracing::{debug, warn};

use crate::adapters::{Ffmpeg, YtDlp};

/// Downloads and transcodes a video's audio track.
pub struct AudioPipeline {
    ytdlp: YtDlp,
    ffmpeg: Ffmpeg,
    work_dir: PathBuf,
}

impl AudioPipeline {
    pub fn new(ytdlp: YtDlp, ffmpeg: Ffmpeg, work_dir: PathBuf) -> Self {
        Self {
            ytdlp,
            ffmpeg,
            work_dir,
        }
    }

    /// Fetch the video's audio as mono 16 kHz 16-bit PCM WAV bytes.
    pub async fn acquire(&self, url: &str) -> Result<Vec<u8>> {
        fs::create_dir_all(&self.work_dir)
            .await
            .with_context(|| format!("Failed to create work dir: {}", self.work_dir.display()))?;

        let stamp = Utc::now().timestamp_millis();
        let result = self.download_and_transcode(url, stamp).await;

        // Temp files are removed unconditionally, whatever happened above
        self.cleanup(stamp).await;

        result
    }

    async fn download_and_transcode(&self, url: &str, stamp: i64) -> Result<Vec<u8>> {
        let template = self.work_dir.join(format!("{}.%(ext)s", stamp));
        self.ytdlp.download_best_audio(url, &template).await?;

        let source = self
            .find_download(stamp)
            .await?
            .context("Downloaded audio file not found")?;
        debug!(source = %source.display(), "Audio downloaded");

        let wav_path = self.work_dir.join(format!("{}.wav", stamp));
        self.ffmpeg.to_mono_wav(&source, &wav_path).await?;

        let bytes = fs::read(&wav_path)
            .await
            .context("Failed to read transcoded WAV")?;

        Ok(bytes)
    }

    /// Locate the downloaded file by its timestamp prefix, excluding the
    /// transcode target.
    async fn find_download(&self, stamp: i64) -> Result<Option<PathBuf>> {
        let prefix = format!("{}.", stamp);
        let wav_name = format!("{}.wav", stamp);

        let mut entries = fs::read_dir(&self.work_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if name.starts_with(&prefix) && name != wav_name {
                return Ok(Some(entry.path()));
            }
        }

        Ok(None)
    }

    /// Remove every file produced for this job's timestamp.
    async fn cleanup(&self, stamp: i64) {
        let prefix = format!("{}.", stamp);

        let Ok(mut entries) = fs::read_dir(&self.work_dir).await else {
            return;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if name.starts_with(&prefix) {
                if let Err(e) = fs::remove_file(entry.path()).await {
                    warn!(file = %entry.path().display(), error = %e, "Failed to remove temp file");
                }
            }
        }
    }
}
