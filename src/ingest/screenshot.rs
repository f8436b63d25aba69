//! Screenshot acquisition.
//!
//! Extracts the 11-character video id, fetches the canonical YouTube
//! thumbnail, and uploads it to the object store. Every failure along
//! that path substitutes the fixed fallback URL; this stage never
//! propagates an error to the orchestrator.

use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapters::MediaStore;

/// Fallback URL served when no durable screenshot exists.
pub const FALLBACK_SCREENSHOT_URL: &str = "/api/media/fallback-screenshot";

const DEFAULT_THUMBNAIL_BASE: &str = "https://img.youtube.com";

fn video_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:youtube\.com/(?:[^/\s]+/\S+/|(?:v|e(?:mbed)?)/|\S*?[?&]v=)|youtu\.be/)([A-Za-z0-9_-]{11})",
        )
        .expect("video id regex is valid")
    })
}

fn youtube_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+$")
            .expect("youtube url regex is valid")
    })
}

/// Extract the 11-character video id from a watch/share/embed URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    video_id_re()
        .captures(url)
        .map(|captures| captures[1].to_string())
}

/// Whether a URL is a recognizable YouTube watch/share link.
pub fn is_youtube_url(url: &str) -> bool {
    youtube_url_re().is_match(url)
}

/// Outcome of the screenshot stage. Always populated.
#[derive(Debug, Clone)]
pub struct ScreenshotResult {
    pub url: String,
    pub storage_id: Option<String>,
}

impl ScreenshotResult {
    fn fallback() -> Self {
        Self {
            url: FALLBACK_SCREENSHOT_URL.to_string(),
            storage_id: None,
        }
    }
}

/// Fetches the canonical thumbnail and uploads it to the media store.
pub struct ScreenshotFetcher {
    store: Arc<dyn MediaStore>,
    client: reqwest::Client,
    thumbnail_base: String,
}

impl ScreenshotFetcher {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self {
            store,
            client: reqwest::Client::new(),
            thumbnail_base: DEFAULT_THUMBNAIL_BASE.to_string(),
        }
    }

    /// Fetch thumbnails from a different host (for tests).
    pub fn with_thumbnail_base(mut self, base: impl Into<String>) -> Self {
        self.thumbnail_base = base.into();
        self
    }

    /// Capture a screenshot for the video, falling back to the fixed
    /// placeholder URL on any failure.
    pub async fn capture(&self, url: &str, job_id: Uuid) -> ScreenshotResult {
        match self.try_capture(url, job_id).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Screenshot acquisition failed, using fallback");
                ScreenshotResult::fallback()
            }
        }
    }

    async fn try_capture(&self, url: &str, job_id: Uuid) -> Result<ScreenshotResult> {
        let video_id = extract_video_id(url).context("Could not extract a video id")?;

        let thumbnail_url = format!(
            "{}/vi/{}/maxresdefault.jpg",
            self.thumbnail_base, video_id
        );
        debug!(%thumbnail_url, "Fetching thumbnail");

        let bytes = self
            .client
            .get(&thumbnail_url)
            .send()
            .await
            .context("Failed to fetch thumbnail")?
            .error_for_status()
            .context("Thumbnail request rejected")?
            .bytes()
            .await
            .context("Failed to read thumbnail body")?;

        let stored = self
            .store
            .upload_image(bytes.to_vec(), &format!("screenshot_{}", job_id))
            .await
            .context("Failed to upload screenshot")?;

        Ok(ScreenshotResult {
            url: stored.url,
            storage_id: stored.storage_id,
        })
    }
}
