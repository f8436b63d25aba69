//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the unreliable collaborators
//! the pipeline depends on: speech-to-text, authorship scoring, and the
//! screenshot object store. The orchestrator only sees these traits.

pub mod cloudinary;
pub mod elevenlabs;
pub mod sapling;
pub mod ytdlp;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

pub use cloudinary::{CloudinaryCredentials, CloudinaryStore};
pub use elevenlabs::ElevenLabsClient;
pub use sapling::SaplingClient;
pub use ytdlp::{Ffmpeg, YtDlp};

/// Raw output of a speech-to-text provider, before normalization.
///
/// Providers either return explicit segment boundaries, a flat text
/// blob, or (rarely) neither.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptionResponse {
    /// Flat transcript text, when no segments are present
    #[serde(default)]
    pub text: Option<String>,

    /// Explicit timed segments, preferred when present
    #[serde(default)]
    pub segments: Option<Vec<RawSegment>>,
}

/// One provider-reported segment.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSegment {
    pub text: String,

    #[serde(default)]
    pub start: Option<f64>,

    #[serde(default)]
    pub end: Option<f64>,

    #[serde(default)]
    pub speaker: Option<String>,
}

/// Speech-to-text provider.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe mono 16 kHz PCM WAV bytes.
    ///
    /// Implementations absorb provider outages themselves (returning a
    /// built-in minimal transcript); an Err here is unexpected and fails
    /// the job.
    async fn transcribe(&self, wav: &[u8]) -> Result<TranscriptionResponse>;
}

/// External authorship-scoring API.
#[async_trait]
pub trait AuthorshipScorer: Send + Sync {
    /// Score a text, returning an AI probability in [0, 1].
    async fn score(&self, text: &str) -> Result<f64>;
}

/// Result of uploading a media object.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    /// Durable URL of the uploaded object
    pub url: String,

    /// Provider-side id, usable for later deletion
    pub storage_id: Option<String>,
}

/// Durable object store for screenshots.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload image bytes under the given public id.
    async fn upload_image(&self, bytes: Vec<u8>, public_id: &str) -> Result<StoredMedia>;
}
