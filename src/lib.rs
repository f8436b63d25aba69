//! tubecheck - segment-level AI authorship analysis for YouTube videos
//!
//! Ingests a YouTube URL and produces a persisted, per-segment
//! authorship verdict (AI vs. human) plus an aggregate summary,
//! tracked through an asynchronous job lifecycle.
//!
//! # Architecture
//!
//! Each submission creates a job and hands it to a detached background
//! task that runs the pipeline stages in order:
//!
//! 1. Media acquisition (thumbnail screenshot, best-audio download + WAV transcode)
//! 2. Transcription (speech-to-text with model fallback)
//! 3. Segment merging (short utterances folded into their neighbors)
//! 4. Per-segment authorship classification
//! 5. Aggregate scoring (recomputed on every read, never cached)
//!
//! Provider outages degrade the job rather than failing it: a broken
//! screenshot store falls back to a placeholder URL, and a broken audio
//! path leaves a single synthetic error segment on a still-`completed` job.
//!
//! # Modules
//!
//! - `adapters`: External system integrations (ElevenLabs, Sapling, Cloudinary, yt-dlp/ffmpeg)
//! - `ingest`: Media acquisition and transcript construction
//! - `analysis`: Per-segment classification
//! - `core`: Orchestration and job persistence
//! - `domain`: Data structures (AnalysisJob, TranscriptSegment, AiSummary)
//! - `api`: HTTP surface (submission, results, media)
//! - `cli`: Command-line interface

pub mod adapters;
pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;

// Re-export main types at crate root for convenience
pub use crate::core::{JobStore, Orchestrator, SubmitError};
pub use domain::{generate_ai_summary, AiSummary, AnalysisJob, JobState, TranscriptSegment};
pub use ingest::{build_transcript, merge_short_segments};
