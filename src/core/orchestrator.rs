//! Pipeline orchestration.
//!
//! Submission validates the URL, persists a processing-state job, and
//! returns it immediately; the pipeline itself runs on a detached task.
//! Stage failures degrade the job rather than failing it: the screenshot
//! stage substitutes a fallback URL, the audio path collapses into a
//! single synthetic error segment, and only an error that escapes every
//! stage-local handler marks the job failed.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::{
    CloudinaryStore, ElevenLabsClient, Ffmpeg, SaplingClient, SpeechToText, YtDlp,
};
use crate::analysis::Classifier;
use crate::config::ResolvedConfig;
use crate::core::job_store::{JobStore, StoreError};
use crate::domain::{AnalysisJob, TranscriptSegment};
use crate::ingest::{build_transcript, is_youtube_url, AudioPipeline, ScreenshotFetcher};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Not a valid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives jobs through the five pipeline stages.
pub struct Orchestrator {
    store: Arc<JobStore>,
    stt: Arc<dyn SpeechToText>,
    classifier: Classifier,
    screenshots: ScreenshotFetcher,
    audio: AudioPipeline,
    ytdlp: YtDlp,
}

impl Orchestrator {
    pub fn new(
        store: Arc<JobStore>,
        stt: Arc<dyn SpeechToText>,
        classifier: Classifier,
        screenshots: ScreenshotFetcher,
        audio: AudioPipeline,
        ytdlp: YtDlp,
    ) -> Self {
        Self {
            store,
            stt,
            classifier,
            screenshots,
            audio,
            ytdlp,
        }
    }

    /// Wire up the real provider adapters from resolved configuration.
    pub fn from_config(config: &ResolvedConfig, store: Arc<JobStore>) -> Self {
        let ytdlp = YtDlp::new(&config.ytdlp_bin);
        let ffmpeg = Ffmpeg::new(&config.ffmpeg_bin);

        Self::new(
            store,
            Arc::new(ElevenLabsClient::new(config.elevenlabs_api_key.clone())),
            Classifier::new(Arc::new(SaplingClient::new(
                config.sapling_api_key.clone(),
                config.sapling_api_url.clone(),
            ))),
            ScreenshotFetcher::new(Arc::new(CloudinaryStore::new(config.cloudinary.clone()))),
            AudioPipeline::new(ytdlp.clone(), ffmpeg, config.work_dir()),
            ytdlp,
        )
    }

    /// Validate and persist a submission, then start processing it in the
    /// background. Returns the job in its initial processing state.
    pub async fn submit(
        self: &Arc<Self>,
        url: &str,
        owner_id: Option<String>,
    ) -> Result<AnalysisJob, SubmitError> {
        let url = url.trim();
        if !is_youtube_url(url) {
            return Err(SubmitError::InvalidUrl(url.to_string()));
        }

        let job = AnalysisJob::new(url, owner_id);
        self.store.create(&job).await?;
        info!(job_id = %job.id, url, "Job submitted");

        let orchestrator = Arc::clone(self);
        let background = job.clone();
        tokio::spawn(async move {
            orchestrator.run(background).await;
        });

        Ok(job)
    }

    /// Run the pipeline to a terminal state. Never panics the task.
    async fn run(&self, mut job: AnalysisJob) {
        let job_id = job.id;
        if let Err(e) = self.execute(&mut job).await {
            error!(%job_id, error = %e, "Pipeline failed");
            job.mark_failed(e.to_string());
            if let Err(e) = self.store.save(&job).await {
                error!(%job_id, error = %e, "Failed to persist failed job");
            }
        }
    }

    async fn execute(&self, job: &mut AnalysisJob) -> Result<()> {
        match self.ytdlp.video_title(&job.source_url).await {
            Ok(title) => job.video_title = Some(title),
            Err(e) => warn!(job_id = %job.id, error = %e, "Title resolution failed"),
        }

        let screenshot = self.screenshots.capture(&job.source_url, job.id).await;
        job.screenshot_url = Some(screenshot.url);
        job.screenshot_storage_id = screenshot.storage_id;

        // Checkpoint before the long audio stage so readers see progress
        self.store
            .save(job)
            .await
            .context("Failed to checkpoint job")?;

        match self.process_audio(job).await {
            Ok(transcript) => job.transcript = transcript,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Audio stage failed, degrading");
                job.transcript = vec![TranscriptSegment::audio_failed()];
                job.audio_size = 0;
            }
        }

        job.mark_completed();
        self.store
            .save(job)
            .await
            .context("Failed to persist completed job")?;

        info!(job_id = %job.id, segments = job.transcript.len(), "Job completed");
        Ok(())
    }

    /// Download, transcode, transcribe, merge and classify. Any error
    /// here degrades the job instead of failing it.
    async fn process_audio(&self, job: &mut AnalysisJob) -> Result<Vec<TranscriptSegment>> {
        let wav = self.audio.acquire(&job.source_url).await?;

        let response = self.stt.transcribe(&wav).await?;
        let transcript = build_transcript(response);
        let classified = self.classifier.classify(transcript).await;

        job.audio_size = wav.len() as u64;
        self.store
            .save_audio(job.id, &wav)
            .await
            .context("Failed to persist audio")?;

        Ok(classified)
    }

    /// Read access used by the HTTP layer.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Load a job, hiding other owners' jobs as missing.
    pub async fn fetch(
        &self,
        id: Uuid,
        owner_id: Option<&str>,
    ) -> Result<AnalysisJob, StoreError> {
        let job = self.store.load(id).await?;

        if let (Some(requester), Some(owner)) = (owner_id, job.owner_id.as_deref()) {
            if requester != owner {
                return Err(StoreError::NotFound(id));
            }
        }

        Ok(job)
    }
}
