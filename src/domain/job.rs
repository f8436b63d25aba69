//! Analysis job record and its state machine.
//!
//! A job is created at submission time, mutated in place by the pipeline
//! stages, and becomes immutable once it reaches a terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::segment::TranscriptSegment;

/// One end-to-end processing attempt for a single submitted video URL.
///
/// Owned exclusively by the orchestrator task executing it; read-only to
/// everyone else once terminal. Audio bytes are persisted next to the job
/// document rather than inside it (see `JobStore`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    /// Unique identifier, generated at creation
    pub id: Uuid,

    /// The submitted YouTube URL
    pub source_url: String,

    /// Opaque owner identity, if the submission carried one
    pub owner_id: Option<String>,

    /// Video title, None until resolved (resolution is best-effort)
    pub video_title: Option<String>,

    /// Lifecycle state; terminal variants carry their completion time
    #[serde(flatten)]
    pub state: JobState,

    /// Durable screenshot URL, or the fallback placeholder
    pub screenshot_url: Option<String>,

    /// Object-store id of the uploaded screenshot, None on fallback
    pub screenshot_storage_id: Option<String>,

    /// MIME type of the stored audio
    pub audio_mime_type: String,

    /// Size of the stored audio in bytes (0 when no audio was kept)
    pub audio_size: u64,

    /// Ordered transcript; created wholesale by transcription + merge
    pub transcript: Vec<TranscriptSegment>,

    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl AnalysisJob {
    /// Create a new job in the processing state.
    pub fn new(source_url: impl Into<String>, owner_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_url: source_url.into(),
            owner_id,
            video_title: None,
            state: JobState::Processing,
            screenshot_url: None,
            screenshot_storage_id: None,
            audio_mime_type: "audio/wav".to_string(),
            audio_size: 0,
            transcript: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Transition to completed. No-op (with a warning) if already terminal:
    /// terminal states are never reversed and completed_at is set exactly once.
    pub fn mark_completed(&mut self) {
        if self.state.is_terminal() {
            tracing::warn!(job_id = %self.id, "Ignoring completion of a terminal job");
            return;
        }
        self.state = JobState::Completed {
            completed_at: Utc::now(),
        };
    }

    /// Transition to failed. No-op (with a warning) if already terminal.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        if self.state.is_terminal() {
            tracing::warn!(job_id = %self.id, "Ignoring failure of a terminal job");
            return;
        }
        self.state = JobState::Failed {
            error: error.into(),
            completed_at: Utc::now(),
        };
    }

    /// Whether audio bytes were kept for this job.
    pub fn has_audio(&self) -> bool {
        self.audio_size > 0
    }
}

/// Lifecycle state of a job.
///
/// Transitions only processing -> completed or processing -> failed.
/// The terminal variants make the completion-time payload explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum JobState {
    /// The pipeline is still running
    Processing,

    /// The pipeline finished (possibly degraded)
    Completed { completed_at: DateTime<Utc> },

    /// An unanticipated error escaped the stage-local handlers
    Failed {
        error: String,
        completed_at: DateTime<Utc>,
    },
}

impl JobState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Processing)
    }

    /// The wire label for this state.
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Processing => "processing",
            JobState::Completed { .. } => "completed",
            JobState::Failed { .. } => "failed",
        }
    }

    /// Completion time, if terminal.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            JobState::Processing => None,
            JobState::Completed { completed_at } | JobState::Failed { completed_at, .. } => {
                Some(*completed_at)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_creation() {
        let job = AnalysisJob::new("https://youtu.be/dQw4w9WgXcQ", Some("user-1".to_string()));

        assert_eq!(job.state, JobState::Processing);
        assert!(job.video_title.is_none());
        assert!(!job.has_audio());
        assert!(job.state.completed_at().is_none());
    }

    #[test]
    fn test_terminal_transitions_are_final() {
        let mut job = AnalysisJob::new("https://youtu.be/dQw4w9WgXcQ", None);

        job.mark_completed();
        let completed_at = job.state.completed_at().unwrap();

        // Neither transition may leave or restamp a terminal state
        job.mark_failed("too late");
        assert_eq!(job.state.label(), "completed");
        job.mark_completed();
        assert_eq!(job.state.completed_at(), Some(completed_at));
    }

    #[test]
    fn test_state_serialization_tag() {
        let mut job = AnalysisJob::new("https://youtu.be/dQw4w9WgXcQ", None);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "processing");
        assert!(json.get("completed_at").is_none());

        job.mark_failed("yt-dlp missing");
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "yt-dlp missing");
        assert!(json.get("completed_at").is_some());

        // Round-trips through the same tagged representation
        let parsed: AnalysisJob = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.state.label(), "failed");
    }
}
