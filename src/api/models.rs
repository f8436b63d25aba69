//! Wire DTOs for the HTTP interface.
//!
//! Response shapes are camelCase and decoupled from the persisted job
//! document so storage evolution never leaks onto the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::summary::{generate_ai_summary, AiSummary, Confidence, Verdict};
use crate::domain::{AnalysisJob, JobState, TranscriptSegment};
use crate::ingest::FALLBACK_SCREENSHOT_URL;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

/// Body of the 201 response to a submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeAccepted {
    pub id: Uuid,
    pub status: &'static str,
    pub video_title: Option<String>,
}

impl AnalyzeAccepted {
    pub fn from_job(job: &AnalysisJob) -> Self {
        Self {
            id: job.id,
            status: job.state.label(),
            video_title: job.video_title.clone(),
        }
    }
}

/// Full analysis document returned by the result endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub id: Uuid,
    pub youtube_url: String,
    pub video_title: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub screenshot_url: String,
    pub audio_url: Option<String>,
    pub audio_size: u64,
    pub audio_mime_type: String,
    pub transcript: Vec<TranscriptSegment>,
    pub ai_analysis_summary: AiSummary,
}

impl ResultResponse {
    pub fn from_job(job: &AnalysisJob) -> Self {
        let error = match &job.state {
            JobState::Failed { error, .. } => Some(error.clone()),
            _ => None,
        };

        Self {
            id: job.id,
            youtube_url: job.source_url.clone(),
            video_title: job.video_title.clone(),
            status: job.state.label(),
            error,
            created_at: job.created_at,
            completed_at: job.state.completed_at(),
            screenshot_url: screenshot_url(job),
            audio_url: audio_url(job),
            audio_size: job.audio_size,
            audio_mime_type: job.audio_mime_type.clone(),
            transcript: job.transcript.clone(),
            ai_analysis_summary: generate_ai_summary(&job.transcript),
        }
    }
}

/// Condensed verdict attached to list items.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickSummary {
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub ai_percentage: u32,
    pub total_segments: usize,
    pub has_errors: bool,
}

/// One row in the analyses listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: Uuid,
    pub youtube_url: String,
    pub video_title: Option<String>,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub screenshot_url: String,
    pub quick_summary: Option<QuickSummary>,
}

impl JobSummary {
    pub fn from_job(job: &AnalysisJob) -> Self {
        let quick_summary = job.state.is_terminal().then(|| {
            let summary = generate_ai_summary(&job.transcript);
            QuickSummary {
                verdict: summary.verdict,
                confidence: summary.confidence,
                ai_percentage: summary.ai_percentage,
                total_segments: summary.total_segments,
                has_errors: summary.error.is_some(),
            }
        });

        Self {
            id: job.id,
            youtube_url: job.source_url.clone(),
            video_title: job.video_title.clone(),
            status: job.state.label(),
            created_at: job.created_at,
            completed_at: job.state.completed_at(),
            screenshot_url: screenshot_url(job),
            quick_summary,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub analyses: Vec<JobSummary>,
    pub pagination: Pagination,
}

impl ListResponse {
    /// Paginate an already owner-filtered, newest-first job list.
    pub fn paginate(jobs: &[AnalysisJob], query: &ListQuery) -> Self {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);

        let total = jobs.len();
        let total_pages = total.div_ceil(limit);
        let start = (page - 1).saturating_mul(limit);

        let analyses = jobs
            .iter()
            .skip(start)
            .take(limit)
            .map(JobSummary::from_job)
            .collect();

        Self {
            analyses,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
            },
        }
    }
}

fn screenshot_url(job: &AnalysisJob) -> String {
    job.screenshot_url
        .clone()
        .unwrap_or_else(|| FALLBACK_SCREENSHOT_URL.to_string())
}

fn audio_url(job: &AnalysisJob) -> Option<String> {
    job.has_audio()
        .then(|| format!("/api/media/audio/{}", job.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jobs(count: usize) -> Vec<AnalysisJob> {
        (0..count)
            .map(|_| AnalysisJob::new("https://youtu.be/dQw4w9WgXcQ", None))
            .collect()
    }

    #[test]
    fn test_pagination_math() {
        let jobs = jobs(23);
        let response = ListResponse::paginate(
            &jobs,
            &ListQuery {
                page: Some(3),
                limit: Some(10),
            },
        );

        assert_eq!(response.analyses.len(), 3);
        assert_eq!(response.pagination.total, 23);
        assert_eq!(response.pagination.total_pages, 3);
        assert_eq!(response.pagination.page, 3);
    }

    #[test]
    fn test_pagination_clamps_limit_and_page() {
        let jobs = jobs(5);
        let response = ListResponse::paginate(
            &jobs,
            &ListQuery {
                page: Some(0),
                limit: Some(500),
            },
        );

        assert_eq!(response.pagination.page, 1);
        assert_eq!(response.pagination.limit, MAX_PAGE_LIMIT);
        assert_eq!(response.analyses.len(), 5);
    }

    #[test]
    fn test_past_the_end_page_is_empty() {
        let jobs = jobs(4);
        let response = ListResponse::paginate(
            &jobs,
            &ListQuery {
                page: Some(9),
                limit: None,
            },
        );

        assert!(response.analyses.is_empty());
        assert_eq!(response.pagination.total, 4);
    }

    #[test]
    fn test_result_response_defaults() {
        let job = AnalysisJob::new("https://youtu.be/dQw4w9WgXcQ", None);
        let response = ResultResponse::from_job(&job);

        assert_eq!(response.status, "processing");
        assert_eq!(response.screenshot_url, FALLBACK_SCREENSHOT_URL);
        assert!(response.audio_url.is_none());
        assert_eq!(response.ai_analysis_summary.verdict, Verdict::NoData);
    }

    #[test]
    fn test_quick_summary_only_on_terminal_jobs() {
        let mut job = AnalysisJob::new("https://youtu.be/dQw4w9WgXcQ", None);
        assert!(JobSummary::from_job(&job).quick_summary.is_none());

        job.mark_completed();
        let summary = JobSummary::from_job(&job).quick_summary.unwrap();
        assert_eq!(summary.verdict, Verdict::NoData);
        assert!(summary.has_errors);
    }

    #[test]
    fn test_audio_url_present_when_audio_kept() {
        let mut job = AnalysisJob::new("https://youtu.be/dQw4w9WgXcQ", None);
        job.audio_size = 1024;

        let response = ResultResponse::from_job(&job);
        assert_eq!(
            response.audio_url.as_deref(),
            Some(format!("/api/media/audio/{}", job.id).as_str())
        );
    }
}
