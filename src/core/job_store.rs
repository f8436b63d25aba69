//! Durable job storage.
//!
//! One directory per job under the jobs root:
//!
//! ```text
//! jobs/<uuid>/job.json     serialized AnalysisJob
//! jobs/<uuid>/audio.wav    transcoded audio, only when kept
//! ```
//!
//! Documents are written atomically (temp file then rename) so readers
//! never observe a partially written job.

use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::AnalysisJob;

const JOB_FILE: &str = "job.json";
const AUDIO_FILE: &str = "audio.wav";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Job serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Filesystem-backed job store.
pub struct JobStore {
    jobs_dir: PathBuf,
}

impl JobStore {
    pub fn new(jobs_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
        }
    }

    /// Store rooted at the configured home directory.
    pub fn open_default() -> anyhow::Result<Self> {
        let config = crate::config::config()?;
        Ok(Self::new(config.jobs_dir()))
    }

    fn job_dir(&self, id: Uuid) -> PathBuf {
        self.jobs_dir.join(id.to_string())
    }

    /// Persist a newly submitted job.
    pub async fn create(&self, job: &AnalysisJob) -> Result<(), StoreError> {
        fs::create_dir_all(self.job_dir(job.id)).await?;
        self.save(job).await
    }

    /// Write the job document atomically.
    pub async fn save(&self, job: &AnalysisJob) -> Result<(), StoreError> {
        let dir = self.job_dir(job.id);
        fs::create_dir_all(&dir).await?;

        let body = serde_json::to_vec_pretty(job)?;
        let tmp = dir.join(format!("{}.tmp", JOB_FILE));
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, dir.join(JOB_FILE)).await?;

        debug!(job_id = %job.id, status = job.state.label(), "Job saved");
        Ok(())
    }

    /// Load one job by id.
    pub async fn load(&self, id: Uuid) -> Result<AnalysisJob, StoreError> {
        let path = self.job_dir(id).join(JOB_FILE);
        let body = match fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&body)?)
    }

    /// Persist the job's audio bytes next to its document.
    pub async fn save_audio(&self, id: Uuid, wav: &[u8]) -> Result<(), StoreError> {
        let dir = self.job_dir(id);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(AUDIO_FILE), wav).await?;
        Ok(())
    }

    /// Read back the job's audio bytes, if any were kept.
    pub async fn load_audio(&self, id: Uuid) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.job_dir(id).join(AUDIO_FILE)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All jobs, newest first. Unreadable documents are skipped with a
    /// warning rather than failing the whole listing.
    pub async fn list(&self) -> Result<Vec<AnalysisJob>, StoreError> {
        let mut jobs = Vec::new();

        let mut entries = match fs::read_dir(&self.jobs_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(jobs),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path().join(JOB_FILE);
            let body = match fs::read(&path).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable job");
                    continue;
                }
            };

            match serde_json::from_slice::<AnalysisJob>(&body) {
                Ok(job) => jobs.push(job),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping corrupt job"),
            }
        }

        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    /// Jobs belonging to one owner, newest first.
    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<AnalysisJob>, StoreError> {
        let mut jobs = self.list().await?;
        jobs.retain(|job| job.owner_id.as_deref() == Some(owner_id));
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, JobStore) {
        let temp = tempfile::tempdir().unwrap();
        let store = JobStore::new(temp.path().join("jobs"));
        (temp, store)
    }

    #[tokio::test]
    async fn test_create_load_round_trip() {
        let (_temp, store) = store();
        let mut job = AnalysisJob::new("https://youtu.be/dQw4w9WgXcQ", Some("u1".to_string()));
        job.video_title = Some("A video".to_string());

        store.create(&job).await.unwrap();
        let loaded = store.load(job.id).await.unwrap();

        assert_eq!(loaded.id, job.id);
        assert_eq!(loaded.video_title.as_deref(), Some("A video"));
        assert_eq!(loaded.owner_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let (_temp, store) = store();
        let id = Uuid::new_v4();

        match store.load(id).await {
            Err(StoreError::NotFound(missing)) => assert_eq!(missing, id),
            other => panic!("expected NotFound, got {:?}", other.map(|j| j.id)),
        }
    }

    #[tokio::test]
    async fn test_audio_round_trip_and_absence() {
        let (_temp, store) = store();
        let job = AnalysisJob::new("https://youtu.be/dQw4w9WgXcQ", None);
        store.create(&job).await.unwrap();

        assert!(store.load_audio(job.id).await.unwrap().is_none());

        store.save_audio(job.id, b"RIFFdata").await.unwrap();
        assert_eq!(
            store.load_audio(job.id).await.unwrap().as_deref(),
            Some(&b"RIFFdata"[..])
        );
    }

    #[tokio::test]
    async fn test_list_sorts_newest_first_and_skips_corrupt() {
        let (_temp, store) = store();

        let mut older = AnalysisJob::new("https://youtu.be/aaaaaaaaaaa", None);
        older.created_at = older.created_at - chrono::Duration::hours(1);
        let newer = AnalysisJob::new("https://youtu.be/bbbbbbbbbbb", None);
        store.create(&older).await.unwrap();
        store.create(&newer).await.unwrap();

        // A corrupt document must not break listing
        let broken_dir = store.jobs_dir.join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&broken_dir).unwrap();
        std::fs::write(broken_dir.join(JOB_FILE), b"{ not json").unwrap();

        let jobs = store.list().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, newer.id);
        assert_eq!(jobs[1].id, older.id);
    }

    #[tokio::test]
    async fn test_list_for_owner_filters() {
        let (_temp, store) = store();

        let mine = AnalysisJob::new("https://youtu.be/aaaaaaaaaaa", Some("me".to_string()));
        let theirs = AnalysisJob::new("https://youtu.be/bbbbbbbbbbb", Some("them".to_string()));
        let anon = AnalysisJob::new("https://youtu.be/ccccccccccc", None);
        for job in [&mine, &theirs, &anon] {
            store.create(job).await.unwrap();
        }

        let jobs = store.list_for_owner("me").await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, mine.id);
    }
}
