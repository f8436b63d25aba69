//! End-to-end pipeline tests with stub providers and fake subprocess
//! binaries.

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use tubecheck::adapters::{
    AuthorshipScorer, Ffmpeg, MediaStore, RawSegment, SpeechToText, StoredMedia,
    TranscriptionResponse, YtDlp,
};
use tubecheck::analysis::Classifier;
use tubecheck::core::{JobStore, Orchestrator};
use tubecheck::domain::{generate_ai_summary, AnalysisJob, Verdict};
use tubecheck::ingest::{AudioPipeline, ScreenshotFetcher, FALLBACK_SCREENSHOT_URL};

/// Write an executable shell script into `dir` and return its path.
fn fake_binary(dir: &Path, name: &str, script: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_str().unwrap().to_string()
}

/// yt-dlp stand-in: answers title lookups and writes a fake download.
fn fake_ytdlp(dir: &Path) -> String {
    fake_binary(
        dir,
        "yt-dlp",
        r#"#!/bin/sh
if [ "$1" = "--print" ]; then
    echo "Fake Video Title"
    exit 0
fi
out=$(printf '%s' "$4" | sed 's/%(ext)s/webm/')
printf 'fake-downloaded-audio' > "$out"
"#,
    )
}

/// ffmpeg stand-in: writes WAV-looking bytes to its last argument.
fn fake_ffmpeg(dir: &Path) -> String {
    fake_binary(
        dir,
        "ffmpeg",
        r#"#!/bin/sh
for last; do :; done
printf 'RIFF-fake-wav-payload' > "$last"
"#,
    )
}

struct SegmentedStt;

#[async_trait]
impl SpeechToText for SegmentedStt {
    async fn transcribe(&self, wav: &[u8]) -> Result<TranscriptionResponse> {
        assert!(!wav.is_empty());
        let segment = |text: &str, start: f64, end: f64| RawSegment {
            text: text.to_string(),
            start: Some(start),
            end: Some(end),
            speaker: Some("speaker_0".to_string()),
        };

        Ok(TranscriptionResponse {
            text: None,
            segments: Some(vec![
                segment("Well now.", 0.0, 1.5),
                segment("Let me tell you.", 1.5, 3.0),
                segment("This essay was definitely produced by a machine.", 3.0, 8.0),
            ]),
        })
    }
}

struct FixedScorer(f64);

#[async_trait]
impl AuthorshipScorer for FixedScorer {
    async fn score(&self, _text: &str) -> Result<f64> {
        Ok(self.0)
    }
}

struct OfflineMediaStore;

#[async_trait]
impl MediaStore for OfflineMediaStore {
    async fn upload_image(&self, _bytes: Vec<u8>, _public_id: &str) -> Result<StoredMedia> {
        anyhow::bail!("media store offline")
    }
}

struct Harness {
    _temp: tempfile::TempDir,
    store: Arc<JobStore>,
    orchestrator: Arc<Orchestrator>,
}

fn harness(ytdlp_bin: String, ffmpeg_bin: String, temp: tempfile::TempDir) -> Harness {
    let store = Arc::new(JobStore::new(temp.path().join("jobs")));
    let ytdlp = YtDlp::new(ytdlp_bin);

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        Arc::new(SegmentedStt),
        Classifier::with_limits(Arc::new(FixedScorer(0.95)), Duration::from_millis(1), 4),
        ScreenshotFetcher::new(Arc::new(OfflineMediaStore))
            .with_thumbnail_base("http://127.0.0.1:9"),
        AudioPipeline::new(ytdlp.clone(), Ffmpeg::new(ffmpeg_bin), temp.path().join("work")),
        ytdlp,
    ));

    Harness {
        _temp: temp,
        store,
        orchestrator,
    }
}

async fn wait_terminal(store: &JobStore, id: Uuid) -> AnalysisJob {
    for _ in 0..200 {
        let job = store.load(id).await.unwrap();
        if job.state.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job never reached a terminal state");
}

#[tokio::test]
async fn full_pipeline_with_fake_tools() {
    let temp = tempfile::tempdir().unwrap();
    let ytdlp = fake_ytdlp(temp.path());
    let ffmpeg = fake_ffmpeg(temp.path());
    let h = harness(ytdlp, ffmpeg, temp);

    let job = h
        .orchestrator
        .submit("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Some("u1".to_string()))
        .await
        .unwrap();
    assert_eq!(job.state.label(), "processing");

    let done = wait_terminal(&h.store, job.id).await;

    assert_eq!(done.state.label(), "completed");
    assert_eq!(done.video_title.as_deref(), Some("Fake Video Title"));
    // Offline media store: the screenshot degrades to the placeholder
    assert_eq!(done.screenshot_url.as_deref(), Some(FALLBACK_SCREENSHOT_URL));

    // The two short openers fold into one segment ahead of the long one
    assert_eq!(done.transcript.len(), 2);
    assert_eq!(done.transcript[0].text, "Well now. Let me tell you.");
    assert_eq!(done.transcript[1].text, "This essay was definitely produced by a machine.");
    let ids: Vec<usize> = done.transcript.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![0, 1]);

    for segment in &done.transcript {
        assert_eq!(segment.ai_probability, Some(0.95));
        assert!(segment.error.is_none());
    }

    let summary = generate_ai_summary(&done.transcript);
    assert_eq!(summary.verdict, Verdict::HighlyAiGenerated);
    assert_eq!(summary.ai_percentage, 100);

    // Audio was persisted and temp files cleaned up
    assert!(done.has_audio());
    let audio = h.store.load_audio(done.id).await.unwrap().unwrap();
    assert_eq!(audio, b"RIFF-fake-wav-payload");
    assert_eq!(done.audio_size, audio.len() as u64);
}

#[tokio::test]
async fn audio_failure_degrades_to_synthetic_segment() {
    let temp = tempfile::tempdir().unwrap();
    let h = harness(
        "/nonexistent/yt-dlp".to_string(),
        "/nonexistent/ffmpeg".to_string(),
        temp,
    );

    let job = h
        .orchestrator
        .submit("https://youtu.be/dQw4w9WgXcQ", None)
        .await
        .unwrap();
    let done = wait_terminal(&h.store, job.id).await;

    // Degraded, not failed
    assert_eq!(done.state.label(), "completed");
    assert_eq!(done.transcript.len(), 1);
    assert_eq!(done.transcript[0].error.as_deref(), Some("Audio processing failed"));
    assert!(!done.has_audio());
    assert!(h.store.load_audio(done.id).await.unwrap().is_none());

    let summary = generate_ai_summary(&done.transcript);
    assert_eq!(summary.verdict, Verdict::AnalysisError);
    assert_eq!(summary.error.as_deref(), Some("1 segments failed analysis"));
}

#[tokio::test]
async fn transcode_failure_leaves_no_work_files() {
    let temp = tempfile::tempdir().unwrap();
    let ytdlp = fake_ytdlp(temp.path());
    let ffmpeg = fake_binary(temp.path(), "ffmpeg-broken", "#!/bin/sh\nexit 1\n");
    let work_dir = temp.path().join("work");

    let h = harness(ytdlp, ffmpeg, temp);

    let job = h
        .orchestrator
        .submit("https://youtu.be/dQw4w9WgXcQ", None)
        .await
        .unwrap();
    let done = wait_terminal(&h.store, job.id).await;

    assert_eq!(done.state.label(), "completed");
    assert_eq!(done.transcript[0].error.as_deref(), Some("Audio processing failed"));

    let leftovers: Vec<_> = std::fs::read_dir(&work_dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.file_name()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "leftover work files: {:?}", leftovers);
}
