//! Per-segment classification with throttled, bounded-concurrency scoring.
//!
//! Each merged segment is scored individually; a provider error, an
//! out-of-range score, or missing credentials assigns the fixed default
//! score instead of aborting the batch. Calls share a token-bucket
//! inter-call limiter and a bounded worker pool, and result order is
//! restored by original segment index before returning.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, warn};

use crate::adapters::AuthorshipScorer;
use crate::domain::segment::{
    verdict_for, SegmentVerdict, TranscriptSegment, DEFAULT_AI_PROBABILITY,
    MIN_CLASSIFIABLE_CHARS,
};
use crate::domain::summary::round3;

/// Minimum spacing between scorer calls.
pub const CLASSIFY_INTERVAL: Duration = Duration::from_millis(100);

/// Worker pool width for scorer calls.
pub const CLASSIFY_CONCURRENCY: usize = 4;

/// Token-bucket style limiter: each acquire reserves the next slot on a
/// fixed-interval schedule and sleeps until it arrives.
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Wait for the next available call slot.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = if *next > now { *next } else { now };
            *next = slot + self.interval;
            slot
        };

        sleep_until(slot).await;
    }
}

/// Scores merged transcript segments.
pub struct Classifier {
    scorer: Arc<dyn AuthorshipScorer>,
    limiter: Arc<RateLimiter>,
    concurrency: usize,
}

impl Classifier {
    pub fn new(scorer: Arc<dyn AuthorshipScorer>) -> Self {
        Self::with_limits(scorer, CLASSIFY_INTERVAL, CLASSIFY_CONCURRENCY)
    }

    pub fn with_limits(
        scorer: Arc<dyn AuthorshipScorer>,
        interval: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            scorer,
            limiter: Arc::new(RateLimiter::new(interval)),
            concurrency: concurrency.max(1),
        }
    }

    /// Annotate every segment with its score and verdict.
    ///
    /// An empty input degrades to the single synthetic "no transcript"
    /// segment. The returned list is in original segment order with ids
    /// reassigned 0..N-1.
    pub async fn classify(&self, segments: Vec<TranscriptSegment>) -> Vec<TranscriptSegment> {
        if segments.is_empty() {
            warn!("Classifier received an empty transcript");
            return vec![TranscriptSegment::no_transcript()];
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();

        for (index, mut segment) in segments.into_iter().enumerate() {
            let scorer = Arc::clone(&self.scorer);
            let limiter = Arc::clone(&self.limiter);
            let semaphore = Arc::clone(&semaphore);

            workers.spawn(async move {
                // A closed semaphore is impossible here; scoring proceeds
                // unthrottled rather than panicking if it ever were.
                let _permit = semaphore.acquire_owned().await.ok();

                let (score, verdict) = score_text(&*scorer, &limiter, &segment.text).await;
                segment.id = index;
                segment.ai_probability = Some(score);
                segment.analysis = Some(verdict);
                segment.error = None;

                (index, segment)
            });
        }

        let mut scored = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(pair) => scored.push(pair),
                Err(e) => error!(error = %e, "Classification worker aborted"),
            }
        }

        // Aggregation depends on original ordering, not completion order
        scored.sort_by_key(|(index, _)| *index);
        scored.into_iter().map(|(_, segment)| segment).collect()
    }
}

async fn score_text(
    scorer: &dyn AuthorshipScorer,
    limiter: &RateLimiter,
    text: &str,
) -> (f64, SegmentVerdict) {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_CLASSIFIABLE_CHARS {
        debug!("Segment too short to score, using default");
        return (DEFAULT_AI_PROBABILITY, SegmentVerdict::Human);
    }

    limiter.acquire().await;

    match scorer.score(trimmed).await {
        Ok(score) if (0.0..=1.0).contains(&score) => {
            let rounded = round3(score);
            (rounded, verdict_for(rounded))
        }
        Ok(score) => {
            warn!(score, "Scorer returned an out-of-range score, using default");
            (DEFAULT_AI_PROBABILITY, SegmentVerdict::Human)
        }
        Err(e) => {
            warn!(error = %e, "Scoring failed, using default");
            (DEFAULT_AI_PROBABILITY, SegmentVerdict::Human)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scorer that derives the score from the text so ordering is visible.
    struct EchoScorer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuthorshipScorer for EchoScorer {
        async fn score(&self, text: &str) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let digit = text
                .chars()
                .find(|c| c.is_ascii_digit())
                .and_then(|c| c.to_digit(10))
                .unwrap_or(0);
            Ok(digit as f64 / 10.0)
        }
    }

    struct FailingScorer;

    #[async_trait]
    impl AuthorshipScorer for FailingScorer {
        async fn score(&self, _text: &str) -> Result<f64> {
            anyhow::bail!("provider outage")
        }
    }

    fn segments(texts: &[&str]) -> Vec<TranscriptSegment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TranscriptSegment::new(i, *t, 0.0, 4.0, "unknown"))
            .collect()
    }

    fn fast_classifier(scorer: Arc<dyn AuthorshipScorer>) -> Classifier {
        Classifier::with_limits(scorer, Duration::from_millis(1), 4)
    }

    #[tokio::test]
    async fn test_order_restored_under_concurrency() {
        let classifier = fast_classifier(Arc::new(EchoScorer {
            calls: AtomicUsize::new(0),
        }));

        let input = segments(&[
            "segment number 9 speaks at length",
            "segment number 2 speaks at length",
            "segment number 7 speaks at length",
            "segment number 1 speaks at length",
        ]);
        let scored = classifier.classify(input).await;

        let probabilities: Vec<f64> =
            scored.iter().filter_map(|s| s.ai_probability).collect();
        assert_eq!(probabilities, vec![0.9, 0.2, 0.7, 0.1]);

        let ids: Vec<usize> = scored.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_short_text_skips_the_scorer() {
        let scorer = Arc::new(EchoScorer {
            calls: AtomicUsize::new(0),
        });
        let classifier = fast_classifier(scorer.clone());

        let scored = classifier.classify(segments(&["short 9"])).await;

        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(scored[0].ai_probability, Some(DEFAULT_AI_PROBABILITY));
        assert_eq!(scored[0].analysis, Some(SegmentVerdict::Human));
    }

    #[tokio::test]
    async fn test_provider_failure_assigns_default_without_error() {
        let classifier = fast_classifier(Arc::new(FailingScorer));

        let scored = classifier
            .classify(segments(&["a segment long enough to score"]))
            .await;

        assert_eq!(scored[0].ai_probability, Some(DEFAULT_AI_PROBABILITY));
        assert_eq!(scored[0].analysis, Some(SegmentVerdict::Human));
        assert!(scored[0].error.is_none());
    }

    #[tokio::test]
    async fn test_empty_transcript_degrades_to_synthetic_segment() {
        let classifier = fast_classifier(Arc::new(FailingScorer));

        let scored = classifier.classify(Vec::new()).await;

        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].error.as_deref(), Some("No transcript data"));
        assert!(scored[0].ai_probability.is_none());
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(20));

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        // Third slot is two intervals after the first
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
