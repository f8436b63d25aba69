//! Transcript construction: provider-output normalization and merging.
//!
//! Normalization prefers explicit segment boundaries; without them the
//! flat text is split on sentence-ending punctuation into synthetic
//! 4-second windows, and an empty response yields one placeholder
//! segment. Short segments are then folded into their successors and
//! ids reassigned.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::adapters::TranscriptionResponse;
use crate::domain::segment::{TranscriptSegment, MERGE_MIN_CHARS};

/// Synthetic window length for sentence-split transcripts, in seconds.
const SENTENCE_WINDOW_SECS: f64 = 4.0;

fn sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("sentence split regex is valid"))
}

/// Build the final (merged, re-numbered) transcript from provider output.
pub fn build_transcript(response: TranscriptionResponse) -> Vec<TranscriptSegment> {
    let segments = normalize_response(response);
    merge_short_segments(segments, MERGE_MIN_CHARS)
}

/// Normalize provider output into unclassified segments.
pub fn normalize_response(response: TranscriptionResponse) -> Vec<TranscriptSegment> {
    if let Some(raw_segments) = response.segments.filter(|s| !s.is_empty()) {
        return raw_segments
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                TranscriptSegment::new(
                    index,
                    raw.text.trim(),
                    raw.start.unwrap_or(0.0),
                    raw.end.unwrap_or(0.0),
                    raw.speaker.unwrap_or_else(|| "unknown".to_string()),
                )
            })
            .collect();
    }

    if let Some(text) = response.text.filter(|t| !t.trim().is_empty()) {
        return sentence_end_re()
            .split(&text)
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
            .enumerate()
            .map(|(index, sentence)| {
                TranscriptSegment::new(
                    index,
                    format!("{}.", sentence),
                    index as f64 * SENTENCE_WINDOW_SECS,
                    (index + 1) as f64 * SENTENCE_WINDOW_SECS,
                    "unknown",
                )
            })
            .collect();
    }

    vec![TranscriptSegment::new(
        0,
        "Transcription completed",
        0.0,
        5.0,
        "unknown",
    )]
}

/// Fold segments shorter than `min_chars` into their successors.
///
/// While the current segment's text is below the threshold and a next
/// segment exists, the next segment's text is appended (single-space
/// separated), the end time extended, and the consumed segment skipped.
/// Ids are reassigned 0..N-1 afterwards. Order- and text-preserving;
/// idempotent on its own output except when the final segment alone
/// remains under the threshold (accepted, not worked around).
pub fn merge_short_segments(
    segments: Vec<TranscriptSegment>,
    min_chars: usize,
) -> Vec<TranscriptSegment> {
    let total = segments.len();
    let mut merged: Vec<TranscriptSegment> = Vec::with_capacity(total);
    let mut iter = segments.into_iter().peekable();

    while let Some(mut current) = iter.next() {
        while current.text.chars().count() < min_chars {
            let Some(next) = iter.next() else { break };

            current.text.push(' ');
            current.text.push_str(&next.text);
            current.end = next.end;

            if current.speaker != next.speaker {
                current.speaker = "mixed".to_string();
            }
        }

        merged.push(current);
    }

    for (index, segment) in merged.iter_mut().enumerate() {
        segment.id = index;
    }

    if merged.len() != total {
        debug!(before = total, after = merged.len(), "Merged short segments");
    }
    merged
}
