//! Transcript segments and the classification constants shared across stages.

use serde::{Deserialize, Serialize};

/// Probabilities strictly above this are labeled AI; at or below, human.
pub const AI_VERDICT_THRESHOLD: f64 = 0.5;

/// Segments with fewer characters than this are folded into their successor.
pub const MERGE_MIN_CHARS: usize = 25;

/// Texts shorter than this are not worth a scorer round-trip.
pub const MIN_CLASSIFIABLE_CHARS: usize = 10;

/// Neutral score assigned when the scorer is unavailable or returns garbage.
pub const DEFAULT_AI_PROBABILITY: f64 = 0.3;

/// A time-bounded transcribed utterance carrying an authorship probability.
///
/// Ids are contiguous 0..N-1 within one job's transcript and are reassigned
/// after merging. The classifier fills in `ai_probability` and `analysis`
/// field-by-field; the list is never reordered or resized after the merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// 0-based position within the transcript
    pub id: usize,

    /// Transcribed text
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// End offset in seconds (start <= end)
    pub end: f64,

    /// Best-effort speaker label ("unknown" or "mixed" when unclear)
    pub speaker: String,

    /// Authorship probability in [0, 1], None until classified
    pub ai_probability: Option<f64>,

    /// Verdict label assigned by the classifier
    pub analysis: Option<SegmentVerdict>,

    /// Stage-local error, if this segment is synthetic
    pub error: Option<String>,
}

impl TranscriptSegment {
    /// Create an unclassified segment.
    pub fn new(
        id: usize,
        text: impl Into<String>,
        start: f64,
        end: f64,
        speaker: impl Into<String>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            start,
            end,
            speaker: speaker.into(),
            ai_probability: None,
            analysis: None,
            error: None,
        }
    }

    /// Synthetic segment recorded when the audio sub-stage fails.
    pub fn audio_failed() -> Self {
        Self {
            id: 0,
            text: "Audio processing failed".to_string(),
            start: 0.0,
            end: 0.0,
            speaker: "unknown".to_string(),
            ai_probability: None,
            analysis: Some(SegmentVerdict::ProcessingFailed),
            error: Some("Audio processing failed".to_string()),
        }
    }

    /// Synthetic segment recorded when the classifier receives an empty transcript.
    pub fn no_transcript() -> Self {
        Self {
            id: 0,
            text: "No transcript available".to_string(),
            start: 0.0,
            end: 0.0,
            speaker: "unknown".to_string(),
            ai_probability: None,
            analysis: Some(SegmentVerdict::Human),
            error: Some("No transcript data".to_string()),
        }
    }
}

/// Per-segment verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentVerdict {
    #[serde(rename = "AI")]
    Ai,

    #[serde(rename = "HUMAN")]
    Human,

    /// The segment is a placeholder for a failed stage, not a real utterance
    #[serde(rename = "processing_failed")]
    ProcessingFailed,
}

/// Label for a score using the fixed verdict cut point.
pub fn verdict_for(score: f64) -> SegmentVerdict {
    if score > AI_VERDICT_THRESHOLD {
        SegmentVerdict::Ai
    } else {
        SegmentVerdict::Human
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_cut_point() {
        assert_eq!(verdict_for(0.51), SegmentVerdict::Ai);
        assert_eq!(verdict_for(0.5), SegmentVerdict::Human);
        assert_eq!(verdict_for(0.0), SegmentVerdict::Human);
        assert_eq!(verdict_for(1.0), SegmentVerdict::Ai);
    }

    #[test]
    fn test_segment_serialization() {
        let mut segment = TranscriptSegment::new(2, "Hello there.", 4.0, 8.0, "speaker_0");
        segment.ai_probability = Some(0.72);
        segment.analysis = Some(SegmentVerdict::Ai);

        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["ai_probability"], 0.72);
        assert_eq!(json["analysis"], "AI");
        assert_eq!(json["error"], serde_json::Value::Null);
    }

    #[test]
    fn test_audio_failed_segment() {
        let segment = TranscriptSegment::audio_failed();
        assert_eq!(segment.id, 0);
        assert_eq!(segment.error.as_deref(), Some("Audio processing failed"));
        assert!(segment.ai_probability.is_none());
    }
}
