//! Aggregate verdict scoring.
//!
//! A pure function over a classified transcript. The summary is derived
//! data: it is recomputed on every read and never persisted as a source
//! of truth.

use serde::{Deserialize, Serialize};

use super::segment::{TranscriptSegment, AI_VERDICT_THRESHOLD};

/// Categorical label derived from probability and distribution statistics.
///
/// The first three variants are sentinels signaling missing or unusable
/// data rather than a real classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    NoData,
    AnalysisError,
    NoAnalysis,
    HighlyAiGenerated,
    MostlyAiGenerated,
    MixedContent,
    MostlyHumanCreated,
    HighlyHumanCreated,
}

/// Confidence attached to a verdict tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Unknown,
    VeryHigh,
    High,
    Medium,
}

/// Diagnostic histogram of segment probabilities over fixed ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// p > 0.9
    #[serde(rename = "veryHighAI")]
    pub very_high_ai: usize,

    /// 0.7 < p <= 0.9
    #[serde(rename = "highAI")]
    pub high_ai: usize,

    /// 0.5 < p <= 0.7
    #[serde(rename = "mediumAI")]
    pub medium_ai: usize,

    /// 0.3 < p <= 0.5
    #[serde(rename = "mediumHuman")]
    pub medium_human: usize,

    /// 0.1 < p <= 0.3
    #[serde(rename = "highHuman")]
    pub high_human: usize,

    /// p <= 0.1
    #[serde(rename = "veryHighHuman")]
    pub very_high_human: usize,
}

/// Aggregate authorship summary for one job's transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSummary {
    pub verdict: Verdict,
    pub confidence: Confidence,

    /// Mean probability over valid segments, to 3 decimals; None for sentinels
    pub ai_probability: Option<f64>,

    pub total_segments: usize,
    pub ai_segments: usize,
    pub human_segments: usize,

    /// Share of AI-labeled segments, rounded percent
    pub ai_percentage: u32,

    /// Share of human-labeled segments, rounded percent
    pub human_percentage: u32,

    pub distribution: Option<Distribution>,

    pub error: Option<String>,
}

impl AiSummary {
    fn sentinel(verdict: Verdict, total_segments: usize, error: impl Into<String>) -> Self {
        Self {
            verdict,
            confidence: Confidence::Unknown,
            ai_probability: None,
            total_segments,
            ai_segments: 0,
            human_segments: 0,
            ai_percentage: 0,
            human_percentage: 0,
            distribution: None,
            error: Some(error.into()),
        }
    }
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn rounded_percent(count: usize, total: usize) -> u32 {
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Compute the aggregate summary for a transcript.
///
/// Evaluation order is fixed: empty list, then segment-level errors, then
/// absence of any valid probability, then the tier table over mean
/// probability and AI-label percentage jointly.
pub fn generate_ai_summary(transcript: &[TranscriptSegment]) -> AiSummary {
    if transcript.is_empty() {
        return AiSummary::sentinel(Verdict::NoData, 0, "No transcript data available");
    }

    let failed = transcript.iter().filter(|s| s.error.is_some()).count();
    if failed > 0 {
        return AiSummary::sentinel(
            Verdict::AnalysisError,
            transcript.len(),
            format!("{} segments failed analysis", failed),
        );
    }

    let probabilities: Vec<f64> = transcript
        .iter()
        .filter_map(|s| s.ai_probability)
        .filter(|p| (0.0..=1.0).contains(p))
        .collect();

    if probabilities.is_empty() {
        return AiSummary::sentinel(
            Verdict::NoAnalysis,
            transcript.len(),
            "No valid AI analysis found",
        );
    }

    let valid = probabilities.len();
    let mean = probabilities.iter().sum::<f64>() / valid as f64;

    let ai_segments = probabilities
        .iter()
        .filter(|&&p| p > AI_VERDICT_THRESHOLD)
        .count();
    let human_segments = valid - ai_segments;

    let ai_percentage = rounded_percent(ai_segments, valid);
    let human_percentage = rounded_percent(human_segments, valid);

    let (verdict, confidence) = if mean > 0.8 && ai_percentage > 80 {
        (Verdict::HighlyAiGenerated, Confidence::VeryHigh)
    } else if mean > 0.6 && ai_percentage > 60 {
        (Verdict::MostlyAiGenerated, Confidence::High)
    } else if mean > 0.4 && ai_percentage > 40 {
        (Verdict::MixedContent, Confidence::Medium)
    } else if mean > 0.2 && ai_percentage > 20 {
        (Verdict::MostlyHumanCreated, Confidence::Medium)
    } else {
        (Verdict::HighlyHumanCreated, Confidence::High)
    };

    let mut distribution = Distribution::default();
    for &p in &probabilities {
        if p > 0.9 {
            distribution.very_high_ai += 1;
        } else if p > 0.7 {
            distribution.high_ai += 1;
        } else if p > 0.5 {
            distribution.medium_ai += 1;
        } else if p > 0.3 {
            distribution.medium_human += 1;
        } else if p > 0.1 {
            distribution.high_human += 1;
        } else {
            distribution.very_high_human += 1;
        }
    }

    AiSummary {
        verdict,
        confidence,
        ai_probability: Some(round3(mean)),
        total_segments: valid,
        ai_segments,
        human_segments,
        ai_percentage,
        human_percentage,
        distribution: Some(distribution),
        error: None,
    }
}
