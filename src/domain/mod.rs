//! Data structures for the analysis pipeline.

pub mod job;
pub mod segment;
pub mod summary;

pub use job::{AnalysisJob, JobState};
pub use segment::{SegmentVerdict, TranscriptSegment};
pub use summary::{generate_ai_summary, AiSummary, Confidence, Distribution, Verdict};
