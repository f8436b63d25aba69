//! Media acquisition and transcript construction.

pub mod audio;
pub mod screenshot;
pub mod transcript;

pub use audio::AudioPipeline;
pub use screenshot::{
    extract_video_id, is_youtube_url, ScreenshotFetcher, ScreenshotResult,
    FALLBACK_SCREENSHOT_URL,
};
pub use transcript::{build_transcript, merge_short_segments};
