//! Sapling AI-detection adapter.
//!
//! Thin client around the aidetect endpoint. Returns the provider's
//! overall score; per-segment default handling lives in the classifier.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::AuthorshipScorer;

const DEFAULT_API_URL: &str = "https://api.sapling.ai/api/v1/aidetect";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Sapling authorship-scoring client.
pub struct SaplingClient {
    api_key: Option<String>,
    api_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    key: &'a str,
    text: &'a str,
    sent_scores: bool,
}

#[derive(Deserialize)]
struct DetectResponse {
    score: f64,
}

impl SaplingClient {
    pub fn new(api_key: Option<String>, api_url: Option<String>) -> Self {
        Self {
            api_key,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AuthorshipScorer for SaplingClient {
    async fn score(&self, text: &str) -> Result<f64> {
        let api_key = self
            .api_key
            .as_deref()
            .context("No Sapling API key configured")?;

        let response = self
            .client
            .post(&self.api_url)
            .json(&DetectRequest {
                key: api_key,
                text,
                sent_scores: false,
            })
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Failed to reach the detection endpoint")?
            .error_for_status()
            .context("Detection request rejected")?;

        let parsed: DetectResponse = response
            .json()
            .await
            .context("Failed to parse detection response")?;

        if !(0.0..=1.0).contains(&parsed.score) {
            anyhow::bail!("Detection score {} is outside [0, 1]", parsed.score);
        }

        Ok(parsed.score)
    }
}
