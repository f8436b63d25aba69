//! Cloudinary object-store adapter for screenshot uploads.
//!
//! Performs a signed image upload and returns the durable URL plus the
//! provider-side public id. Missing credentials surface as an error here;
//! the screenshot stage maps every failure to its fallback URL.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use super::{MediaStore, StoredMedia};

const UPLOAD_FOLDER: &str = "tubecheck/screenshots";

/// Account credentials for signed uploads.
#[derive(Debug, Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Cloudinary image store.
pub struct CloudinaryStore {
    credentials: Option<CloudinaryCredentials>,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

impl CloudinaryStore {
    pub fn new(credentials: Option<CloudinaryCredentials>) -> Self {
        Self {
            credentials,
            base_url: "https://api.cloudinary.com".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the store at a different endpoint (for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Signature over the sorted parameter string plus the API secret.
    fn sign(params: &str, api_secret: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(params.as_bytes());
        hasher.update(api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload_image(&self, bytes: Vec<u8>, public_id: &str) -> Result<StoredMedia> {
        let credentials = self
            .credentials
            .as_ref()
            .context("No Cloudinary credentials configured")?;

        let timestamp = Utc::now().timestamp();

        // Parameters are signed in lexical order
        let to_sign = format!(
            "folder={}&public_id={}&timestamp={}",
            UPLOAD_FOLDER, public_id, timestamp
        );
        let signature = Self::sign(&to_sign, &credentials.api_secret);

        let form = Form::new()
            .part(
                "file",
                Part::bytes(bytes).file_name(format!("{}.png", public_id)),
            )
            .text("api_key", credentials.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", UPLOAD_FOLDER.to_string())
            .text("public_id", public_id.to_string())
            .text("signature", signature);

        let response = self
            .client
            .post(format!(
                "{}/v1_1/{}/image/upload",
                self.base_url, credentials.cloud_name
            ))
            .multipart(form)
            .send()
            .await
            .context("Failed to reach the upload endpoint")?
            .error_for_status()
            .context("Upload rejected")?;

        let parsed: UploadResponse = response
            .json()
            .await
            .context("Failed to parse upload response")?;

        Ok(StoredMedia {
            url: parsed.secure_url,
            storage_id: Some(parsed.public_id),
        })
    }
}
