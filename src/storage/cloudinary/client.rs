//! Cloudinary HTTP client

use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::storage::cloudinary::response::{
    DestroyResult, ErrorBody, SearchResult, UploadResult,
};
use crate::storage::cloudinary::signer::Signer;

/// Cloudinary client
#[derive(Debug, Clone)]
pub struct Client {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a new client
    ///
    /// `api_base` is the versioned API root, normally
    /// `https://api.cloudinary.com/v1_1`.
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_base: api_base.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Full URL for an API path below the cloud
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.cloud_name,
            path.trim_start_matches('/')
        )
    }

    fn timestamp() -> String {
        Utc::now().timestamp().to_string()
    }

    /// Upload an image into `folder`
    ///
    /// The host rejects formats outside `allowed_formats`.
    pub async fn upload_image(
        &self,
        data: Bytes,
        file_name: &str,
        folder: &str,
        allowed_formats: &[&str],
    ) -> Result<UploadResult> {
        let timestamp = Self::timestamp();
        let allowed_formats = allowed_formats.join(",");
        let signature = Signer::new()
            .param("allowed_formats", allowed_formats.as_str())
            .param("folder", folder)
            .param("timestamp", timestamp.as_str())
            .get_signature(&self.api_secret);

        let mime_type = mime_guess::from_path(file_name).first_or_octet_stream();
        let file = Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_type.as_ref())?;

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("allowed_formats", allowed_formats)
            .text("signature", signature);

        let resp = self
            .http
            .post(self.endpoint("image/upload"))
            .multipart(form)
            .send()
            .await?;

        Self::parse(resp, "upload").await
    }

    /// Destroy an image by public id
    pub async fn destroy_image(&self, public_id: &str) -> Result<DestroyResult> {
        let timestamp = Self::timestamp();
        let signature = Signer::new()
            .param("public_id", public_id)
            .param("timestamp", timestamp.as_str())
            .get_signature(&self.api_secret);

        let params = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp),
            ("api_key", self.api_key.clone()),
            ("signature", signature),
        ];

        let resp = self
            .http
            .post(self.endpoint("image/destroy"))
            .form(&params)
            .send()
            .await?;

        Self::parse(resp, "destroy").await
    }

    /// Images in `folder`, newest first, at most `max_results`
    pub async fn search_folder(&self, folder: &str, max_results: u32) -> Result<SearchResult> {
        let body = json!({
            "expression": format!("resource_type:image AND folder=\"{}\"", folder),
            "sort_by": [{ "created_at": "desc" }],
            "max_results": max_results,
        });

        let resp = self
            .http
            .post(self.endpoint("resources/search"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&body)
            .send()
            .await?;

        Self::parse(resp, "search").await
    }

    /// Decode a success body or turn the host's error into a storage error
    async fn parse<T: DeserializeOwned>(resp: reqwest::Response, operation: &str) -> Result<T> {
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(AppError::Storage(format!(
                "Cloudinary {} failed: [{}] {}",
                operation, status, message
            )));
        }

        serde_json::from_slice(&body).map_err(|e| {
            AppError::Storage(format!(
                "Cloudinary {} returned an unexpected body: {}",
                operation, e
            ))
        })
    }
}
