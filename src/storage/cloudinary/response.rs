//! Cloudinary API payloads

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Result of an image upload
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of an image destroy, `"ok"` or `"not found"`
#[derive(Debug, Clone, Deserialize)]
pub struct DestroyResult {
    pub result: String,
}

impl DestroyResult {
    pub fn is_ok_or_missing(&self) -> bool {
        matches!(self.result.as_str(), "ok" | "not found")
    }
}

/// One asset in a search result
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Search API response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// Error body returned on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}
