use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A photo held by the active store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPhoto {
    /// Identifier the store addresses the photo by
    pub id: String,
    /// Relative path or URL a browser can load
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Upload fields buffered from a multipart request
#[derive(Debug, Default)]
pub struct UploadRequest {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Option<bytes::Bytes>,
    pub password: Option<String>,
}

/// Body of `DELETE /delete/:filename`
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub password: Option<String>,
}
