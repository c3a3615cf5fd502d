use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;
use crate::models::StoredPhoto;

/// Photo store trait
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Persist an uploaded photo and describe where it landed
    async fn store(&self, data: Bytes, original_name: &str) -> Result<StoredPhoto>;

    /// All stored photos, newest first
    async fn list(&self) -> Result<Vec<StoredPhoto>>;

    /// Remove a photo. A photo that is already gone is not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Lowercase extensions this store accepts
    fn allowed_extensions(&self) -> &'static [&'static str];

    /// Map a client supplied file name to the identifier `delete` expects
    fn identifier_from_hint(&self, hint: &str) -> Option<String>;

    /// Get the storage type name
    fn storage_type(&self) -> &'static str;

    fn accepts(&self, file_name: &str) -> bool {
        extension_of(file_name)
            .map(|ext| self.allowed_extensions().contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

/// Lowercased extension of a file name, if it has one
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Last path component of a client supplied name, with either separator
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
