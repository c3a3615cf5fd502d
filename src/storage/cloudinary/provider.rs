//! Cloudinary photo store

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::config::CloudinaryConfig;
use crate::error::{AppError, Result};
use crate::models::StoredPhoto;
use crate::storage::{base_name, PhotoStore};

use super::client::Client;
use super::response::Resource;

const CLOUD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Search API page size, the most a single listing returns
const MAX_LIST_RESULTS: u32 = 500;

/// Cloudinary photo store scoped to one folder
pub struct CloudinaryStorage {
    client: Client,
    folder: String,
}

impl CloudinaryStorage {
    pub fn new(config: &CloudinaryConfig, folder: &str) -> Self {
        let client = Client::new(
            &config.cloud_name,
            &config.api_key,
            &config.api_secret,
            &config.api_base,
        );
        Self {
            client,
            folder: folder.trim_matches('/').to_string(),
        }
    }
}

/// Convert search hits to photos, newest first
fn photos_from_resources(resources: Vec<Resource>) -> Vec<StoredPhoto> {
    let mut photos: Vec<StoredPhoto> = resources
        .into_iter()
        .map(|r| StoredPhoto {
            id: r.public_id,
            path: r.secure_url,
            created_at: r.created_at,
        })
        .collect();
    // Stable, so the host's order survives among equal or missing timestamps
    photos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    photos
}

#[async_trait]
impl PhotoStore for CloudinaryStorage {
    async fn store(&self, data: Bytes, original_name: &str) -> Result<StoredPhoto> {
        let res = self
            .client
            .upload_image(data, original_name, &self.folder, CLOUD_EXTENSIONS)
            .await?;

        tracing::info!("Uploaded to Cloudinary: {}", res.public_id);
        Ok(StoredPhoto {
            id: res.public_id,
            path: res.secure_url,
            created_at: res.created_at,
        })
    }

    async fn list(&self) -> Result<Vec<StoredPhoto>> {
        let res = self.client.search_folder(&self.folder, MAX_LIST_RESULTS).await?;
        if let Some(total) = res.total_count {
            if total > res.resources.len() as u64 {
                tracing::warn!(
                    "Folder {} holds {} photos, listing only the newest {}",
                    self.folder,
                    total,
                    res.resources.len()
                );
            }
        }
        Ok(photos_from_resources(res.resources))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let res = self.client.destroy_image(id).await?;

        if !res.is_ok_or_missing() {
            return Err(AppError::Storage(format!(
                "Cloudinary destroy of {} returned {:?}",
                id, res.result
            )));
        }

        tracing::debug!("Destroyed on Cloudinary: {} ({})", id, res.result);
        Ok(())
    }

    fn allowed_extensions(&self) -> &'static [&'static str] {
        CLOUD_EXTENSIONS
    }

    fn identifier_from_hint(&self, hint: &str) -> Option<String> {
        let name = base_name(hint.trim());
        let stem = Path::new(name).file_stem()?.to_str()?;
        if stem.is_empty() || stem == "." || stem == ".." {
            return None;
        }
        Some(format!("{}/{}", self.folder, stem))
    }

    fn storage_type(&self) -> &'static str {
        "cloudinary"
    }
}
