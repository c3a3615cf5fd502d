use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, Result};
use crate::models::StoredPhoto;
use crate::storage::{base_name, PhotoStore};

const LOCAL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

// Same-millisecond uploads of the same name bump the prefix this many times
const MAX_NAME_ATTEMPTS: i64 = 16;

/// Local file system photo store
pub struct LocalStorage {
    base_path: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            base_path: base_path.into(),
            public_prefix: public_prefix.trim_matches('/').to_string(),
        }
    }

    fn public_path(&self, file_name: &str) -> String {
        if self.public_prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.public_prefix, file_name)
        }
    }

    fn photo(&self, file_name: String, created_at: Option<DateTime<Utc>>) -> StoredPhoto {
        StoredPhoto {
            path: self.public_path(&file_name),
            id: file_name,
            created_at,
        }
    }
}

/// Reduce a client file name to a safe single path component
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = base_name(name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "photo".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Millisecond timestamp a stored file name starts with
fn millis_prefix(file_name: &str) -> Option<i64> {
    let (prefix, _) = file_name.split_once('-')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Write a freshly created photo file, removing it again if the write fails
async fn write_or_discard<W>(file: &mut W, full_path: &Path, data: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(data).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(full_path).await {
            tracing::warn!("Failed to remove partial photo {:?}: {}", full_path, cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

#[async_trait]
impl PhotoStore for LocalStorage {
    async fn store(&self, data: Bytes, original_name: &str) -> Result<StoredPhoto> {
        fs::create_dir_all(&self.base_path).await?;

        let safe_name = sanitize_file_name(original_name);
        let now = Utc::now().timestamp_millis();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let millis = now + attempt;
            let file_name = format!("{}-{}", millis, safe_name);
            let full_path = self.base_path.join(&file_name);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&full_path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            write_or_discard(&mut file, &full_path, &data).await?;

            tracing::debug!("Saved photo to {:?}", full_path);
            return Ok(self.photo(file_name, from_millis(millis)));
        }

        Err(AppError::Storage(format!(
            "No free file name for {} after {} attempts",
            safe_name, MAX_NAME_ATTEMPTS
        )))
    }

    async fn list(&self) -> Result<Vec<StoredPhoto>> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {:?}: {}",
                    self.base_path, e
                )))
            }
        };

        let mut found: Vec<(i64, String)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if !self.accepts(&file_name) {
                continue;
            }

            // Entries may vanish under a concurrent delete; skip those
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => {}
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }

            let millis = match millis_prefix(&file_name) {
                Some(millis) => millis,
                None => match entry.metadata().await {
                    Ok(metadata) => metadata
                        .modified()
                        .map(|t| DateTime::<Utc>::from(t).timestamp_millis())
                        .unwrap_or(0),
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(e.into()),
                },
            };
            found.push((millis, file_name));
        }

        found.sort_by(|a, b| b.cmp(a));

        Ok(found
            .into_iter()
            .map(|(millis, file_name)| self.photo(file_name, from_millis(millis)))
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let file_name = self
            .identifier_from_hint(id)
            .filter(|name| name == id)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid photo id: {}", id)))?;
        if !self.accepts(&file_name) {
            return Err(AppError::BadRequest(format!("Not a photo: {}", id)));
        }
        let full_path = self.base_path.join(&file_name);

        match fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!("Deleted photo {:?}", full_path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Photo {:?} already gone", full_path);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn allowed_extensions(&self) -> &'static [&'static str] {
        LOCAL_EXTENSIONS
    }

    fn identifier_from_hint(&self, hint: &str) -> Option<String> {
        let name = base_name(hint.trim());
        if name.is_empty() || name == "." || name == ".." {
            return None;
        }
        Some(name.to_string())
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }
}
