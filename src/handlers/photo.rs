use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{DeleteRequest, StoredPhoto, UploadRequest};
use crate::storage::{extension_of, PhotoStore};
use crate::AppState;

const PHOTO_FIELD: &str = "photo";
const PASSWORD_FIELD: &str = "password";

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(format!("Failed to process multipart: {}", e.body_text()))
    }
}

/// Buffer every field of the upload before anything is stored
async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest> {
    let mut upload = UploadRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            PHOTO_FIELD if upload.bytes.is_none() => {
                upload.file_name = field.file_name().map(|s| s.to_string());
                upload.content_type = field.content_type().map(|s| s.to_string());
                upload.bytes = Some(field.bytes().await.map_err(multipart_error)?);
            }
            PASSWORD_FIELD => {
                upload.password = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// File name to store under, borrowing an extension from the content type
/// when the client sent none
fn upload_file_name(upload: &UploadRequest, store: &dyn PhotoStore) -> Option<String> {
    if let Some(name) = upload.file_name.as_deref().filter(|n| !n.trim().is_empty()) {
        return Some(name.to_string());
    }

    let content_type = upload.content_type.as_deref()?;
    mime_guess::get_mime_extensions_str(content_type)?
        .iter()
        .find(|ext| store.allowed_extensions().contains(*ext))
        .map(|ext| format!("photo.{}", ext))
}

/// Upload a photo
/// POST /upload
pub async fn upload_photo(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse>> {
    let multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected upload body: {}", e);
        AppError::MissingFile
    })?;
    let upload = read_upload(multipart).await?;

    let data = match &upload.bytes {
        Some(data) if !data.is_empty() => data.clone(),
        _ => return Err(AppError::MissingFile),
    };

    let store = state.store.as_ref();
    let file_name = upload_file_name(&upload, store).ok_or_else(|| {
        AppError::UnsupportedType(upload.content_type.clone().unwrap_or_default())
    })?;
    if !store.accepts(&file_name) {
        return Err(AppError::UnsupportedType(
            extension_of(&file_name).unwrap_or_default(),
        ));
    }

    if state.config.gallery.require_upload_password
        && !state.credentials.verify(upload.password.as_deref())
    {
        tracing::warn!("Rejected upload of {} with a wrong password", file_name);
        return Ok(Json(ApiResponse::failure("Incorrect password")));
    }

    let photo = store.store(data, &file_name).await?;
    tracing::info!("Photo received and stored: {}", photo.path);

    Ok(Json(ApiResponse::stored(
        "Photo uploaded successfully!",
        photo.path,
        photo.id,
    )))
}

/// List addressable photo paths, newest first
/// GET /photos
pub async fn list_photos(State(state): State<AppState>) -> (StatusCode, Json<Vec<String>>) {
    match state.store.list().await {
        Ok(photos) => (
            StatusCode::OK,
            Json(photos.into_iter().map(|p| p.path).collect()),
        ),
        Err(e) => {
            tracing::error!("Could not list photos: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Vec::new()))
        }
    }
}

/// List photos with their identifiers
/// GET /photos/details
pub async fn list_photo_details(
    State(state): State<AppState>,
) -> (StatusCode, Json<Vec<StoredPhoto>>) {
    match state.store.list().await {
        Ok(photos) => (StatusCode::OK, Json(photos)),
        Err(e) => {
            tracing::error!("Could not list photos: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Vec::new()))
        }
    }
}

/// Delete a photo
/// DELETE /delete/:filename
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    body: Option<Json<DeleteRequest>>,
) -> Result<Json<ApiResponse>> {
    let password = body.and_then(|Json(req)| req.password);
    if !state.credentials.verify(password.as_deref()) {
        tracing::warn!("Rejected delete of {} with a wrong password", filename);
        return Err(AppError::Forbidden("Incorrect password".to_string()));
    }

    let id = state
        .store
        .identifier_from_hint(&filename)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid file name: {}", filename)))?;

    state.store.delete(&id).await?;
    tracing::info!("Deleted photo {}", id);

    Ok(Json(ApiResponse::success("Photo deleted successfully")))
}
