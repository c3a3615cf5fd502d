use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No photo received")]
    MissingFile,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// JSON envelope returned by every mutating endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ApiResponse {
    pub fn success(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            file_path: None,
            id: None,
        }
    }

    pub fn stored(message: &str, file_path: String, id: String) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            file_path: Some(file_path),
            id: Some(id),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            file_path: None,
            id: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MissingFile => (
                StatusCode::BAD_REQUEST,
                "Error: no photo was received".to_string(),
            ),
            AppError::UnsupportedType(ext) => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported file type: {}", ext),
            ),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Photo is too large".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            AppError::Request(e) => {
                tracing::error!("Request error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
        };

        (status, Json(ApiResponse::failure(&message))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
