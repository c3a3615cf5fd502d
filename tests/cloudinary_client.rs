//! Cloudinary store over HTTP
//!
//! Runs a small stand-in for the Cloudinary API on a loopback port and points
//! `CloudinaryStorage` at it through `api_base`.

use axum::{
    extract::{Form, Multipart},
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use photowall::config::CloudinaryConfig;
use photowall::error::AppError;
use photowall::storage::cloudinary::Signer;
use photowall::storage::{CloudinaryStorage, PhotoStore};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;

const CLOUD_NAME: &str = "demo";
const API_KEY: &str = "key";
const API_SECRET: &str = "secret";
const FOLDER: &str = "photowall";

fn host_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": { "message": message } })))
}

async fn fake_upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut file_name = String::new();
    let mut file_len = 0;

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            file_name = field.file_name().unwrap_or("").to_string();
            file_len = field.bytes().await.unwrap().len();
        } else {
            fields.insert(name, field.text().await.unwrap());
        }
    }

    let field = |key: &str| fields.get(key).cloned().unwrap_or_default();
    let expected = Signer::new()
        .param("allowed_formats", field("allowed_formats"))
        .param("folder", field("folder"))
        .param("timestamp", field("timestamp"))
        .get_signature(API_SECRET);
    if field("api_key") != API_KEY || field("signature") != expected {
        return host_error(StatusCode::UNAUTHORIZED, "Invalid Signature");
    }
    if file_len == 0 || !field("allowed_formats").split(',').any(|f| f == "png") {
        return host_error(StatusCode::BAD_REQUEST, "Empty file");
    }

    let stem = Path::new(&file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload")
        .to_string();
    let public_id = format!("{}/{}", field("folder"), stem);
    (
        StatusCode::OK,
        Json(json!({
            "public_id": public_id,
            "secure_url": format!("https://res.cloudinary.test/{}/image/upload/{}.png", CLOUD_NAME, public_id),
            "created_at": "2024-03-01T12:00:00Z",
            "format": "png",
        })),
    )
}

async fn fake_destroy(Form(params): Form<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    let param = |key: &str| params.get(key).cloned().unwrap_or_default();
    let expected = Signer::new()
        .param("public_id", param("public_id"))
        .param("timestamp", param("timestamp"))
        .get_signature(API_SECRET);
    if param("api_key") != API_KEY || param("signature") != expected {
        return host_error(StatusCode::UNAUTHORIZED, "Invalid Signature");
    }

    match param("public_id").as_str() {
        "photowall/missing" => (StatusCode::OK, Json(json!({ "result": "not found" }))),
        "photowall/odd" => (StatusCode::OK, Json(json!({ "result": "error" }))),
        "photowall/boom" => host_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        _ => (StatusCode::OK, Json(json!({ "result": "ok" }))),
    }
}

async fn fake_search(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Basic "))
        .unwrap_or(false);
    if !authorized {
        return host_error(StatusCode::UNAUTHORIZED, "Missing credentials");
    }

    let expression = format!("resource_type:image AND folder=\"{}\"", FOLDER);
    if body["expression"] != json!(expression) {
        return host_error(StatusCode::FORBIDDEN, "Folder not allowed");
    }
    assert_eq!(body["sort_by"], json!([{ "created_at": "desc" }]));
    assert_eq!(body["max_results"], 500);

    // Deliberately out of order
    (
        StatusCode::OK,
        Json(json!({
            "total_count": 3,
            "resources": [
                {
                    "public_id": "photowall/middle",
                    "secure_url": "https://res.cloudinary.test/middle.png",
                    "created_at": "2024-02-01T00:00:00Z",
                },
                {
                    "public_id": "photowall/newest",
                    "secure_url": "https://res.cloudinary.test/newest.png",
                    "created_at": "2024-03-01T00:00:00Z",
                },
                {
                    "public_id": "photowall/oldest",
                    "secure_url": "https://res.cloudinary.test/oldest.png",
                    "created_at": "2024-01-01T00:00:00Z",
                },
            ],
        })),
    )
}

/// Start the stand-in host and return its API base
async fn fake_host() -> String {
    let app = Router::new()
        .route("/v1_1/demo/image/upload", post(fake_upload))
        .route("/v1_1/demo/image/destroy", post(fake_destroy))
        .route("/v1_1/demo/resources/search", post(fake_search));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/v1_1", addr)
}

fn store_at(api_base: &str, api_secret: &str, folder: &str) -> CloudinaryStorage {
    let config = CloudinaryConfig {
        cloud_name: CLOUD_NAME.to_string(),
        api_key: API_KEY.to_string(),
        api_secret: api_secret.to_string(),
        api_base: api_base.to_string(),
    };
    CloudinaryStorage::new(&config, folder)
}

fn storage_message(err: AppError) -> String {
    match err {
        AppError::Storage(msg) => msg,
        other => panic!("expected a storage error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_store_uploads_signed_into_folder() {
    let base = fake_host().await;
    let store = store_at(&base, API_SECRET, FOLDER);

    let photo = store
        .store(Bytes::from_static(b"pixels"), "cat.png")
        .await
        .unwrap();
    assert_eq!(photo.id, "photowall/cat");
    assert!(photo.path.ends_with("/photowall/cat.png"));
    assert_eq!(photo.created_at.unwrap().to_rfc3339(), "2024-03-01T12:00:00+00:00");

    // The returned id derives back from the addressable path
    assert_eq!(store.identifier_from_hint(&photo.path), Some(photo.id));
}

#[tokio::test]
async fn test_bad_signature_is_storage_error() {
    let base = fake_host().await;
    let store = store_at(&base, "not-the-secret", FOLDER);

    let err = store
        .store(Bytes::from_static(b"pixels"), "cat.png")
        .await
        .unwrap_err();
    let msg = storage_message(err);
    assert!(msg.contains("upload"));
    assert!(msg.contains("401"));
    assert!(msg.contains("Invalid Signature"));
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let base = fake_host().await;
    let store = store_at(&base, API_SECRET, FOLDER);

    let photos = store.list().await.unwrap();
    let ids: Vec<&str> = photos.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["photowall/newest", "photowall/middle", "photowall/oldest"]
    );
    assert_eq!(photos[0].path, "https://res.cloudinary.test/newest.png");
}

#[tokio::test]
async fn test_list_failure_carries_host_message() {
    let base = fake_host().await;
    let store = store_at(&base, API_SECRET, "elsewhere");

    let msg = storage_message(store.list().await.unwrap_err());
    assert!(msg.contains("search"));
    assert!(msg.contains("Folder not allowed"));
}

#[tokio::test]
async fn test_delete_treats_not_found_as_success() {
    let base = fake_host().await;
    let store = store_at(&base, API_SECRET, FOLDER);

    store.delete("photowall/cat").await.unwrap();
    store.delete("photowall/missing").await.unwrap();
}

#[tokio::test]
async fn test_delete_host_failures() {
    let base = fake_host().await;
    let store = store_at(&base, API_SECRET, FOLDER);

    let msg = storage_message(store.delete("photowall/boom").await.unwrap_err());
    assert!(msg.contains("destroy"));
    assert!(msg.contains("500"));
    assert!(msg.contains("boom"));

    let msg = storage_message(store.delete("photowall/odd").await.unwrap_err());
    assert!(msg.contains("photowall/odd"));

    let wrong = store_at(&base, "not-the-secret", FOLDER);
    let msg = storage_message(wrong.delete("photowall/cat").await.unwrap_err());
    assert!(msg.contains("Invalid Signature"));
}
