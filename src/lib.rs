pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod static_files;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, StorageBackend};
use crate::services::CredentialCheck;
use crate::storage::PhotoStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn PhotoStore>,
    pub credentials: Arc<dyn CredentialCheck>,
}

impl AppState {
    /// Build the store and credential check the configuration asks for
    pub fn from_config(config: Config) -> error::Result<Self> {
        let store = storage::from_config(&config.storage);
        let credentials = services::from_secret(&config.gallery.admin_secret)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            credentials,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/upload", post(handlers::photo::upload_photo))
        .route("/photos", get(handlers::photo::list_photos))
        .route("/photos/details", get(handlers::photo::list_photo_details))
        .route("/delete/:filename", delete(handlers::photo::delete_photo))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes));

    // Locally stored photos are addressed by relative paths under the prefix
    let storage = &state.config.storage;
    let prefix = storage.public_prefix.trim_matches('/');
    if storage.backend == StorageBackend::Local && !prefix.is_empty() {
        router = router.nest_service(
            &format!("/{}", prefix),
            static_files::uploads_service(&storage.local_path),
        );
    }

    router
        .fallback_service(static_files::frontend_service(&state.config.server.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
