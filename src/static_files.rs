use std::path::Path;
use tower_http::services::ServeDir;

/// Front-end files, served for every path no route claims
pub fn frontend_service(dir: impl AsRef<Path>) -> ServeDir {
    ServeDir::new(dir).append_index_html_on_directories(true)
}

/// Locally stored photos, mounted under the public prefix
pub fn uploads_service(dir: impl AsRef<Path>) -> ServeDir {
    ServeDir::new(dir).append_index_html_on_directories(false)
}
