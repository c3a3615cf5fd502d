pub mod cloudinary;
pub mod local;
pub mod provider;

pub use cloudinary::CloudinaryStorage;
pub use local::LocalStorage;
pub use provider::*;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

/// Build the photo store selected by configuration
pub fn from_config(config: &StorageConfig) -> Arc<dyn PhotoStore> {
    match config.backend {
        StorageBackend::Local => Arc::new(LocalStorage::new(
            &config.local_path,
            &config.public_prefix,
        )),
        StorageBackend::Cloudinary => {
            Arc::new(CloudinaryStorage::new(&config.cloudinary, &config.folder))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_picks_backend() {
        let mut config = StorageConfig::default();
        assert_eq!(from_config(&config).storage_type(), "local");

        config.backend = StorageBackend::Cloudinary;
        assert_eq!(from_config(&config).storage_type(), "cloudinary");
    }
}
