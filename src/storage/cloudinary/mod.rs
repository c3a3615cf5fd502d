//! Cloudinary media host
//!
//! Signed upload and destroy calls plus the Admin search API, enough to back
//! a [`PhotoStore`](crate::storage::PhotoStore):
//! - request signing
//! - image upload into a folder
//! - image destroy
//! - folder listing sorted by creation time

pub mod client;
pub mod provider;
pub mod response;
pub mod signer;

pub use client::Client;
pub use provider::CloudinaryStorage;
pub use response::{DestroyResult, Resource, SearchResult, UploadResult};
pub use signer::Signer;
