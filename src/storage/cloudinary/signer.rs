//! Cloudinary request signatures
//!
//! The signed parameters are sorted by name, joined as `k=v` pairs with `&`,
//! suffixed with the API secret and hashed with SHA-1. `file`, `api_key`,
//! `cloud_name` and `resource_type` are never part of the signature.

use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

/// Cloudinary signer
#[derive(Debug, Default)]
pub struct Signer<'a> {
    params: BTreeMap<&'a str, String>,
}

impl<'a> Signer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to sign. Empty values are skipped, as the host does.
    pub fn param(mut self, key: &'a str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.params.insert(key, value);
        }
        self
    }

    fn get_string_to_sign(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<String>>()
            .join("&")
    }

    /// Hex encoded signature for the collected parameters
    pub fn get_signature(&self, api_secret: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.get_string_to_sign().as_bytes());
        hasher.update(api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}
