use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::sync::Arc;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Gate for operations that need the admin secret
pub trait CredentialCheck: Send + Sync {
    /// Whether the presented password is accepted. A missing password never is.
    fn verify(&self, presented: Option<&str>) -> bool;
}

/// Plaintext shared secret
///
/// Only a keyed digest of the secret is kept, and presented passwords are
/// compared against it in constant time.
pub struct SharedSecret {
    key: [u8; 32],
    tag: Vec<u8>,
}

impl SharedSecret {
    pub fn new(secret: &str) -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        let tag = Self::mac(&key, secret).finalize().into_bytes().to_vec();
        Self { key, tag }
    }

    fn mac(key: &[u8; 32], value: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(value.as_bytes());
        mac
    }
}

impl CredentialCheck for SharedSecret {
    fn verify(&self, presented: Option<&str>) -> bool {
        match presented {
            Some(password) => Self::mac(&self.key, password).verify_slice(&self.tag).is_ok(),
            None => false,
        }
    }
}

const ARGON2_ALGORITHMS: &[&str] = &["argon2d", "argon2i", "argon2id"];

/// Secret configured as an Argon2 PHC string
pub struct Argon2Secret {
    hash: String,
}

impl Argon2Secret {
    pub fn new(hash: &str) -> Result<Self> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid admin secret hash: {}", e)))?;
        if !ARGON2_ALGORITHMS.contains(&parsed.algorithm.as_str()) {
            return Err(AppError::Internal(format!(
                "Admin secret hash uses {}, expected an Argon2 variant",
                parsed.algorithm
            )));
        }
        if parsed.salt.is_none() || parsed.hash.is_none() {
            return Err(AppError::Internal(
                "Admin secret hash is missing its salt or digest".to_string(),
            ));
        }
        Ok(Self {
            hash: hash.to_string(),
        })
    }
}

impl CredentialCheck for Argon2Secret {
    fn verify(&self, presented: Option<&str>) -> bool {
        let Some(password) = presented else {
            return false;
        };
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Pick the checker matching how the admin secret is written.
/// A blank secret is refused.
pub fn from_secret(secret: &str) -> Result<Arc<dyn CredentialCheck>> {
    if secret.trim().is_empty() {
        return Err(AppError::Internal("Admin secret is empty".to_string()));
    }
    if secret.starts_with("$argon2") {
        Ok(Arc::new(Argon2Secret::new(secret)?))
    } else {
        Ok(Arc::new(SharedSecret::new(secret)))
    }
}
