pub mod credentials;

pub use credentials::{from_secret, Argon2Secret, CredentialCheck, SharedSecret};
