//! Campus Host KV
//!
//! The [`SecureStore`] trait is the platform layer for everything the
//! authentication workflow keeps between runs: the user's credential bundle
//! and the current access token. On a device this is the OS keystore; the
//! crate ships an [`InMemorySecureStore`] for tests and the CLI.

mod memory;

pub use memory::InMemorySecureStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for secure store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// No credential bundle has been stored.
  #[error("no stored credentials")]
  MissingCredentials,

  /// The backing keystore rejected the operation.
  #[error("keystore error: {message}")]
  Keystore { message: String },
}

impl StoreError {
  pub fn keystore(message: impl Into<String>) -> Self {
    Self::Keystore {
      message: message.into(),
    }
  }
}

/// A username together with the password as encrypted by [`SecureStore::encrypt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
  pub username: String,
  pub encrypted_password: String,
}

impl Credentials {
  pub fn new(username: impl Into<String>, encrypted_password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      encrypted_password: encrypted_password.into(),
    }
  }
}

/// Secure storage for the credential bundle and access token.
///
/// Implementations must be safe to share across concurrently running
/// workflows.
#[async_trait]
pub trait SecureStore: Send + Sync {
  /// Encrypt a password with the device key before it leaves the device.
  async fn encrypt(&self, plaintext: &str) -> Result<String, StoreError>;

  /// Persist the credential bundle, replacing any previous one.
  async fn store_credentials(&self, credentials: Credentials) -> Result<(), StoreError>;

  /// Retrieve the stored credential bundle.
  async fn credentials(&self) -> Result<Credentials, StoreError>;

  /// Remove the credential bundle. Succeeds if none is stored.
  async fn destroy_credentials(&self) -> Result<(), StoreError>;

  /// Persist the access token, replacing any previous one.
  async fn store_access_token(&self, token: &str) -> Result<(), StoreError>;

  /// Retrieve the access token, if one is stored.
  async fn access_token(&self) -> Result<Option<String>, StoreError>;

  /// Remove the access token. Succeeds if none is stored.
  async fn destroy_access_token(&self) -> Result<(), StoreError>;
}
