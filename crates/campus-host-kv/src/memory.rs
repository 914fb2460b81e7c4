use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::Mutex;

use crate::{Credentials, SecureStore, StoreError};

const DEFAULT_KEY: &[u8] = b"campus-in-memory";

#[derive(Debug, Default)]
struct Slots {
  credentials: Option<Credentials>,
  access_token: Option<String>,
}

/// In-memory secure store.
///
/// Encryption is a keyed XOR followed by base64. It stands in for the device
/// keystore and offers no real protection.
#[derive(Debug)]
pub struct InMemorySecureStore {
  key: Vec<u8>,
  slots: Mutex<Slots>,
}

impl Default for InMemorySecureStore {
  fn default() -> Self {
    Self::with_key(DEFAULT_KEY)
  }
}

impl InMemorySecureStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a store that encrypts with the given key.
  pub fn with_key(key: impl AsRef<[u8]>) -> Self {
    let key = key.as_ref();
    Self {
      key: if key.is_empty() {
        DEFAULT_KEY.to_vec()
      } else {
        key.to_vec()
      },
      slots: Mutex::new(Slots::default()),
    }
  }

  fn xor(&self, bytes: &[u8]) -> Vec<u8> {
    bytes
      .iter()
      .zip(self.key.iter().cycle())
      .map(|(b, k)| b ^ k)
      .collect()
  }

  /// Reverse [`SecureStore::encrypt`]. Used by tests to check what was stored.
  pub fn decrypt(&self, ciphertext: &str) -> Result<String, StoreError> {
    let bytes = STANDARD
      .decode(ciphertext)
      .map_err(|e| StoreError::keystore(format!("invalid ciphertext: {}", e)))?;
    String::from_utf8(self.xor(&bytes))
      .map_err(|e| StoreError::keystore(format!("invalid plaintext: {}", e)))
  }
}

#[async_trait]
impl SecureStore for InMemorySecureStore {
  async fn encrypt(&self, plaintext: &str) -> Result<String, StoreError> {
    Ok(STANDARD.encode(self.xor(plaintext.as_bytes())))
  }

  async fn store_credentials(&self, credentials: Credentials) -> Result<(), StoreError> {
    self.slots.lock().await.credentials = Some(credentials);
    Ok(())
  }

  async fn credentials(&self) -> Result<Credentials, StoreError> {
    self
      .slots
      .lock()
      .await
      .credentials
      .clone()
      .ok_or(StoreError::MissingCredentials)
  }

  async fn destroy_credentials(&self) -> Result<(), StoreError> {
    self.slots.lock().await.credentials = None;
    Ok(())
  }

  async fn store_access_token(&self, token: &str) -> Result<(), StoreError> {
    self.slots.lock().await.access_token = Some(token.to_string());
    Ok(())
  }

  async fn access_token(&self) -> Result<Option<String>, StoreError> {
    Ok(self.slots.lock().await.access_token.clone())
  }

  async fn destroy_access_token(&self) -> Result<(), StoreError> {
    self.slots.lock().await.access_token = None;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_credentials_lifecycle() {
    let store = InMemorySecureStore::new();

    assert!(matches!(
      store.credentials().await,
      Err(StoreError::MissingCredentials)
    ));

    store
      .store_credentials(Credentials::new("triton", "secret"))
      .await
      .unwrap();
    assert_eq!(store.credentials().await.unwrap().username, "triton");

    store.destroy_credentials().await.unwrap();
    assert!(store.credentials().await.is_err());

    // Destroying twice is fine
    store.destroy_credentials().await.unwrap();
  }

  #[tokio::test]
  async fn test_access_token_lifecycle() {
    let store = InMemorySecureStore::new();
    assert_eq!(store.access_token().await.unwrap(), None);

    store.store_access_token("abc").await.unwrap();
    store.store_access_token("def").await.unwrap();
    assert_eq!(store.access_token().await.unwrap(), Some("def".to_string()));

    store.destroy_access_token().await.unwrap();
    assert_eq!(store.access_token().await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_encrypt_hides_plaintext_and_reverses() {
    let store = InMemorySecureStore::with_key("k3y");
    let encrypted = store.encrypt("hunter2").await.unwrap();

    assert_ne!(encrypted, "hunter2");
    assert_eq!(store.decrypt(&encrypted).unwrap(), "hunter2");
  }

  #[tokio::test]
  async fn test_different_keys_differ() {
    let a = InMemorySecureStore::with_key("a");
    let b = InMemorySecureStore::with_key("b");
    assert_ne!(
      a.encrypt("password").await.unwrap(),
      b.encrypt("password").await.unwrap()
    );
  }
}
