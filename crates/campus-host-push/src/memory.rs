use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{PushError, PushMessaging};

/// A call made against [`InMemoryPush`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushCall {
  Subscribe(String),
  Unsubscribe(String),
}

/// In-memory push SDK that records every topic call in order.
#[derive(Debug)]
pub struct InMemoryPush {
  device_id: String,
  token: Option<String>,
  calls: Mutex<Vec<PushCall>>,
}

impl Default for InMemoryPush {
  fn default() -> Self {
    Self::new(Some(uuid::Uuid::new_v4().to_string()))
  }
}

impl InMemoryPush {
  /// Create a push SDK stand-in. `token` is what `device_token` will return;
  /// `None` simulates a device that has not been issued one yet.
  pub fn new(token: Option<String>) -> Self {
    Self {
      device_id: uuid::Uuid::new_v4().to_string(),
      token,
      calls: Mutex::new(Vec::new()),
    }
  }

  /// Override the device id.
  pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
    self.device_id = device_id.into();
    self
  }

  /// All topic calls made so far.
  pub async fn calls(&self) -> Vec<PushCall> {
    self.calls.lock().await.clone()
  }
}

#[async_trait]
impl PushMessaging for InMemoryPush {
  async fn device_token(&self) -> Result<String, PushError> {
    self.token.clone().ok_or(PushError::TokenUnavailable)
  }

  fn device_id(&self) -> String {
    self.device_id.clone()
  }

  async fn subscribe_to_topic(&self, topic_id: &str) -> Result<(), PushError> {
    self
      .calls
      .lock()
      .await
      .push(PushCall::Subscribe(topic_id.to_string()));
    Ok(())
  }

  async fn unsubscribe_from_topic(&self, topic_id: &str) -> Result<(), PushError> {
    self
      .calls
      .lock()
      .await
      .push(PushCall::Unsubscribe(topic_id.to_string()));
    Ok(())
  }
}
