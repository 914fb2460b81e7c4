//! Campus Host Push
//!
//! The [`PushMessaging`] trait covers the slice of the device push SDK the
//! messaging workflows use: the device's push token, a stable device id and
//! topic subscription management.

mod memory;

pub use memory::{InMemoryPush, PushCall};

use async_trait::async_trait;

/// Errors reported by the push SDK.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
  /// The SDK has not issued a push token for this device.
  #[error("push token unavailable")]
  TokenUnavailable,

  /// The SDK rejected the request.
  #[error("push sdk error: {message}")]
  Sdk { message: String },
}

impl PushError {
  pub fn sdk(message: impl Into<String>) -> Self {
    Self::Sdk {
      message: message.into(),
    }
  }
}

/// Device push-messaging capability.
#[async_trait]
pub trait PushMessaging: Send + Sync {
  /// The push token the SDK issued to this device.
  async fn device_token(&self) -> Result<String, PushError>;

  /// A stable identifier for this device.
  fn device_id(&self) -> String;

  /// Subscribe the device to a broadcast topic.
  async fn subscribe_to_topic(&self, topic_id: &str) -> Result<(), PushError>;

  /// Unsubscribe the device from a broadcast topic.
  async fn unsubscribe_from_topic(&self, topic_id: &str) -> Result<(), PushError>;
}
