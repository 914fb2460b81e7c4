use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{AccessTokenResponse, Ack, MessagePage, Topic};

/// Remote operations consumed by the workflows.
///
/// Each call either returns the decoded response or fails. Application
/// errors carried inside a decoded response are not failures at this layer.
#[async_trait]
pub trait Gateway: Send + Sync {
  /// Fetch every broadcast topic the user can subscribe to.
  async fn fetch_topics(&self) -> Result<Vec<Topic>, GatewayError>;

  /// Register this device's push token.
  async fn post_push_token(&self, token: &str, device_id: &str) -> Result<Ack, GatewayError>;

  /// Remove a push token registration. Takes the access token explicitly
  /// because it is usually called while the session is being torn down.
  async fn delete_push_token(&self, token: &str, access_token: &str)
  -> Result<Ack, GatewayError>;

  /// Fetch one page of the user's messages, starting at `timestamp`
  /// (most recent page when `None`).
  async fn fetch_my_messages(&self, timestamp: Option<i64>) -> Result<MessagePage, GatewayError>;

  /// Exchange encoded credentials for an access token.
  async fn retrieve_access_token(
    &self,
    encoded_credentials: &str,
  ) -> Result<AccessTokenResponse, GatewayError>;
}
