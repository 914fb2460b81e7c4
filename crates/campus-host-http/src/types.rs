//! Wire types.

use serde::{Deserialize, Serialize};

/// Application error carried inside an otherwise successful response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteError {
  #[serde(default)]
  pub message: String,

  /// Set by the identity provider when this app version is no longer
  /// accepted.
  #[serde(default)]
  pub app_update_required: bool,
}

/// Access to the application error of a decoded response.
///
/// A response satisfies the success predicate when `remote_error` is `None`.
pub trait Reply {
  fn remote_error(&self) -> Option<&RemoteError>;
}

/// Acknowledgement of a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<RemoteError>,
}

impl Reply for Ack {
  fn remote_error(&self) -> Option<&RemoteError> {
    self.error.as_ref()
  }
}

/// Identity provider token response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub access_token: Option<String>,

  /// Student id. Present only for student accounts.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pid: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<RemoteError>,
}

impl Reply for AccessTokenResponse {
  fn remote_error(&self) -> Option<&RemoteError> {
    self.error.as_ref()
  }
}

/// A broadcast topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
  pub topic_id: String,

  /// Display metadata, passed through untouched.
  #[serde(flatten)]
  pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Reply for Vec<Topic> {
  fn remote_error(&self) -> Option<&RemoteError> {
    None
  }
}

/// A single message addressed to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
  pub message_id: String,
  pub timestamp: i64,

  /// Title, body, sender and so on, passed through untouched.
  #[serde(flatten)]
  pub fields: serde_json::Map<String, serde_json::Value>,
}

/// One page of messages.
///
/// `next_timestamp` is the cursor for the following (older) page and is
/// `None` once the last page has been reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePage {
  #[serde(default)]
  pub messages: Vec<Message>,

  #[serde(default, rename = "next")]
  pub next_timestamp: Option<i64>,
}

impl Reply for MessagePage {
  fn remote_error(&self) -> Option<&RemoteError> {
    None
  }
}
