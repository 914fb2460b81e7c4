use serde::{Deserialize, Serialize};

/// Base URLs of the remote services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
  /// Identity provider token endpoint.
  pub sso_url: String,

  /// Messaging backend base URL. Topic, registration and message paths are
  /// joined onto it.
  pub messaging_url: String,
}

impl Default for Endpoints {
  fn default() -> Self {
    Self {
      sso_url: "http://localhost:8080/sso/access-token".to_string(),
      messaging_url: "http://localhost:8080/messaging/".to_string(),
    }
  }
}
