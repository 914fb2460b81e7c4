use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Time bounds applied to remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deadlines {
  /// Deadline for every messaging backend request.
  pub messaging_ms: u64,

  /// Deadline for identity provider (SSO) requests.
  pub sso_ms: u64,

  /// Delay before the single retry after the identity provider rejects
  /// stored credentials during a token refresh.
  pub sso_retry_backoff_ms: u64,
}

impl Default for Deadlines {
  fn default() -> Self {
    Self {
      messaging_ms: 15_000,
      sso_ms: 15_000,
      sso_retry_backoff_ms: 10_000,
    }
  }
}

impl Deadlines {
  pub fn messaging(&self) -> Duration {
    Duration::from_millis(self.messaging_ms)
  }

  pub fn sso(&self) -> Duration {
    Duration::from_millis(self.sso_ms)
  }

  pub fn sso_retry_backoff(&self) -> Duration {
    Duration::from_millis(self.sso_retry_backoff_ms)
  }
}
