use std::time::Duration;

use campus_config::CampusConfig;

/// Tunables the workflows read, resolved from [`CampusConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// Deadline for every messaging backend call.
  pub messaging_deadline: Duration,
  /// Deadline for identity provider calls, login and refresh alike.
  pub sso_deadline: Duration,
  /// Wait before retrying a refresh whose credentials were rejected.
  pub sso_retry_backoff: Duration,
  /// Simulated latency of a demo account login.
  pub demo_latency: Duration,
  pub dedupe_subscriptions: bool,
}

impl From<&CampusConfig> for Settings {
  fn from(config: &CampusConfig) -> Self {
    Self {
      messaging_deadline: config.deadlines.messaging(),
      sso_deadline: config.deadlines.sso(),
      sso_retry_backoff: config.deadlines.sso_retry_backoff(),
      demo_latency: config.demo.latency(),
      dedupe_subscriptions: config.topics.dedupe_subscriptions,
    }
  }
}

impl Default for Settings {
  fn default() -> Self {
    Self::from(&CampusConfig::default())
  }
}
