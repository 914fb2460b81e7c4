use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deadlines::Deadlines;
use crate::endpoints::Endpoints;

/// Top-level configuration.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampusConfig {
  pub deadlines: Deadlines,
  pub endpoints: Endpoints,
  pub demo: DemoSettings,
  pub topics: TopicSettings,
}

impl CampusConfig {
  /// Parse a config from a JSON string.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }
}

/// Settings for the fixed demo accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
  /// Simulated login latency for demo accounts.
  pub latency_ms: u64,
}

impl Default for DemoSettings {
  fn default() -> Self {
    Self { latency_ms: 750 }
  }
}

impl DemoSettings {
  pub fn latency(&self) -> Duration {
    Duration::from_millis(self.latency_ms)
  }
}

/// Topic subscription behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicSettings {
  /// Skip appending a topic id that is already subscribed.
  ///
  /// Off by default: subscribing twice records the topic twice, matching
  /// the behaviour hosts already depend on.
  pub dedupe_subscriptions: bool,
}
