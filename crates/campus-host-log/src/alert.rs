use std::sync::Mutex;

use serde::Serialize;
use tracing::warn;

/// How an alert button is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
  Default,
  Cancel,
  Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertButton {
  pub text: String,
  pub style: ButtonStyle,
}

/// A modal alert shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
  pub title: String,
  pub message: String,
  pub buttons: Vec<AlertButton>,
  /// Whether tapping outside the alert dismisses it.
  pub cancelable: bool,
}

impl Alert {
  /// The alert shown when the identity provider reports that this build of
  /// the app is no longer accepted.
  pub fn app_update_required() -> Self {
    Self {
      title: "App Update Required".to_string(),
      message: "If you would like to log in, please update the app.".to_string(),
      buttons: vec![AlertButton {
        text: "OK".to_string(),
        style: ButtonStyle::Cancel,
      }],
      cancelable: false,
    }
  }
}

/// Presents alerts to the user.
pub trait AlertPresenter: Send + Sync {
  fn present(&self, alert: Alert);
}

/// Alert presenter for headless hosts: logs the alert.
#[derive(Debug, Clone, Default)]
pub struct TracingAlerts;

impl AlertPresenter for TracingAlerts {
  fn present(&self, alert: Alert) {
    warn!(title = %alert.title, message = %alert.message, "user alert");
  }
}

/// Alert presenter that keeps every alert in memory.
#[derive(Debug, Default)]
pub struct MemoryAlerts {
  presented: Mutex<Vec<Alert>>,
}

impl MemoryAlerts {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn presented(&self) -> Vec<Alert> {
    self
      .presented
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }
}

impl AlertPresenter for MemoryAlerts {
  fn present(&self, alert: Alert) {
    self
      .presented
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .push(alert);
  }
}
