//! Notifiers deliver emitted notifications to the host.

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::events::Notification;

/// Trait for receiving workflow notifications.
///
/// `notify` is called while the emitting execution's slot is locked, so
/// implementations must not block and must not call back into the
/// supervisor.
pub trait Notifier: Send + Sync {
  fn notify(&self, notification: Notification);
}

/// A no-op notifier that discards all notifications.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  fn notify(&self, _notification: Notification) {}
}

/// A notifier that sends notifications to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow host never stalls a workflow; each execution emits a
  // handful of notifications.
  sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<Notification>) -> Self {
    Self { sender }
  }
}

impl Notifier for ChannelNotifier {
  fn notify(&self, notification: Notification) {
    // Receiver may have been dropped
    let _ = self.sender.send(notification);
  }
}

/// A notifier that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
  received: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
  pub fn new() -> Self {
    Self::default()
  }

  /// Everything received so far, in delivery order.
  pub fn received(&self) -> Vec<Notification> {
    self
      .received
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }

  /// Names of everything received so far, in delivery order.
  pub fn names(&self) -> Vec<&'static str> {
    self.received().iter().map(Notification::name).collect()
  }

  /// Drain and return everything received so far.
  pub fn take(&self) -> Vec<Notification> {
    std::mem::take(
      &mut *self
        .received
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()),
    )
  }
}

impl Notifier for MemoryNotifier {
  fn notify(&self, notification: Notification) {
    self
      .received
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .push(notification);
  }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
  fn notify(&self, notification: Notification) {
    (**self).notify(notification)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_channel_notifier_survives_dropped_receiver() {
    let (sender, receiver) = mpsc::unbounded_channel();
    let notifier = ChannelNotifier::new(sender);
    drop(receiver);
    notifier.notify(Notification::LogInRequest);
  }

  #[tokio::test]
  async fn test_channel_notifier_delivers_in_order() {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let notifier = ChannelNotifier::new(sender);

    notifier.notify(Notification::GetTopicsRequest);
    notifier.notify(Notification::GetTopicsSuccess);

    assert_eq!(receiver.recv().await, Some(Notification::GetTopicsRequest));
    assert_eq!(receiver.recv().await, Some(Notification::GetTopicsSuccess));
  }

  #[test]
  fn test_memory_notifier_take_drains() {
    let notifier = MemoryNotifier::new();
    notifier.notify(Notification::LoggedOut);

    assert_eq!(notifier.names(), vec!["LOGGED_OUT"]);
    assert_eq!(notifier.take().len(), 1);
    assert!(notifier.received().is_empty());
  }
}
