//! Latest-only execution supervision.
//!
//! The [`Supervisor`] keeps one slot per [`TriggerKind`]. Starting an
//! execution claims the slot, which bumps the slot's generation. Every
//! execution emits through an [`Emitter`] bound to the generation it was
//! started with; once a newer execution of the same kind has claimed the
//! slot, the older emitter's notifications are dropped.
//!
//! Superseded executions keep running to completion and only their
//! notifications are suppressed. Workflows that destroy or replace stored
//! state check [`Emitter::is_current`] before doing so.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::{Notification, TriggerKind};
use crate::execution::RequestState;
use crate::notify::Notifier;

#[derive(Debug)]
struct Slot {
  generation: u64,
  state: RequestState,
}

type Slots = Arc<Mutex<HashMap<TriggerKind, Slot>>>;

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<TriggerKind, Slot>> {
  slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Per-kind single-slot supervisor.
pub struct Supervisor {
  notifier: Arc<dyn Notifier>,
  slots: Slots,
  shutdown: CancellationToken,
}

impl Supervisor {
  pub fn new(notifier: Arc<dyn Notifier>) -> Self {
    Self::with_shutdown(notifier, CancellationToken::new())
  }

  /// Create a supervisor whose spawned executions stop when `shutdown` is
  /// cancelled.
  pub fn with_shutdown(notifier: Arc<dyn Notifier>, shutdown: CancellationToken) -> Self {
    Self {
      notifier,
      slots: Arc::new(Mutex::new(HashMap::new())),
      shutdown,
    }
  }

  /// Claim the slot for `kind`, superseding whatever execution held it.
  pub fn claim(&self, kind: TriggerKind) -> Emitter {
    let mut slots = lock(&self.slots);
    let slot = slots.entry(kind).or_insert(Slot {
      generation: 0,
      state: RequestState::Idle,
    });

    if slot.state == RequestState::Requesting {
      info!(
        kind = %kind,
        superseded_generation = slot.generation,
        "superseding in-flight execution"
      );
    }

    slot.generation += 1;
    slot.state = RequestState::Idle;

    Emitter {
      kind,
      generation: slot.generation,
      execution_id: uuid::Uuid::new_v4().to_string(),
      slots: self.slots.clone(),
      notifier: self.notifier.clone(),
    }
  }

  /// Claim the slot for `kind` and run `work` on a new task.
  pub fn spawn<F, Fut>(&self, kind: TriggerKind, work: F) -> ExecutionHandle
  where
    F: FnOnce(Emitter) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let emitter = self.claim(kind);
    let execution_id = emitter.execution_id().to_string();
    let cancel = self.shutdown.child_token();
    let task = work(emitter);

    let id = execution_id.clone();
    let handle = tokio::spawn(async move {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!(kind = %kind, execution_id = %id, "execution stopped by shutdown");
        }
        _ = task => {}
      }
    });

    ExecutionHandle {
      kind,
      execution_id,
      handle,
    }
  }

  /// The state of the latest execution of `kind`.
  pub fn state(&self, kind: TriggerKind) -> RequestState {
    lock(&self.slots)
      .get(&kind)
      .map(|slot| slot.state)
      .unwrap_or(RequestState::Idle)
  }

  /// Stop every spawned execution.
  pub fn shutdown(&self) {
    self.shutdown.cancel();
  }
}

/// Emits notifications on behalf of one execution.
#[derive(Clone)]
pub struct Emitter {
  kind: TriggerKind,
  generation: u64,
  execution_id: String,
  slots: Slots,
  notifier: Arc<dyn Notifier>,
}

impl Emitter {
  pub fn kind(&self) -> TriggerKind {
    self.kind
  }

  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  /// Whether this execution still holds its slot.
  pub fn is_current(&self) -> bool {
    lock(&self.slots)
      .get(&self.kind)
      .is_some_and(|slot| slot.generation == self.generation)
  }

  /// Deliver a notification unless this execution has been superseded.
  /// Returns whether it was delivered.
  pub fn emit(&self, notification: Notification) -> bool {
    // Hold the slot lock while delivering so a newer execution cannot claim
    // the slot between the check and the send.
    let slots = lock(&self.slots);
    let current = slots
      .get(&self.kind)
      .is_some_and(|slot| slot.generation == self.generation);

    if !current {
      debug!(
        kind = %self.kind,
        execution_id = %self.execution_id,
        notification = notification.name(),
        "suppressed notification from superseded execution"
      );
      return false;
    }

    self.notifier.notify(notification);
    true
  }

  /// Record the execution's state. Ignored once superseded.
  pub(crate) fn set_state(&self, state: RequestState) -> bool {
    let mut slots = lock(&self.slots);
    match slots.get_mut(&self.kind) {
      Some(slot) if slot.generation == self.generation => {
        slot.state = state;
        true
      }
      _ => false,
    }
  }
}

/// A handle to a spawned execution.
#[derive(Debug)]
pub struct ExecutionHandle {
  kind: TriggerKind,
  execution_id: String,
  handle: JoinHandle<()>,
}

impl ExecutionHandle {
  pub fn kind(&self) -> TriggerKind {
    self.kind
  }

  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  pub fn is_finished(&self) -> bool {
    self.handle.is_finished()
  }

  /// Wait for the execution to finish.
  pub async fn wait(self) -> Result<(), JoinError> {
    self.handle.await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notify::{MemoryNotifier, NoopNotifier};
  use std::time::Duration;

  fn supervisor() -> (Supervisor, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    (Supervisor::new(notifier.clone()), notifier)
  }

  #[test]
  fn test_superseded_emitter_is_suppressed() {
    let (supervisor, notifier) = supervisor();

    let first = supervisor.claim(TriggerKind::GetTopics);
    assert!(first.emit(Notification::GetTopicsRequest));

    let second = supervisor.claim(TriggerKind::GetTopics);
    assert!(!first.is_current());
    assert!(!first.emit(Notification::GetTopicsSuccess));
    assert!(second.emit(Notification::GetTopicsRequest));

    assert_eq!(
      notifier.names(),
      vec!["GET_TOPICS_REQUEST", "GET_TOPICS_REQUEST"]
    );
  }

  #[test]
  fn test_kinds_do_not_supersede_each_other() {
    let (supervisor, notifier) = supervisor();

    let login = supervisor.claim(TriggerKind::UserLogin);
    let _messages = supervisor.claim(TriggerKind::UpdateMessages);

    assert!(login.is_current());
    assert!(login.emit(Notification::LogInRequest));
    assert_eq!(notifier.names(), vec!["LOG_IN_REQUEST"]);
  }

  #[test]
  fn test_state_tracks_latest_execution() {
    let supervisor = Supervisor::new(Arc::new(NoopNotifier));
    assert_eq!(supervisor.state(TriggerKind::GetTopics), RequestState::Idle);

    let first = supervisor.claim(TriggerKind::GetTopics);
    first.set_state(RequestState::Requesting);
    assert_eq!(supervisor.state(TriggerKind::GetTopics), RequestState::Requesting);

    let second = supervisor.claim(TriggerKind::GetTopics);
    assert_eq!(supervisor.state(TriggerKind::GetTopics), RequestState::Idle);

    // The superseded execution can no longer move the slot
    assert!(!first.set_state(RequestState::Failed));
    assert!(second.set_state(RequestState::Succeeded));
    assert_eq!(supervisor.state(TriggerKind::GetTopics), RequestState::Succeeded);
  }

  #[tokio::test(start_paused = true)]
  async fn test_spawned_superseded_execution_runs_but_stays_silent() {
    let (supervisor, notifier) = supervisor();
    let finished = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let flag = finished.clone();
    let slow = supervisor.spawn(TriggerKind::GetTopics, move |emitter| async move {
      emitter.emit(Notification::GetTopicsRequest);
      tokio::time::sleep(Duration::from_secs(10)).await;
      emitter.emit(Notification::GetTopicsSuccess);
      flag.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_secs(1)).await;

    let fast = supervisor.spawn(TriggerKind::GetTopics, |emitter| async move {
      emitter.emit(Notification::GetTopicsRequest);
      emitter.emit(Notification::GetTopicsFailed {
        error: crate::WorkflowError::request_timed_out(Duration::from_secs(1)).report(),
      });
    });

    fast.wait().await.unwrap();
    assert!(!slow.is_finished());
    slow.wait().await.unwrap();

    assert!(finished.load(std::sync::atomic::Ordering::SeqCst));
    assert_eq!(
      notifier.names(),
      vec!["GET_TOPICS_REQUEST", "GET_TOPICS_REQUEST", "GET_TOPICS_FAILED"]
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_shutdown_stops_executions() {
    let (supervisor, notifier) = supervisor();

    let handle = supervisor.spawn(TriggerKind::UpdateMessages, |emitter| async move {
      tokio::time::sleep(Duration::from_secs(60)).await;
      emitter.emit(Notification::GetMessagesSuccess);
    });

    supervisor.shutdown();
    handle.wait().await.unwrap();
    assert!(notifier.received().is_empty());
  }
}
