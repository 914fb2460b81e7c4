//! Execution scaffolding shared by every workflow.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use campus_host_http::Reply;
use campus_host_log::Diagnostics;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DomainError, FailureReport, WorkflowError};
use crate::events::{Notification, TriggerKind};
use crate::guard;
use crate::supervisor::Emitter;

/// Lifecycle of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
  Idle,
  Requesting,
  Succeeded,
  Failed,
  TimedOut,
}

impl RequestState {
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      RequestState::Succeeded | RequestState::Failed | RequestState::TimedOut
    )
  }
}

/// A single run of a workflow.
///
/// Wraps the execution's [`Emitter`] and walks the
/// `Idle -> Requesting -> (Succeeded | Failed | TimedOut)` lifecycle.
pub struct Execution {
  emitter: Emitter,
  diagnostics: Arc<dyn Diagnostics>,
}

impl Execution {
  pub fn new(emitter: Emitter, diagnostics: Arc<dyn Diagnostics>) -> Self {
    Self {
      emitter,
      diagnostics,
    }
  }

  pub fn id(&self) -> &str {
    self.emitter.execution_id()
  }

  pub fn kind(&self) -> TriggerKind {
    self.emitter.kind()
  }

  pub fn emit(&self, notification: Notification) -> bool {
    self.emitter.emit(notification)
  }

  /// Whether no newer execution of the same kind has started.
  pub fn is_current(&self) -> bool {
    self.emitter.is_current()
  }

  /// Enter `Requesting` without announcing it.
  pub fn start(&self) {
    self.emitter.set_state(RequestState::Requesting);
  }

  /// Enter `Requesting` and emit the request-started notification.
  pub fn begin(&self, started: Notification) {
    self.start();
    self.emit(started);
  }

  /// Run a guarded remote call.
  ///
  /// A timeout becomes the error produced by `on_timeout`; a call failure is
  /// converted into a [`WorkflowError`].
  pub async fn invoke<T, E, F, Fut>(
    &self,
    operation: &'static str,
    deadline: Duration,
    on_timeout: fn(Duration) -> WorkflowError,
    call: F,
  ) -> Result<T, WorkflowError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display + Into<WorkflowError>,
  {
    match guard::invoke(operation, deadline, call).await {
      Ok(outcome) => outcome.or_timeout(|| on_timeout(deadline)),
      Err(e) => Err(e.into()),
    }
  }

  /// Emit the success notifications and enter `Succeeded`.
  pub fn succeed(&self, notifications: impl IntoIterator<Item = Notification>) {
    for notification in notifications {
      self.emit(notification);
    }
    self.complete();
  }

  /// Enter `Succeeded` without notifying.
  pub fn complete(&self) {
    self.emitter.set_state(RequestState::Succeeded);
    debug!(kind = %self.kind(), execution_id = %self.id(), "execution_succeeded");
  }

  /// Emit the failure notification built by `failure`, record the error
  /// with diagnostics and enter `Failed` (or `TimedOut`). A superseded
  /// execution records nothing.
  pub fn fail(&self, error: &WorkflowError, failure: impl FnOnce(FailureReport) -> Notification) {
    if self.emit(failure(error.report())) {
      self.track(error);
    }
    self.settle_failed(error);
  }

  /// Enter `Failed` (or `TimedOut`) without notifying.
  pub fn settle_failed(&self, error: &WorkflowError) {
    let state = if error.is_timeout() {
      RequestState::TimedOut
    } else {
      RequestState::Failed
    };
    self.emitter.set_state(state);
    debug!(
      kind = %self.kind(),
      execution_id = %self.id(),
      error = %error,
      "execution_failed"
    );
  }

  /// Record a non-fatal error with diagnostics.
  pub fn track(&self, error: &WorkflowError) {
    self.diagnostics.track_exception(error, false);
  }
}

/// Accept a reply only if it carries no application error.
pub fn accept<T: Reply>(reply: T) -> Result<T, WorkflowError> {
  match reply.remote_error() {
    None => Ok(reply),
    Some(error) if error.app_update_required => Err(DomainError::AppUpdateRequired.into()),
    Some(error) => Err(WorkflowError::rejected(error.message.clone())),
  }
}
