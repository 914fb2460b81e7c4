//! Trigger dispatch with channel-based delivery.
//!
//! The `Dispatcher` owns an mpsc channel for receiving triggers and starts
//! one supervised execution per trigger. Messaging executions read the
//! session snapshot taken at dispatch time; token refresh reads the live
//! session on every attempt.

use std::sync::Arc;

use campus_workflow::{
  Capabilities, Execution, ExecutionHandle, Notifier, ReducingNotifier, RequestState, Session,
  SessionStore, Supervisor, Trigger, TriggerKind,
};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::messages::{MessagesWorkflows, PageMode};
use crate::settings::Settings;
use crate::user::UserWorkflows;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
  #[error("dispatcher channel closed")]
  ChannelClosed,

  #[error("execution task failed: {0}")]
  Join(#[from] JoinError),
}

/// Routes triggers to the user and messaging workflows.
///
/// # Usage
///
/// ```ignore
/// let dispatcher = Dispatcher::new(capabilities, settings, notifier);
///
/// // Get sender for the host's event source
/// let sender = dispatcher.sender();
///
/// // Start the dispatch loop
/// let cancel = CancellationToken::new();
/// dispatcher.start(cancel).await?;
/// ```
pub struct Dispatcher {
  sender: mpsc::Sender<Trigger>,
  receiver: mpsc::Receiver<Trigger>,
  supervisor: Supervisor,
  session: Arc<SessionStore>,
  capabilities: Capabilities,
  user: Arc<UserWorkflows>,
  messages: Arc<MessagesWorkflows>,
}

impl Dispatcher {
  /// Create a dispatcher that starts from a logged-out session.
  pub fn new(capabilities: Capabilities, settings: Settings, notifier: Arc<dyn Notifier>) -> Self {
    Self::with_session(
      capabilities,
      settings,
      Arc::new(SessionStore::new()),
      notifier,
    )
  }

  /// Create a dispatcher around an existing session store.
  ///
  /// Every emitted notification is applied to `session` before it reaches
  /// `notifier`.
  pub fn with_session(
    capabilities: Capabilities,
    settings: Settings,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(100);
    let reducing = Arc::new(ReducingNotifier::new(session.clone(), notifier));

    Self {
      sender,
      receiver,
      supervisor: Supervisor::new(reducing),
      user: Arc::new(UserWorkflows::new(
        capabilities.clone(),
        settings.clone(),
        session.clone(),
      )),
      messages: Arc::new(MessagesWorkflows::new(capabilities.clone(), settings)),
      session,
      capabilities,
    }
  }

  /// Get a sender handle for delivering triggers to the dispatch loop.
  pub fn sender(&self) -> mpsc::Sender<Trigger> {
    self.sender.clone()
  }

  /// Deliver a trigger through the channel.
  pub async fn send(&self, trigger: Trigger) -> Result<(), DispatchError> {
    self
      .sender
      .send(trigger)
      .await
      .map_err(|_| DispatchError::ChannelClosed)
  }

  /// The current session snapshot.
  pub fn session(&self) -> Session {
    self.session.snapshot()
  }

  /// The state of the latest execution of `kind`.
  pub fn state(&self, kind: TriggerKind) -> RequestState {
    self.supervisor.state(kind)
  }

  /// Start an execution for `trigger` immediately, superseding any execution
  /// of the same kind.
  pub fn trigger(&self, trigger: Trigger) -> ExecutionHandle {
    let kind = trigger.kind();
    let session = self.session.snapshot();
    let diagnostics = self.capabilities.diagnostics.clone();
    let user = self.user.clone();
    let messages = self.messages.clone();

    let handle = self.supervisor.spawn(kind, move |emitter| async move {
      let execution = Execution::new(emitter, diagnostics);
      match trigger {
        Trigger::UserLogin { username, password } => {
          user.login(&execution, &username, &password).await
        }
        Trigger::UserLogout => user.logout(&execution).await,
        Trigger::UserLoginTimeout => user.login_timed_out(&execution).await,
        Trigger::UserTokenRefresh => user.refresh(&execution).await,
        Trigger::UpdateMessages { timestamp } => {
          messages
            .fetch_messages(&execution, &session, timestamp, PageMode::Replace)
            .await
        }
        Trigger::LoadMoreMessages { timestamp } => {
          messages
            .fetch_messages(&execution, &session, timestamp, PageMode::Append)
            .await
        }
        Trigger::RegisterToken { token } => {
          messages.register_token(&execution, &session, &token).await
        }
        Trigger::UnregisterToken { access_token } => {
          messages.unregister_token(&execution, &access_token).await
        }
        Trigger::GetTopics => messages.get_topics(&execution).await,
        Trigger::SubscribeToTopic { topic_id } => {
          messages.subscribe(&execution, &session, &topic_id).await
        }
        Trigger::UnsubscribeFromTopic { topic_id } => {
          messages.unsubscribe(&execution, &session, &topic_id).await
        }
      }
    });

    info!(
      trigger = %kind,
      execution_id = %handle.execution_id(),
      "dispatched trigger"
    );
    handle
  }

  /// Start executions for every trigger and wait for all of them.
  ///
  /// Triggers of the same kind supersede each other in order.
  pub async fn run_all(
    &self,
    triggers: impl IntoIterator<Item = Trigger>,
  ) -> Result<(), DispatchError> {
    let handles: Vec<_> = triggers
      .into_iter()
      .map(|trigger| self.trigger(trigger).wait())
      .collect();

    futures::future::try_join_all(handles).await?;
    Ok(())
  }

  /// Start the dispatch loop.
  ///
  /// Runs until the cancellation token is triggered or the channel closes.
  /// Cancelling also stops every in-flight execution.
  pub async fn start(mut self, cancel: CancellationToken) -> Result<(), DispatchError> {
    info!("starting dispatcher");

    loop {
      let trigger = tokio::select! {
        _ = cancel.cancelled() => {
          info!("dispatcher cancelled");
          self.supervisor.shutdown();
          break;
        }
        trigger = self.receiver.recv() => trigger,
      };

      match trigger {
        Some(trigger) => {
          self.trigger(trigger);
        }
        None => {
          error!("dispatcher channel closed");
          break;
        }
      }
    }

    Ok(())
  }
}
