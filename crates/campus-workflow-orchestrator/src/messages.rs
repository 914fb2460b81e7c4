//! Messaging workflows: topics, push token registration, message pages and
//! topic subscriptions.

use campus_host_http::MessagePage;
use campus_workflow::{
  Capabilities, Execution, Notification, ProfilePatch, Session, WorkflowError, accept,
};
use tracing::{debug, instrument, warn};

use crate::settings::Settings;

/// How a fetched message page is merged into the host's message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
  /// `UPDATE_MESSAGES`: replace the list.
  Replace,
  /// `LOAD_MORE_MESSAGES`: append to the list.
  Append,
}

impl PageMode {
  fn notification(&self, page: MessagePage) -> Notification {
    let MessagePage {
      messages,
      next_timestamp,
    } = page;
    match self {
      PageMode::Replace => Notification::SetMessages {
        messages,
        next_timestamp,
      },
      PageMode::Append => Notification::AddMessages {
        messages,
        next_timestamp,
      },
    }
  }
}

/// Append `topic_id` to `topics`. With `dedupe`, an already present id is
/// not appended again.
pub fn with_subscription(mut topics: Vec<String>, topic_id: &str, dedupe: bool) -> Vec<String> {
  if !(dedupe && topics.iter().any(|t| t == topic_id)) {
    topics.push(topic_id.to_string());
  }
  topics
}

/// Remove the first occurrence of `topic_id`. Unchanged when absent.
pub fn without_subscription(mut topics: Vec<String>, topic_id: &str) -> Vec<String> {
  if let Some(index) = topics.iter().position(|t| t == topic_id) {
    topics.remove(index);
  }
  topics
}

pub struct MessagesWorkflows {
  capabilities: Capabilities,
  settings: Settings,
}

impl MessagesWorkflows {
  pub fn new(capabilities: Capabilities, settings: Settings) -> Self {
    Self {
      capabilities,
      settings,
    }
  }

  /// `GET_TOPICS`
  #[instrument(skip_all, fields(execution_id = %execution.id()))]
  pub async fn get_topics(&self, execution: &Execution) {
    execution.begin(Notification::GetTopicsRequest);

    let result = execution
      .invoke(
        "fetch_topics",
        self.settings.messaging_deadline,
        WorkflowError::request_timed_out,
        || self.capabilities.gateway.fetch_topics(),
      )
      .await
      .and_then(accept);

    match result {
      Ok(topics) => {
        debug!(count = topics.len(), "topics fetched");
        execution.succeed([
          Notification::SetTopics { topics },
          Notification::GetTopicsSuccess,
        ]);
      }
      Err(error) => execution.fail(&error, |error| Notification::GetTopicsFailed { error }),
    }
  }

  /// `REGISTER_TOKEN`. Does nothing unless logged in.
  #[instrument(skip_all, fields(execution_id = %execution.id()))]
  pub async fn register_token(&self, execution: &Execution, session: &Session, token: &str) {
    if !session.is_logged_in {
      debug!("not logged in, skipping push token registration");
      return;
    }

    execution.begin(Notification::PostTokenRequest);

    let device_id = self.capabilities.push.device_id();
    let result = execution
      .invoke(
        "post_push_token",
        self.settings.messaging_deadline,
        WorkflowError::request_timed_out,
        || self.capabilities.gateway.post_push_token(token, &device_id),
      )
      .await
      .and_then(accept);

    match result {
      Ok(_) => execution.succeed([
        Notification::ConfirmRegistration,
        Notification::PostTokenSuccess,
      ]),
      Err(error) => execution.fail(&error, |error| Notification::PostTokenFailed { error }),
    }
  }

  /// `UNREGISTER_TOKEN`
  ///
  /// Takes the access token from the trigger because the session is usually
  /// being torn down while this runs.
  #[instrument(skip_all, fields(execution_id = %execution.id()))]
  pub async fn unregister_token(&self, execution: &Execution, access_token: &str) {
    let device_token = match self.capabilities.push.device_token().await {
      Ok(token) => token,
      Err(e) => {
        let error = WorkflowError::from(e);
        return execution.fail(&error, |error| Notification::PostTokenFailed { error });
      }
    };

    execution.begin(Notification::PostTokenRequest);

    let result = execution
      .invoke(
        "delete_push_token",
        self.settings.messaging_deadline,
        WorkflowError::request_timed_out,
        || {
          self
            .capabilities
            .gateway
            .delete_push_token(&device_token, access_token)
        },
      )
      .await
      .and_then(accept);

    match result {
      Ok(_) => execution.succeed([
        Notification::ConfirmDeregistration,
        Notification::PostTokenSuccess,
      ]),
      Err(error) => execution.fail(&error, |error| Notification::PostTokenFailed { error }),
    }
  }

  /// `UPDATE_MESSAGES` and `LOAD_MORE_MESSAGES`. Does nothing unless logged
  /// in.
  #[instrument(skip_all, fields(execution_id = %execution.id(), mode = ?mode, timestamp = ?timestamp))]
  pub async fn fetch_messages(
    &self,
    execution: &Execution,
    session: &Session,
    timestamp: Option<i64>,
    mode: PageMode,
  ) {
    if !session.is_logged_in {
      debug!("not logged in, skipping message fetch");
      return;
    }

    execution.begin(Notification::GetMessagesRequest);

    let result = execution
      .invoke(
        "fetch_my_messages",
        self.settings.messaging_deadline,
        WorkflowError::request_timed_out,
        || self.capabilities.gateway.fetch_my_messages(timestamp),
      )
      .await
      .and_then(accept);

    match result {
      Ok(page) => {
        debug!(
          count = page.messages.len(),
          next_timestamp = ?page.next_timestamp,
          "message page fetched"
        );
        execution.succeed([mode.notification(page), Notification::GetMessagesSuccess]);
      }
      Err(error) => execution.fail(&error, |error| Notification::GetMessagesFailure { error }),
    }
  }

  /// `SUBSCRIBE_TO_TOPIC`
  #[instrument(skip_all, fields(execution_id = %execution.id(), topic_id = %topic_id))]
  pub async fn subscribe(&self, execution: &Execution, session: &Session, topic_id: &str) {
    execution.start();

    let topics = with_subscription(
      session.subscribed_topics(),
      topic_id,
      self.settings.dedupe_subscriptions,
    );

    if let Err(e) = self.capabilities.push.subscribe_to_topic(topic_id).await {
      return self.subscription_failed(execution, e.into());
    }

    execution.succeed([Notification::ModifyLocalProfile {
      profile_items: ProfilePatch::subscribed_topics(topics),
    }]);
  }

  /// `UNSUBSCRIBE_FROM_TOPIC`
  #[instrument(skip_all, fields(execution_id = %execution.id(), topic_id = %topic_id))]
  pub async fn unsubscribe(&self, execution: &Execution, session: &Session, topic_id: &str) {
    execution.start();

    let topics = without_subscription(session.subscribed_topics(), topic_id);

    if let Err(e) = self.capabilities.push.unsubscribe_from_topic(topic_id).await {
      return self.subscription_failed(execution, e.into());
    }

    execution.succeed([Notification::ModifyLocalProfile {
      profile_items: ProfilePatch::subscribed_topics(topics),
    }]);
  }

  fn subscription_failed(&self, execution: &Execution, error: WorkflowError) {
    warn!(error = %error, "push sdk topic call failed");
    execution.track(&error);
    execution.settle_failed(&error);
  }
}
