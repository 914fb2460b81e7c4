//! Triggers and notifications.
//!
//! Triggers arrive from the host application and start workflows.
//! Notifications leave the workflows and describe state transitions for the
//! host's state store. Both serialize as `{"type": "SCREAMING_SNAKE_CASE", ...}`
//! with camelCase payload fields.

use campus_host_http::{Message, Topic};
use serde::{Deserialize, Serialize};

use crate::error::FailureReport;

/// An inbound event that starts or restarts a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
  tag = "type",
  rename_all = "SCREAMING_SNAKE_CASE",
  rename_all_fields = "camelCase"
)]
pub enum Trigger {
  UserLogin { username: String, password: String },
  UserLogout,
  UserLoginTimeout,
  UserTokenRefresh,
  UpdateMessages {
    #[serde(default)]
    timestamp: Option<i64>,
  },
  LoadMoreMessages {
    #[serde(default)]
    timestamp: Option<i64>,
  },
  RegisterToken { token: String },
  UnregisterToken { access_token: String },
  GetTopics,
  SubscribeToTopic { topic_id: String },
  UnsubscribeFromTopic { topic_id: String },
}

/// Which workflow a trigger belongs to. At most one execution per kind is
/// live at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
  UserLogin,
  UserLogout,
  UserLoginTimeout,
  UserTokenRefresh,
  UpdateMessages,
  LoadMoreMessages,
  RegisterToken,
  UnregisterToken,
  GetTopics,
  SubscribeToTopic,
  UnsubscribeFromTopic,
}

impl TriggerKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      TriggerKind::UserLogin => "USER_LOGIN",
      TriggerKind::UserLogout => "USER_LOGOUT",
      TriggerKind::UserLoginTimeout => "USER_LOGIN_TIMEOUT",
      TriggerKind::UserTokenRefresh => "USER_TOKEN_REFRESH",
      TriggerKind::UpdateMessages => "UPDATE_MESSAGES",
      TriggerKind::LoadMoreMessages => "LOAD_MORE_MESSAGES",
      TriggerKind::RegisterToken => "REGISTER_TOKEN",
      TriggerKind::UnregisterToken => "UNREGISTER_TOKEN",
      TriggerKind::GetTopics => "GET_TOPICS",
      TriggerKind::SubscribeToTopic => "SUBSCRIBE_TO_TOPIC",
      TriggerKind::UnsubscribeFromTopic => "UNSUBSCRIBE_FROM_TOPIC",
    }
  }
}

impl std::fmt::Display for TriggerKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Trigger {
  pub fn kind(&self) -> TriggerKind {
    match self {
      Trigger::UserLogin { .. } => TriggerKind::UserLogin,
      Trigger::UserLogout => TriggerKind::UserLogout,
      Trigger::UserLoginTimeout => TriggerKind::UserLoginTimeout,
      Trigger::UserTokenRefresh => TriggerKind::UserTokenRefresh,
      Trigger::UpdateMessages { .. } => TriggerKind::UpdateMessages,
      Trigger::LoadMoreMessages { .. } => TriggerKind::LoadMoreMessages,
      Trigger::RegisterToken { .. } => TriggerKind::RegisterToken,
      Trigger::UnregisterToken { .. } => TriggerKind::UnregisterToken,
      Trigger::GetTopics => TriggerKind::GetTopics,
      Trigger::SubscribeToTopic { .. } => TriggerKind::SubscribeToTopic,
      Trigger::UnsubscribeFromTopic { .. } => TriggerKind::UnsubscribeFromTopic,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifications {
  pub student: bool,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub username: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pid: Option<String>,
  #[serde(default)]
  pub classifications: Classifications,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subscribed_topics: Option<Vec<String>>,
}

/// A field-wise patch of the profile.
///
/// Only the fields that are `Some` are written, so patches coming from
/// different workflows never clobber each other's fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subscribed_topics: Option<Vec<String>>,
}

impl ProfilePatch {
  pub fn subscribed_topics(topics: Vec<String>) -> Self {
    Self {
      subscribed_topics: Some(topics),
    }
  }

  pub fn apply(&self, profile: &mut Profile) {
    if let Some(topics) = &self.subscribed_topics {
      profile.subscribed_topics = Some(topics.clone());
    }
  }
}

/// An outbound state-transition event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
  tag = "type",
  rename_all = "SCREAMING_SNAKE_CASE",
  rename_all_fields = "camelCase"
)]
pub enum Notification {
  // Authentication
  LogInRequest,
  ActivateStudentDemoAccount,
  LoggedIn { profile: Profile },
  LogInSuccess,
  LogInFailure { error: FailureReport },
  ToggleAuthenticatedCards,
  AuthHttpSuccess,
  UpdateSchedule,
  AppUpdateRequired,
  PanicLogOut,
  LoggedOut,
  ClearScheduleData,

  // Topics
  GetTopicsRequest,
  SetTopics { topics: Vec<Topic> },
  GetTopicsSuccess,
  GetTopicsFailed { error: FailureReport },

  // Push token registration
  PostTokenRequest,
  ConfirmRegistration,
  ConfirmDeregistration,
  PostTokenSuccess,
  PostTokenFailed { error: FailureReport },

  // Messages
  GetMessagesRequest,
  SetMessages {
    messages: Vec<Message>,
    next_timestamp: Option<i64>,
  },
  AddMessages {
    messages: Vec<Message>,
    next_timestamp: Option<i64>,
  },
  GetMessagesSuccess,
  GetMessagesFailure { error: FailureReport },

  // Profile
  ModifyLocalProfile { profile_items: ProfilePatch },
}

impl Notification {
  /// The wire name of this notification.
  pub fn name(&self) -> &'static str {
    match self {
      Notification::LogInRequest => "LOG_IN_REQUEST",
      Notification::ActivateStudentDemoAccount => "ACTIVATE_STUDENT_DEMO_ACCOUNT",
      Notification::LoggedIn { .. } => "LOGGED_IN",
      Notification::LogInSuccess => "LOG_IN_SUCCESS",
      Notification::LogInFailure { .. } => "LOG_IN_FAILURE",
      Notification::ToggleAuthenticatedCards => "TOGGLE_AUTHENTICATED_CARDS",
      Notification::AuthHttpSuccess => "AUTH_HTTP_SUCCESS",
      Notification::UpdateSchedule => "UPDATE_SCHEDULE",
      Notification::AppUpdateRequired => "APP_UPDATE_REQUIRED",
      Notification::PanicLogOut => "PANIC_LOG_OUT",
      Notification::LoggedOut => "LOGGED_OUT",
      Notification::ClearScheduleData => "CLEAR_SCHEDULE_DATA",
      Notification::GetTopicsRequest => "GET_TOPICS_REQUEST",
      Notification::SetTopics { .. } => "SET_TOPICS",
      Notification::GetTopicsSuccess => "GET_TOPICS_SUCCESS",
      Notification::GetTopicsFailed { .. } => "GET_TOPICS_FAILED",
      Notification::PostTokenRequest => "POST_TOKEN_REQUEST",
      Notification::ConfirmRegistration => "CONFIRM_REGISTRATION",
      Notification::ConfirmDeregistration => "CONFIRM_DEREGISTRATION",
      Notification::PostTokenSuccess => "POST_TOKEN_SUCCESS",
      Notification::PostTokenFailed { .. } => "POST_TOKEN_FAILED",
      Notification::GetMessagesRequest => "GET_MESSAGES_REQUEST",
      Notification::SetMessages { .. } => "SET_MESSAGES",
      Notification::AddMessages { .. } => "ADD_MESSAGES",
      Notification::GetMessagesSuccess => "GET_MESSAGES_SUCCESS",
      Notification::GetMessagesFailure { .. } => "GET_MESSAGES_FAILURE",
      Notification::ModifyLocalProfile { .. } => "MODIFY_LOCAL_PROFILE",
    }
  }
}
