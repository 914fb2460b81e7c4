#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campus_host_http::{
  AccessTokenResponse, Ack, Gateway, GatewayError, Message, MessagePage, RemoteError, Topic,
};
use campus_host_kv::InMemorySecureStore;
use campus_host_log::{MemoryAlerts, MemoryDiagnostics};
use campus_host_push::InMemoryPush;
use campus_workflow::{
  Capabilities, Classifications, MemoryNotifier, Profile, Session, SessionStore,
};
use campus_workflow_orchestrator::{Dispatcher, Settings};

pub const PAGE_SIZE: usize = 3;

/// A remote call made against [`FakeGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  RetrieveAccessToken(String),
  FetchTopics,
  PostPushToken { token: String, device_id: String },
  DeletePushToken { token: String, access_token: String },
  FetchMyMessages(Option<i64>),
}

/// Scripted gateway.
///
/// Identity provider replies are served from a queue; once it is empty every
/// call succeeds with `access_token = "token"`. Messages are served from a
/// fixed backing store, newest first.
pub struct FakeGateway {
  calls: Mutex<Vec<Call>>,
  sso_replies: Mutex<VecDeque<Result<AccessTokenResponse, GatewayError>>>,
  sso_latency: Mutex<Duration>,
  messaging_latency: Mutex<Duration>,
  messaging_failure: Mutex<Option<u16>>,
  messages: Vec<Message>,
}

impl FakeGateway {
  pub fn new() -> Self {
    // Timestamps 100, 90, ..., 10
    let messages = (1..=10)
      .rev()
      .map(|i| message(&format!("m{i}"), i * 10))
      .collect();

    Self {
      calls: Mutex::new(Vec::new()),
      sso_replies: Mutex::new(VecDeque::new()),
      sso_latency: Mutex::new(Duration::ZERO),
      messaging_latency: Mutex::new(Duration::ZERO),
      messaging_failure: Mutex::new(None),
      messages,
    }
  }

  pub fn push_sso_reply(&self, reply: AccessTokenResponse) {
    self.sso_replies.lock().unwrap().push_back(Ok(reply));
  }

  pub fn push_sso_failure(&self, error: GatewayError) {
    self.sso_replies.lock().unwrap().push_back(Err(error));
  }

  pub fn set_sso_latency(&self, latency: Duration) {
    *self.sso_latency.lock().unwrap() = latency;
  }

  pub fn set_messaging_latency(&self, latency: Duration) {
    *self.messaging_latency.lock().unwrap() = latency;
  }

  /// Make every messaging call fail with `status`.
  pub fn fail_messaging(&self, status: u16) {
    *self.messaging_failure.lock().unwrap() = Some(status);
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn sso_calls(&self) -> Vec<String> {
    self
      .calls()
      .into_iter()
      .filter_map(|call| match call {
        Call::RetrieveAccessToken(encoded) => Some(encoded),
        _ => None,
      })
      .collect()
  }

  fn record(&self, call: Call) {
    self.calls.lock().unwrap().push(call);
  }

  async fn messaging(&self) -> Result<(), GatewayError> {
    let latency = *self.messaging_latency.lock().unwrap();
    tokio::time::sleep(latency).await;

    match *self.messaging_failure.lock().unwrap() {
      Some(status) => Err(GatewayError::Status {
        status,
        message: "backend unavailable".to_string(),
      }),
      None => Ok(()),
    }
  }
}

#[async_trait]
impl Gateway for FakeGateway {
  async fn fetch_topics(&self) -> Result<Vec<Topic>, GatewayError> {
    self.record(Call::FetchTopics);
    self.messaging().await?;
    Ok(vec![topic("campus-news"), topic("athletics")])
  }

  async fn post_push_token(&self, token: &str, device_id: &str) -> Result<Ack, GatewayError> {
    self.record(Call::PostPushToken {
      token: token.to_string(),
      device_id: device_id.to_string(),
    });
    self.messaging().await?;
    Ok(Ack::default())
  }

  async fn delete_push_token(
    &self,
    token: &str,
    access_token: &str,
  ) -> Result<Ack, GatewayError> {
    self.record(Call::DeletePushToken {
      token: token.to_string(),
      access_token: access_token.to_string(),
    });
    self.messaging().await?;
    Ok(Ack::default())
  }

  async fn fetch_my_messages(&self, timestamp: Option<i64>) -> Result<MessagePage, GatewayError> {
    self.record(Call::FetchMyMessages(timestamp));
    self.messaging().await?;

    let remaining: Vec<_> = self
      .messages
      .iter()
      .filter(|m| timestamp.is_none_or(|ts| m.timestamp < ts))
      .cloned()
      .collect();
    let page: Vec<_> = remaining.iter().take(PAGE_SIZE).cloned().collect();
    let next_timestamp = if remaining.len() > page.len() {
      page.last().map(|m| m.timestamp)
    } else {
      None
    };

    Ok(MessagePage {
      messages: page,
      next_timestamp,
    })
  }

  async fn retrieve_access_token(
    &self,
    encoded_credentials: &str,
  ) -> Result<AccessTokenResponse, GatewayError> {
    self.record(Call::RetrieveAccessToken(encoded_credentials.to_string()));

    let latency = *self.sso_latency.lock().unwrap();
    tokio::time::sleep(latency).await;

    let reply = self.sso_replies.lock().unwrap().pop_front();
    reply.unwrap_or_else(|| Ok(token_reply("token", Some("A12345678"))))
  }
}

pub fn topic(id: &str) -> Topic {
  Topic {
    topic_id: id.to_string(),
    metadata: serde_json::Map::new(),
  }
}

pub fn message(id: &str, timestamp: i64) -> Message {
  let mut fields = serde_json::Map::new();
  fields.insert("title".to_string(), serde_json::json!(format!("Message {id}")));
  Message {
    message_id: id.to_string(),
    timestamp,
    fields,
  }
}

pub fn token_reply(token: &str, pid: Option<&str>) -> AccessTokenResponse {
  AccessTokenResponse {
    access_token: Some(token.to_string()),
    pid: pid.map(str::to_string),
    error: None,
  }
}

pub fn error_reply(message: &str) -> AccessTokenResponse {
  AccessTokenResponse {
    access_token: None,
    pid: None,
    error: Some(RemoteError {
      message: message.to_string(),
      app_update_required: false,
    }),
  }
}

pub fn app_update_reply() -> AccessTokenResponse {
  AccessTokenResponse {
    access_token: None,
    pid: None,
    error: Some(RemoteError {
      message: "Please update.".to_string(),
      app_update_required: true,
    }),
  }
}

pub fn logged_in_session(subscribed_topics: Option<Vec<&str>>) -> Session {
  Session {
    is_logged_in: true,
    profile: Some(Profile {
      username: "triton".to_string(),
      pid: Some("A12345678".to_string()),
      classifications: Classifications { student: true },
      subscribed_topics: subscribed_topics
        .map(|topics| topics.into_iter().map(str::to_string).collect()),
    }),
  }
}

/// A dispatcher wired to in-memory collaborators.
pub struct Harness {
  pub gateway: Arc<FakeGateway>,
  pub store: Arc<InMemorySecureStore>,
  pub push: Arc<InMemoryPush>,
  pub diagnostics: Arc<MemoryDiagnostics>,
  pub alerts: Arc<MemoryAlerts>,
  pub notifier: Arc<MemoryNotifier>,
  pub dispatcher: Dispatcher,
}

impl Harness {
  pub fn new() -> Self {
    Self::with(Settings::default(), Session::default())
  }

  pub fn logged_in() -> Self {
    Self::with(Settings::default(), logged_in_session(None))
  }

  pub fn with(settings: Settings, session: Session) -> Self {
    let gateway = Arc::new(FakeGateway::new());
    let store = Arc::new(InMemorySecureStore::new());
    let push = Arc::new(InMemoryPush::new(Some("fcm-token".to_string())).with_device_id("device-1"));
    let diagnostics = Arc::new(MemoryDiagnostics::new());
    let alerts = Arc::new(MemoryAlerts::new());
    let notifier = Arc::new(MemoryNotifier::new());

    let capabilities = Capabilities::new(
      gateway.clone(),
      store.clone(),
      push.clone(),
      diagnostics.clone(),
      alerts.clone(),
    );
    let dispatcher = Dispatcher::with_session(
      capabilities,
      settings,
      Arc::new(SessionStore::with_session(session)),
      notifier.clone(),
    );

    Self {
      gateway,
      store,
      push,
      diagnostics,
      alerts,
      notifier,
      dispatcher,
    }
  }

  /// Run one trigger to completion.
  pub async fn run(&self, trigger: campus_workflow::Trigger) {
    self.dispatcher.trigger(trigger).wait().await.unwrap();
  }
}
