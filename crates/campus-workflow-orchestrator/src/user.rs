//! Authentication workflows: login, token refresh, logout.

use base64::prelude::*;
use campus_host_kv::Credentials;
use campus_host_log::Alert;
use std::sync::Arc;

use campus_workflow::{
  Capabilities, Classifications, DomainError, Execution, Notification, Profile, SessionStore,
  WorkflowError, accept,
};
use tracing::{debug, info, instrument, warn};

use crate::settings::Settings;

/// The fixed demo accounts that skip the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoAccount {
  /// `studentdemo` / `studentdemo`
  Student,
  /// `demo` / `demo`
  Guest,
}

impl DemoAccount {
  /// Match a username/password pair against the demo accounts.
  pub fn matching(username: &str, password: &str) -> Option<Self> {
    match (username, password) {
      ("studentdemo", "studentdemo") => Some(DemoAccount::Student),
      ("demo", "demo") => Some(DemoAccount::Guest),
      _ => None,
    }
  }

  pub fn profile(&self) -> Profile {
    match self {
      DemoAccount::Student => Profile {
        username: "Student Demo".to_string(),
        pid: Some("fakepid".to_string()),
        classifications: Classifications { student: true },
        subscribed_topics: None,
      },
      DemoAccount::Guest => Profile {
        username: "Demo".to_string(),
        pid: None,
        classifications: Classifications { student: false },
        subscribed_topics: None,
      },
    }
  }
}

/// `base64("{username}:{encrypted_password}")`, as the identity provider
/// expects it.
pub fn encode_credentials(username: &str, encrypted_password: &str) -> String {
  BASE64_STANDARD.encode(format!("{username}:{encrypted_password}"))
}

pub struct UserWorkflows {
  capabilities: Capabilities,
  settings: Settings,
  session: Arc<SessionStore>,
}

impl UserWorkflows {
  /// `session` is read on every refresh attempt, so a logout that lands
  /// while a refresh is in flight is observed before any token is stored.
  pub fn new(capabilities: Capabilities, settings: Settings, session: Arc<SessionStore>) -> Self {
    Self {
      capabilities,
      settings,
      session,
    }
  }

  /// `USER_LOGIN`
  #[instrument(skip_all, fields(execution_id = %execution.id(), username = %username))]
  pub async fn login(&self, execution: &Execution, username: &str, password: &str) {
    if let Some(account) = DemoAccount::matching(username, password) {
      self.activate_demo(execution, account, username, password).await;
      return;
    }

    execution.begin(Notification::LogInRequest);

    match self.authenticate(execution, username, password).await {
      Ok(profile) => {
        info!(student = profile.classifications.student, "logged in");
        self.logged_in(execution, profile);
      }
      Err(error) => {
        execution.fail(&error, |error| Notification::LogInFailure { error });
      }
    }
  }

  async fn authenticate(
    &self,
    execution: &Execution,
    username: &str,
    password: &str,
  ) -> Result<Profile, WorkflowError> {
    if password.is_empty() {
      // Let the request notification land before the failure
      tokio::task::yield_now().await;
      return Err(WorkflowError::empty_password());
    }

    let store = &self.capabilities.store;
    let encrypted = store.encrypt(password).await?;
    let encoded = encode_credentials(username, &encrypted);

    let reply = execution
      .invoke(
        "retrieve_access_token",
        self.settings.sso_deadline,
        WorkflowError::login_timed_out,
        || self.capabilities.gateway.retrieve_access_token(&encoded),
      )
      .await?;
    let reply = accept(reply).inspect_err(|error| self.check_app_update(execution, error))?;

    let access_token = reply.access_token.ok_or(DomainError::MissingAccessToken)?;
    // A newer login owns the secure store now
    if !execution.is_current() {
      return Err(DomainError::Superseded.into());
    }
    store
      .store_credentials(Credentials::new(username, encrypted))
      .await?;
    store.store_access_token(&access_token).await?;

    let student = reply.pid.is_some();
    Ok(Profile {
      username: username.to_string(),
      pid: reply.pid,
      classifications: Classifications { student },
      subscribed_topics: None,
    })
  }

  async fn activate_demo(
    &self,
    execution: &Execution,
    account: DemoAccount,
    username: &str,
    password: &str,
  ) {
    execution.begin(Notification::LogInRequest);
    execution.emit(Notification::ActivateStudentDemoAccount);
    info!(account = ?account, "activating demo account");

    tokio::time::sleep(self.settings.demo_latency).await;

    let stored = self
      .capabilities
      .store
      .store_credentials(Credentials::new(username, password))
      .await;
    if let Err(e) = stored {
      let error = WorkflowError::from(e);
      execution.fail(&error, |error| Notification::LogInFailure { error });
      return;
    }

    self.logged_in(execution, account.profile());
  }

  fn logged_in(&self, execution: &Execution, profile: Profile) {
    execution.succeed([
      Notification::LoggedIn { profile },
      Notification::LogInSuccess,
      Notification::ToggleAuthenticatedCards,
      // Clears errors left by a failed automatic re-authorization
      Notification::AuthHttpSuccess,
      Notification::UpdateSchedule,
    ]);
  }

  /// `USER_TOKEN_REFRESH`
  ///
  /// A credential rejection is retried once after the configured backoff. A
  /// second rejection forces a logout and purges local state. Every other
  /// failure is logged and otherwise ignored.
  #[instrument(skip_all, fields(execution_id = %execution.id()))]
  pub async fn refresh(&self, execution: &Execution) {
    execution.start();

    let first = match self.refresh_token(execution).await {
      Ok(()) => return execution.complete(),
      Err(error) => error,
    };

    if !first.is_credential_rejection() {
      return self.swallow(execution, &first);
    }

    info!(
      backoff_ms = self.settings.sso_retry_backoff.as_millis() as u64,
      "credentials rejected, retrying refresh"
    );
    tokio::time::sleep(self.settings.sso_retry_backoff).await;

    match self.refresh_token(execution).await {
      Ok(()) => execution.complete(),
      Err(second) if second.is_credential_rejection() && !execution.is_current() => {
        debug!("credentials rejected twice by a superseded refresh, leaving user data");
        execution.settle_failed(&second);
      }
      Err(second) if second.is_credential_rejection() => {
        warn!("credentials rejected twice, forcing logout");
        execution.emit(Notification::PanicLogOut);
        execution.track(&second);
        self.clear_user_data(execution).await;
        execution.settle_failed(&second);
      }
      Err(second) => self.swallow(execution, &second),
    }
  }

  async fn refresh_token(&self, execution: &Execution) -> Result<(), WorkflowError> {
    self.require_session()?;

    let store = &self.capabilities.store;
    let credentials = store.credentials().await?;
    let encoded = encode_credentials(&credentials.username, &credentials.encrypted_password);

    let reply = execution
      .invoke(
        "retrieve_access_token",
        self.settings.sso_deadline,
        WorkflowError::login_timed_out,
        || self.capabilities.gateway.retrieve_access_token(&encoded),
      )
      .await?;
    let reply = accept(reply).inspect_err(|error| self.check_app_update(execution, error))?;

    let access_token = reply.access_token.ok_or(DomainError::MissingAccessToken)?;

    // The session may have ended while the call was in flight
    self.require_session()?;
    if !execution.is_current() {
      return Err(DomainError::Superseded.into());
    }
    store.store_access_token(&access_token).await?;
    execution.emit(Notification::AuthHttpSuccess);
    Ok(())
  }

  fn require_session(&self) -> Result<(), WorkflowError> {
    if self.session.snapshot().is_logged_in {
      Ok(())
    } else {
      Err(DomainError::NotSignedIn.into())
    }
  }

  fn swallow(&self, execution: &Execution, error: &WorkflowError) {
    warn!(error = %error, "token refresh failed");
    execution.settle_failed(error);
  }

  /// `USER_LOGOUT`
  #[instrument(skip_all, fields(execution_id = %execution.id()))]
  pub async fn logout(&self, execution: &Execution) {
    execution.start();
    execution.emit(Notification::LoggedOut);
    self.clear_user_data(execution).await;
    execution.complete();
  }

  /// `USER_LOGIN_TIMEOUT`
  pub async fn login_timed_out(&self, execution: &Execution) {
    let error = WorkflowError::login_timed_out(self.settings.sso_deadline);
    execution.emit(Notification::LogInFailure {
      error: error.report(),
    });
    execution.settle_failed(&error);
  }

  async fn clear_user_data(&self, execution: &Execution) {
    execution.emit(Notification::ToggleAuthenticatedCards);

    let store = &self.capabilities.store;
    if let Err(e) = store.destroy_credentials().await {
      warn!(error = %e, "failed to destroy credentials");
      execution.track(&WorkflowError::from(e));
    }
    if let Err(e) = store.destroy_access_token().await {
      warn!(error = %e, "failed to destroy access token");
      execution.track(&WorkflowError::from(e));
    }

    execution.emit(Notification::ClearScheduleData);
    debug!("user data cleared");
  }

  fn check_app_update(&self, execution: &Execution, error: &WorkflowError) {
    if matches!(error, WorkflowError::Domain(DomainError::AppUpdateRequired)) {
      execution.emit(Notification::AppUpdateRequired);
      self.capabilities.alerts.present(Alert::app_update_required());
    }
  }
}
