//! Workflow error types.

use std::time::Duration;

use campus_host_http::GatewayError;
use campus_host_kv::StoreError;
use campus_host_push::PushError;
use serde::{Deserialize, Serialize};

/// Message the identity provider uses when it rejects stored credentials.
///
/// Token refresh retries exactly this error, matched by message rather than
/// by category.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "There was a problem with your credentials.";

/// An application error reported by a remote service over a healthy
/// transport, or an expected precondition that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
  /// The identity provider no longer accepts this app version.
  #[error("App update required.")]
  AppUpdateRequired,

  /// The service rejected the request.
  #[error("{message}")]
  Rejected { message: String },

  /// A workflow that needs a session ran without one.
  #[error("Not signed in.")]
  NotSignedIn,

  /// The identity provider answered without a token or an error.
  #[error("No access token returned.")]
  MissingAccessToken,

  /// A newer execution of the same workflow took over before this one
  /// could commit its result.
  #[error("Superseded by a newer request.")]
  Superseded,
}

/// Errors that end a workflow execution.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
  /// The deadline elapsed before the remote call settled.
  #[error("{message}")]
  Timeout {
    name: Option<&'static str>,
    message: &'static str,
    deadline: Duration,
  },

  /// The call succeeded at the transport level but carried an application error.
  #[error(transparent)]
  Domain(#[from] DomainError),

  /// Input was rejected before any remote call was made.
  #[error("{message}")]
  Validation {
    name: &'static str,
    message: &'static str,
  },

  /// The remote call itself failed.
  #[error(transparent)]
  Transport(#[from] GatewayError),

  /// The secure store failed.
  #[error("secure store failed: {0}")]
  Store(#[from] StoreError),

  /// The push SDK failed.
  #[error("push sdk failed: {0}")]
  Push(#[from] PushError),
}

/// Coarse classification carried in failure notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Timeout,
  Domain,
  Validation,
  Transport,
}

impl WorkflowError {
  /// Generic messaging timeout.
  pub fn request_timed_out(deadline: Duration) -> Self {
    Self::Timeout {
      name: None,
      message: "Request timed out.",
      deadline,
    }
  }

  /// Identity provider timeout.
  pub fn login_timed_out(deadline: Duration) -> Self {
    Self::Timeout {
      name: Some("ssoTimeout"),
      message: "Logging in timed out.",
      deadline,
    }
  }

  pub fn empty_password() -> Self {
    Self::Validation {
      name: "emptyPasswordError",
      message: "Please type in your password.",
    }
  }

  /// Convert an application error carried in a reply.
  pub fn rejected(message: impl Into<String>) -> Self {
    Self::Domain(DomainError::Rejected {
      message: message.into(),
    })
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      WorkflowError::Timeout { .. } => ErrorKind::Timeout,
      WorkflowError::Domain(_) => ErrorKind::Domain,
      WorkflowError::Validation { .. } => ErrorKind::Validation,
      WorkflowError::Transport(GatewayError::Rejected { .. }) => ErrorKind::Domain,
      WorkflowError::Transport(_) | WorkflowError::Store(_) | WorkflowError::Push(_) => {
        ErrorKind::Transport
      }
    }
  }

  /// The short machine name, where one exists.
  pub fn name(&self) -> Option<&'static str> {
    match self {
      WorkflowError::Timeout { name, .. } => *name,
      WorkflowError::Validation { name, .. } => Some(*name),
      WorkflowError::Domain(DomainError::AppUpdateRequired) => Some("appUpdateRequired"),
      _ => None,
    }
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, WorkflowError::Timeout { .. })
  }

  /// Whether the identity provider rejected the stored credentials.
  ///
  /// The rejection may arrive in a decoded reply or as a failed call; both
  /// are matched on the exact message.
  pub fn is_credential_rejection(&self) -> bool {
    match self {
      WorkflowError::Domain(DomainError::Rejected { message })
      | WorkflowError::Transport(GatewayError::Rejected { message }) => {
        message == INVALID_CREDENTIALS_MESSAGE
      }
      _ => false,
    }
  }

  pub fn report(&self) -> FailureReport {
    FailureReport::from(self)
  }
}

/// Serializable description of a failure, carried in failure notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
  pub kind: ErrorKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  pub message: String,
}

impl From<&WorkflowError> for FailureReport {
  fn from(error: &WorkflowError) -> Self {
    Self {
      kind: error.kind(),
      name: error.name().map(str::to_string),
      message: error.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_credential_rejection_matches_exact_message() {
    assert!(WorkflowError::rejected(INVALID_CREDENTIALS_MESSAGE).is_credential_rejection());
    assert!(
      WorkflowError::Transport(GatewayError::rejected(INVALID_CREDENTIALS_MESSAGE))
        .is_credential_rejection()
    );

    assert!(!WorkflowError::rejected("Account locked.").is_credential_rejection());
    assert!(!WorkflowError::Domain(DomainError::NotSignedIn).is_credential_rejection());
    assert!(!WorkflowError::request_timed_out(Duration::from_secs(1)).is_credential_rejection());
  }

  #[test]
  fn test_report_for_timeout() {
    let report = WorkflowError::login_timed_out(Duration::from_secs(15)).report();
    assert_eq!(report.kind, ErrorKind::Timeout);
    assert_eq!(report.name.as_deref(), Some("ssoTimeout"));
    assert_eq!(report.message, "Logging in timed out.");
  }

  #[test]
  fn test_report_for_validation() {
    let report = WorkflowError::empty_password().report();
    assert_eq!(report.kind, ErrorKind::Validation);
    assert_eq!(report.name.as_deref(), Some("emptyPasswordError"));
    assert_eq!(report.message, "Please type in your password.");
  }

  #[test]
  fn test_kind_of_collaborator_failures() {
    let store = WorkflowError::Store(StoreError::MissingCredentials);
    assert_eq!(store.kind(), ErrorKind::Transport);

    let push = WorkflowError::Push(PushError::TokenUnavailable);
    assert_eq!(push.kind(), ErrorKind::Transport);

    let app_update = WorkflowError::Domain(DomainError::AppUpdateRequired);
    assert_eq!(app_update.kind(), ErrorKind::Domain);
    assert_eq!(app_update.to_string(), "App update required.");
  }
}
