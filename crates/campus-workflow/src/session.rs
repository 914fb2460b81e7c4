//! Session state.
//!
//! The host application owns the canonical user state. Workflows never read
//! it directly; each execution gets a [`Session`] snapshot taken when it
//! starts. [`SessionStore`] keeps a local copy up to date by reducing the
//! notifications the workflows emit.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{Notification, Profile};
use crate::notify::Notifier;

/// A snapshot of the user's session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub is_logged_in: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub profile: Option<Profile>,
}

impl Session {
  /// The current topic subscriptions; empty when the profile has none.
  pub fn subscribed_topics(&self) -> Vec<String> {
    self
      .profile
      .as_ref()
      .and_then(|profile| profile.subscribed_topics.clone())
      .unwrap_or_default()
  }
}

/// Local session state, updated from emitted notifications.
#[derive(Debug, Default)]
pub struct SessionStore {
  session: RwLock<Session>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start from an existing session, e.g. one restored by the host.
  pub fn with_session(session: Session) -> Self {
    Self {
      session: RwLock::new(session),
    }
  }

  pub fn snapshot(&self) -> Session {
    self
      .session
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }

  /// Apply a notification. Returns whether the session changed.
  pub fn apply(&self, notification: &Notification) -> bool {
    let mut session = self
      .session
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    let before = session.clone();

    match notification {
      Notification::LoggedIn { profile } => {
        session.is_logged_in = true;
        session.profile = Some(profile.clone());
      }
      Notification::LoggedOut | Notification::PanicLogOut => {
        *session = Session::default();
      }
      Notification::ModifyLocalProfile { profile_items } => {
        profile_items.apply(session.profile.get_or_insert_with(Profile::default));
      }
      _ => return false,
    }

    let changed = *session != before;
    if changed {
      debug!(
        notification = notification.name(),
        is_logged_in = session.is_logged_in,
        "session updated"
      );
    }
    changed
  }
}

/// A notifier that applies each notification to a [`SessionStore`] before
/// forwarding it.
pub struct ReducingNotifier<N: Notifier> {
  store: Arc<SessionStore>,
  inner: N,
}

impl<N: Notifier> ReducingNotifier<N> {
  pub fn new(store: Arc<SessionStore>, inner: N) -> Self {
    Self { store, inner }
  }

  pub fn store(&self) -> &Arc<SessionStore> {
    &self.store
  }
}

impl<N: Notifier> Notifier for ReducingNotifier<N> {
  fn notify(&self, notification: Notification) {
    self.store.apply(&notification);
    self.inner.notify(notification);
  }
}
