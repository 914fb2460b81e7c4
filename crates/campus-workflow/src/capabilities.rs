use std::sync::Arc;

use campus_host_http::Gateway;
use campus_host_kv::SecureStore;
use campus_host_log::{AlertPresenter, Diagnostics};
use campus_host_push::PushMessaging;

/// The external collaborators a workflow may call.
#[derive(Clone)]
pub struct Capabilities {
  pub gateway: Arc<dyn Gateway>,
  pub store: Arc<dyn SecureStore>,
  pub push: Arc<dyn PushMessaging>,
  pub diagnostics: Arc<dyn Diagnostics>,
  pub alerts: Arc<dyn AlertPresenter>,
}

impl Capabilities {
  pub fn new(
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn SecureStore>,
    push: Arc<dyn PushMessaging>,
    diagnostics: Arc<dyn Diagnostics>,
    alerts: Arc<dyn AlertPresenter>,
  ) -> Self {
    Self {
      gateway,
      store,
      push,
      diagnostics,
      alerts,
    }
  }
}
