//! Campus Workflow Orchestrator
//!
//! The user and messaging workflows, and the [`Dispatcher`] that routes
//! triggers to them.
//!
//! | Trigger                  | Workflow                               |
//! |--------------------------|----------------------------------------|
//! | `USER_LOGIN`             | [`UserWorkflows::login`]               |
//! | `USER_LOGOUT`            | [`UserWorkflows::logout`]              |
//! | `USER_LOGIN_TIMEOUT`     | [`UserWorkflows::login_timed_out`]     |
//! | `USER_TOKEN_REFRESH`     | [`UserWorkflows::refresh`]             |
//! | `GET_TOPICS`             | [`MessagesWorkflows::get_topics`]      |
//! | `REGISTER_TOKEN`         | [`MessagesWorkflows::register_token`]  |
//! | `UNREGISTER_TOKEN`       | [`MessagesWorkflows::unregister_token`]|
//! | `UPDATE_MESSAGES`        | [`MessagesWorkflows::fetch_messages`]  |
//! | `LOAD_MORE_MESSAGES`     | [`MessagesWorkflows::fetch_messages`]  |
//! | `SUBSCRIBE_TO_TOPIC`     | [`MessagesWorkflows::subscribe`]       |
//! | `UNSUBSCRIBE_FROM_TOPIC` | [`MessagesWorkflows::unsubscribe`]     |

mod dispatcher;
mod messages;
mod settings;
mod user;

pub use dispatcher::{DispatchError, Dispatcher};
pub use messages::{MessagesWorkflows, PageMode, with_subscription, without_subscription};
pub use settings::Settings;
pub use user::{DemoAccount, UserWorkflows, encode_credentials};
