//! Campus Workflow
//!
//! The core every campus workflow is built from.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Supervisor                           │
//! │  - one slot per TriggerKind, keeps only the latest run      │
//! │  - hands each run an Emitter scoped to its generation       │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Execution                            │
//! │  - Idle → Requesting → Succeeded | Failed | TimedOut        │
//! │  - emits notifications, records failures with diagnostics  │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     guard::invoke                           │
//! │  - races a gateway call against its deadline                │
//! │  - Completed(value) | TimedOut, errors propagate at once    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications leave through a [`Notifier`]. Wrapping one in a
//! [`ReducingNotifier`] keeps a [`SessionStore`] in step with what was
//! emitted, so the next execution reads an up-to-date snapshot.

mod capabilities;
mod error;
mod events;
mod execution;
pub mod guard;
mod notify;
mod session;
mod supervisor;

pub use capabilities::Capabilities;
pub use error::{DomainError, ErrorKind, FailureReport, INVALID_CREDENTIALS_MESSAGE, WorkflowError};
pub use events::{Classifications, Notification, Profile, ProfilePatch, Trigger, TriggerKind};
pub use execution::{Execution, RequestState, accept};
pub use guard::Guarded;
pub use notify::{ChannelNotifier, MemoryNotifier, NoopNotifier, Notifier};
pub use session::{ReducingNotifier, Session, SessionStore};
pub use supervisor::{Emitter, ExecutionHandle, Supervisor};
