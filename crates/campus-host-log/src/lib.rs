//! Campus Host Log
//!
//! Two host capabilities that report outward from a workflow:
//!
//! - [`Diagnostics`] records exceptions with the crash/diagnostics collector.
//! - [`AlertPresenter`] shows a blocking alert to the user.
//!
//! Both have a `tracing`-backed implementation for headless hosts and an
//! in-memory implementation that keeps what it was given.

mod alert;
mod diagnostics;

pub use alert::{Alert, AlertButton, AlertPresenter, ButtonStyle, MemoryAlerts, TracingAlerts};
pub use diagnostics::{Diagnostics, MemoryDiagnostics, TrackedException, TracingDiagnostics};
