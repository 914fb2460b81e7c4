use std::error::Error;
use std::sync::Mutex;

use serde::Serialize;
use tracing::error;

/// Sink for exceptions a workflow caught but wants recorded.
pub trait Diagnostics: Send + Sync {
  /// Record an exception. `fatal` is forwarded to the collector as-is; the
  /// workflows only ever report non-fatal exceptions.
  fn track_exception(&self, error: &(dyn Error + 'static), fatal: bool);
}

/// Diagnostics collector that emits a `tracing` error event per exception.
#[derive(Debug, Clone, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
  fn track_exception(&self, err: &(dyn Error + 'static), fatal: bool) {
    let chain = source_chain(err);
    error!(error = %err, sources = ?chain, fatal, "exception tracked");
  }
}

/// An exception as recorded by [`MemoryDiagnostics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedException {
  pub message: String,
  pub fatal: bool,
}

/// Diagnostics collector that keeps every exception in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
  tracked: Mutex<Vec<TrackedException>>,
}

impl MemoryDiagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Exceptions recorded so far, oldest first.
  pub fn tracked(&self) -> Vec<TrackedException> {
    self
      .tracked
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }
}

impl Diagnostics for MemoryDiagnostics {
  fn track_exception(&self, err: &(dyn Error + 'static), fatal: bool) {
    self
      .tracked
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .push(TrackedException {
        message: err.to_string(),
        fatal,
      });
  }
}

fn source_chain(err: &(dyn Error + 'static)) -> Vec<String> {
  let mut chain = Vec::new();
  let mut current = err.source();
  while let Some(source) = current {
    chain.push(source.to_string());
    current = source.source();
  }
  chain
}
