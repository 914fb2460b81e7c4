//! Timeout-guarded invocation.
//!
//! A remote call is raced against a deadline timer. Whichever settles first
//! decides the outcome:
//!
//! - the call returns `Ok(value)` first → `Ok(Guarded::Completed(value))`
//! - the call returns `Err(e)` first → `Err(e)`, the timer is dropped
//! - the deadline elapses first → `Ok(Guarded::TimedOut)`, the call is
//!   dropped and whatever it would have produced is never observed
//!
//! When the call and the deadline settle at the same instant the deadline
//! wins, so a call that takes exactly as long as its deadline has timed out.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

/// Outcome of a guarded invocation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Guarded<T> {
  /// The call settled before the deadline.
  Completed(T),
  /// The deadline elapsed first.
  TimedOut,
}

impl<T> Guarded<T> {
  pub fn is_timed_out(&self) -> bool {
    matches!(self, Guarded::TimedOut)
  }

  /// The value, if the call completed.
  pub fn completed(self) -> Option<T> {
    match self {
      Guarded::Completed(value) => Some(value),
      Guarded::TimedOut => None,
    }
  }

  /// Convert a timeout into an error.
  pub fn or_timeout<E>(self, on_timeout: impl FnOnce() -> E) -> Result<T, E> {
    match self {
      Guarded::Completed(value) => Ok(value),
      Guarded::TimedOut => Err(on_timeout()),
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Guarded<U> {
    match self {
      Guarded::Completed(value) => Guarded::Completed(f(value)),
      Guarded::TimedOut => Guarded::TimedOut,
    }
  }
}

/// Race `operation` against `deadline`.
pub async fn guarded<T, E, F>(deadline: Duration, operation: F) -> Result<Guarded<T>, E>
where
  F: Future<Output = Result<T, E>>,
{
  let timer = tokio::time::sleep(deadline);
  tokio::pin!(timer);
  tokio::pin!(operation);

  tokio::select! {
    // Timer first: a tie goes to the deadline
    biased;
    _ = &mut timer => Ok(Guarded::TimedOut),
    result = &mut operation => result.map(Guarded::Completed),
  }
}

/// Start `call` and race it against `deadline`, logging the outcome.
///
/// `operation` names the remote operation in log events.
pub async fn invoke<T, E, F, Fut>(
  operation: &'static str,
  deadline: Duration,
  call: F,
) -> Result<Guarded<T>, E>
where
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: Display,
{
  let started = Instant::now();
  debug!(
    operation,
    deadline_ms = deadline.as_millis() as u64,
    "invocation_started"
  );

  let outcome = guarded(deadline, call()).await;
  let elapsed_ms = started.elapsed().as_millis() as u64;

  match &outcome {
    Ok(Guarded::Completed(_)) => {
      debug!(operation, elapsed_ms, "invocation_completed");
    }
    Ok(Guarded::TimedOut) => {
      warn!(operation, elapsed_ms, "invocation_timed_out");
    }
    Err(e) => {
      warn!(operation, elapsed_ms, error = %e, "invocation_failed");
    }
  }

  outcome
}
