//! Campus Config
//!
//! This crate contains the serializable configuration types for campus.
//! Every constant the workflows consume (request deadlines, the identity
//! provider retry backoff, demo latency, remote endpoints) lives here so
//! hosts can supply their own values.
//!
//! Configuration can be loaded from:
//! - JSON files (via CLI with `--config=config.json`)
//! - Code, via `CampusConfig::default()` and struct update syntax
//!
//! Durations are expressed in milliseconds on the wire and exposed as
//! [`std::time::Duration`] through accessor methods.

mod config;
mod deadlines;
mod endpoints;

pub use config::{CampusConfig, DemoSettings, TopicSettings};
pub use deadlines::Deadlines;
pub use endpoints::Endpoints;
