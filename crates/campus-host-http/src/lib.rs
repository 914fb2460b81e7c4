//! Campus Host HTTP
//!
//! The remote call gateway. [`Gateway`] names every remote operation the
//! workflows consume; [`HttpGateway`] implements it against the identity
//! provider and messaging backend with `reqwest`.
//!
//! Responses that arrive over a healthy transport but carry an application
//! error expose it through [`Reply::remote_error`], so callers can apply one
//! success predicate to every operation.

mod error;
mod gateway;
mod http;
mod types;

pub use error::GatewayError;
pub use gateway::Gateway;
pub use http::HttpGateway;
pub use types::{AccessTokenResponse, Ack, Message, MessagePage, RemoteError, Reply, Topic};
