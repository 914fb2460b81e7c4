use thiserror::Error;

/// Errors raised while performing a remote call.
#[derive(Debug, Error)]
pub enum GatewayError {
  /// The request could not be sent or the response could not be read.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// A configured endpoint is not a valid URL.
  #[error("invalid endpoint url: {0}")]
  InvalidUrl(#[from] url::ParseError),

  /// The service answered with a non-success status and no usable body.
  #[error("unexpected status {status}: {message}")]
  Status { status: u16, message: String },

  /// The response body did not match the expected shape.
  #[error("invalid response body: {message}")]
  Decode { message: String },

  /// An authenticated call was attempted without a stored access token.
  #[error("no access token available")]
  MissingAccessToken,

  /// The service rejected the call with an application-level message.
  #[error("{message}")]
  Rejected { message: String },

  /// The secure store could not be read.
  #[error("secure store error: {0}")]
  Store(#[from] campus_host_kv::StoreError),
}

impl GatewayError {
  pub fn rejected(message: impl Into<String>) -> Self {
    Self::Rejected {
      message: message.into(),
    }
  }
}
