//! `reqwest`-backed gateway.

use std::sync::Arc;

use async_trait::async_trait;
use campus_config::Endpoints;
use campus_host_kv::SecureStore;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::types::{AccessTokenResponse, Ack, MessagePage, RemoteError, Topic};

/// Error envelope returned by the messaging backend on failure statuses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: RemoteError,
}

/// Gateway that talks to the identity provider and messaging backend over HTTP.
///
/// Authenticated messaging calls read the bearer token from the secure store
/// at call time, so a refreshed token is picked up without rebuilding the
/// gateway.
pub struct HttpGateway {
  client: Client,
  sso_url: Url,
  messaging_url: Url,
  store: Arc<dyn SecureStore>,
}

impl HttpGateway {
  /// Create a gateway for the given endpoints.
  pub fn new(endpoints: &Endpoints, store: Arc<dyn SecureStore>) -> Result<Self, GatewayError> {
    Self::with_client(Client::new(), endpoints, store)
  }

  /// Create a gateway that reuses an existing `reqwest` client.
  pub fn with_client(
    client: Client,
    endpoints: &Endpoints,
    store: Arc<dyn SecureStore>,
  ) -> Result<Self, GatewayError> {
    let sso_url = Url::parse(&endpoints.sso_url)?;

    // `Url::join` replaces the last path segment unless the base ends in '/'
    let mut messaging = endpoints.messaging_url.clone();
    if !messaging.ends_with('/') {
      messaging.push('/');
    }
    let messaging_url = Url::parse(&messaging)?;

    Ok(Self {
      client,
      sso_url,
      messaging_url,
      store,
    })
  }

  fn messaging(&self, path: &str) -> Result<Url, GatewayError> {
    Ok(self.messaging_url.join(path)?)
  }

  async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, GatewayError> {
    let token = self
      .store
      .access_token()
      .await?
      .ok_or(GatewayError::MissingAccessToken)?;
    Ok(request.bearer_auth(token))
  }
}

#[async_trait]
impl Gateway for HttpGateway {
  #[instrument(name = "gateway_fetch_topics", skip(self))]
  async fn fetch_topics(&self) -> Result<Vec<Topic>, GatewayError> {
    let url = self.messaging("topics")?;
    let response = self.client.get(url).send().await?;
    decode(response).await
  }

  #[instrument(name = "gateway_post_push_token", skip(self, token))]
  async fn post_push_token(&self, token: &str, device_id: &str) -> Result<Ack, GatewayError> {
    let url = self.messaging("registration")?;
    let request = self.client.post(url).json(&serde_json::json!({
      "token": token,
      "deviceId": device_id,
    }));
    let response = self.authorized(request).await?.send().await?;
    decode_ack(response).await
  }

  #[instrument(name = "gateway_delete_push_token", skip_all)]
  async fn delete_push_token(
    &self,
    token: &str,
    access_token: &str,
  ) -> Result<Ack, GatewayError> {
    let url = self.messaging("registration")?;
    let response = self
      .client
      .delete(url)
      .bearer_auth(access_token)
      .json(&serde_json::json!({ "token": token }))
      .send()
      .await?;
    decode_ack(response).await
  }

  #[instrument(name = "gateway_fetch_my_messages", skip(self))]
  async fn fetch_my_messages(&self, timestamp: Option<i64>) -> Result<MessagePage, GatewayError> {
    let mut url = self.messaging("messages")?;
    if let Some(timestamp) = timestamp {
      url
        .query_pairs_mut()
        .append_pair("start", &timestamp.to_string());
    }
    let request = self.client.get(url);
    let response = self.authorized(request).await?.send().await?;
    decode(response).await
  }

  #[instrument(name = "gateway_retrieve_access_token", skip_all)]
  async fn retrieve_access_token(
    &self,
    encoded_credentials: &str,
  ) -> Result<AccessTokenResponse, GatewayError> {
    let response = self
      .client
      .post(self.sso_url.clone())
      .header(
        reqwest::header::AUTHORIZATION,
        format!("Basic {}", encoded_credentials),
      )
      .send()
      .await?;

    // The identity provider reports rejected credentials and outdated apps
    // in the body of a failure status, so parse the body before the status.
    let status = response.status();
    let body = response.text().await?;
    let parsed = serde_json::from_str::<AccessTokenResponse>(&body);

    if status.is_success() {
      return parsed.map_err(|e| GatewayError::Decode {
        message: e.to_string(),
      });
    }

    match parsed {
      Ok(parsed) if parsed.error.is_some() => Ok(parsed),
      _ => Err(failure(status.as_u16(), body)),
    }
  }
}

/// Decode a JSON body, turning failure statuses into errors.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
  let status = response.status();
  let body = response.text().await?;
  debug!(status = status.as_u16(), bytes = body.len(), "response received");

  if !status.is_success() {
    return Err(failure(status.as_u16(), body));
  }

  serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
    message: e.to_string(),
  })
}

/// Decode an acknowledgement. An empty success body is a plain ack.
async fn decode_ack(response: Response) -> Result<Ack, GatewayError> {
  let status = response.status();
  let body = response.text().await?;

  if !status.is_success() {
    return Err(failure(status.as_u16(), body));
  }

  if body.trim().is_empty() {
    return Ok(Ack::default());
  }

  serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
    message: e.to_string(),
  })
}

fn failure(status: u16, body: String) -> GatewayError {
  match serde_json::from_str::<ErrorEnvelope>(&body) {
    Ok(envelope) if !envelope.error.message.is_empty() => {
      GatewayError::rejected(envelope.error.message)
    }
    _ => GatewayError::Status {
      status,
      message: body,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use campus_host_kv::InMemorySecureStore;

  fn endpoints(messaging_url: &str) -> Endpoints {
    Endpoints {
      sso_url: "https://sso.example.edu/token".to_string(),
      messaging_url: messaging_url.to_string(),
    }
  }

  #[test]
  fn test_messaging_paths_join_under_base() {
    let store = Arc::new(InMemorySecureStore::new());
    let gateway = HttpGateway::new(&endpoints("https://api.example.edu/messaging"), store).unwrap();

    assert_eq!(
      gateway.messaging("topics").unwrap().as_str(),
      "https://api.example.edu/messaging/topics"
    );
  }

  #[test]
  fn test_invalid_endpoint_rejected() {
    let store = Arc::new(InMemorySecureStore::new());
    let result = HttpGateway::new(&endpoints("not a url"), store);
    assert!(matches!(result, Err(GatewayError::InvalidUrl(_))));
  }

  #[test]
  fn test_failure_uses_error_envelope_message() {
    let err = failure(
      401,
      r#"{"error":{"message":"There was a problem with your credentials."}}"#.to_string(),
    );
    assert!(matches!(err, GatewayError::Rejected { .. }));
    assert_eq!(err.to_string(), "There was a problem with your credentials.");
  }

  #[test]
  fn test_failure_falls_back_to_status() {
    let err = failure(502, "bad gateway".to_string());
    assert!(matches!(err, GatewayError::Status { status: 502, .. }));
  }

  #[tokio::test]
  async fn test_authenticated_call_requires_token() {
    let store = Arc::new(InMemorySecureStore::new());
    let gateway =
      HttpGateway::new(&endpoints("https://api.example.edu/messaging/"), store).unwrap();

    let request = gateway.client.get("https://api.example.edu/");
    let result = gateway.authorized(request).await;
    assert!(matches!(result, Err(GatewayError::MissingAccessToken)));
  }
}
