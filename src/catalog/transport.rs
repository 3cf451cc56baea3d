//! HTTP transport used by the catalog client.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::error::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
}

impl From<Method> for reqwest::Method {
  fn from(method: Method) -> Self {
    match method {
      Method::Get => reqwest::Method::GET,
    }
  }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
  pub method: Method,
  pub url: String,
  pub body: Option<Vec<u8>>,
}

impl HttpRequest {
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      method: Method::Get,
      url: url.into(),
      body: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Sends a request and returns the raw status and body.
///
/// Status codes are not interpreted here; timeouts belong to the
/// implementation.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn request(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new(timeout: Duration, api_key: Option<&str>) -> Result<Self, RemoteError> {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Some(key) = api_key {
      let value = key
        .parse::<reqwest::header::HeaderValue>()
        .map_err(|e| RemoteError::Transport(format!("invalid api key header: {}", e)))?;
      headers.insert("x-api-key", value);
    }

    let client = reqwest::Client::builder()
      .timeout(timeout)
      .default_headers(headers)
      .build()
      .map_err(|e| RemoteError::Transport(format!("failed to build http client: {}", e)))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn request(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError> {
    let url =
      reqwest::Url::parse(&request.url).map_err(|_| RemoteError::InvalidUrl(request.url.clone()))?;

    let mut builder = self.client.request(request.method.into(), url);
    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    debug!(method = ?request.method, url = %request.url, "sending request");

    let response = builder
      .send()
      .await
      .map_err(|e| RemoteError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let body = response
      .bytes()
      .await
      .map_err(|e| RemoteError::Transport(e.to_string()))?
      .to_vec();

    debug!(url = %request.url, status, bytes = body.len(), "received response");

    Ok(HttpResponse { status, body })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_get_request_maps_to_http_get() {
    let request = HttpRequest::get("https://api.thecatapi.com/v1/breeds");
    assert_eq!(request.method, Method::Get);
    assert!(request.body.is_none());
    assert_eq!(reqwest::Method::from(request.method), reqwest::Method::GET);
  }

  #[test]
  fn test_success_is_2xx_only() {
    let response = |status| HttpResponse {
      status,
      body: Vec::new(),
    };
    assert!(response(200).is_success());
    assert!(response(204).is_success());
    assert!(!response(199).is_success());
    assert!(!response(304).is_success());
    assert!(!response(404).is_success());
  }
}
