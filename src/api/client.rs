use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::ApiError;
use super::params::QueryParams;
use super::types::HealthStatus;
use crate::config::ApiConfig;

/// Asset management REST API client.
///
/// Turns a logical request into an HTTP call against
/// `{base_url}/api/{version}` and the response into a typed value or an
/// [`ApiError`]. It never retries; callers wrap it in a
/// [`RetryPolicy`](crate::retry::RetryPolicy).
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  api_url: String,
  token: Option<String>,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;

    let mut builder = reqwest::Client::builder().user_agent(concat!(
      env!("CARGO_PKG_NAME"),
      "/",
      env!("CARGO_PKG_VERSION")
    ));
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let api_url = format!(
      "{}/api/{}",
      base_url.as_str().trim_end_matches('/'),
      config.version
    );

    Ok(Self {
      http,
      base_url,
      api_url,
      token: config.token.clone(),
    })
  }

  /// The versioned API root, e.g. `http://localhost:8787/api/v1`.
  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  fn endpoint(&self, path: &str, params: Option<&QueryParams>) -> Result<Url, ApiError> {
    let mut url = Url::parse(&format!("{}{}", self.api_url, path))
      .map_err(|e| ApiError::network(format!("invalid URL for {}: {}", path, e)))?;

    if let Some(params) = params.filter(|p| !p.is_empty()) {
      let mut pairs = url.query_pairs_mut();
      for (key, value) in params.pairs() {
        pairs.append_pair(key, &value);
      }
    }

    Ok(url)
  }

  /// Perform a request and decode the body as `T`.
  pub async fn request<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    params: Option<&QueryParams>,
    body: Option<&Value>,
  ) -> Result<T, ApiError> {
    let url = self.endpoint(path, params)?;
    let value = self.send(method, url, body).await?;
    serde_json::from_value(value).map_err(ApiError::invalid_response)
  }

  async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value, ApiError> {
    debug!(%method, %url, "api request");

    let mut request = self
      .http
      .request(method.clone(), url.clone())
      .header(reqwest::header::CONTENT_TYPE, "application/json");
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request.send().await.map_err(|e| {
      warn!(%method, %url, error = %e, "api request could not complete");
      ApiError::network(e)
    })?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(ApiError::network)?;
    debug!(%method, %url, status = status.as_u16(), len = bytes.len(), "api response");

    if !status.is_success() {
      return Err(ApiError::from_response(
        status.as_u16(),
        status.canonical_reason(),
        &bytes,
      ));
    }

    decode_body(status, &bytes)
  }

  pub async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    params: Option<&QueryParams>,
  ) -> Result<T, ApiError> {
    self.request(Method::GET, path, params, None).await
  }

  pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let body = to_body(body)?;
    self.request(Method::POST, path, None, Some(&body)).await
  }

  pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let body = to_body(body)?;
    self.request(Method::PUT, path, None, Some(&body)).await
  }

  pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let body = to_body(body)?;
    self.request(Method::PATCH, path, None, Some(&body)).await
  }

  /// DELETE; the (usually empty) body is discarded.
  pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
    self
      .request::<Value>(Method::DELETE, path, None, None)
      .await
      .map(|_| ())
  }

  /// Liveness probe at `{base_url}/health`, outside the versioned prefix.
  pub async fn health(&self) -> Result<HealthStatus, ApiError> {
    let url = Url::parse(&format!(
      "{}/health",
      self.base_url.as_str().trim_end_matches('/')
    ))
    .map_err(|e| ApiError::network(format!("invalid health URL: {}", e)))?;
    let value = self.send(Method::GET, url, None).await?;
    serde_json::from_value(value).map_err(ApiError::invalid_response)
  }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
  // Nothing was sent; report it as a local rejection.
  serde_json::to_value(body).map_err(|e| ApiError::validation(format!("unserializable body: {}", e)))
}

/// 204 and empty bodies decode as `{}`.
fn decode_body(status: StatusCode, bytes: &[u8]) -> Result<Value, ApiError> {
  if status == StatusCode::NO_CONTENT || bytes.iter().all(u8::is_ascii_whitespace) {
    return Ok(Value::Object(Default::default()));
  }
  serde_json::from_slice(bytes).map_err(ApiError::invalid_response)
}
