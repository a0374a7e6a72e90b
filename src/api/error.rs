//! Typed errors produced by the API client.

use serde::{Deserialize, Serialize};

/// Code reported when the request never produced an HTTP response.
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
/// Code used when a non-2xx response carries no machine-readable code.
pub const HTTP_ERROR: &str = "HTTP_ERROR";
/// Code reported when a 2xx body cannot be decoded into the expected type.
pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
/// Code for writes rejected locally before anything is sent.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";

/// Optional detail attached to an error body: either one string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetails {
  One(String),
  Many(Vec<String>),
}

impl ErrorDetails {
  /// Flatten into a list regardless of shape.
  pub fn to_vec(&self) -> Vec<String> {
    match self {
      ErrorDetails::One(s) => vec![s.clone()],
      ErrorDetails::Many(v) => v.clone(),
    }
  }
}

/// Error returned by every API call.
///
/// `status` is the HTTP status code, or `0` when the request could not
/// complete at all. The type is `Clone` so one failure can be handed to every
/// caller sharing a coalesced fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (status {status}, code {code})")]
pub struct ApiError {
  pub status: u16,
  pub code: String,
  pub message: String,
  pub details: Option<ErrorDetails>,
}

impl ApiError {
  pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      status,
      code: code.into(),
      message: message.into(),
      details: None,
    }
  }

  pub fn with_details(mut self, details: ErrorDetails) -> Self {
    self.details = Some(details);
    self
  }

  /// Transport failure: no response was received.
  pub fn network(cause: impl std::fmt::Display) -> Self {
    Self::new(0, NETWORK_ERROR, format!("Network error: {}", cause))
  }

  /// A successful response whose body could not be decoded.
  pub fn invalid_response(cause: impl std::fmt::Display) -> Self {
    Self::new(0, INVALID_RESPONSE, format!("Invalid response body: {}", cause))
  }

  /// A write refused locally before dispatch. Classified as a 400 so retry
  /// policy treats it like the server-side rejection it stands in for.
  pub fn validation(message: impl Into<String>) -> Self {
    Self::new(400, VALIDATION_ERROR, message)
  }

  pub fn is_client_error(&self) -> bool {
    (400..500).contains(&self.status)
  }

  pub fn is_server_error(&self) -> bool {
    (500..600).contains(&self.status)
  }

  pub fn is_network(&self) -> bool {
    self.status == 0
  }

  pub fn is_not_found(&self) -> bool {
    self.status == 404
  }
}

/// Wire shape of an error response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
  pub error: ErrorBodyInner,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBodyInner {
  pub code: Option<String>,
  pub message: Option<String>,
  pub details: Option<ErrorDetails>,
}

impl ApiError {
  /// Build an error from a non-2xx response. Missing or unparseable bodies
  /// fall back to a generic `HTTP_ERROR`.
  pub(crate) fn from_response(status: u16, reason: Option<&str>, body: &[u8]) -> Self {
    let fallback = format!("HTTP {}: {}", status, reason.unwrap_or("Unknown Status"));
    let parsed = serde_json::from_slice::<ErrorBody>(body).ok().map(|b| b.error);

    match parsed {
      Some(inner) => Self {
        status,
        code: inner.code.unwrap_or_else(|| HTTP_ERROR.to_string()),
        message: inner.message.unwrap_or(fallback),
        details: inner.details,
      },
      None => Self::new(status, HTTP_ERROR, fallback),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_structured_error_body() {
    let body = br#"{"error":{"code":"VALIDATION","message":"bad serial","details":["serial too short","tag missing"]}}"#;
    let err = ApiError::from_response(422, Some("Unprocessable Entity"), body);

    assert_eq!(err.status, 422);
    assert_eq!(err.code, "VALIDATION");
    assert_eq!(err.message, "bad serial");
    assert_eq!(
      err.details.map(|d| d.to_vec()),
      Some(vec!["serial too short".to_string(), "tag missing".to_string()])
    );
  }

  #[test]
  fn single_string_details() {
    let body = br#"{"error":{"code":"NOT_FOUND","message":"gone","details":"asset 9"}}"#;
    let err = ApiError::from_response(404, Some("Not Found"), body);
    assert_eq!(err.details, Some(ErrorDetails::One("asset 9".to_string())));
    assert!(err.is_not_found());
  }

  #[test]
  fn unparseable_body_falls_back_to_http_error() {
    let err = ApiError::from_response(502, Some("Bad Gateway"), b"<html>oops</html>");
    assert_eq!(err.code, HTTP_ERROR);
    assert_eq!(err.message, "HTTP 502: Bad Gateway");
    assert!(err.is_server_error());
  }

  #[test]
  fn missing_code_defaults() {
    let err = ApiError::from_response(400, Some("Bad Request"), br#"{"error":{"message":"nope"}}"#);
    assert_eq!(err.code, HTTP_ERROR);
    assert_eq!(err.message, "nope");
  }

  #[test]
  fn network_errors_have_status_zero() {
    let err = ApiError::network("connection refused");
    assert!(err.is_network());
    assert_eq!(err.code, NETWORK_ERROR);
    assert!(!err.is_client_error());
  }
}
