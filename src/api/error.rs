use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("Resource not found: {0}")]
  NotFound(String),

  #[error("Rate limited - please wait before retrying")]
  RateLimited,

  #[error("Server error: {0}")]
  ServerError(String),

  #[error("Network error: {0}")]
  NetworkError(#[from] reqwest::Error),

  #[error("Invalid URL: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("Invalid response: {0}")]
  InvalidResponse(String),

  #[error("No rate in response for {0}")]
  MissingRate(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

impl ApiError {
  /// Truncate a response body to avoid logging excessive data
  fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
      return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
      end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
  }

  pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
    let truncated = Self::truncate_body(body);
    match status.as_u16() {
      404 => ApiError::NotFound(truncated),
      429 => ApiError::RateLimited,
      500..=599 => ApiError::ServerError(truncated),
      _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use reqwest::StatusCode;

  #[test]
  fn test_from_status() {
    assert!(matches!(
      ApiError::from_status(StatusCode::NOT_FOUND, "gone"),
      ApiError::NotFound(_)
    ));
    assert!(matches!(
      ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
      ApiError::RateLimited
    ));
    assert!(matches!(
      ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
      ApiError::ServerError(_)
    ));
    assert!(matches!(
      ApiError::from_status(StatusCode::FORBIDDEN, ""),
      ApiError::InvalidResponse(_)
    ));
  }

  #[test]
  fn test_long_body_truncated() {
    let body = "é".repeat(300);
    let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
    let msg = err.to_string();
    assert!(msg.contains("truncated, 600 total bytes"));
  }
}
