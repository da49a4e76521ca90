//! Grading error taxonomy shared by the whole pipeline.
//!
//! Three families matter for control flow:
//!   - pre-flight (too short / too long / missing key): surfaced immediately,
//!     no network attempt, never retried
//!   - transient (rate limit / network / parse): absorbed by the retry loop
//!     up to the budget, then the last error is surfaced unchanged
//!   - cancellation: a distinct outcome, never retried

use thiserror::Error;

/// Everything that can go wrong between raw essay text and a final grade.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GradingError {
  /// Essay is empty or far below the minimum word count for its type.
  #[error("essay is too short to grade: {0}")]
  EssayTooShort(String),

  /// Essay is far above the maximum word count for its type.
  #[error("essay is too long to grade: {0}")]
  EssayTooLong(String),

  /// No API key configured for the selected provider. Checked before any
  /// network call is made.
  #[error("no API key configured for the grading provider")]
  ApiKeyMissing,

  /// Provider returned HTTP 429.
  #[error("provider rate limit exceeded")]
  RateLimitExceeded,

  /// Connectivity loss, timeouts, and non-2xx statuses not otherwise
  /// classified. Detail keeps the status / transport message.
  #[error("network error: {0}")]
  NetworkError(String),

  /// Provider envelope was missing the expected content fields. Treated as a
  /// contract violation, not retried.
  #[error("provider response envelope was malformed")]
  InvalidResponse,

  /// The JSON payload inside the model text failed to decode. Retried on the
  /// theory that a regenerated response may parse.
  #[error("could not parse grade JSON: {0}")]
  ParseError(String),

  /// Degenerate score data (max_score of zero). Defensive; never produces
  /// NaN/Infinity downstream.
  #[error("invalid score data from provider")]
  InvalidScore,

  /// Caller cancelled the request. Aborts both the in-flight call and any
  /// pending backoff sleep.
  #[error("grading was cancelled")]
  Cancelled,
}

impl GradingError {
  /// Short machine-readable code used in the HTTP error envelope and logs.
  pub fn code(&self) -> &'static str {
    match self {
      GradingError::EssayTooShort(_) => "essay_too_short",
      GradingError::EssayTooLong(_) => "essay_too_long",
      GradingError::ApiKeyMissing => "api_key_missing",
      GradingError::RateLimitExceeded => "rate_limit_exceeded",
      GradingError::NetworkError(_) => "network_error",
      GradingError::InvalidResponse => "invalid_response",
      GradingError::ParseError(_) => "parse_error",
      GradingError::InvalidScore => "invalid_score",
      GradingError::Cancelled => "cancelled",
    }
  }
}

/// Result alias used across the pipeline.
pub type GradingResult<T> = Result<T, GradingError>;
