//! Provider-abstracted grading clients.
//!
//! One trait, one small stateless struct per provider, and an explicit
//! provider-to-implementation lookup. Every variant follows the same
//! contract:
//!   1. fail `ApiKeyMissing` before any network call when no credential
//!   2. one HTTP POST with temperature 0.3 and a 1500-token output cap
//!   3. status mapping: 2xx ok, 401 key, 429 rate limit, rest network error
//!   4. extract the model text from the provider envelope, pull the embedded
//!      JSON object out of it, decode into the canonical `GradeResponse`
//!   5. append preprocessing warnings after any provider-supplied warnings

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Provider, Settings};
use crate::domain::{EssayType, GradeResponse};
use crate::error::{GradingError, GradingResult};
use crate::preprocess::PreprocessingResult;

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

/// Sampling temperature sent to every provider.
pub const TEMPERATURE: f32 = 0.3;
/// Output token cap sent to every provider.
pub const MAX_OUTPUT_TOKENS: u32 = 1500;
/// Per-request timeout (connect + read), enforced by the reqwest client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Overall budget for a single attempt, enforced around the whole call.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// The capability every provider variant implements.
#[async_trait]
pub trait GradingClient: Send + Sync {
  fn provider_name(&self) -> &'static str;

  async fn grade(
    &self,
    essay: &str,
    essay_type: EssayType,
    prompt: &str,
    preprocessing: &PreprocessingResult,
  ) -> GradingResult<GradeResponse>;
}

/// Explicit lookup from configured provider to implementation.
pub fn client_for(settings: &Settings) -> Box<dyn GradingClient> {
  match settings.provider {
    Provider::Anthropic => Box::new(AnthropicClient::new(settings)),
    Provider::OpenAi => Box::new(OpenAiClient::new(settings)),
  }
}

/// Build the shared HTTP client with the per-request timeout. Falls back to
/// defaults if the builder fails (it only does so on TLS backend issues).
pub(crate) fn http_client() -> reqwest::Client {
  reqwest::Client::builder()
    .timeout(REQUEST_TIMEOUT)
    .build()
    .unwrap_or_default()
}

/// Map a non-2xx HTTP status (plus a truncated body for context) onto the
/// error taxonomy.
pub(crate) fn classify_status(status: reqwest::StatusCode, body: &str) -> GradingError {
  match status.as_u16() {
    401 => GradingError::ApiKeyMissing,
    429 => GradingError::RateLimitExceeded,
    code => GradingError::NetworkError(format!(
      "HTTP {}: {}",
      code,
      crate::util::trunc_for_log(body, 200)
    )),
  }
}

/// Map a reqwest transport error (including the 30s request timeout) onto
/// the error taxonomy.
pub(crate) fn classify_transport(err: reqwest::Error) -> GradingError {
  if err.is_timeout() {
    GradingError::NetworkError("request timed out".into())
  } else {
    GradingError::NetworkError(err.to_string())
  }
}

/// Providers sometimes wrap the JSON grade in prose. Take the substring from
/// the first `{` to the last `}`; when no braces are found the full text is
/// returned and will fail decoding downstream.
pub(crate) fn extract_json_block(text: &str) -> &str {
  match (text.find('{'), text.rfind('}')) {
    (Some(start), Some(end)) if end >= start => &text[start..=end],
    _ => text,
  }
}

/// Decode the model text into the canonical grade and append preprocessing
/// warnings (provider warnings stay first).
pub(crate) fn decode_grade(
  text: &str,
  preprocessing: &PreprocessingResult,
) -> GradingResult<GradeResponse> {
  let payload = extract_json_block(text);
  let response: GradeResponse = serde_json::from_str(payload)
    .map_err(|e| GradingError::ParseError(e.to_string()))?;
  Ok(response.with_appended_warnings(&preprocessing.warnings))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::EssayType;
  use crate::preprocess;

  #[test]
  fn json_block_is_extracted_from_prose() {
    let text = "Here you go: {\"score\":4} thanks!";
    assert_eq!(extract_json_block(text), "{\"score\":4}");
  }

  #[test]
  fn braceless_text_is_passed_through() {
    assert_eq!(extract_json_block("no json here"), "no json here");
  }

  #[test]
  fn decode_appends_preprocessing_warnings_after_provider_ones() {
    let pre = preprocess::analyze("short", EssayType::Saq);
    assert!(!pre.warnings.is_empty());
    let text = r#"Sure! {
      "score": 2, "maxScore": 3,
      "breakdown": {"partA": {"score": 1, "maxScore": 1, "feedback": "ok"}},
      "overallFeedback": "fine",
      "suggestions": [],
      "warnings": ["provider note"]
    } hope that helps"#;
    let resp = decode_grade(text, &pre).expect("decode");
    assert_eq!(resp.warnings[0], "provider note");
    assert_eq!(resp.warnings.len(), 1 + pre.warnings.len());
  }

  #[test]
  fn undecodable_payload_is_a_parse_error() {
    let pre = preprocess::analyze("short", EssayType::Saq);
    match decode_grade("not a grade at all", &pre) {
      Err(GradingError::ParseError(_)) => {}
      other => panic!("expected ParseError, got {:?}", other),
    }
  }

  #[test]
  fn status_classification() {
    use reqwest::StatusCode;
    assert_eq!(
      classify_status(StatusCode::UNAUTHORIZED, ""),
      GradingError::ApiKeyMissing
    );
    assert_eq!(
      classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
      GradingError::RateLimitExceeded
    );
    assert!(matches!(
      classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
      GradingError::NetworkError(_)
    ));
    assert!(matches!(
      classify_status(StatusCode::BAD_REQUEST, "bad body"),
      GradingError::NetworkError(_)
    ));
  }
}
