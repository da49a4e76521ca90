//! Retry/backoff policy around a grading client call.
//!
//! Transient provider overload and parse hiccups are worth retrying;
//! malformed credentials and client-side validation failures are not, since
//! retrying them cannot change the outcome. Per attempt:
//!   - RateLimitExceeded : wait attempt^2 * 2 seconds (2s, 8s, 18s, ...)
//!   - NetworkError      : wait a fixed 1 second
//!   - ParseError        : wait a fixed 0.5 seconds
//!   - everything else   : propagate immediately
//! The wait is skipped once attempts are exhausted, and the last observed
//! error is surfaced unchanged. Cancellation aborts both the in-flight call
//! and any pending backoff sleep.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::domain::{EssayType, GradeResponse};
use crate::error::{GradingError, GradingResult};
use crate::preprocess::PreprocessingResult;
use crate::providers::GradingClient;

/// Backoff before the next attempt, or None when the error is not worth
/// retrying.
fn backoff_for(error: &GradingError, attempt: u32) -> Option<Duration> {
  match error {
    GradingError::RateLimitExceeded => {
      Some(Duration::from_secs(u64::from(attempt * attempt * 2)))
    }
    GradingError::NetworkError(_) => Some(Duration::from_secs(1)),
    GradingError::ParseError(_) => Some(Duration::from_millis(500)),
    _ => None,
  }
}

/// Run the client up to `max_retries` times under the policy above.
#[instrument(
  level = "info",
  skip(client, essay, prompt, preprocessing, cancel),
  fields(provider = client.provider_name(), %essay_type, max_retries)
)]
pub async fn grade_with_retry(
  client: &dyn GradingClient,
  essay: &str,
  essay_type: EssayType,
  prompt: &str,
  preprocessing: &PreprocessingResult,
  max_retries: u32,
  cancel: &CancellationToken,
) -> GradingResult<GradeResponse> {
  let max_retries = max_retries.max(1);
  for attempt in 1..=max_retries {
    let result = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(GradingError::Cancelled),
      result = client.grade(essay, essay_type, prompt, preprocessing) => result,
    };

    let error = match result {
      Ok(response) => return Ok(response),
      Err(e) => e,
    };

    let Some(delay) = backoff_for(&error, attempt) else {
      return Err(error);
    };
    if attempt == max_retries {
      return Err(error);
    }

    warn!(
      target: "grading",
      attempt,
      error = %error,
      delay_ms = delay.as_millis() as u64,
      "Grading attempt failed; backing off"
    );
    tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(GradingError::Cancelled),
      _ = tokio::time::sleep(delay) => {}
    }
  }

  // Loop always returns from inside; attempts start at 1.
  unreachable!("retry loop exited without a result")
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::VecDeque;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use async_trait::async_trait;
  use tokio::time::Instant;

  use crate::domain::{GradeBreakdown, RubricItem};
  use crate::preprocess;

  fn sample_response() -> GradeResponse {
    GradeResponse {
      score: 5.0,
      max_score: 6.0,
      breakdown: GradeBreakdown {
        thesis: Some(RubricItem {
          score: 1.0,
          max_score: 1.0,
          feedback: "clear".into(),
        }),
        ..Default::default()
      },
      overall_feedback: "good".into(),
      suggestions: vec![],
      warnings: vec![],
    }
  }

  /// Client that replays a fixed script of outcomes and counts calls.
  struct ScriptedClient {
    calls: AtomicUsize,
    script: Mutex<VecDeque<GradingResult<GradeResponse>>>,
  }

  impl ScriptedClient {
    fn new(script: Vec<GradingResult<GradeResponse>>) -> Self {
      Self {
        calls: AtomicUsize::new(0),
        script: Mutex::new(script.into()),
      }
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl GradingClient for ScriptedClient {
    fn provider_name(&self) -> &'static str {
      "scripted"
    }

    async fn grade(
      &self,
      _essay: &str,
      _essay_type: EssayType,
      _prompt: &str,
      _preprocessing: &PreprocessingResult,
    ) -> GradingResult<GradeResponse> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self
        .script
        .lock()
        .expect("script lock")
        .pop_front()
        .expect("script exhausted")
    }
  }

  fn pre() -> PreprocessingResult {
    preprocess::analyze("some essay text", EssayType::Saq)
  }

  #[tokio::test(start_paused = true)]
  async fn rate_limited_twice_then_success_waits_2s_then_8s() {
    let client = ScriptedClient::new(vec![
      Err(GradingError::RateLimitExceeded),
      Err(GradingError::RateLimitExceeded),
      Ok(sample_response()),
    ]);
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let response = grade_with_retry(
      &client,
      "essay",
      EssayType::Saq,
      "",
      &pre(),
      3,
      &cancel,
    )
    .await
    .expect("third attempt succeeds");

    assert_eq!(response.score, 5.0);
    assert_eq!(client.calls(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(10)); // 2s + 8s
  }

  #[tokio::test(start_paused = true)]
  async fn api_key_missing_is_not_retried_and_has_no_delay() {
    let client = ScriptedClient::new(vec![Err(GradingError::ApiKeyMissing)]);
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let err = grade_with_retry(
      &client,
      "essay",
      EssayType::Dbq,
      "",
      &pre(),
      3,
      &cancel,
    )
    .await
    .expect_err("should propagate");

    assert_eq!(err, GradingError::ApiKeyMissing);
    assert_eq!(client.calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
  }

  #[tokio::test(start_paused = true)]
  async fn network_errors_use_fixed_backoff_and_surface_last_error() {
    let client = ScriptedClient::new(vec![
      Err(GradingError::NetworkError("HTTP 500".into())),
      Err(GradingError::NetworkError("HTTP 502".into())),
      Err(GradingError::NetworkError("HTTP 503".into())),
    ]);
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let err = grade_with_retry(
      &client,
      "essay",
      EssayType::Leq,
      "",
      &pre(),
      3,
      &cancel,
    )
    .await
    .expect_err("exhausted");

    assert_eq!(err, GradingError::NetworkError("HTTP 503".into()));
    assert_eq!(client.calls(), 3);
    // Two 1s waits; none after the final attempt.
    assert_eq!(started.elapsed(), Duration::from_secs(2));
  }

  #[tokio::test(start_paused = true)]
  async fn parse_errors_use_half_second_backoff() {
    let client = ScriptedClient::new(vec![
      Err(GradingError::ParseError("bad json".into())),
      Ok(sample_response()),
    ]);
    let cancel = CancellationToken::new();
    let started = Instant::now();

    grade_with_retry(&client, "essay", EssayType::Saq, "", &pre(), 3, &cancel)
      .await
      .expect("second attempt succeeds");

    assert_eq!(client.calls(), 2);
    assert_eq!(started.elapsed(), Duration::from_millis(500));
  }

  #[tokio::test(start_paused = true)]
  async fn cancellation_wins_over_a_pending_backoff() {
    let client = ScriptedClient::new(vec![
      Err(GradingError::RateLimitExceeded),
      Ok(sample_response()),
    ]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = grade_with_retry(&client, "essay", EssayType::Saq, "", &pre(), 3, &cancel)
      .await
      .expect_err("cancelled");

    assert_eq!(err, GradingError::Cancelled);
    assert_eq!(client.calls(), 0);
  }

  #[test]
  fn backoff_schedule_matches_policy() {
    assert_eq!(
      backoff_for(&GradingError::RateLimitExceeded, 1),
      Some(Duration::from_secs(2))
    );
    assert_eq!(
      backoff_for(&GradingError::RateLimitExceeded, 2),
      Some(Duration::from_secs(8))
    );
    assert_eq!(
      backoff_for(&GradingError::RateLimitExceeded, 3),
      Some(Duration::from_secs(18))
    );
    assert_eq!(
      backoff_for(&GradingError::NetworkError("x".into()), 2),
      Some(Duration::from_secs(1))
    );
    assert_eq!(
      backoff_for(&GradingError::ParseError("x".into()), 1),
      Some(Duration::from_millis(500))
    );
    assert_eq!(backoff_for(&GradingError::InvalidResponse, 1), None);
    assert_eq!(backoff_for(&GradingError::Cancelled, 1), None);
  }
}
