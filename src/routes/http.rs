//! HTTP endpoint handlers. Thin wrappers that forward to the grading
//! pipeline and translate `GradingError` into the error envelope.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::GradingError;
use crate::pipeline;
use crate::protocol::{ErrorOut, GradeIn, GradeOut, HealthOut};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    provider: state.client.provider_name(),
  })
}

#[instrument(
  level = "info",
  skip(state, body),
  fields(essay_type = %body.essay_type, has_saq_parts = body.saq_parts.is_some())
)]
pub async fn http_post_grade(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GradeIn>,
) -> Result<Json<GradeOut>, (StatusCode, Json<ErrorOut>)> {
  // The handler future is dropped if the client disconnects, which aborts
  // the pipeline; the token exists for callers that cancel explicitly.
  let cancel = CancellationToken::new();

  let graded = pipeline::grade_essay(&state, &body, &cancel)
    .await
    .map_err(|e| {
      warn!(target: "grading", error = %e, code = e.code(), "Grading request failed");
      error_response(e)
    })?;

  let percentage = graded.percentage().map_err(error_response)?;
  let performance_level = graded.performance_level().map_err(error_response)?;
  info!(
    target: "grading",
    score = graded.response.score,
    max_score = graded.response.max_score,
    letter = graded.formatted.display_data.letter_grade,
    insights = graded.insights.len(),
    elapsed_ms = graded.processing_time_ms,
    "Grading request served"
  );
  tracing::debug!(
    target: "grading",
    summary = %crate::util::trunc_for_log(&graded.formatted.summary_text, 200),
    "Summary rendered"
  );

  Ok(Json(GradeOut {
    score: graded.response.score,
    max_score: graded.response.max_score,
    percentage,
    letter_grade: graded.formatted.display_data.letter_grade,
    performance_level,
    breakdown: graded.response.breakdown.clone(),
    overall_feedback: graded.response.overall_feedback.clone(),
    suggestions: graded.response.suggestions.clone(),
    warnings: graded.response.warnings.clone(),
    word_count: graded.word_count,
    paragraph_count: graded.paragraph_count,
    processing_time_ms: graded.processing_time_ms,
  }))
}

/// Map a pipeline error onto a status code and the error envelope. The
/// messages here are user-facing; technical detail goes in `details`.
fn error_response(error: GradingError) -> (StatusCode, Json<ErrorOut>) {
  let (status, message, details) = match &error {
    GradingError::EssayTooShort(detail) => (
      StatusCode::BAD_REQUEST,
      "The essay is too short to grade.".to_string(),
      Some(detail.clone()),
    ),
    GradingError::EssayTooLong(detail) => (
      StatusCode::BAD_REQUEST,
      "The essay is too long to grade.".to_string(),
      Some(detail.clone()),
    ),
    GradingError::ApiKeyMissing => (
      StatusCode::SERVICE_UNAVAILABLE,
      "Grading is not configured on this server.".to_string(),
      None,
    ),
    GradingError::RateLimitExceeded => (
      StatusCode::TOO_MANY_REQUESTS,
      "The grading service is busy. Please try again shortly.".to_string(),
      None,
    ),
    GradingError::NetworkError(detail) => (
      StatusCode::BAD_GATEWAY,
      "Could not reach the grading service.".to_string(),
      Some(detail.clone()),
    ),
    GradingError::InvalidResponse => (
      StatusCode::BAD_GATEWAY,
      "The grading service returned an unexpected response.".to_string(),
      None,
    ),
    GradingError::ParseError(detail) => (
      StatusCode::BAD_GATEWAY,
      "The grade could not be read from the grading service.".to_string(),
      Some(detail.clone()),
    ),
    GradingError::InvalidScore => (
      StatusCode::BAD_GATEWAY,
      "The grading service returned invalid score data.".to_string(),
      None,
    ),
    GradingError::Cancelled => (
      StatusCode::REQUEST_TIMEOUT,
      "Grading was cancelled.".to_string(),
      None,
    ),
  };
  (
    status,
    Json(ErrorOut {
      error: error.code(),
      message,
      details,
    }),
  )
}
