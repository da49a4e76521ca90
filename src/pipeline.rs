//! The grading pipeline shared by every caller of the backend.
//!
//! Flow per request: resolve the essay text (SAQ parts or plain text),
//! validate and preprocess, hand the cleaned text to the provider client
//! through the retry coordinator, then derive score data, insights, and the
//! display projection from the canonical grade. Each request is independent;
//! the only shared state is the read-only `AppState`.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{EssayType, GradeResponse, GradingInsight};
use crate::error::{GradingError, GradingResult};
use crate::format::{self, FormattedResult};
use crate::insights;
use crate::preprocess;
use crate::protocol::GradeIn;
use crate::retry;
use crate::score;
use crate::state::AppState;

/// Everything the pipeline produces for one essay.
#[derive(Debug)]
pub struct GradedEssay {
  pub response: GradeResponse,
  pub insights: Vec<GradingInsight>,
  pub formatted: FormattedResult,
  pub word_count: usize,
  pub paragraph_count: usize,
  pub processing_time_ms: u64,
}

impl GradedEssay {
  pub fn performance_level(&self) -> GradingResult<&'static str> {
    Ok(score::performance_level(self.response.score, self.response.max_score)?.label())
  }

  pub fn percentage(&self) -> GradingResult<f64> {
    score::percentage(self.response.score, self.response.max_score)
  }
}

/// Resolve the text to grade from the request. SAQ requests may carry three
/// labeled parts instead of one text blob; all three are required.
fn resolve_essay_text(request: &GradeIn) -> GradingResult<String> {
  if request.essay_type == EssayType::Saq {
    if let Some(parts) = &request.saq_parts {
      if !parts.is_complete() {
        return Err(GradingError::EssayTooShort(
          "all three SAQ parts are required".into(),
        ));
      }
      return Ok(parts.combined_text());
    }
  }
  match &request.essay_text {
    Some(text) if !text.trim().is_empty() => Ok(text.clone()),
    _ => Err(GradingError::EssayTooShort("essay text is empty".into())),
  }
}

/// The question context sent to the model: the prompt itself plus any SAQ /
/// rubric annotations from the request.
fn prompt_context(request: &GradeIn) -> String {
  let mut context = request.prompt.trim().to_string();
  if let Some(saq_type) = request.saq_type.as_deref().filter(|s| !s.trim().is_empty()) {
    context.push_str(&format!("\n(SAQ type: {})", saq_type.trim()));
  }
  if let Some(rubric) = request.rubric_type.as_deref().filter(|s| !s.trim().is_empty()) {
    context.push_str(&format!("\n(Rubric: {})", rubric.trim()));
  }
  context
}

/// Grade one essay end to end.
#[instrument(
  level = "info",
  skip(state, request, cancel),
  fields(request_id = %Uuid::new_v4(), essay_type = %request.essay_type)
)]
pub async fn grade_essay(
  state: &AppState,
  request: &GradeIn,
  cancel: &CancellationToken,
) -> GradingResult<GradedEssay> {
  let started = Instant::now();

  let essay_text = resolve_essay_text(request)?;
  let preprocessing = preprocess::validate(&essay_text, request.essay_type)?;
  info!(
    target: "grading",
    word_count = preprocessing.word_count,
    paragraph_count = preprocessing.paragraph_count,
    warnings = preprocessing.warnings.len(),
    "Essay preprocessed"
  );

  let context = prompt_context(request);
  let response = retry::grade_with_retry(
    state.client.as_ref(),
    &preprocessing.cleaned_text,
    request.essay_type,
    &context,
    &preprocessing,
    state.settings.max_retries,
    cancel,
  )
  .await?;

  let derived = insights::generate(&response)?;
  let formatted = format::format(&response, &derived)?;
  info!(
    target: "grading",
    score = response.score,
    max_score = response.max_score,
    insights = derived.len(),
    elapsed_ms = started.elapsed().as_millis() as u64,
    "Essay graded"
  );

  Ok(GradedEssay {
    word_count: preprocessing.word_count,
    paragraph_count: preprocessing.paragraph_count,
    processing_time_ms: started.elapsed().as_millis() as u64,
    response,
    insights: derived,
    formatted,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  use async_trait::async_trait;

  use crate::config::Settings;
  use crate::domain::{GradeBreakdown, RubricItem, SaqParts};
  use crate::preprocess::PreprocessingResult;
  use crate::providers::GradingClient;

  /// Stub provider that always returns the same grade and counts calls.
  struct StubClient {
    calls: Arc<AtomicUsize>,
    response: GradeResponse,
  }

  #[async_trait]
  impl GradingClient for StubClient {
    fn provider_name(&self) -> &'static str {
      "stub"
    }

    async fn grade(
      &self,
      _essay: &str,
      _essay_type: EssayType,
      _prompt: &str,
      preprocessing: &PreprocessingResult,
    ) -> GradingResult<GradeResponse> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(self
        .response
        .clone()
        .with_appended_warnings(&preprocessing.warnings))
    }
  }

  fn saq_response() -> GradeResponse {
    let item = |score: f64| RubricItem {
      score,
      max_score: 1.0,
      feedback: "graded".into(),
    };
    GradeResponse {
      score: 2.0,
      max_score: 3.0,
      breakdown: GradeBreakdown {
        part_a: Some(item(1.0)),
        part_b: Some(item(1.0)),
        part_c: Some(item(0.0)),
        ..Default::default()
      },
      overall_feedback: "Two of three points earned.".into(),
      suggestions: vec!["Answer part C directly".into()],
      warnings: vec![],
    }
  }

  fn state_with_stub(calls: Arc<AtomicUsize>) -> AppState {
    AppState::with_client(
      Settings::default(),
      Box::new(StubClient {
        calls,
        response: saq_response(),
      }),
    )
  }

  fn saq_request(parts: SaqParts) -> GradeIn {
    GradeIn {
      essay_text: None,
      essay_type: EssayType::Saq,
      prompt: "Explain one cause of the Market Revolution.".into(),
      saq_parts: Some(parts),
      saq_type: None,
      rubric_type: None,
    }
  }

  fn long_part(n: usize) -> String {
    vec!["evidence"; n].join(" ")
  }

  #[tokio::test]
  async fn saq_parts_flow_end_to_end() {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = state_with_stub(calls.clone());
    let parts = SaqParts::new(&long_part(30), &long_part(30), &long_part(30));
    let cancel = CancellationToken::new();

    let graded = grade_essay(&state, &saq_request(parts), &cancel)
      .await
      .expect("grading succeeds");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(graded.response.score, 2.0);
    assert_eq!(graded.performance_level().unwrap(), "Developing");
    assert!(graded.formatted.summary_text.contains("Grade D"));
    assert!(graded.word_count >= 90);
  }

  #[tokio::test]
  async fn incomplete_saq_parts_fail_before_any_client_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = state_with_stub(calls.clone());
    let parts = SaqParts::new(&long_part(30), "", &long_part(30));
    let cancel = CancellationToken::new();

    let err = grade_essay(&state, &saq_request(parts), &cancel)
      .await
      .expect_err("incomplete parts");

    assert!(matches!(err, GradingError::EssayTooShort(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn missing_essay_text_fails_before_any_client_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = state_with_stub(calls.clone());
    let request = GradeIn {
      essay_text: None,
      essay_type: EssayType::Dbq,
      prompt: String::new(),
      saq_parts: None,
      saq_type: None,
      rubric_type: None,
    };
    let cancel = CancellationToken::new();

    let err = grade_essay(&state, &request, &cancel)
      .await
      .expect_err("no text");
    assert!(matches!(err, GradingError::EssayTooShort(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn prompt_context_appends_annotations() {
    let mut request = saq_request(SaqParts::default());
    request.saq_type = Some("stimulus".into());
    request.rubric_type = Some("2024".into());
    let context = prompt_context(&request);
    assert!(context.starts_with("Explain one cause"));
    assert!(context.contains("(SAQ type: stimulus)"));
    assert!(context.contains("(Rubric: 2024)"));
  }

  #[test]
  fn resolved_saq_text_keeps_part_labels() {
    let parts = SaqParts::new(&long_part(10), &long_part(25), &long_part(25));
    let request = saq_request(parts);
    let resolved = resolve_essay_text(&request).expect("complete parts");
    assert!(resolved.contains("Part A:"));
    assert!(resolved.contains("Part B:"));
    assert!(resolved.contains("Part C:"));
  }
}
