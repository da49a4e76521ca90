//! Display-ready projections of a grade: a plain-text summary and a compact
//! data bundle for visual layers.
//!
//! The color banding here (five classes at 90/80/70/60) is a separate table
//! from the letter-grade bands in `score.rs`: same cut points, different
//! outputs and different defaults for the bottom band. Do not merge them.

use serde::Serialize;

use crate::domain::{GradeResponse, GradingInsight, InsightKind};
use crate::error::GradingResult;
use crate::score;

/// Compact projection consumed by UI layers. Plain synchronous data; no
/// UI-framework types anywhere near this.
#[derive(Clone, Debug, Serialize)]
pub struct DisplayData {
  pub score_text: String,
  pub percentage: f64,
  pub letter_grade: &'static str,
  /// One of the five performance color classes.
  pub performance_color: &'static str,
  pub strength_count: usize,
  pub improvement_count: usize,
  pub warning_count: usize,
}

/// Formatter output: a deterministic textual rendering plus display data.
#[derive(Clone, Debug, Serialize)]
pub struct FormattedResult {
  pub summary_text: String,
  pub display_data: DisplayData,
}

/// Bucket the overall percentage into a named color class:
/// 90+ / 80-89 / 70-79 / 60-69 / below 60.
fn performance_color(pct: f64) -> &'static str {
  if pct >= 90.0 {
    "excellent"
  } else if pct >= 80.0 {
    "good"
  } else if pct >= 70.0 {
    "average"
  } else if pct >= 60.0 {
    "below-average"
  } else {
    "poor"
  }
}

/// Render the summary text and display data for a graded essay.
pub fn format(
  response: &GradeResponse,
  insights: &[GradingInsight],
) -> GradingResult<FormattedResult> {
  let pct = score::percentage(response.score, response.max_score)?;
  let letter = score::letter_grade(pct);

  let mut summary = format!(
    "Score: {:.0}/{:.0} ({:.1}%) - Grade {}\n",
    response.score, response.max_score, pct, letter
  );
  if !response.overall_feedback.is_empty() {
    summary.push('\n');
    summary.push_str(&response.overall_feedback);
    summary.push('\n');
  }
  if !response.suggestions.is_empty() {
    summary.push_str("\nSuggestions:\n");
    for (i, suggestion) in response.suggestions.iter().enumerate() {
      summary.push_str(&format!("{}. {}\n", i + 1, suggestion));
    }
  }

  let count = |kind: InsightKind| insights.iter().filter(|i| i.kind == kind).count();

  Ok(FormattedResult {
    summary_text: summary,
    display_data: DisplayData {
      score_text: format!("{:.0}/{:.0}", response.score, response.max_score),
      percentage: pct,
      letter_grade: letter,
      performance_color: performance_color(pct),
      strength_count: count(InsightKind::Strength),
      improvement_count: count(InsightKind::Improvement),
      warning_count: count(InsightKind::Warning),
    },
  })
}
