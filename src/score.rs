//! Pure score arithmetic: percentage, letter grade, and performance level.
//!
//! The letter-grade table and the display color table (see `format.rs`) both
//! cut at 90/80/70/60 but are distinct mappings; keep them separate.

use serde::Serialize;

use crate::error::{GradingError, GradingResult};

/// Qualitative bucket derived from a score ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
  Excellent,
  Proficient,
  Developing,
  NeedsImprovement,
}

impl PerformanceLevel {
  pub fn label(&self) -> &'static str {
    match self {
      PerformanceLevel::Excellent => "Excellent",
      PerformanceLevel::Proficient => "Proficient",
      PerformanceLevel::Developing => "Developing",
      PerformanceLevel::NeedsImprovement => "Needs Improvement",
    }
  }
}

/// `100 * score / max_score`. A zero or negative `max_score` is degenerate
/// provider data and must never silently become NaN/Infinity.
pub fn percentage(score: f64, max_score: f64) -> GradingResult<f64> {
  if max_score <= 0.0 {
    return Err(GradingError::InvalidScore);
  }
  Ok(score / max_score * 100.0)
}

/// Fixed letter bands: >=90 A, >=80 B, >=70 C, >=60 D, else F.
pub fn letter_grade(pct: f64) -> &'static str {
  if pct >= 90.0 {
    "A"
  } else if pct >= 80.0 {
    "B"
  } else if pct >= 70.0 {
    "C"
  } else if pct >= 60.0 {
    "D"
  } else {
    "F"
  }
}

/// Bucket a rubric ratio: 100% Excellent, [80,100) Proficient,
/// [50,80) Developing, else Needs Improvement.
pub fn performance_level(score: f64, max_score: f64) -> GradingResult<PerformanceLevel> {
  let pct = percentage(score, max_score)?;
  let level = if pct >= 100.0 {
    PerformanceLevel::Excellent
  } else if pct >= 80.0 {
    PerformanceLevel::Proficient
  } else if pct >= 50.0 {
    PerformanceLevel::Developing
  } else {
    PerformanceLevel::NeedsImprovement
  };
  Ok(level)
}
