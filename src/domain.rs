//! Domain models for the grading pipeline: essay types with their fixed
//! rubric structures, rubric items, the canonical grade response, and the
//! derived insight records.
//!
//! `GradeResponse` is the canonical grade: parsed once per request from
//! whichever provider answered, then treated as immutable.

use serde::{Deserialize, Serialize};

/// The three AP-History essay kinds. Scoring caps and word-count bounds are
/// fixed attributes of the type, defined once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EssayType {
  #[serde(alias = "DBQ")]
  Dbq,
  #[serde(alias = "LEQ")]
  Leq,
  #[serde(alias = "SAQ")]
  Saq,
}

impl EssayType {
  pub fn label(&self) -> &'static str {
    match self {
      EssayType::Dbq => "DBQ",
      EssayType::Leq => "LEQ",
      EssayType::Saq => "SAQ",
    }
  }

  pub fn max_score(&self) -> f64 {
    match self {
      EssayType::Dbq | EssayType::Leq => 6.0,
      EssayType::Saq => 3.0,
    }
  }

  pub fn min_word_count(&self) -> usize {
    match self {
      EssayType::Dbq => 400,
      EssayType::Leq => 300,
      EssayType::Saq => 50,
    }
  }

  pub fn max_word_count(&self) -> usize {
    match self {
      EssayType::Dbq => 1200,
      EssayType::Leq => 1000,
      EssayType::Saq => 300,
    }
  }

  /// Rubric category names and point caps, in grading order. The order here
  /// is the iteration order everywhere downstream (prompts, insights).
  pub fn rubric_structure(&self) -> &'static [(&'static str, f64)] {
    match self {
      EssayType::Dbq | EssayType::Leq => &[
        ("thesis", 1.0),
        ("contextualization", 1.0),
        ("evidence", 2.0),
        ("analysis", 2.0),
      ],
      EssayType::Saq => &[("partA", 1.0), ("partB", 1.0), ("partC", 1.0)],
    }
  }
}

impl std::fmt::Display for EssayType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// The three answers of a short-answer question, trimmed on construction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SaqParts {
  #[serde(alias = "partA")]
  pub part_a: String,
  #[serde(alias = "partB")]
  pub part_b: String,
  #[serde(alias = "partC")]
  pub part_c: String,
}

impl SaqParts {
  pub fn new(part_a: &str, part_b: &str, part_c: &str) -> Self {
    Self {
      part_a: part_a.trim().to_string(),
      part_b: part_b.trim().to_string(),
      part_c: part_c.trim().to_string(),
    }
  }

  /// An SAQ is incomplete when any part is empty.
  pub fn is_complete(&self) -> bool {
    !self.part_a.is_empty() && !self.part_b.is_empty() && !self.part_c.is_empty()
  }

  /// Concatenate the parts with labeled separators for downstream prompting.
  pub fn combined_text(&self) -> String {
    format!(
      "Part A:\n{}\n\nPart B:\n{}\n\nPart C:\n{}",
      self.part_a, self.part_b, self.part_c
    )
  }
}

/// One scored rubric category.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RubricItem {
  pub score: f64,
  #[serde(rename = "maxScore")]
  pub max_score: f64,
  pub feedback: String,
}

impl RubricItem {
  pub fn is_full_credit(&self) -> bool {
    self.score >= self.max_score
  }
}

/// Named rubric items keyed by category. DBQ/LEQ use thesis through analysis
/// (plus optional complexity); SAQ uses the three parts. Only the fields for
/// the graded essay type are populated.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GradeBreakdown {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thesis: Option<RubricItem>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contextualization: Option<RubricItem>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub evidence: Option<RubricItem>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub analysis: Option<RubricItem>,
  /// Reported only by essay types that award a complexity point.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub complexity: Option<RubricItem>,
  #[serde(default, rename = "partA", skip_serializing_if = "Option::is_none")]
  pub part_a: Option<RubricItem>,
  #[serde(default, rename = "partB", skip_serializing_if = "Option::is_none")]
  pub part_b: Option<RubricItem>,
  #[serde(default, rename = "partC", skip_serializing_if = "Option::is_none")]
  pub part_c: Option<RubricItem>,
}

impl GradeBreakdown {
  /// Populated entries in rubric order. Categories must not reorder between
  /// calls; insights and prompts both rely on this sequence.
  pub fn entries(&self) -> Vec<(&'static str, &RubricItem)> {
    let slots: [(&'static str, &Option<RubricItem>); 8] = [
      ("thesis", &self.thesis),
      ("contextualization", &self.contextualization),
      ("evidence", &self.evidence),
      ("analysis", &self.analysis),
      ("complexity", &self.complexity),
      ("partA", &self.part_a),
      ("partB", &self.part_b),
      ("partC", &self.part_c),
    ];
    slots
      .into_iter()
      .filter_map(|(name, item)| item.as_ref().map(|i| (name, i)))
      .collect()
  }
}

/// Canonical grade produced once per request, independent of provider.
/// Preprocessing warnings are appended to `warnings` (provider warnings
/// first) before the response reaches the caller; after that it is never
/// mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GradeResponse {
  pub score: f64,
  #[serde(alias = "maxScore")]
  pub max_score: f64,
  pub breakdown: GradeBreakdown,
  #[serde(alias = "overallFeedback")]
  pub overall_feedback: String,
  #[serde(default)]
  pub suggestions: Vec<String>,
  #[serde(default)]
  pub warnings: Vec<String>,
}

impl GradeResponse {
  /// Rebuild the response with preprocessing warnings appended after any
  /// provider-supplied ones.
  pub fn with_appended_warnings(mut self, extra: &[String]) -> Self {
    self.warnings.extend(extra.iter().cloned());
    self
  }
}

/// What an insight is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
  Performance,
  Strength,
  Improvement,
  Tip,
  Warning,
}

/// Display severity attached to an insight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSeverity {
  Info,
  Warning,
  Error,
  Success,
}

/// Structured feedback derived from a grade. Ephemeral: computed per request,
/// never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct GradingInsight {
  pub kind: InsightKind,
  pub title: String,
  pub message: String,
  pub severity: InsightSeverity,
}
