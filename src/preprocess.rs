//! Text preprocessing and pre-flight validation.
//!
//! This includes:
//!   - Cleaning raw essay text (whitespace collapsing that keeps paragraph
//!     breaks, ASCII normalization of typographic quotes/dashes)
//!   - Word/paragraph metrics
//!   - Advisory warnings (length, content-quality heuristics) that never
//!     block grading
//!   - The hard length gate that runs before any network call
//!
//! Everything here is a pure function of its inputs.

use serde::Serialize;

use crate::domain::EssayType;
use crate::error::{GradingError, GradingResult};

/// Output of `analyze`. Created once per grading attempt and never mutated.
#[derive(Clone, Debug, Serialize)]
pub struct PreprocessingResult {
  pub cleaned_text: String,
  pub word_count: usize,
  pub paragraph_count: usize,
  pub warnings: Vec<String>,
  /// False only when a length warning fired ("too short"/"too long").
  pub is_valid: bool,
}

/// Collapse whitespace runs to single spaces while keeping blank-line
/// paragraph delimiters, trim the ends, and normalize typographic
/// quotes/dashes to plain ASCII. Idempotent.
pub fn clean_text(text: &str) -> String {
  let normalized: String = text
    .chars()
    .map(|c| match c {
      '\u{2018}' | '\u{2019}' => '\'',
      '\u{201C}' | '\u{201D}' => '"',
      '\u{2013}' | '\u{2014}' => '-',
      _ => c,
    })
    .collect();

  // Rebuild paragraph by paragraph: a line of pure whitespace ends the
  // current paragraph, and within a paragraph every whitespace run becomes
  // one space.
  let mut paragraphs: Vec<String> = Vec::new();
  let mut words: Vec<&str> = Vec::new();
  for line in normalized.lines() {
    if line.trim().is_empty() {
      if !words.is_empty() {
        paragraphs.push(words.join(" "));
        words.clear();
      }
    } else {
      words.extend(line.split_whitespace());
    }
  }
  if !words.is_empty() {
    paragraphs.push(words.join(" "));
  }

  paragraphs.join("\n\n")
}

/// Clean the text and compute metrics plus advisory warnings for the given
/// essay type.
pub fn analyze(text: &str, essay_type: EssayType) -> PreprocessingResult {
  let cleaned_text = clean_text(text);
  let word_count = cleaned_text.split_whitespace().count();
  let paragraph_count = cleaned_text
    .split("\n\n")
    .filter(|p| !p.trim().is_empty())
    .count();

  let mut warnings = Vec::new();
  if word_count < essay_type.min_word_count() {
    warnings.push(format!(
      "Essay may be too short: {} words (recommended minimum for a {} is {})",
      word_count,
      essay_type.label(),
      essay_type.min_word_count()
    ));
  } else if word_count > essay_type.max_word_count() {
    warnings.push(format!(
      "Essay may be too long: {} words (recommended maximum for a {} is {})",
      word_count,
      essay_type.label(),
      essay_type.max_word_count()
    ));
  }
  warnings.extend(content_quality_warnings(&cleaned_text));

  let is_valid = !warnings
    .iter()
    .any(|w| w.contains("too short") || w.contains("too long"));

  PreprocessingResult {
    cleaned_text,
    word_count,
    paragraph_count,
    warnings,
    is_valid,
  }
}

/// Pre-flight gate. Thresholds are deliberately looser than the advisory
/// warnings above: warnings fire at the recommended bounds, this fails only
/// at half the minimum / double the maximum. Returns the analysis so callers
/// do not preprocess twice.
pub fn validate(text: &str, essay_type: EssayType) -> GradingResult<PreprocessingResult> {
  let result = analyze(text, essay_type);
  if result.cleaned_text.is_empty() {
    return Err(GradingError::EssayTooShort("essay text is empty".into()));
  }
  if result.word_count < essay_type.min_word_count() / 2 {
    return Err(GradingError::EssayTooShort(format!(
      "{} words, a {} needs at least {}",
      result.word_count,
      essay_type.label(),
      essay_type.min_word_count() / 2
    )));
  }
  if result.word_count > essay_type.max_word_count() * 2 {
    return Err(GradingError::EssayTooLong(format!(
      "{} words, a {} is capped at {}",
      result.word_count,
      essay_type.label(),
      essay_type.max_word_count() * 2
    )));
  }
  Ok(result)
}

// -------- Content-quality heuristics --------
//
// Keyword lists are advisory; they flag essays likely to grade poorly but
// never raise errors.

const THESIS_INDICATORS: &[&str] = &[
  "argue", "argues", "because", "therefore", "thus", "demonstrates",
  "contends", "asserts", "thesis", "this essay",
];

const EVIDENCE_INDICATORS: &[&str] = &[
  "act", "treaty", "war", "president", "congress", "amendment", "court",
  "constitution", "revolution", "movement", "tariff", "compromise",
];

const INFORMAL_MARKERS: &[&str] = &[
  "can't", "won't", "don't", "didn't", "gonna", "wanna", "kinda",
  "basically", "a lot of", "stuff",
];

fn content_quality_warnings(cleaned: &str) -> Vec<String> {
  let mut warnings = Vec::new();
  if cleaned.is_empty() {
    return warnings;
  }
  let lower = cleaned.to_lowercase();
  let tokens: Vec<&str> = lower
    .split(|c: char| !c.is_alphanumeric() && c != '\'')
    .filter(|t| !t.is_empty())
    .collect();

  let has_year = tokens
    .iter()
    .any(|t| t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()));

  if !THESIS_INDICATORS.iter().any(|k| lower.contains(k)) {
    warnings.push(
      "No thesis-indicating language detected; graders look for an explicit argument".into(),
    );
  }
  if !has_year && !EVIDENCE_INDICATORS.iter().any(|k| tokens.contains(k)) {
    warnings.push(
      "Little concrete historical evidence detected (no dates or named acts/events)".into(),
    );
  }
  if tokens.iter().any(|t| matches!(*t, "i" | "my" | "me")) {
    warnings.push("First-person language detected; prefer third-person analysis".into());
  }
  if INFORMAL_MARKERS.iter().any(|k| lower.contains(k)) {
    warnings.push("Informal language detected (contractions or filler words)".into());
  }
  warnings
}
