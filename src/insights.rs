//! Deriving structured feedback from a canonical grade.
//!
//! Output order is deterministic: one overall performance insight, then a
//! strength per full-credit rubric entry, then an improvement per
//! under-credit entry (both walks in rubric order), then one warning insight
//! per response warning.

use crate::domain::{
  GradeResponse, GradingInsight, InsightKind, InsightSeverity, RubricItem,
};
use crate::error::GradingResult;
use crate::score;
use crate::util::title_case_category;

/// Generate the insight list for a grade. Fails only on degenerate score
/// data (zero max score).
pub fn generate(response: &GradeResponse) -> GradingResult<Vec<GradingInsight>> {
  let pct = score::percentage(response.score, response.max_score)?;
  let mut insights = Vec::new();

  let severity = if pct >= 80.0 {
    InsightSeverity::Success
  } else if pct >= 60.0 {
    InsightSeverity::Info
  } else {
    InsightSeverity::Warning
  };
  insights.push(GradingInsight {
    kind: InsightKind::Performance,
    title: "Overall Performance".into(),
    message: format!(
      "Scored {:.0} of {:.0} points ({:.1}%) - {}",
      response.score,
      response.max_score,
      pct,
      score::letter_grade(pct)
    ),
    severity,
  });

  for (name, item) in response.breakdown.entries() {
    if item.is_full_credit() {
      insights.push(strength_insight(name, item));
    }
  }
  for (name, item) in response.breakdown.entries() {
    if item.score < item.max_score {
      insights.push(improvement_insight(name, item));
    }
  }

  for warning in &response.warnings {
    insights.push(GradingInsight {
      kind: InsightKind::Warning,
      title: "Warning".into(),
      message: warning.clone(),
      severity: InsightSeverity::Warning,
    });
  }

  Ok(insights)
}

fn strength_insight(name: &str, item: &RubricItem) -> GradingInsight {
  GradingInsight {
    kind: InsightKind::Strength,
    title: title_case_category(name),
    message: if item.feedback.is_empty() {
      format!("Full credit ({:.0}/{:.0})", item.score, item.max_score)
    } else {
      item.feedback.clone()
    },
    severity: InsightSeverity::Success,
  }
}

fn improvement_insight(name: &str, item: &RubricItem) -> GradingInsight {
  GradingInsight {
    kind: InsightKind::Improvement,
    title: title_case_category(name),
    message: if item.feedback.is_empty() {
      format!("Earned {:.0} of {:.0} points", item.score, item.max_score)
    } else {
      item.feedback.clone()
    },
    severity: InsightSeverity::Info,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::GradeBreakdown;

  fn item(score: f64, max: f64, feedback: &str) -> RubricItem {
    RubricItem {
      score,
      max_score: max,
      feedback: feedback.into(),
    }
  }

  fn response(breakdown: GradeBreakdown, score: f64, max: f64) -> GradeResponse {
    GradeResponse {
      score,
      max_score: max,
      breakdown,
      overall_feedback: String::new(),
      suggestions: vec![],
      warnings: vec![],
    }
  }

  #[test]
  fn full_credit_everywhere_yields_only_strengths() {
    let breakdown = GradeBreakdown {
      thesis: Some(item(1.0, 1.0, "sharp")),
      contextualization: Some(item(1.0, 1.0, "")),
      evidence: Some(item(2.0, 2.0, "")),
      analysis: Some(item(2.0, 2.0, "")),
      ..Default::default()
    };
    let insights = generate(&response(breakdown, 6.0, 6.0)).expect("insights");

    let strengths: Vec<_> = insights
      .iter()
      .filter(|i| i.kind == InsightKind::Strength)
      .collect();
    assert_eq!(strengths.len(), 4);
    assert!(!insights.iter().any(|i| i.kind == InsightKind::Improvement));
    assert_eq!(insights[0].kind, InsightKind::Performance);
    assert_eq!(insights[0].severity, InsightSeverity::Success);
  }

  #[test]
  fn mixed_breakdown_keeps_rubric_order_within_each_group() {
    let breakdown = GradeBreakdown {
      thesis: Some(item(1.0, 1.0, "")),
      contextualization: Some(item(0.0, 1.0, "")),
      evidence: Some(item(2.0, 2.0, "")),
      analysis: Some(item(1.0, 2.0, "")),
      ..Default::default()
    };
    let insights = generate(&response(breakdown, 4.0, 6.0)).expect("insights");

    let titles: Vec<&str> = insights.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
      titles,
      vec![
        "Overall Performance",
        "Thesis",
        "Evidence",
        "Contextualization",
        "Analysis",
      ]
    );
  }

  #[test]
  fn overall_severity_bands() {
    let breakdown = || GradeBreakdown {
      part_a: Some(item(1.0, 1.0, "")),
      ..Default::default()
    };
    let sev = |score: f64, max: f64| {
      generate(&response(breakdown(), score, max)).expect("insights")[0].severity
    };
    assert_eq!(sev(5.0, 6.0), InsightSeverity::Success); // 83%
    assert_eq!(sev(4.0, 6.0), InsightSeverity::Info); // 67%
    assert_eq!(sev(3.0, 6.0), InsightSeverity::Warning); // 50%
  }

  #[test]
  fn warnings_become_trailing_warning_insights_in_order() {
    let breakdown = GradeBreakdown {
      part_a: Some(item(1.0, 1.0, "")),
      ..Default::default()
    };
    let mut resp = response(breakdown, 3.0, 3.0);
    resp.warnings = vec!["first".into(), "second".into()];
    let insights = generate(&resp).expect("insights");

    let tail: Vec<&str> = insights
      .iter()
      .filter(|i| i.kind == InsightKind::Warning)
      .map(|i| i.message.as_str())
      .collect();
    assert_eq!(tail, vec!["first", "second"]);
  }

  #[test]
  fn saq_part_titles_read_naturally() {
    let breakdown = GradeBreakdown {
      part_a: Some(item(0.0, 1.0, "")),
      ..Default::default()
    };
    let insights = generate(&response(breakdown, 0.0, 3.0)).expect("insights");
    assert_eq!(insights[1].title, "Part A");
  }
}
