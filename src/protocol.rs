//! Public request/response structs for the HTTP API (serde ready).
//! Keep this small and stable to evolve backend and clients independently.

use serde::{Deserialize, Serialize};

use crate::domain::{EssayType, GradeBreakdown, SaqParts};

/// Body of `POST /api/v1/grade`.
///
/// DBQ/LEQ requests carry `essay_text`; SAQ requests may carry `saq_parts`
/// instead. `saq_type` and `rubric_type` are optional annotations passed
/// through to the prompt context.
#[derive(Debug, Deserialize)]
pub struct GradeIn {
    #[serde(default)]
    pub essay_text: Option<String>,
    pub essay_type: EssayType,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub saq_parts: Option<SaqParts>,
    #[serde(default)]
    pub saq_type: Option<String>,
    #[serde(default)]
    pub rubric_type: Option<String>,
}

/// Success envelope of `POST /api/v1/grade`.
#[derive(Debug, Serialize)]
pub struct GradeOut {
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub letter_grade: &'static str,
    pub performance_level: &'static str,
    pub breakdown: GradeBreakdown,
    pub overall_feedback: String,
    pub suggestions: Vec<String>,
    pub warnings: Vec<String>,
    pub word_count: usize,
    pub paragraph_count: usize,
    pub processing_time_ms: u64,
}

/// Error envelope shared by all endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub provider: &'static str,
}
