//! Prompt construction. The system prompt pins the model to a strict JSON
//! shape whose categories and point caps come straight from the essay type's
//! rubric structure; the rubric criteria themselves are fixed prose blocks
//! keyed by essay type, not computed.

use crate::domain::EssayType;
use crate::preprocess::PreprocessingResult;

const DBQ_RUBRIC: &str = r#"
DBQ RUBRIC (6 points):
- thesis (1 pt): Historically defensible thesis or claim that responds to the
  prompt and establishes a line of reasoning.
- contextualization (1 pt): Describes broader historical context relevant to
  the prompt, beyond a passing reference.
- evidence (2 pts): 1 pt for using content from at least three documents to
  address the prompt; 2 pts for supporting an argument with at least four
  documents plus one piece of outside evidence.
- analysis (2 pts): 1 pt for sourcing (point of view, purpose, situation or
  audience) in at least two documents; 2 pts when the response also
  demonstrates a complex understanding of the historical development.
"#;

const LEQ_RUBRIC: &str = r#"
LEQ RUBRIC (6 points):
- thesis (1 pt): Historically defensible thesis that responds to the prompt
  and establishes a line of reasoning.
- contextualization (1 pt): Broader historical context relevant to the
  prompt, developed rather than merely mentioned.
- evidence (2 pts): 1 pt for providing specific historical examples relevant
  to the prompt; 2 pts for using them to support an argument.
- analysis (2 pts): 1 pt for historical reasoning (causation, comparison, or
  continuity and change); 2 pts for a complex understanding that qualifies or
  corroborates the argument.
"#;

const SAQ_RUBRIC: &str = r#"
SAQ RUBRIC (3 points, one per part):
- partA (1 pt): Directly answers the question with accurate historical
  information.
- partB (1 pt): Directly answers with a specific, relevant example.
- partC (1 pt): Directly answers and explains the connection asked for.
Award each point independently; no partial credit within a part.
"#;

fn rubric_criteria(essay_type: EssayType) -> &'static str {
  match essay_type {
    EssayType::Dbq => DBQ_RUBRIC,
    EssayType::Leq => LEQ_RUBRIC,
    EssayType::Saq => SAQ_RUBRIC,
  }
}

fn grading_instructions(essay_type: EssayType) -> &'static str {
  match essay_type {
    EssayType::Dbq => {
      "Grade the DBQ against the rubric above. Award whole points only. Cite \
       what earned or lost each point in the per-category feedback."
    }
    EssayType::Leq => {
      "Grade the LEQ against the rubric above. Award whole points only. Be \
       specific about what a stronger response would add."
    }
    EssayType::Saq => {
      "Grade each SAQ part independently against the rubric above. A part \
       earns its point only when it fully answers the question asked."
    }
  }
}

/// System prompt: role, rubric prose, and the mandated JSON response shape
/// with the category set and point caps of the essay type.
pub fn build_system_prompt(essay_type: EssayType) -> String {
  let mut breakdown_shape = String::new();
  for (i, (name, points)) in essay_type.rubric_structure().iter().enumerate() {
    if i > 0 {
      breakdown_shape.push_str(", ");
    }
    breakdown_shape.push_str(&format!(
      "\"{}\": {{\"score\": <0-{}>, \"maxScore\": {}, \"feedback\": \"<string>\"}}",
      name, points, points
    ));
  }

  format!(
    "You are an experienced AP History grader scoring a {} essay.\n{}\n\
     Respond with ONLY a JSON object, no prose before or after, shaped \
     exactly as:\n{{\"score\": <0-{max}>, \"maxScore\": {max}, \
     \"breakdown\": {{{}}}, \"overallFeedback\": \"<string>\", \
     \"suggestions\": [\"<string>\", ...]}}",
    essay_type.label(),
    rubric_criteria(essay_type),
    breakdown_shape,
    max = essay_type.max_score() as u32,
  )
}

/// User message: essay metadata, preprocessing warnings, the question prompt
/// when provided, the cleaned essay, and the per-type grading instructions.
/// Plain text; no JSON escaping at this stage.
pub fn build_user_message(
  essay: &str,
  essay_type: EssayType,
  prompt: &str,
  preprocessing: &PreprocessingResult,
) -> String {
  let mut message = format!(
    "Essay type: {}\nWord count: {} | Paragraphs: {}\n",
    essay_type.label(),
    preprocessing.word_count,
    preprocessing.paragraph_count
  );
  if !preprocessing.warnings.is_empty() {
    message.push_str(&format!(
      "Preprocessing notes: {}\n",
      preprocessing.warnings.join("; ")
    ));
  }
  message.push_str("\n---\n");
  if !prompt.trim().is_empty() {
    message.push_str(&format!("Question prompt:\n{}\n\n---\n", prompt.trim()));
  }
  message.push_str(&format!("Essay:\n{}\n\n---\n", essay));
  message.push_str(grading_instructions(essay_type));
  message
}
