//! OpenAI chat-completions grading client.
//!
//! One POST to `/v1/chat/completions` with a bearer token; we request
//! `response_format: json_object` and read `choices[0].message.content`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::domain::{EssayType, GradeResponse};
use crate::error::{GradingError, GradingResult};
use crate::preprocess::PreprocessingResult;
use crate::prompts;

use super::{
  classify_status, classify_transport, decode_grade, http_client, GradingClient,
  ATTEMPT_TIMEOUT, MAX_OUTPUT_TOKENS, TEMPERATURE,
};

#[derive(Clone)]
pub struct OpenAiClient {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  model: String,
}

impl OpenAiClient {
  pub fn new(settings: &Settings) -> Self {
    Self {
      client: http_client(),
      api_key: settings.api_key.clone(),
      base_url: settings.openai_base_url.clone(),
      model: settings.model.clone(),
    }
  }

  async fn post_chat(&self, system: String, user: String) -> GradingResult<String> {
    let url = format!("{}/v1/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system },
        ChatMessageReq { role: "user".into(), content: user },
      ],
      temperature: TEMPERATURE,
      max_tokens: MAX_OUTPUT_TOKENS,
      response_format: ResponseFormat { r#type: "json_object".into() },
    };

    let res = self
      .client
      .post(&url)
      .bearer_auth(&self.api_key)
      .json(&req)
      .send()
      .await
      .map_err(classify_transport)?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      warn!(target: "grading", %status, "OpenAI returned non-success status");
      return Err(classify_status(status, &body));
    }

    let envelope: ChatCompletionResponse = res.json().await.map_err(classify_transport)?;
    if let Some(usage) = &envelope.usage {
      info!(
        target: "grading",
        prompt_tokens = ?usage.prompt_tokens,
        completion_tokens = ?usage.completion_tokens,
        "OpenAI usage"
      );
    }
    envelope
      .choices
      .first()
      .and_then(|choice| choice.message.content.clone())
      .ok_or(GradingError::InvalidResponse)
  }
}

#[async_trait]
impl GradingClient for OpenAiClient {
  fn provider_name(&self) -> &'static str {
    "openai"
  }

  #[instrument(
    level = "info",
    skip(self, essay, prompt, preprocessing),
    fields(model = %self.model, %essay_type, essay_len = essay.len())
  )]
  async fn grade(
    &self,
    essay: &str,
    essay_type: EssayType,
    prompt: &str,
    preprocessing: &PreprocessingResult,
  ) -> GradingResult<GradeResponse> {
    if self.api_key.trim().is_empty() {
      return Err(GradingError::ApiKeyMissing);
    }

    let system = prompts::build_system_prompt(essay_type);
    let user = prompts::build_user_message(essay, essay_type, prompt, preprocessing);

    let text = tokio::time::timeout(ATTEMPT_TIMEOUT, self.post_chat(system, user))
      .await
      .map_err(|_| GradingError::NetworkError("attempt exceeded overall timeout".into()))??;

    decode_grade(&text, preprocessing)
  }
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  max_tokens: u32,
  response_format: ResponseFormat,
}
#[derive(Serialize)]
struct ChatMessageReq {
  role: String,
  content: String,
}
#[derive(Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")]
  r#type: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  #[serde(default)]
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
}
#[derive(Deserialize)]
struct ChatMessageResp {
  #[serde(default)]
  content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
  #[serde(default)]
  prompt_tokens: Option<u32>,
  #[serde(default)]
  completion_tokens: Option<u32>,
}
