//! Anthropic messages-API grading client.
//!
//! One POST to `/v1/messages` with `x-api-key` + `anthropic-version` headers;
//! the model text lives at `content[0].text` in the response envelope.

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

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct AnthropicClient {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  model: String,
}

impl AnthropicClient {
  pub fn new(settings: &Settings) -> Self {
    Self {
      client: http_client(),
      api_key: settings.api_key.clone(),
      base_url: settings.anthropic_base_url.clone(),
      model: settings.model.clone(),
    }
  }

  async fn post_messages(&self, system: String, user: String) -> GradingResult<String> {
    let url = format!("{}/v1/messages", self.base_url);
    let req = MessagesRequest {
      model: self.model.clone(),
      max_tokens: MAX_OUTPUT_TOKENS,
      temperature: TEMPERATURE,
      system,
      messages: vec![MessageReq { role: "user".into(), content: user }],
    };

    let res = self
      .client
      .post(&url)
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", ANTHROPIC_VERSION)
      .json(&req)
      .send()
      .await
      .map_err(classify_transport)?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      warn!(target: "grading", %status, "Anthropic returned non-success status");
      return Err(classify_status(status, &body));
    }

    let envelope: MessagesResponse = res.json().await.map_err(classify_transport)?;
    if let Some(usage) = &envelope.usage {
      info!(
        target: "grading",
        input_tokens = ?usage.input_tokens,
        output_tokens = ?usage.output_tokens,
        "Anthropic usage"
      );
    }
    envelope
      .content
      .first()
      .and_then(|block| block.text.clone())
      .ok_or(GradingError::InvalidResponse)
  }
}

#[async_trait]
impl GradingClient for AnthropicClient {
  fn provider_name(&self) -> &'static str {
    "anthropic"
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

    let text = tokio::time::timeout(ATTEMPT_TIMEOUT, self.post_messages(system, user))
      .await
      .map_err(|_| GradingError::NetworkError("attempt exceeded overall timeout".into()))??;

    decode_grade(&text, preprocessing)
  }
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct MessagesRequest {
  model: String,
  max_tokens: u32,
  temperature: f32,
  system: String,
  messages: Vec<MessageReq>,
}
#[derive(Serialize)]
struct MessageReq {
  role: String,
  content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
  #[serde(default)]
  content: Vec<ContentBlock>,
  #[serde(default)]
  usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ContentBlock {
  #[serde(default)]
  text: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
  #[serde(default)]
  input_tokens: Option<u32>,
  #[serde(default)]
  output_tokens: Option<u32>,
}
