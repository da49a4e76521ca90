//! Runtime settings: provider selection, model, credentials, retry budget.
//!
//! Settings are read once at startup and shared read-only after that. An
//! optional TOML file (GRADER_CONFIG_PATH) supplies defaults; environment
//! variables override it. API keys come from the environment only.
//!
//! Relevant env variables:
//!   GRADER_PROVIDER    : "anthropic" (default) or "openai"
//!   GRADER_MODEL       : model identifier (per-provider default)
//!   ANTHROPIC_API_KEY  : credential for the anthropic provider
//!   OPENAI_API_KEY     : credential for the openai provider
//!   GRADER_MAX_RETRIES : attempt budget for the retry loop (default 3)

use serde::Deserialize;
use tracing::{error, info};

const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_RETRIES: u32 = 3;

/// The fixed set of supported providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
  Anthropic,
  #[serde(rename = "openai")]
  OpenAi,
}

impl Provider {
  pub fn label(&self) -> &'static str {
    match self {
      Provider::Anthropic => "anthropic",
      Provider::OpenAi => "openai",
    }
  }

  fn default_model(&self) -> &'static str {
    match self {
      Provider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
      Provider::OpenAi => DEFAULT_OPENAI_MODEL,
    }
  }

  fn key_env_var(&self) -> &'static str {
    match self {
      Provider::Anthropic => "ANTHROPIC_API_KEY",
      Provider::OpenAi => "OPENAI_API_KEY",
    }
  }
}

/// Read-once configuration shared by all pipelines.
#[derive(Clone, Debug)]
pub struct Settings {
  pub provider: Provider,
  pub model: String,
  pub api_key: String,
  pub anthropic_base_url: String,
  pub openai_base_url: String,
  pub max_retries: u32,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      provider: Provider::Anthropic,
      model: DEFAULT_ANTHROPIC_MODEL.into(),
      api_key: String::new(),
      anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.into(),
      openai_base_url: DEFAULT_OPENAI_BASE_URL.into(),
      max_retries: DEFAULT_MAX_RETRIES,
    }
  }
}

/// Optional TOML overrides (no credentials here).
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
  #[serde(default)]
  provider: Option<Provider>,
  #[serde(default)]
  model: Option<String>,
  #[serde(default)]
  max_retries: Option<u32>,
}

impl Settings {
  /// Build settings from the TOML file (if any) plus env overrides.
  pub fn from_env() -> Self {
    let file = load_file_config();

    let provider = std::env::var("GRADER_PROVIDER")
      .ok()
      .and_then(|raw| parse_provider(&raw))
      .or(file.provider)
      .unwrap_or(Provider::Anthropic);

    let model = std::env::var("GRADER_MODEL")
      .ok()
      .filter(|m| !m.trim().is_empty())
      .or_else(|| file.model.clone())
      .unwrap_or_else(|| provider.default_model().into());

    let api_key = std::env::var(provider.key_env_var()).unwrap_or_default();

    let anthropic_base_url = std::env::var("ANTHROPIC_BASE_URL")
      .unwrap_or_else(|_| DEFAULT_ANTHROPIC_BASE_URL.into());
    let openai_base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.into());

    let max_retries = std::env::var("GRADER_MAX_RETRIES")
      .ok()
      .and_then(|v| v.parse::<u32>().ok())
      .or(file.max_retries)
      .unwrap_or(DEFAULT_MAX_RETRIES)
      .max(1);

    info!(
      target: "apgrader_backend",
      provider = provider.label(),
      %model,
      has_key = !api_key.trim().is_empty(),
      max_retries,
      "Settings loaded"
    );

    Self {
      provider,
      model,
      api_key,
      anthropic_base_url,
      openai_base_url,
      max_retries,
    }
  }
}

fn parse_provider(raw: &str) -> Option<Provider> {
  match raw.trim().to_lowercase().as_str() {
    "anthropic" => Some(Provider::Anthropic),
    "openai" => Some(Provider::OpenAi),
    other => {
      error!(target: "apgrader_backend", provider = other, "Unknown GRADER_PROVIDER; ignoring");
      None
    }
  }
}

/// Attempt to load the TOML override file. On any IO/parse error, fall back
/// to defaults.
fn load_file_config() -> FileConfig {
  let Ok(path) = std::env::var("GRADER_CONFIG_PATH") else {
    return FileConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<FileConfig>(&s) {
      Ok(cfg) => {
        info!(target: "apgrader_backend", %path, "Loaded grader config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "apgrader_backend", %path, error = %e, "Failed to parse TOML config");
        FileConfig::default()
      }
    },
    Err(e) => {
      error!(target: "apgrader_backend", %path, error = %e, "Failed to read TOML config file");
      FileConfig::default()
    }
  }
}
