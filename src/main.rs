//! APGrader · AP History Essay Grading Backend
//!
//! - Axum HTTP API (`POST /api/v1/grade`, `GET /api/v1/health`)
//! - LLM-provider grading (Anthropic or OpenAI, selected at startup)
//! - Retry/backoff around an unreliable free-form text dependency
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   GRADER_PROVIDER    : "anthropic" (default) or "openai"
//!   GRADER_MODEL       : model identifier (per-provider default)
//!   ANTHROPIC_API_KEY  : credential for the anthropic provider
//!   OPENAI_API_KEY     : credential for the openai provider
//!   GRADER_CONFIG_PATH : path to optional TOML config overrides
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod preprocess;
mod prompts;
mod providers;
mod retry;
mod score;
mod insights;
mod format;
mod pipeline;
mod protocol;
mod state;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (settings + provider client).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "apgrader_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "apgrader_backend", "Shutdown signal received");
    })
    .await?;
  Ok(())
}
