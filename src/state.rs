//! Application state: read-once settings plus the provider client selected
//! at startup.
//!
//! Nothing here mutates after construction; concurrent grading pipelines
//! share it read-only, so no locking is needed.

use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::providers::{self, GradingClient};

pub struct AppState {
    pub settings: Settings,
    pub client: Box<dyn GradingClient>,
}

impl AppState {
    /// Build state from env: load settings and construct the provider client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let settings = Settings::from_env();
        if settings.api_key.trim().is_empty() {
            warn!(
                target: "apgrader_backend",
                provider = settings.provider.label(),
                "No API key configured; grading requests will fail until one is set"
            );
        }
        let client = providers::client_for(&settings);
        info!(
            target: "apgrader_backend",
            provider = client.provider_name(),
            model = %settings.model,
            "Grading client ready"
        );
        Self { settings, client }
    }

    /// Build state with an explicit client. Used by tests to stub the
    /// provider.
    pub fn with_client(settings: Settings, client: Box<dyn GradingClient>) -> Self {
        Self { settings, client }
    }
}
