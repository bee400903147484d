//! Application assembly: one pipeline instance per process, shared across
//! requests behind `Arc`. Configuration problems surface here, before any
//! listener binds or any network call is attempted.

use std::sync::Arc;

use dramwise_agent::{HttpCompletionTransport, RecommendationPipeline};
use dramwise_core::config::AppConfig;
use dramwise_core::Catalog;

use crate::api::ApiState;

pub struct App {
    pub config: Arc<AppConfig>,
    pub state: ApiState<HttpCompletionTransport>,
}

pub fn build(config: AppConfig) -> anyhow::Result<App> {
    let catalog = Catalog::builtin();
    let transport = HttpCompletionTransport::new(&config.completion)?;
    let pipeline = RecommendationPipeline::new(&config.completion, catalog, transport);

    tracing::info!(
        event_name = "system.bootstrap.complete",
        correlation_id = "bootstrap",
        model = %config.completion.model,
        "pipeline assembled"
    );

    Ok(App { config: Arc::new(config), state: ApiState::new(pipeline) })
}
