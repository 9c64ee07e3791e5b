use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use voicecart_core::config::{AppConfig, ConfigError};
use voicecart_core::DispatchError;
use voicecart_fulfillment::FulfillmentService;

pub struct Application {
    pub config: AppConfig,
    pub service: Arc<FulfillmentService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("intent registration failed: {0}")]
    Registration(#[from] DispatchError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let service = FulfillmentService::from_config(&config)?;
    info!(
        event_name = "system.bootstrap.intents_registered",
        correlation_id = "bootstrap",
        handler_count = service.handler_count(),
        strict_flow = config.conversation.strict_flow,
        unknown_intent = ?config.conversation.unknown_intent,
        "intent handlers registered"
    );

    Ok(Application { config, service: Arc::new(service) })
}
