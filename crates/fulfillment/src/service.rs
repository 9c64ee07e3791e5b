use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;
use voicecart_core::audit::{AuditSink, TracingAuditSink};
use voicecart_core::config::{AppConfig, UnknownIntentPolicy};
use voicecart_core::conversation::ResponseDirective;
use voicecart_core::{
    ApplicationError, DispatchError, DispatcherConfig, IntentDispatcher, InterfaceError, Request,
    Response,
};
use voicecart_platform::{
    decode_request, encode_response, DecodeError, EncodeError, WebhookResponse,
};

use crate::handlers::{register_transaction_handlers, TransactionSettings};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl From<ServiceError> for ApplicationError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Decode(error) => Self::MalformedRequest(error.to_string()),
            ServiceError::Dispatch(error) => Self::from(error),
            ServiceError::Encode(error) => Self::Encoding(error.to_string()),
        }
    }
}

/// Webhook-facing entry point: the transaction dispatcher plus the
/// unknown-intent policy.
pub struct FulfillmentService {
    dispatcher: IntentDispatcher,
    unknown_intent: UnknownIntentPolicy,
    fallback_message: String,
}

impl FulfillmentService {
    pub fn from_config(config: &AppConfig) -> Result<Self, DispatchError> {
        Self::with_settings(
            config,
            &TransactionSettings::from_config(config),
            Arc::new(TracingAuditSink),
        )
    }

    pub fn with_settings(
        config: &AppConfig,
        settings: &TransactionSettings,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, DispatchError> {
        let mut dispatcher = IntentDispatcher::new(DispatcherConfig::from(&config.conversation))
            .with_audit_sink(audit);
        register_transaction_handlers(&mut dispatcher, settings)?;

        Ok(Self {
            dispatcher,
            unknown_intent: config.conversation.unknown_intent,
            fallback_message: config.conversation.fallback_message.clone(),
        })
    }

    pub fn intents(&self) -> Vec<&str> {
        self.dispatcher.intents()
    }

    pub fn handler_count(&self) -> usize {
        self.dispatcher.handler_count()
    }

    pub fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        if self.unknown_intent == UnknownIntentPolicy::Fallback
            && !self.dispatcher.is_registered(&request.intent)
        {
            return Ok(self.fallback(request));
        }
        self.dispatcher.dispatch(request)
    }

    /// Decode, dispatch and encode one raw webhook body. Failures carry the
    /// turn's response id, or a fresh id when the body never decoded.
    pub fn handle_webhook(&self, body: &[u8]) -> Result<WebhookResponse, InterfaceError> {
        let request = decode_request(body).map_err(|error| {
            ApplicationError::from(ServiceError::from(error))
                .into_interface(Uuid::new_v4().to_string())
        })?;
        let correlation_id = request.correlation_id.clone();

        self.handle(request)
            .map_err(ServiceError::from)
            .and_then(|response| encode_response(response).map_err(ServiceError::from))
            .map_err(|error| ApplicationError::from(error).into_interface(correlation_id))
    }

    fn fallback(&self, request: Request) -> Response {
        tracing::warn!(
            event_name = "conversation.intent_fallback",
            correlation_id = %request.correlation_id,
            session_id = %request.session_id,
            intent = %request.intent,
            "no handler registered, replying with fallback prompt"
        );
        Response {
            session_id: request.session_id,
            correlation_id: request.correlation_id,
            intent: request.intent,
            directives: vec![ResponseDirective::SpeechPrompt(self.fallback_message.clone().into())],
            session: request.session,
            contexts: request.contexts,
            transition: None,
        }
    }
}
