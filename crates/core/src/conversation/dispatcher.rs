use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, TracingAuditSink};
use crate::config::ConversationConfig;
use crate::conversation::turn::{HandlerOutcome, Request, Response, TurnContext};
use crate::errors::{ApplicationError, DomainError};
use crate::flows::{CheckoutFlow, FlowDefinition, FlowEngine, FlowState, FlowTransitionError};

const DISPATCHER_ACTOR: &str = "intent-dispatcher";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("argument `{name}` is malformed: {message}")]
    MalformedArgument { name: String, message: String },
    #[error("session value `{key}` is unusable: {message}")]
    SessionState { key: String, message: String },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no handler registered for intent `{0}`")]
    UnknownIntent(String),
    #[error("a handler is already registered for intent `{0}`")]
    DuplicateIntent(String),
    #[error("handler for `{intent}` returned an invalid outcome: {reason}")]
    InvalidOutcome { intent: String, reason: String },
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
}

impl From<DispatchError> for ApplicationError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::UnknownIntent(intent) => Self::UnknownIntent(intent),
            DispatchError::DuplicateIntent(intent) => {
                Self::Configuration(format!("intent `{intent}` registered twice"))
            }
            DispatchError::InvalidOutcome { intent, reason } => {
                Self::HandlerContract(format!("{intent}: {reason}"))
            }
            DispatchError::Handler(HandlerError::Domain(error)) => Self::Domain(error),
            DispatchError::Handler(error) => Self::MalformedRequest(error.to_string()),
            DispatchError::Flow(error) => Self::Domain(DomainError::from(error)),
        }
    }
}

pub trait IntentHandler: Send + Sync {
    fn handle(&self, turn: &TurnContext<'_>) -> Result<HandlerOutcome, HandlerError>;
}

impl<F> IntentHandler for F
where
    F: Fn(&TurnContext<'_>) -> Result<HandlerOutcome, HandlerError> + Send + Sync,
{
    fn handle(&self, turn: &TurnContext<'_>) -> Result<HandlerOutcome, HandlerError> {
        self(turn)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Log arguments and produced directives for every turn.
    pub debug: bool,
    /// Reject flow events the transition table does not permit.
    pub strict_flow: bool,
}

impl From<&ConversationConfig> for DispatcherConfig {
    fn from(config: &ConversationConfig) -> Self {
        Self { debug: config.debug, strict_flow: config.strict_flow }
    }
}

/// Routes a request to the single handler registered for its intent.
///
/// Holds no per-session data: everything a turn needs travels in the
/// [`Request`], and everything it changes comes back in the [`Response`].
pub struct IntentDispatcher<F = CheckoutFlow> {
    handlers: HashMap<String, Box<dyn IntentHandler>>,
    engine: FlowEngine<F>,
    config: DispatcherConfig,
    audit: Arc<dyn AuditSink>,
}

impl IntentDispatcher<CheckoutFlow> {
    pub fn new(config: DispatcherConfig) -> Self {
        Self::with_flow(CheckoutFlow, config)
    }
}

impl<F> IntentDispatcher<F>
where
    F: FlowDefinition,
{
    pub fn with_flow(flow: F, config: DispatcherConfig) -> Self {
        Self {
            handlers: HashMap::new(),
            engine: FlowEngine::new(flow),
            config,
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn register<H>(
        &mut self,
        intent: impl Into<String>,
        handler: H,
    ) -> Result<(), DispatchError>
    where
        H: IntentHandler + 'static,
    {
        let intent = intent.into();
        if self.handlers.contains_key(&intent) {
            return Err(DispatchError::DuplicateIntent(intent));
        }
        self.handlers.insert(intent, Box::new(handler));
        Ok(())
    }

    pub fn is_registered(&self, intent: &str) -> bool {
        self.handlers.contains_key(intent)
    }

    /// Registered intent names, sorted.
    pub fn intents(&self) -> Vec<&str> {
        let mut intents: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        intents.sort_unstable();
        intents
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    pub fn dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        let audit = AuditContext::new(
            Some(request.session_id.clone()),
            Some(request.intent.clone()),
            request.correlation_id.clone(),
            DISPATCHER_ACTOR,
        );

        let Some(handler) = self.handlers.get(&request.intent) else {
            let error = DispatchError::UnknownIntent(request.intent.clone());
            self.reject(&audit, &error);
            return Err(error);
        };

        let current = self.current_state(&request);
        if self.config.debug {
            tracing::info!(
                event_name = "conversation.request_received",
                correlation_id = %request.correlation_id,
                session_id = %request.session_id,
                intent = %request.intent,
                flow_state = %current,
                arguments = %serde_json::to_string(&request.arguments).unwrap_or_default(),
                "dispatching intent"
            );
        }

        let outcome = match handler.handle(&TurnContext::new(&request, current)) {
            Ok(outcome) => outcome,
            Err(error) => {
                let error = DispatchError::from(error);
                self.reject(&audit, &error);
                return Err(error);
            }
        };
        if let Err(reason) = outcome.validate() {
            let error = DispatchError::InvalidOutcome { intent: request.intent.clone(), reason };
            self.reject(&audit, &error);
            return Err(error);
        }

        let applied =
            self.engine.apply_with_audit(&current, &outcome.event, self.audit.as_ref(), &audit);
        let transition = match applied {
            Ok(transition) => transition,
            Err(error) if self.config.strict_flow => {
                let error = DispatchError::from(error);
                self.reject(&audit, &error);
                return Err(error);
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "flow.transition_resynced",
                    correlation_id = %request.correlation_id,
                    session_id = %request.session_id,
                    intent = %request.intent,
                    error = %error,
                    "flow event out of order, landing on its target state"
                );
                self.engine.resync(&current, &outcome.event)
            }
        };

        let Request { session_id, correlation_id, intent, mut session, mut contexts, .. } = request;
        let HandlerOutcome { directives, session_changes, context_changes, .. } = outcome;
        session.apply(session_changes);
        session.set_flow_state(transition.to);
        contexts.apply(context_changes);

        if self.config.debug {
            tracing::info!(
                event_name = "conversation.directives_produced",
                correlation_id = %correlation_id,
                session_id = %session_id,
                intent = %intent,
                directives = %serde_json::to_string(&directives).unwrap_or_default(),
                "handler produced directives"
            );
        }
        self.audit.emit(
            audit
                .event(
                    "conversation.intent_dispatched",
                    AuditCategory::Dispatch,
                    AuditOutcome::Success,
                )
                .with_metadata("directives", directives.len().to_string())
                .with_metadata("flow_state", transition.to.as_str()),
        );

        Ok(Response {
            session_id,
            correlation_id,
            intent,
            directives,
            session,
            contexts,
            transition: Some(transition),
        })
    }

    fn current_state(&self, request: &Request) -> FlowState {
        match request.session.flow_state() {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(
                    event_name = "conversation.flow_state_unreadable",
                    correlation_id = %request.correlation_id,
                    session_id = %request.session_id,
                    error = %error,
                    "stored flow state unreadable, restarting from start"
                );
                self.engine.initial_state()
            }
        }
    }

    fn reject(&self, audit: &AuditContext, error: &DispatchError) {
        let outcome = match error {
            DispatchError::Handler(_) | DispatchError::InvalidOutcome { .. } => {
                AuditOutcome::Failed
            }
            _ => AuditOutcome::Rejected,
        };
        self.audit.emit(
            audit
                .event("conversation.intent_rejected", AuditCategory::Dispatch, outcome)
                .with_metadata("error", error.to_string()),
        );
    }
}
