use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::conversation::context::{Context, ContextChange, ContextSet};
use crate::conversation::directive::{ResponseDirective, SimpleResponse, StructuredPayload};
use crate::conversation::dispatcher::HandlerError;
use crate::conversation::session::{SessionChange, SessionState};
use crate::flows::{FlowEvent, FlowState, TransitionOutcome};

/// One inbound turn, already decoded from the platform envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub session_id: String,
    pub correlation_id: String,
    pub intent: String,
    pub arguments: BTreeMap<String, Value>,
    pub session: SessionState,
    pub contexts: ContextSet,
}

impl Request {
    pub fn new(session_id: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            correlation_id: Uuid::new_v4().to_string(),
            intent: intent.into(),
            arguments: BTreeMap::new(),
            session: SessionState::new(),
            contexts: ContextSet::new(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = session;
        self
    }

    pub fn with_contexts(mut self, contexts: ContextSet) -> Self {
        self.contexts = contexts;
        self
    }
}

/// Read-only view of a turn handed to intent handlers.
#[derive(Clone, Copy, Debug)]
pub struct TurnContext<'a> {
    request: &'a Request,
    flow_state: FlowState,
}

impl<'a> TurnContext<'a> {
    pub fn new(request: &'a Request, flow_state: FlowState) -> Self {
        Self { request, flow_state }
    }

    pub fn session_id(&self) -> &'a str {
        &self.request.session_id
    }

    pub fn correlation_id(&self) -> &'a str {
        &self.request.correlation_id
    }

    pub fn intent(&self) -> &'a str {
        &self.request.intent
    }

    pub fn argument(&self, name: &str) -> Option<&'a Value> {
        self.request.arguments.get(name)
    }

    /// Deserializes an argument; absent arguments are `Ok(None)`.
    pub fn argument_as<T>(&self, name: &str) -> Result<Option<T>, HandlerError>
    where
        T: DeserializeOwned,
    {
        self.argument(name)
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|error| HandlerError::MalformedArgument {
                name: name.to_owned(),
                message: error.to_string(),
            })
    }

    pub fn session(&self) -> &'a SessionState {
        &self.request.session
    }

    pub fn session_value<T>(&self, key: &str) -> Result<Option<T>, HandlerError>
    where
        T: DeserializeOwned,
    {
        self.request.session.get_as(key).map_err(|error| HandlerError::SessionState {
            key: key.to_owned(),
            message: error.to_string(),
        })
    }

    pub fn contexts(&self) -> &'a ContextSet {
        &self.request.contexts
    }

    pub fn flow_state(&self) -> FlowState {
        self.flow_state
    }
}

/// What a handler wants done: ordered directives, session and context
/// deltas, and the flow event the turn represents.
#[derive(Clone, Debug, PartialEq)]
pub struct HandlerOutcome {
    pub event: FlowEvent,
    pub directives: Vec<ResponseDirective>,
    pub session_changes: Vec<SessionChange>,
    pub context_changes: Vec<ContextChange>,
}

impl HandlerOutcome {
    pub fn new(event: FlowEvent) -> Self {
        Self {
            event,
            directives: Vec::new(),
            session_changes: Vec::new(),
            context_changes: Vec::new(),
        }
    }

    pub fn prompt(mut self, response: impl Into<SimpleResponse>) -> Self {
        self.directives.push(ResponseDirective::SpeechPrompt(response.into()));
        self
    }

    pub fn suggest<I, S>(mut self, chips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directives.push(ResponseDirective::SuggestionChips {
            chips: chips.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn payload(mut self, payload: StructuredPayload) -> Self {
        self.directives.push(ResponseDirective::StructuredPayload { payload });
        self
    }

    pub fn close(mut self, message: impl Into<String>) -> Self {
        self.directives.push(ResponseDirective::SessionClose { message: message.into() });
        self
    }

    pub fn set_data<T>(mut self, key: impl Into<String>, value: &T) -> Result<Self, HandlerError>
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|error| HandlerError::SessionState {
            key: key.clone(),
            message: error.to_string(),
        })?;
        self.session_changes.push(SessionChange::Set { key, value });
        Ok(self)
    }

    pub fn set_context(mut self, name: impl Into<String>, lifespan: u32) -> Self {
        self.context_changes.push(ContextChange::Set(Context::new(name, lifespan)));
        self
    }

    pub fn clear_context(mut self, name: impl Into<String>) -> Self {
        self.context_changes.push(ContextChange::Clear { name: name.into() });
        self
    }

    pub fn closes_session(&self) -> bool {
        self.directives.iter().any(ResponseDirective::is_close)
    }

    /// Non-empty, with at most one close and nothing after it.
    pub fn validate(&self) -> Result<(), String> {
        if self.directives.is_empty() {
            return Err("outcome carries no directives".to_owned());
        }
        if let Some(position) = self.directives.iter().position(ResponseDirective::is_close) {
            if position + 1 != self.directives.len() {
                return Err(format!(
                    "directive `{}` follows the session close",
                    self.directives[position + 1].name()
                ));
            }
        }
        Ok(())
    }
}

/// Dispatch result: directives in handler order plus the state to hand back
/// to the platform.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub session_id: String,
    pub correlation_id: String,
    pub intent: String,
    pub directives: Vec<ResponseDirective>,
    pub session: SessionState,
    pub contexts: ContextSet,
    pub transition: Option<TransitionOutcome>,
}

impl Response {
    pub fn is_closed(&self) -> bool {
        self.directives.iter().any(ResponseDirective::is_close)
    }

    pub fn flow_state(&self) -> Option<FlowState> {
        self.transition.as_ref().map(|transition| transition.to)
    }
}
