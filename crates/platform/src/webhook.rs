use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use voicecart_core::conversation::{Context, ContextSet, SessionState};
use voicecart_core::Request;

use crate::SESSION_DATA_CONTEXT;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("webhook body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("webhook request is missing `{0}`")]
    MissingField(&'static str),
    #[error("session data in `_actions_on_google` is unreadable: {0}")]
    InvalidSessionData(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default)]
    pub response_id: Option<String>,
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub query_result: QueryResult,
    #[serde(default)]
    pub original_detect_intent_request: Option<OriginalDetectIntentRequest>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub intent: Option<IntentRef>,
    #[serde(default)]
    pub output_contexts: Vec<WireContext>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireContext {
    pub name: String,
    #[serde(default)]
    pub lifespan_count: Option<u32>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl WireContext {
    /// Short name: whatever follows `/contexts/` in the full resource name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit_once("/contexts/").map_or(self.name.as_str(), |(_, short)| short)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalDetectIntentRequest {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub payload: AssistantPayload,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AssistantPayload {
    #[serde(default)]
    pub inputs: Vec<AssistantInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantInput {
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    pub name: String,
    #[serde(default)]
    pub extension: Option<Value>,
    #[serde(default)]
    pub structured_value: Option<Value>,
    #[serde(default)]
    pub text_value: Option<String>,
    #[serde(default)]
    pub bool_value: Option<bool>,
    #[serde(default)]
    pub datetime_value: Option<Value>,
    #[serde(default)]
    pub raw_text: Option<String>,
}

impl Argument {
    /// The first populated value, richest representation first.
    pub fn value(&self) -> Option<Value> {
        self.extension
            .clone()
            .or_else(|| self.structured_value.clone())
            .or_else(|| self.text_value.clone().map(Value::String))
            .or_else(|| self.bool_value.map(Value::Bool))
            .or_else(|| self.datetime_value.clone())
            .or_else(|| self.raw_text.clone().map(Value::String))
    }
}

impl WebhookRequest {
    pub fn into_request(self) -> Result<Request, DecodeError> {
        if self.session.trim().is_empty() {
            return Err(DecodeError::MissingField("session"));
        }
        let intent = self
            .query_result
            .intent
            .as_ref()
            .map(|intent| intent.display_name.trim())
            .filter(|name| !name.is_empty())
            .ok_or(DecodeError::MissingField("queryResult.intent.displayName"))?
            .to_owned();

        let mut session = SessionState::new();
        let mut contexts = ContextSet::new();
        for wire in &self.query_result.output_contexts {
            if wire.short_name() == SESSION_DATA_CONTEXT {
                session = session_data(wire)?;
                continue;
            }
            // An explicit zero means the platform already expired it.
            let lifespan = wire.lifespan_count.unwrap_or(1);
            if lifespan == 0 {
                continue;
            }
            let mut context = Context::new(wire.short_name(), lifespan);
            context.parameters = wire.parameters.clone();
            contexts.restore(context);
        }

        let mut request = Request::new(self.session, intent)
            .with_session(session)
            .with_contexts(contexts);
        if let Some(response_id) = self.response_id.filter(|id| !id.is_empty()) {
            request = request.with_correlation_id(response_id);
        }

        let inputs = self
            .original_detect_intent_request
            .map(|original| original.payload.inputs)
            .unwrap_or_default();
        for argument in inputs.iter().flat_map(|input| input.arguments.iter()) {
            if let Some(value) = argument.value() {
                request.arguments.insert(argument.name.clone(), value);
            }
        }

        Ok(request)
    }
}

fn session_data(context: &WireContext) -> Result<SessionState, DecodeError> {
    match context.parameters.get("data") {
        None | Some(Value::Null) => Ok(SessionState::new()),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(SessionState::new()),
        Some(Value::String(raw)) => serde_json::from_str(raw)
            .map_err(|error| DecodeError::InvalidSessionData(error.to_string())),
        Some(object @ Value::Object(_)) => serde_json::from_value(object.clone())
            .map_err(|error| DecodeError::InvalidSessionData(error.to_string())),
        Some(other) => Err(DecodeError::InvalidSessionData(format!(
            "expected a JSON object or string, found {other}"
        ))),
    }
}

/// Parses a raw webhook body into a dispatcher request.
pub fn decode_request(body: &[u8]) -> Result<Request, DecodeError> {
    let webhook: WebhookRequest = serde_json::from_slice(body)?;
    let request = webhook.into_request()?;
    tracing::debug!(
        event_name = "platform.request_decoded",
        correlation_id = %request.correlation_id,
        session_id = %request.session_id,
        intent = %request.intent,
        arguments = request.arguments.len(),
        contexts = request.contexts.active().count(),
        "decoded webhook request"
    );
    Ok(request)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_request, DecodeError};

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).expect("serialize body")
    }

    #[test]
    fn argument_value_prefers_extension_over_raw_text() {
        let request = decode_request(&body(json!({
            "session": "projects/demo/agent/sessions/s-1",
            "queryResult": { "intent": { "displayName": "Transaction Check Complete" } },
            "originalDetectIntentRequest": { "payload": { "inputs": [{
                "arguments": [
                    {
                        "name": "TRANSACTION_REQUIREMENTS_CHECK_RESULT",
                        "extension": { "resultType": "OK" },
                        "rawText": "ignored"
                    },
                    { "name": "text", "rawText": "hello" },
                    { "name": "flag", "boolValue": true, "rawText": "yes" }
                ]
            }]}}
        })))
        .expect("decode");

        assert_eq!(
            request.arguments.get("TRANSACTION_REQUIREMENTS_CHECK_RESULT"),
            Some(&json!({ "resultType": "OK" }))
        );
        assert_eq!(request.arguments.get("text"), Some(&json!("hello")));
        assert_eq!(request.arguments.get("flag"), Some(&json!(true)));
    }

    #[test]
    fn context_lifespans_follow_platform_counts() {
        let request = decode_request(&body(json!({
            "session": "projects/demo/agent/sessions/s-1",
            "queryResult": {
                "intent": { "displayName": "Transaction Decision" },
                "outputContexts": [
                    { "name": "projects/demo/agent/sessions/s-1/contexts/google_pay", "lifespanCount": 3 },
                    { "name": "projects/demo/agent/sessions/s-1/contexts/merchant_pay", "lifespanCount": 0 },
                    { "name": "projects/demo/agent/sessions/s-1/contexts/no_count" }
                ]
            }
        })))
        .expect("decode");

        assert_eq!(request.contexts.get("google_pay").map(|context| context.lifespan), Some(3));
        assert!(!request.contexts.is_active("merchant_pay"));
        assert_eq!(request.contexts.get("no_count").map(|context| context.lifespan), Some(1));
    }

    #[test]
    fn session_data_is_read_from_reserved_context() {
        let request = decode_request(&body(json!({
            "session": "projects/demo/agent/sessions/s-1",
            "queryResult": {
                "intent": { "displayName": "Transaction Decision Complete" },
                "outputContexts": [{
                    "name": "projects/demo/agent/sessions/s-1/contexts/_actions_on_google",
                    "lifespanCount": 98,
                    "parameters": { "data": "{\"orderId\":\"abc\",\"flowState\":\"decision_requested\"}" }
                }]
            }
        })))
        .expect("decode");

        assert_eq!(request.session.get("orderId"), Some(&json!("abc")));
        assert!(!request.contexts.is_active("_actions_on_google"));
    }

    #[test]
    fn missing_intent_is_rejected() {
        let error = decode_request(&body(json!({
            "session": "projects/demo/agent/sessions/s-1",
            "queryResult": {}
        })))
        .expect_err("intent is required");

        assert!(matches!(error, DecodeError::MissingField("queryResult.intent.displayName")));
    }

    #[test]
    fn garbage_body_is_invalid_json() {
        let error = decode_request(b"not json").expect_err("invalid json");
        assert!(matches!(error, DecodeError::InvalidJson(_)));
    }

    #[test]
    fn session_data_must_be_an_object() {
        let error = decode_request(&body(json!({
            "session": "projects/demo/agent/sessions/s-1",
            "queryResult": {
                "intent": { "displayName": "Default Welcome Intent" },
                "outputContexts": [{
                    "name": "projects/demo/agent/sessions/s-1/contexts/_actions_on_google",
                    "parameters": { "data": 42 }
                }]
            }
        })))
        .expect_err("numeric session data");

        assert!(matches!(error, DecodeError::InvalidSessionData(_)));
    }
}
