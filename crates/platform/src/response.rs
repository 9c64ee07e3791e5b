use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use voicecart_core::conversation::{ResponseDirective, SimpleResponse, StructuredPayload};
use voicecart_core::domain::transaction::OrderUpdate;
use voicecart_core::Response;

use crate::payloads::{self, SystemIntent};
use crate::{SESSION_DATA_CONTEXT, SESSION_DATA_LIFESPAN};

const PLACEHOLDER_SPEECH: &str = "PLACEHOLDER";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("a response can carry only one system intent, found `{first}` and `{second}`")]
    MultipleSystemIntents { first: &'static str, second: &'static str },
    #[error("system intent `{0}` cannot be sent on a closing response")]
    SystemIntentOnClose(&'static str),
    #[error("could not serialize response payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub payload: PlatformPayload,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output_contexts: Vec<OutputContext>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlatformPayload {
    pub google: GooglePayload,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePayload {
    pub expect_user_response: bool,
    pub rich_response: RichResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_intent: Option<SystemIntent>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RichResponse {
    pub items: Vec<RichItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RichItem {
    SimpleResponse(SimpleResponseItem),
    StructuredResponse(StructuredResponseItem),
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleResponseItem {
    pub text_to_speech: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
}

impl From<SimpleResponse> for SimpleResponseItem {
    fn from(response: SimpleResponse) -> Self {
        Self { text_to_speech: response.speech, display_text: response.display_text }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResponseItem {
    pub order_update: OrderUpdate,
}

#[derive(Clone, Debug, Serialize)]
pub struct Suggestion {
    pub title: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputContext {
    pub name: String,
    pub lifespan_count: u32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
}

fn context_name(session_id: &str, name: &str) -> String {
    format!("{session_id}/contexts/{name}")
}

/// Renders a dispatcher response in the platform's reply envelope.
///
/// Directives keep their order. Payloads that need a system intent move to
/// `systemIntent`; if nothing else speaks, a `PLACEHOLDER` simple response
/// fills the mandatory first item. Only contexts the turn set or cleared are
/// sent back, so the platform keeps its own count for the rest.
pub fn encode_response(response: Response) -> Result<WebhookResponse, EncodeError> {
    let mut rich = RichResponse::default();
    let mut system_intent: Option<SystemIntent> = None;
    let mut expect_user_response = true;

    for directive in response.directives {
        match directive {
            ResponseDirective::SpeechPrompt(prompt) => {
                rich.items.push(RichItem::SimpleResponse(prompt.into()));
            }
            ResponseDirective::SuggestionChips { chips } => {
                rich.suggestions.extend(chips.into_iter().map(|title| Suggestion { title }));
            }
            ResponseDirective::StructuredPayload { payload } => match payload {
                StructuredPayload::OrderUpdate(update) => {
                    rich.items.push(RichItem::StructuredResponse(StructuredResponseItem {
                        order_update: *update,
                    }));
                }
                other => {
                    let Some(intent) = payloads::system_intent(&other)? else {
                        continue;
                    };
                    if let Some(first) = &system_intent {
                        return Err(EncodeError::MultipleSystemIntents {
                            first: first.intent,
                            second: intent.intent,
                        });
                    }
                    system_intent = Some(intent);
                }
            },
            ResponseDirective::SessionClose { message } => {
                expect_user_response = false;
                rich.items.push(RichItem::SimpleResponse(SimpleResponseItem {
                    text_to_speech: message,
                    display_text: None,
                }));
            }
        }
    }

    if let Some(intent) = &system_intent {
        if !expect_user_response {
            return Err(EncodeError::SystemIntentOnClose(intent.intent));
        }
        let has_speech = rich.items.iter().any(|item| matches!(item, RichItem::SimpleResponse(_)));
        if !has_speech {
            rich.items.insert(
                0,
                RichItem::SimpleResponse(SimpleResponseItem {
                    text_to_speech: PLACEHOLDER_SPEECH.to_owned(),
                    display_text: None,
                }),
            );
        }
    }

    let mut output_contexts: Vec<OutputContext> = response
        .contexts
        .changed()
        .map(|context| OutputContext {
            name: context_name(&response.session_id, &context.name),
            lifespan_count: context.lifespan,
            parameters: context.parameters.clone(),
        })
        .collect();
    let data = serde_json::to_string(&response.session)?;
    output_contexts.push(OutputContext {
        name: context_name(&response.session_id, SESSION_DATA_CONTEXT),
        lifespan_count: SESSION_DATA_LIFESPAN,
        parameters: BTreeMap::from([("data".to_owned(), Value::String(data))]),
    });

    tracing::debug!(
        event_name = "platform.response_encoded",
        correlation_id = %response.correlation_id,
        session_id = %response.session_id,
        intent = %response.intent,
        expect_user_response,
        system_intent = system_intent.as_ref().map_or("none", |intent| intent.intent),
        "encoded webhook response"
    );

    Ok(WebhookResponse {
        payload: PlatformPayload {
            google: GooglePayload { expect_user_response, rich_response: rich, system_intent },
        },
        output_contexts,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use voicecart_core::conversation::{
        Context, ContextSet, ResponseDirective, SessionState, SimpleResponse, StructuredPayload,
    };
    use voicecart_core::domain::transaction::DeliveryAddressRequest;
    use voicecart_core::Response;

    use super::{encode_response, EncodeError};

    fn response(directives: Vec<ResponseDirective>) -> Response {
        Response {
            session_id: "projects/demo/agent/sessions/s-1".to_owned(),
            correlation_id: "req-1".to_owned(),
            intent: "Delivery Address".to_owned(),
            directives,
            session: SessionState::new(),
            contexts: ContextSet::new(),
            transition: None,
        }
    }

    fn address_payload() -> ResponseDirective {
        ResponseDirective::StructuredPayload {
            payload: StructuredPayload::DeliveryAddress(DeliveryAddressRequest::with_reason(
                "To know where to send the order",
            )),
        }
    }

    #[test]
    fn lone_system_intent_gets_placeholder_prompt() {
        let encoded = encode_response(response(vec![address_payload()])).expect("encode");
        let value = serde_json::to_value(&encoded).expect("serialize");

        let google = &value["payload"]["google"];
        assert_eq!(google["expectUserResponse"], true);
        assert_eq!(google["richResponse"]["items"][0]["simpleResponse"]["textToSpeech"], "PLACEHOLDER");
        assert_eq!(google["systemIntent"]["intent"], "actions.intent.DELIVERY_ADDRESS");
    }

    #[test]
    fn prompts_and_chips_keep_their_order() {
        let encoded = encode_response(response(vec![
            ResponseDirective::SpeechPrompt(
                SimpleResponse::new("Hey there!").with_display_text("Hi there!"),
            ),
            ResponseDirective::SuggestionChips {
                chips: vec!["Merchant Transaction".to_owned(), "Google Pay Transaction".to_owned()],
            },
        ]))
        .expect("encode");
        let value = serde_json::to_value(&encoded).expect("serialize");
        let rich = &value["payload"]["google"]["richResponse"];

        assert_eq!(
            rich["items"][0]["simpleResponse"],
            json!({ "textToSpeech": "Hey there!", "displayText": "Hi there!" })
        );
        assert_eq!(
            rich["suggestions"],
            json!([{ "title": "Merchant Transaction" }, { "title": "Google Pay Transaction" }])
        );
        assert!(value["payload"]["google"].get("systemIntent").is_none());
    }

    #[test]
    fn close_stops_expecting_user_response() {
        let encoded = encode_response(response(vec![ResponseDirective::SessionClose {
            message: "Transaction failed.".to_owned(),
        }]))
        .expect("encode");

        assert!(!encoded.payload.google.expect_user_response);
        let value = serde_json::to_value(&encoded).expect("serialize");
        assert_eq!(
            value["payload"]["google"]["richResponse"]["items"][0]["simpleResponse"]["textToSpeech"],
            "Transaction failed."
        );
    }

    #[test]
    fn two_system_intents_are_rejected() {
        let error = encode_response(response(vec![address_payload(), address_payload()]))
            .expect_err("second system intent");

        assert!(matches!(error, EncodeError::MultipleSystemIntents { .. }));
    }

    #[test]
    fn contexts_and_session_data_become_output_contexts() {
        let mut contexts = ContextSet::new();
        contexts.set(Context::new("google_pay", 5));
        contexts.set(Context::new("merchant_pay", 5));
        contexts.clear("merchant_pay");
        let mut session = SessionState::new();
        session.insert("orderId", json!("abc"));

        let mut reply = response(vec![ResponseDirective::SpeechPrompt("ok".into())]);
        reply.contexts = contexts;
        reply.session = session;

        let value = serde_json::to_value(encode_response(reply).expect("encode")).expect("json");
        let contexts = value["outputContexts"].as_array().expect("contexts array");

        assert_eq!(contexts.len(), 3);
        assert_eq!(contexts[0]["name"], "projects/demo/agent/sessions/s-1/contexts/google_pay");
        assert_eq!(contexts[0]["lifespanCount"], 5);
        assert_eq!(contexts[1]["lifespanCount"], 0);
        assert_eq!(
            contexts[2]["name"],
            "projects/demo/agent/sessions/s-1/contexts/_actions_on_google"
        );
        assert_eq!(contexts[2]["lifespanCount"], 99);
        assert_eq!(contexts[2]["parameters"]["data"], "{\"orderId\":\"abc\"}");
    }

    #[test]
    fn contexts_received_from_the_platform_are_not_echoed() {
        let mut contexts = ContextSet::new();
        contexts.restore(Context::new("actions_capability_screen_output", 1));
        contexts.restore(Context::new("google_pay", 4));

        let mut reply = response(vec![ResponseDirective::SpeechPrompt("ok".into())]);
        reply.contexts = contexts;

        let value = serde_json::to_value(encode_response(reply).expect("encode")).expect("json");
        let contexts = value["outputContexts"].as_array().expect("contexts array");

        assert_eq!(contexts.len(), 1);
        assert_eq!(
            contexts[0]["name"],
            "projects/demo/agent/sessions/s-1/contexts/_actions_on_google"
        );
    }
}
