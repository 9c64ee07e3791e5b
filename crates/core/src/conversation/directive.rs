use serde::{Deserialize, Serialize};

use crate::domain::transaction::{
    DeliveryAddressRequest, OrderUpdate, TransactionDecision, TransactionRequirements,
};

/// Spoken text with optional different on-screen text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleResponse {
    pub speech: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
}

impl SimpleResponse {
    pub fn new(speech: impl Into<String>) -> Self {
        Self { speech: speech.into(), display_text: None }
    }

    pub fn with_display_text(mut self, text: impl Into<String>) -> Self {
        self.display_text = Some(text.into());
        self
    }
}

impl From<&str> for SimpleResponse {
    fn from(speech: &str) -> Self {
        Self::new(speech)
    }
}

impl From<String> for SimpleResponse {
    fn from(speech: String) -> Self {
        Self::new(speech)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StructuredPayload {
    TransactionRequirements(TransactionRequirements),
    DeliveryAddress(DeliveryAddressRequest),
    TransactionDecision(Box<TransactionDecision>),
    OrderUpdate(Box<OrderUpdate>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseDirective {
    SpeechPrompt(SimpleResponse),
    SuggestionChips { chips: Vec<String> },
    StructuredPayload { payload: StructuredPayload },
    SessionClose { message: String },
}

impl ResponseDirective {
    pub fn is_close(&self) -> bool {
        matches!(self, Self::SessionClose { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SpeechPrompt(_) => "speech_prompt",
            Self::SuggestionChips { .. } => "suggestion_chips",
            Self::StructuredPayload { .. } => "structured_payload",
            Self::SessionClose { .. } => "session_close",
        }
    }
}
