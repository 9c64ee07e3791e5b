use serde::Serialize;
use voicecart_core::domain::transaction::{
    DeliveryAddressRequest, TransactionDecision, TransactionRequirements,
};
use voicecart_core::StructuredPayload;

pub const TRANSACTION_REQUIREMENTS_CHECK_INTENT: &str =
    "actions.intent.TRANSACTION_REQUIREMENTS_CHECK";
pub const DELIVERY_ADDRESS_INTENT: &str = "actions.intent.DELIVERY_ADDRESS";
pub const TRANSACTION_DECISION_INTENT: &str = "actions.intent.TRANSACTION_DECISION";

pub const TRANSACTION_REQUIREMENTS_CHECK_SPEC: &str =
    "type.googleapis.com/google.actions.v2.TransactionRequirementsCheckSpec";
pub const DELIVERY_ADDRESS_VALUE_SPEC: &str =
    "type.googleapis.com/google.actions.v2.DeliveryAddressValueSpec";
pub const TRANSACTION_DECISION_VALUE_SPEC: &str =
    "type.googleapis.com/google.actions.v2.TransactionDecisionValueSpec";

/// Argument names the platform uses for system intent results.
pub mod arguments {
    pub const TRANSACTION_REQUIREMENTS_CHECK_RESULT: &str =
        "TRANSACTION_REQUIREMENTS_CHECK_RESULT";
    pub const DELIVERY_ADDRESS_VALUE: &str = "DELIVERY_ADDRESS_VALUE";
    pub const TRANSACTION_DECISION_VALUE: &str = "TRANSACTION_DECISION_VALUE";
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemIntent {
    pub intent: &'static str,
    pub data: serde_json::Value,
}

#[derive(Serialize)]
struct TypedSpec<'a, T> {
    #[serde(rename = "@type")]
    type_url: &'static str,
    #[serde(flatten)]
    spec: &'a T,
}

fn typed_spec<T>(type_url: &'static str, spec: &T) -> Result<serde_json::Value, serde_json::Error>
where
    T: Serialize,
{
    serde_json::to_value(TypedSpec { type_url, spec })
}

pub fn requirements_check(
    requirements: &TransactionRequirements,
) -> Result<SystemIntent, serde_json::Error> {
    Ok(SystemIntent {
        intent: TRANSACTION_REQUIREMENTS_CHECK_INTENT,
        data: typed_spec(TRANSACTION_REQUIREMENTS_CHECK_SPEC, requirements)?,
    })
}

pub fn delivery_address(
    request: &DeliveryAddressRequest,
) -> Result<SystemIntent, serde_json::Error> {
    Ok(SystemIntent {
        intent: DELIVERY_ADDRESS_INTENT,
        data: typed_spec(DELIVERY_ADDRESS_VALUE_SPEC, request)?,
    })
}

pub fn transaction_decision(
    decision: &TransactionDecision,
) -> Result<SystemIntent, serde_json::Error> {
    Ok(SystemIntent {
        intent: TRANSACTION_DECISION_INTENT,
        data: typed_spec(TRANSACTION_DECISION_VALUE_SPEC, decision)?,
    })
}

/// System intent for a payload, or `None` for payloads rendered inline.
pub fn system_intent(
    payload: &StructuredPayload,
) -> Result<Option<SystemIntent>, serde_json::Error> {
    match payload {
        StructuredPayload::TransactionRequirements(requirements) => {
            requirements_check(requirements).map(Some)
        }
        StructuredPayload::DeliveryAddress(request) => delivery_address(request).map(Some),
        StructuredPayload::TransactionDecision(decision) => {
            transaction_decision(decision).map(Some)
        }
        StructuredPayload::OrderUpdate(_) => Ok(None),
    }
}
