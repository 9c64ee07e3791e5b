use serde::Deserialize;
use voicecart_core::conversation::StructuredPayload;
use voicecart_core::domain::location::Location;
use voicecart_core::domain::transaction::DeliveryAddressRequest;
use voicecart_core::{FlowEvent, HandlerError, HandlerOutcome, TurnContext};
use voicecart_platform::payloads::arguments::DELIVERY_ADDRESS_VALUE;

use crate::intents::session_keys;

pub const ADDRESS_REASON: &str = "To know where to send the order";
pub const ADDRESS_ACCEPTED_PROMPT: &str =
    "Great, got your address! Now say \"confirm transaction\".";
pub const ADDRESS_FAILED: &str = "I failed to get your delivery address.";

pub fn address_request() -> StructuredPayload {
    StructuredPayload::DeliveryAddress(DeliveryAddressRequest::with_reason(ADDRESS_REASON))
}

pub fn delivery_address(_turn: &TurnContext<'_>) -> Result<HandlerOutcome, HandlerError> {
    Ok(HandlerOutcome::new(FlowEvent::AddressPrompted).payload(address_request()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryAddressValue {
    #[serde(default)]
    user_decision: Option<String>,
    #[serde(default)]
    location: Option<Location>,
}

pub fn delivery_address_complete(turn: &TurnContext<'_>) -> Result<HandlerOutcome, HandlerError> {
    let DeliveryAddressValue { user_decision, location } = turn
        .argument_as::<DeliveryAddressValue>(DELIVERY_ADDRESS_VALUE)
        .unwrap_or_default()
        .unwrap_or_default();
    let location = match (user_decision.as_deref(), location) {
        (Some("ACCEPTED"), Some(location)) => location,
        (decision, _) => {
            tracing::info!(
                event_name = "fulfillment.delivery_address_declined",
                correlation_id = %turn.correlation_id(),
                session_id = %turn.session_id(),
                user_decision = decision.unwrap_or("unreadable"),
                "delivery address not collected"
            );
            return Ok(HandlerOutcome::new(FlowEvent::AddressDeclined).close(ADDRESS_FAILED));
        }
    };

    tracing::info!(
        event_name = "fulfillment.delivery_address_received",
        correlation_id = %turn.correlation_id(),
        session_id = %turn.session_id(),
        address_line = location.first_address_line().unwrap_or("unknown"),
        "delivery address accepted"
    );

    HandlerOutcome::new(FlowEvent::AddressAccepted)
        .set_data(session_keys::DELIVERY_ADDRESS, &location)
        .map(|outcome| outcome.prompt(ADDRESS_ACCEPTED_PROMPT).suggest(["Confirm Transaction"]))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use voicecart_core::conversation::{ResponseDirective, SessionChange};
    use voicecart_core::flows::FlowState;
    use voicecart_core::{FlowEvent, HandlerError, HandlerOutcome, Request, TurnContext};

    use super::{delivery_address, delivery_address_complete, ADDRESS_FAILED};

    fn complete(argument: Option<serde_json::Value>) -> Result<HandlerOutcome, HandlerError> {
        let mut request = Request::new("s-1", "Delivery Address Complete");
        if let Some(argument) = argument {
            request = request.with_argument("DELIVERY_ADDRESS_VALUE", argument);
        }
        delivery_address_complete(&TurnContext::new(&request, FlowState::RequirementsChecked))
    }

    #[test]
    fn address_prompt_is_a_single_payload() {
        let request = Request::new("s-1", "Delivery Address");
        let outcome = delivery_address(&TurnContext::new(&request, FlowState::RequirementsChecked))
            .expect("prompt");

        assert_eq!(outcome.event, FlowEvent::AddressPrompted);
        assert_eq!(outcome.directives.len(), 1);
    }

    #[test]
    fn accepted_address_is_stored() {
        let outcome = complete(Some(json!({
            "userDecision": "ACCEPTED",
            "location": { "postalAddress": { "addressLines": ["1 Main St"], "postalCode": "94043" } }
        })))
        .expect("accepted");

        assert_eq!(outcome.event, FlowEvent::AddressAccepted);
        assert!(matches!(
            &outcome.session_changes[0],
            SessionChange::Set { key, value } if key == "deliveryAddress"
                && value["postalAddress"]["postalCode"] == "94043"
        ));
        assert!(!outcome.closes_session());
    }

    #[test]
    fn rejected_or_missing_decision_closes() {
        for argument in [
            Some(json!({ "userDecision": "REJECTED" })),
            None,
            Some(json!({ "userDecision": 5 })),
            Some(json!("ACCEPTED")),
            Some(json!({ "userDecision": "ACCEPTED" })),
            Some(json!({ "userDecision": "ACCEPTED", "location": "1 Main St" })),
        ] {
            let outcome = complete(argument).expect("decline");

            assert_eq!(outcome.event, FlowEvent::AddressDeclined);
            assert_eq!(
                outcome.directives,
                vec![ResponseDirective::SessionClose { message: ADDRESS_FAILED.to_owned() }]
            );
        }
    }
}
