use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::flows::states::{FlowEvent, FlowState, TransitionOutcome};

pub trait FlowDefinition: Send + Sync {
    fn initial_state(&self) -> FlowState;
    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Transaction checkout: payment path, requirements check, delivery address,
/// decision and order confirmation.
#[derive(Clone, Debug, Default)]
pub struct CheckoutFlow;

impl FlowDefinition for CheckoutFlow {
    fn initial_state(&self) -> FlowState {
        FlowState::Start
    }

    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_checkout(current, event)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> FlowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &FlowState,
        event: &FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }

    /// Lands on the event's target state without consulting the table.
    pub fn resync(&self, current: &FlowState, event: &FlowEvent) -> TransitionOutcome {
        TransitionOutcome { from: *current, to: event.landing_state(*current), event: *event }
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    audit
                        .event(
                            "flow.transition_applied",
                            AuditCategory::Flow,
                            AuditOutcome::Success,
                        )
                        .with_metadata("from", outcome.from.as_str())
                        .with_metadata("to", outcome.to.as_str())
                        .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    audit
                        .event(
                            "flow.transition_rejected",
                            AuditCategory::Flow,
                            AuditOutcome::Rejected,
                        )
                        .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<CheckoutFlow> {
    fn default() -> Self {
        Self::new(CheckoutFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: FlowState, event: FlowEvent },
}

pub fn is_permitted(current: &FlowState, event: &FlowEvent) -> bool {
    use FlowEvent::{
        AddressAccepted, AddressDeclined, AddressPrompted, DecisionDeclined, DecisionPrompted,
        DeliveryAddressUpdated, OrderAccepted, PaymentPathChosen, RequirementsMet,
        RequirementsRejected, Welcomed,
    };
    use FlowState::{
        AddressCollected, DecisionRequested, GooglePaySelected, MerchantPaySelected,
        RequirementsChecked, Start,
    };

    matches!(
        (current, event),
        (_, Welcomed)
            | (Start | MerchantPaySelected | GooglePaySelected, PaymentPathChosen(_))
            | (MerchantPaySelected | GooglePaySelected, RequirementsMet | RequirementsRejected)
            | (
                RequirementsChecked | AddressCollected,
                AddressPrompted | AddressAccepted | AddressDeclined | DecisionPrompted
            )
            | (DecisionRequested, OrderAccepted | DeliveryAddressUpdated | DecisionDeclined)
    )
}

fn transition_checkout(
    current: &FlowState,
    event: &FlowEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    if !is_permitted(current, event) {
        return Err(FlowTransitionError::InvalidTransition { state: *current, event: *event });
    }

    Ok(TransitionOutcome { from: *current, to: event.landing_state(*current), event: *event })
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditContext, InMemoryAuditSink};
    use crate::domain::payment::PaymentPath;
    use crate::flows::engine::{CheckoutFlow, FlowEngine, FlowTransitionError};
    use crate::flows::states::{FlowEvent, FlowState};

    #[test]
    fn checkout_happy_path_reaches_decision_resolved() {
        let engine = FlowEngine::new(CheckoutFlow);
        let mut state = engine.initial_state();

        for event in [
            FlowEvent::Welcomed,
            FlowEvent::PaymentPathChosen(PaymentPath::GooglePay),
            FlowEvent::RequirementsMet,
            FlowEvent::AddressPrompted,
            FlowEvent::AddressAccepted,
            FlowEvent::DecisionPrompted,
            FlowEvent::OrderAccepted,
        ] {
            state = engine.apply(&state, &event).expect("happy path transition").to;
        }

        assert_eq!(state, FlowState::DecisionResolved);
        assert!(state.is_terminal());
    }

    #[test]
    fn payment_path_selects_matching_state() {
        let engine = FlowEngine::default();

        let merchant = engine
            .apply(&FlowState::Start, &FlowEvent::PaymentPathChosen(PaymentPath::Merchant))
            .expect("start -> merchant");
        let google = engine
            .apply(&merchant.to, &FlowEvent::PaymentPathChosen(PaymentPath::GooglePay))
            .expect("merchant -> google");

        assert_eq!(merchant.to, FlowState::MerchantPaySelected);
        assert_eq!(google.to, FlowState::GooglePaySelected);
    }

    #[test]
    fn address_prompt_keeps_current_state() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(&FlowState::AddressCollected, &FlowEvent::AddressPrompted)
            .expect("re-prompt is allowed");

        assert_eq!(outcome.to, FlowState::AddressCollected);
    }

    #[test]
    fn delivery_address_update_loops_back_to_address_collection() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(&FlowState::DecisionRequested, &FlowEvent::DeliveryAddressUpdated)
            .expect("decision -> address collection");

        assert_eq!(outcome.to, FlowState::RequirementsChecked);
        let accepted = engine
            .apply(&outcome.to, &FlowEvent::AddressAccepted)
            .expect("address can be collected again");
        assert_eq!(accepted.to, FlowState::AddressCollected);
    }

    #[test]
    fn failure_events_close_the_session() {
        let engine = FlowEngine::default();
        let closed = engine
            .apply(&FlowState::MerchantPaySelected, &FlowEvent::RequirementsRejected)
            .expect("rejection is a valid transition");
        assert_eq!(closed.to, FlowState::Closed);

        let error = engine
            .apply(&closed.to, &FlowEvent::DecisionPrompted)
            .expect_err("closed sessions accept nothing but a welcome");
        assert!(matches!(
            error,
            FlowTransitionError::InvalidTransition {
                state: FlowState::Closed,
                event: FlowEvent::DecisionPrompted
            }
        ));

        let restarted =
            engine.apply(&closed.to, &FlowEvent::Welcomed).expect("welcome restarts the flow");
        assert_eq!(restarted.to, FlowState::Start);
    }

    #[test]
    fn out_of_order_event_is_rejected() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(&FlowState::Start, &FlowEvent::OrderAccepted)
            .expect_err("start cannot resolve an order");

        assert!(matches!(error, FlowTransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn resync_lands_on_event_target() {
        let engine = FlowEngine::default();
        let outcome = engine.resync(&FlowState::Start, &FlowEvent::DecisionPrompted);

        assert_eq!(outcome.from, FlowState::Start);
        assert_eq!(outcome.to, FlowState::DecisionRequested);
    }

    #[test]
    fn replay_is_deterministic_for_same_event_sequence() {
        let engine = FlowEngine::default();
        let events = [
            FlowEvent::PaymentPathChosen(PaymentPath::Merchant),
            FlowEvent::RequirementsMet,
            FlowEvent::DecisionPrompted,
            FlowEvent::DeliveryAddressUpdated,
            FlowEvent::AddressAccepted,
        ];

        let run = |engine: &FlowEngine<CheckoutFlow>| {
            let mut state = engine.initial_state();
            let mut visited = Vec::new();
            for event in &events {
                state = engine.apply(&state, event).expect("deterministic run").to;
                visited.push(state);
            }
            visited
        };

        assert_eq!(run(&engine), run(&engine));
    }

    #[test]
    fn flow_transition_emits_audit_event() {
        let engine = FlowEngine::default();
        let sink = InMemoryAuditSink::default();

        let _ = engine
            .apply_with_audit(
                &FlowState::Start,
                &FlowEvent::PaymentPathChosen(PaymentPath::Merchant),
                &sink,
                &AuditContext::new(
                    Some("projects/demo/agent/sessions/s-1".to_owned()),
                    Some("Transaction Merchant".to_owned()),
                    "req-42",
                    "flow-engine",
                ),
            )
            .expect("transition should succeed");
        let _ = engine.apply_with_audit(
            &FlowState::Start,
            &FlowEvent::OrderAccepted,
            &sink,
            &AuditContext::new(None, None, "req-43", "flow-engine"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].correlation_id, "req-42");
        assert_eq!(events[0].event_type, "flow.transition_applied");
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("merchant_pay_selected"));
        assert_eq!(events[1].event_type, "flow.transition_rejected");
    }
}
