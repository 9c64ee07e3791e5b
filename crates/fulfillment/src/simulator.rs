use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use voicecart_core::conversation::{ContextSet, ResponseDirective, SessionState};
use voicecart_core::domain::payment::PaymentPath;
use voicecart_core::flows::FlowState;
use voicecart_core::Request;
use voicecart_platform::encode_response;
use voicecart_platform::payloads::arguments::{
    DELIVERY_ADDRESS_VALUE, TRANSACTION_DECISION_VALUE, TRANSACTION_REQUIREMENTS_CHECK_RESULT,
};

use crate::intents::{self, session_keys};
use crate::service::{FulfillmentService, ServiceError};

/// One user turn of a scripted conversation.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedTurn {
    pub intent: &'static str,
    pub arguments: BTreeMap<String, Value>,
    /// Echo the issued order id back as `order.finalOrder.id`, the way the
    /// platform does after the user confirms.
    pub echo_order_id: bool,
}

impl ScriptedTurn {
    pub fn new(intent: &'static str) -> Self {
        Self { intent, arguments: BTreeMap::new(), echo_order_id: false }
    }

    pub fn with_argument(mut self, name: &str, value: Value) -> Self {
        self.arguments.insert(name.to_owned(), value);
        self
    }
}

/// The full demo transaction, optionally through Google Pay and optionally
/// declining the delivery address.
pub fn scripted_transaction(path: PaymentPath, accept_address: bool) -> Vec<ScriptedTurn> {
    let payment_intent = match path {
        PaymentPath::Merchant => intents::TRANSACTION_MERCHANT,
        PaymentPath::GooglePay => intents::TRANSACTION_GOOGLE,
    };
    let address = if accept_address {
        json!({
            "userDecision": "ACCEPTED",
            "location": {
                "postalAddress": {
                    "regionCode": "US",
                    "postalCode": "94043",
                    "administrativeArea": "CA",
                    "locality": "Mountain View",
                    "addressLines": ["1600 Amphitheatre Parkway"],
                    "recipients": ["Jane Doe"]
                },
                "phoneNumber": "+1 650-253-0000"
            }
        })
    } else {
        json!({ "userDecision": "REJECTED" })
    };

    let mut turns = vec![
        ScriptedTurn::new(intents::WELCOME),
        ScriptedTurn::new(payment_intent),
        ScriptedTurn::new(intents::TRANSACTION_CHECK_COMPLETE)
            .with_argument(TRANSACTION_REQUIREMENTS_CHECK_RESULT, json!({ "resultType": "OK" })),
        ScriptedTurn::new(intents::DELIVERY_ADDRESS),
        ScriptedTurn::new(intents::DELIVERY_ADDRESS_COMPLETE)
            .with_argument(DELIVERY_ADDRESS_VALUE, address),
    ];
    if accept_address {
        turns.push(ScriptedTurn::new(intents::TRANSACTION_DECISION));
        let mut confirm = ScriptedTurn::new(intents::TRANSACTION_DECISION_COMPLETE)
            .with_argument(TRANSACTION_DECISION_VALUE, json!({ "userDecision": "ORDER_ACCEPTED" }));
        confirm.echo_order_id = true;
        turns.push(confirm);
    }
    turns
}

/// What one simulated turn produced.
#[derive(Clone, Debug, Serialize)]
pub struct SimulatedTurn {
    pub turn: usize,
    pub intent: String,
    pub flow_state: Option<FlowState>,
    pub closed: bool,
    pub directives: Vec<ResponseDirective>,
    pub webhook: Value,
}

/// Plays the platform's part in-process: carries session data and contexts
/// from one turn to the next and ages context lifespans in between.
pub struct ConversationSimulator<'a> {
    service: &'a FulfillmentService,
    session_id: String,
    session: SessionState,
    contexts: ContextSet,
    turns: usize,
}

impl<'a> ConversationSimulator<'a> {
    pub fn new(service: &'a FulfillmentService, session_id: impl Into<String>) -> Self {
        Self {
            service,
            session_id: session_id.into(),
            session: SessionState::new(),
            contexts: ContextSet::new(),
            turns: 0,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn contexts(&self) -> &ContextSet {
        &self.contexts
    }

    pub fn play(&mut self, turn: &ScriptedTurn) -> Result<SimulatedTurn, ServiceError> {
        let mut arguments = turn.arguments.clone();
        if turn.echo_order_id {
            if let Some(order_id) = self.session.get(session_keys::ORDER_ID).cloned() {
                let decision = arguments
                    .entry(TRANSACTION_DECISION_VALUE.to_owned())
                    .or_insert_with(|| json!({}));
                if let Some(fields) = decision.as_object_mut() {
                    fields.insert("order".to_owned(), json!({ "finalOrder": { "id": order_id } }));
                }
            }
        }

        self.turns += 1;
        let mut request = Request::new(self.session_id.clone(), turn.intent)
            .with_session(self.session.clone())
            .with_contexts(self.contexts.clone())
            .with_correlation_id(format!("simulated-{}", self.turns));
        request.arguments = arguments;

        let response = self.service.handle(request)?;
        let webhook = serde_json::to_value(encode_response(response.clone())?)
            .map_err(|error| ServiceError::Encode(error.into()))?;

        self.session = response.session.clone();
        self.contexts = response.contexts.clone();
        self.contexts.advance_turn();

        Ok(SimulatedTurn {
            turn: self.turns,
            intent: response.intent.clone(),
            flow_state: response.flow_state(),
            closed: response.is_closed(),
            directives: response.directives,
            webhook,
        })
    }

    /// Plays turns until the script ends or a response closes the session.
    pub fn run(&mut self, script: &[ScriptedTurn]) -> Result<Vec<SimulatedTurn>, ServiceError> {
        let mut played = Vec::with_capacity(script.len());
        for turn in script {
            let result = self.play(turn)?;
            let closed = result.closed;
            played.push(result);
            if closed {
                break;
            }
        }
        Ok(played)
    }
}
