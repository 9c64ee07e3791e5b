use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::payment::PaymentPath;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Start,
    MerchantPaySelected,
    GooglePaySelected,
    RequirementsChecked,
    AddressCollected,
    DecisionRequested,
    DecisionResolved,
    Closed,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::MerchantPaySelected => "merchant_pay_selected",
            Self::GooglePaySelected => "google_pay_selected",
            Self::RequirementsChecked => "requirements_checked",
            Self::AddressCollected => "address_collected",
            Self::DecisionRequested => "decision_requested",
            Self::DecisionResolved => "decision_resolved",
            Self::Closed => "closed",
        }
    }

    /// Terminal states end the session; only a fresh welcome leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::DecisionResolved | Self::Closed)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowEvent {
    Welcomed,
    PaymentPathChosen(PaymentPath),
    RequirementsMet,
    RequirementsRejected,
    AddressPrompted,
    AddressAccepted,
    AddressDeclined,
    DecisionPrompted,
    OrderAccepted,
    DeliveryAddressUpdated,
    DecisionDeclined,
}

impl FlowEvent {
    /// State a session lands in once this event is applied.
    pub fn landing_state(&self, current: FlowState) -> FlowState {
        match self {
            Self::Welcomed => FlowState::Start,
            Self::PaymentPathChosen(PaymentPath::Merchant) => FlowState::MerchantPaySelected,
            Self::PaymentPathChosen(PaymentPath::GooglePay) => FlowState::GooglePaySelected,
            Self::RequirementsMet | Self::DeliveryAddressUpdated => FlowState::RequirementsChecked,
            Self::AddressPrompted => current,
            Self::AddressAccepted => FlowState::AddressCollected,
            Self::DecisionPrompted => FlowState::DecisionRequested,
            Self::OrderAccepted => FlowState::DecisionResolved,
            Self::RequirementsRejected | Self::AddressDeclined | Self::DecisionDeclined => {
                FlowState::Closed
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FlowState,
    pub to: FlowState,
    pub event: FlowEvent,
}
