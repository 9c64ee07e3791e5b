use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which party collects the payment credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPath {
    Merchant,
    GooglePay,
}

impl PaymentPath {
    /// Conversation context that records the chosen path.
    pub fn context_name(&self) -> &'static str {
        match self {
            Self::Merchant => "merchant_pay",
            Self::GooglePay => "google_pay",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    PaymentCard,
    Bank,
    LoyaltyProgram,
    OnFulfillment,
    GiftCard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardNetwork {
    Visa,
    Amex,
    Discover,
    Mastercard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenizationType {
    PaymentGateway,
    Direct,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizationParameters {
    pub parameters: BTreeMap<String, String>,
    pub tokenization_type: TokenizationType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionProvidedPaymentOptions {
    pub payment_type: PaymentType,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleProvidedPaymentOptions {
    pub prepaid_card_disallowed: bool,
    pub supported_card_networks: Vec<CardNetwork>,
    pub tokenization_parameters: TokenizationParameters,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentOptions {
    ActionProvidedOptions(ActionProvidedPaymentOptions),
    GoogleProvidedOptions(GoogleProvidedPaymentOptions),
}

impl PaymentOptions {
    pub fn path(&self) -> PaymentPath {
        match self {
            Self::ActionProvidedOptions(_) => PaymentPath::Merchant,
            Self::GoogleProvidedOptions(_) => PaymentPath::GooglePay,
        }
    }
}
