//! Intent display names as configured in the conversational agent.

pub const WELCOME: &str = "Default Welcome Intent";
pub const TRANSACTION_MERCHANT: &str = "Transaction Merchant";
pub const TRANSACTION_GOOGLE: &str = "Transaction Google";
pub const TRANSACTION_CHECK_COMPLETE: &str = "Transaction Check Complete";
pub const DELIVERY_ADDRESS: &str = "Delivery Address";
pub const DELIVERY_ADDRESS_COMPLETE: &str = "Delivery Address Complete";
pub const TRANSACTION_DECISION: &str = "Transaction Decision";
pub const TRANSACTION_DECISION_COMPLETE: &str = "Transaction Decision Complete";

pub const ALL: [&str; 8] = [
    WELCOME,
    TRANSACTION_MERCHANT,
    TRANSACTION_GOOGLE,
    TRANSACTION_CHECK_COMPLETE,
    DELIVERY_ADDRESS,
    DELIVERY_ADDRESS_COMPLETE,
    TRANSACTION_DECISION,
    TRANSACTION_DECISION_COMPLETE,
];

/// Session keys written by the transaction handlers.
pub mod session_keys {
    pub const ORDER_ID: &str = "orderId";
    pub const DELIVERY_ADDRESS: &str = "deliveryAddress";
}
