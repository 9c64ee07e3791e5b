use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order::Order;
use crate::domain::payment::PaymentOptions;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOptions {
    pub request_delivery_address: bool,
}

/// Asks the platform whether the user can complete a transaction at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequirements {
    pub order_options: OrderOptions,
    pub payment_options: PaymentOptions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressOptions {
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddressRequest {
    pub address_options: AddressOptions,
}

impl DeliveryAddressRequest {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self { address_options: AddressOptions { reason: reason.into() } }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDecision {
    pub order_options: OrderOptions,
    pub payment_options: PaymentOptions,
    pub proposed_order: Order,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStateCode {
    Created,
    Confirmed,
    Rejected,
    Cancelled,
    InTransit,
    Fulfilled,
    Returned,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderState {
    pub label: String,
    pub state: OrderStateCode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub confirmed_action_order_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenUrlAction {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub open_url_action: OpenUrlAction,
    pub title: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderActionType {
    CustomerService,
    Modify,
    Cancel,
    Reorder,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderManagementAction {
    pub button: Button,
    #[serde(rename = "type")]
    pub action_type: OrderActionType,
}

impl OrderManagementAction {
    pub fn customer_service(url: impl Into<String>) -> Self {
        Self {
            button: Button {
                open_url_action: OpenUrlAction { url: url.into() },
                title: "Customer Service".to_owned(),
            },
            action_type: OrderActionType::CustomerService,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotification {
    pub text: String,
    pub title: String,
}

/// Status update pushed to the user once the order is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub action_order_id: String,
    pub order_state: OrderState,
    pub line_item_updates: BTreeMap<String, serde_json::Value>,
    pub update_time: DateTime<Utc>,
    pub receipt: Receipt,
    pub order_management_actions: Vec<OrderManagementAction>,
    pub user_notification: UserNotification,
}

impl OrderUpdate {
    /// `CREATED` update for an accepted order. `action_order_id` is the id the
    /// platform echoed back; `confirmed_id` is the one this service issued.
    pub fn created(
        action_order_id: impl Into<String>,
        confirmed_id: impl Into<String>,
        customer_service_url: impl Into<String>,
        update_time: DateTime<Utc>,
    ) -> Self {
        Self {
            action_order_id: action_order_id.into(),
            order_state: OrderState {
                label: "Order created".to_owned(),
                state: OrderStateCode::Created,
            },
            line_item_updates: BTreeMap::new(),
            update_time,
            receipt: Receipt { confirmed_action_order_id: confirmed_id.into() },
            order_management_actions: vec![OrderManagementAction::customer_service(
                customer_service_url,
            )],
            user_notification: UserNotification {
                text: "Notification text.".to_owned(),
                title: "Notification Title".to_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{DeliveryAddressRequest, OrderStateCode, OrderUpdate};

    #[test]
    fn created_update_serializes_platform_field_names() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid timestamp");
        let update =
            OrderUpdate::created("final-1", "issued-1", "http://example.com/customer-service", at);
        let value = serde_json::to_value(&update).expect("serialize");

        assert_eq!(update.order_state.state, OrderStateCode::Created);
        assert_eq!(value["actionOrderId"], "final-1");
        assert_eq!(value["receipt"]["confirmedActionOrderId"], "issued-1");
        assert_eq!(value["orderState"]["state"], "CREATED");
        assert_eq!(value["orderManagementActions"][0]["type"], "CUSTOMER_SERVICE");
        assert_eq!(
            value["orderManagementActions"][0]["button"]["openUrlAction"]["url"],
            "http://example.com/customer-service"
        );
        assert_eq!(value["updateTime"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn delivery_address_request_carries_reason() {
        let value =
            serde_json::to_value(DeliveryAddressRequest::with_reason("To ship")).expect("serialize");
        assert_eq!(value["addressOptions"]["reason"], "To ship");
    }
}
