use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::location::Location;
use crate::domain::money::{Money, Price};
use crate::domain::order_id::OrderId;
use crate::errors::DomainError;

pub const GENERIC_EXTENSION_TYPE: &str =
    "type.googleapis.com/google.actions.v2.orders.GenericExtension";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineItemType {
    Regular,
    Tax,
    Subtotal,
    Discount,
    Fee,
    Delivery,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubLine {
    Note(String),
    LineItem(Box<LineItem>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    pub id: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_lines: Vec<SubLine>,
    #[serde(rename = "type")]
    pub item_type: LineItemType,
}

impl LineItem {
    pub fn regular(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            price,
            quantity: Some(1),
            sub_lines: Vec::new(),
            item_type: LineItemType::Regular,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.sub_lines.push(SubLine::Note(note.into()));
        self
    }

    pub fn with_sub_item(mut self, item: LineItem) -> Self {
        self.sub_lines.push(SubLine::LineItem(Box::new(item)));
        self
    }

    fn extended_amount(&self) -> Decimal {
        self.price.amount.to_decimal() * Decimal::from(self.quantity.unwrap_or(1))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub merchant: Merchant,
    pub line_items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub other_items: Vec<LineItem>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderLocationType {
    Delivery,
    Business,
    Origin,
    Destination,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLocation {
    #[serde(rename = "type")]
    pub location_type: OrderLocationType,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExtension {
    #[serde(rename = "@type")]
    pub type_url: String,
    pub locations: Vec<OrderLocation>,
}

/// A proposed order. Built once per transaction and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub cart: Cart,
    pub other_items: Vec<LineItem>,
    pub total_price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<OrderExtension>,
}

impl Order {
    /// Prices the cart: subtotal is the sum of top-level line items (sub-line
    /// items are informational), total is subtotal plus `tax`.
    pub fn build(
        id: OrderId,
        cart: Cart,
        tax: Money,
        delivery: Option<&Location>,
    ) -> Result<Self, DomainError> {
        let Some(first) = cart.line_items.first() else {
            return Err(DomainError::InvariantViolation(
                "an order needs at least one line item".to_owned(),
            ));
        };
        let currency = first.price.amount.currency_code.clone();

        let mut subtotal = Decimal::ZERO;
        for item in &cart.line_items {
            ensure_currency(&currency, &item.price.amount)?;
            subtotal += item.extended_amount();
        }
        ensure_currency(&currency, &tax)?;
        let total = subtotal + tax.to_decimal();

        let other_items = vec![
            LineItem {
                name: "Subtotal".to_owned(),
                id: "subtotal".to_owned(),
                price: Price::estimate(Money::from_decimal(currency.clone(), subtotal)?),
                quantity: None,
                sub_lines: Vec::new(),
                item_type: LineItemType::Subtotal,
            },
            LineItem {
                name: "Tax".to_owned(),
                id: "tax".to_owned(),
                price: Price::estimate(tax),
                quantity: None,
                sub_lines: Vec::new(),
                item_type: LineItemType::Tax,
            },
        ];

        let extension = delivery.map(|location| OrderExtension {
            type_url: GENERIC_EXTENSION_TYPE.to_owned(),
            locations: vec![OrderLocation {
                location_type: OrderLocationType::Delivery,
                location: location.postal_only(),
            }],
        });

        Ok(Self {
            id,
            cart,
            other_items,
            total_price: Price::estimate(Money::from_decimal(currency, total)?),
            extension,
        })
    }

    pub fn subtotal(&self) -> Option<&Price> {
        self.other_items
            .iter()
            .find(|item| item.item_type == LineItemType::Subtotal)
            .map(|item| &item.price)
    }
}

fn ensure_currency(expected: &str, amount: &Money) -> Result<(), DomainError> {
    if amount.currency_code == expected {
        return Ok(());
    }
    Err(DomainError::CurrencyMismatch {
        expected: expected.to_owned(),
        found: amount.currency_code.clone(),
    })
}
