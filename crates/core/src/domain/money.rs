use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

const NANOS_PER_UNIT: i64 = 1_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub currency_code: String,
    pub units: i64,
    pub nanos: i32,
}

impl Money {
    pub fn new(currency_code: impl Into<String>, units: i64, nanos: i32) -> Self {
        Self { currency_code: currency_code.into(), units, nanos }
    }

    /// Splits a decimal amount into whole units and nanos. The amount is
    /// rounded to nine fractional digits first, so a carry lands in `units`.
    pub fn from_decimal(
        currency_code: impl Into<String>,
        amount: Decimal,
    ) -> Result<Self, DomainError> {
        let amount = amount.round_dp(9);
        let units = amount.trunc();
        let nanos = (amount - units) * Decimal::from(NANOS_PER_UNIT);
        let out_of_range = || {
            DomainError::InvariantViolation(format!("amount {amount} does not fit in money units"))
        };

        Ok(Self {
            currency_code: currency_code.into(),
            units: units.to_i64().ok_or_else(out_of_range)?,
            nanos: nanos.to_i32().ok_or_else(out_of_range)?,
        })
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.units) + Decimal::new(i64::from(self.nanos), 9)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceType {
    Actual,
    Estimate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Money,
    #[serde(rename = "type")]
    pub price_type: PriceType,
}

impl Price {
    pub fn actual(amount: Money) -> Self {
        Self { amount, price_type: PriceType::Actual }
    }

    pub fn estimate(amount: Money) -> Self {
        Self { amount, price_type: PriceType::Estimate }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::Money;
    use crate::errors::DomainError;

    #[test]
    fn decimal_conversion_splits_units_and_nanos() {
        let money = Money::from_decimal("USD", Decimal::new(1575, 2)).expect("money");

        assert_eq!(money, Money::new("USD", 15, 750_000_000));
        assert_eq!(money.to_decimal(), Decimal::new(1575, 2));
    }

    #[test]
    fn whole_amounts_have_zero_nanos() {
        let money = Money::from_decimal("USD", Decimal::new(35, 0)).expect("money");

        assert_eq!(money.units, 35);
        assert_eq!(money.nanos, 0);
    }

    #[test]
    fn rounding_past_nine_digits_carries_into_units() {
        let money = Money::from_decimal("USD", Decimal::new(29_999_999_999, 10)).expect("money");

        assert_eq!(money, Money::new("USD", 3, 0));
    }

    #[test]
    fn negative_amounts_keep_one_sign() {
        let money = Money::from_decimal("USD", Decimal::new(-150, 2)).expect("money");

        assert_eq!(money, Money::new("USD", -1, -500_000_000));
    }

    #[test]
    fn amounts_beyond_i64_units_are_rejected() {
        let error = Money::from_decimal("USD", Decimal::MAX).expect_err("overflow");

        assert!(matches!(error, DomainError::InvariantViolation(_)));
    }
}
