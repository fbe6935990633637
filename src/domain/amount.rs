use crate::error::OrderError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of fractional digits kept in storage.
pub const STORAGE_SCALE: u32 = 8;
/// Maximum number of fractional digits accepted from a terminal.
pub const INPUT_SCALE: u32 = 2;

/// A positive monetary amount.
///
/// Wraps `rust_decimal::Decimal` so that values never pass through binary
/// floating point. Serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, OrderError> {
        if value <= Decimal::ZERO {
            return Err(OrderError::ValidationError(
                "Amount must be positive".to_string(),
            ));
        }
        if value.scale() > STORAGE_SCALE {
            return Err(OrderError::ValidationError(format!(
                "Amount supports at most {} fractional digits",
                STORAGE_SCALE
            )));
        }
        Ok(Self(value))
    }

    /// Parses an amount submitted by a terminal operator (at most 2 fractional digits).
    pub fn parse_input(raw: &str) -> Result<Self, OrderError> {
        let value = Decimal::from_str_exact(raw.trim()).map_err(|_| {
            OrderError::ValidationError(format!("Malformed amount: {:?}", raw))
        })?;
        if value.scale() > INPUT_SCALE {
            return Err(OrderError::ValidationError(format!(
                "Amount supports at most {} fractional digits",
                INPUT_SCALE
            )));
        }
        Self::new(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Two-digit rendering used on customer-facing surfaces.
    pub fn display(&self) -> String {
        let mut rounded = self
            .0
            .round_dp_with_strategy(INPUT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(INPUT_SCALE);
        rounded.to_string()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = OrderError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}
