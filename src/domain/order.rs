use super::amount::Amount;
use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type OrderId = Uuid;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Active,
    Queued,
    InProgress,
    Completed,
    Expired,
    Cancelled,
}

impl OrderStatus {
    /// Final statuses never transition further.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Expired | OrderStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Active => "ACTIVE",
            OrderStatus::Queued => "QUEUED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Expired => "EXPIRED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment order raised by a POS terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub amount: Amount,
    pub description: String,
    pub status: OrderStatus,
    pub terminal_id: String,
    pub branch_id: String,
    /// Present only while the order is `ACTIVE`.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub exchange: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub external_transaction_id: Option<String>,
    pub error_message: Option<String>,
}

impl Order {
    /// True when the order is `ACTIVE` and its TTL has run out.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Active && self.expires_at.is_some_and(|at| now > at)
    }

    /// True when the order is the terminal's live head of queue.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Active && !self.is_expired(now)
    }

    /// Milliseconds left before expiry, floored at zero.
    pub fn expires_in_ms(&self, now: DateTime<Utc>) -> i64 {
        self.expires_at
            .map(|at| (at - now).num_milliseconds().max(0))
            .unwrap_or(0)
    }
}

/// A validated order request, before queue placement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub amount: Amount,
    pub description: String,
    pub exchange: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl NewOrder {
    pub fn new(amount: &str, description: &str) -> Result<Self> {
        let amount = Amount::parse_input(amount)?;
        let description = description.trim();
        let len = description.chars().count();
        if len == 0 || len > MAX_DESCRIPTION_LEN {
            return Err(OrderError::ValidationError(format!(
                "Description must be between 1 and {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
        Ok(Self {
            amount,
            description: description.to_string(),
            exchange: None,
            metadata: None,
        })
    }

    pub fn with_exchange(mut self, exchange: Option<String>) -> Self {
        self.exchange = exchange;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn active_order(now: DateTime<Utc>) -> Order {
        Order {
            id: Uuid::now_v7(),
            amount: Amount::new(dec!(10.00)).unwrap(),
            description: "coffee".to_string(),
            status: OrderStatus::Active,
            terminal_id: "pos-1".to_string(),
            branch_id: "branch-1".to_string(),
            expires_at: Some(now + Duration::seconds(120)),
            created_at: now,
            completed_at: None,
            deactivated_at: None,
            exchange: None,
            metadata: None,
            external_transaction_id: None,
            error_message: None,
        }
    }

    #[test]
    fn test_expiry_is_strictly_after_deadline() {
        let now = Utc::now();
        let order = active_order(now);
        let deadline = order.expires_at.unwrap();
        assert!(!order.is_expired(deadline));
        assert!(order.is_expired(deadline + Duration::milliseconds(1)));
        assert!(order.is_live(now));
    }

    #[test]
    fn test_expires_in_floors_at_zero() {
        let now = Utc::now();
        let order = active_order(now);
        assert_eq!(order.expires_in_ms(now), 120_000);
        assert_eq!(order.expires_in_ms(now + Duration::seconds(500)), 0);
    }

    #[test]
    fn test_new_order_description_bounds() {
        assert!(NewOrder::new("1.00", "x").is_ok());
        assert!(matches!(
            NewOrder::new("1.00", "   "),
            Err(OrderError::ValidationError(_))
        ));
        let long = "é".repeat(MAX_DESCRIPTION_LEN);
        assert!(NewOrder::new("1.00", &long).is_ok());
        let too_long = "a".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(NewOrder::new("1.00", &too_long).is_err());
    }

    #[test]
    fn test_order_wire_format() {
        let order = active_order(Utc::now());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "ACTIVE");
        assert_eq!(json["amount"], "10.00");
        assert!(json.get("terminalId").is_some());
        assert!(json.get("expiresAt").is_some());
    }
}
