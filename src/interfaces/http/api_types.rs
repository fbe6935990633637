//! JSON bodies exchanged over the HTTP API.

use crate::application::engine::CurrentOrder;
use crate::domain::order::{OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: String,
    pub description: String,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Public view of a terminal's live order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentOrderResponse {
    pub id: OrderId,
    /// Rounded to two fractional digits.
    pub amount: String,
    pub description: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Milliseconds until expiry, never negative.
    pub expires_in: i64,
    pub terminal_name: String,
    pub branch_name: String,
    pub merchant_name: String,
}

impl From<CurrentOrder> for CurrentOrderResponse {
    fn from(current: CurrentOrder) -> Self {
        let CurrentOrder {
            order,
            terminal,
            expires_in_ms,
        } = current;
        Self {
            id: order.id,
            amount: order.amount.display(),
            description: order.description,
            status: order.status,
            created_at: order.created_at,
            expires_at: order.expires_at,
            expires_in: expires_in_ms,
            terminal_name: terminal.name,
            branch_name: terminal.branch_name,
            merchant_name: terminal.merchant_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Current order status, for refused transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}
