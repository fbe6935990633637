use super::order::{Order, OrderId, OrderStatus};
use super::terminal::Terminal;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Durable keyed storage for orders.
///
/// Listings are returned in creation order: by `created_at`, then by
/// insertion sequence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    ///
    /// Fails with `OrderError::Conflict` if the order is `ACTIVE` and the
    /// terminal already has an `ACTIVE` order.
    async fn insert(&self, order: Order) -> Result<()>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    async fn find_by_terminal(&self, terminal_id: &str) -> Result<Vec<Order>>;

    async fn find_by_terminal_and_status(
        &self,
        terminal_id: &str,
        status: OrderStatus,
    ) -> Result<Vec<Order>>;

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;

    /// Replaces the stored order only if its stored status is still `expected`.
    ///
    /// Returns `Ok(false)` when the stored status differs (or the order is
    /// gone). Moving an order to `ACTIVE` fails with `OrderError::Conflict`
    /// when another order of the same terminal is already `ACTIVE`.
    async fn update_if_status(&self, expected: OrderStatus, order: Order) -> Result<bool>;
}

/// Read-only view of the merchant/branch/terminal directory.
#[async_trait]
pub trait TerminalDirectory: Send + Sync {
    async fn get(&self, terminal_id: &str) -> Result<Option<Terminal>>;
}

/// Request sent to the treasury when an order completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    pub terminal_id: String,
    pub branch_id: String,
    pub token_amount: Decimal,
    pub memo: String,
}

/// Best-effort collaborator that mints tokens for completed orders.
#[async_trait]
pub trait SettlementNotifier: Send + Sync {
    async fn notify(&self, request: &SettlementRequest) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type OrderStoreHandle = Arc<dyn OrderStore>;
pub type TerminalDirectoryHandle = Arc<dyn TerminalDirectory>;
pub type SettlementNotifierHandle = Arc<dyn SettlementNotifier>;
pub type ClockHandle = Arc<dyn Clock>;
