//! Order state machine.
//!
//! ```text
//!   create ──► ACTIVE ◄── promote ── QUEUED ◄── create
//!                │  │                  │  │
//!        begin   │  │ ttl     complete │  │ cancel
//!                ▼  ▼                  ▼  ▼
//!        IN_PROGRESS EXPIRED   COMPLETED  CANCELLED
//! ```
//!
//! ACTIVE and IN_PROGRESS may also complete; ACTIVE may also be cancelled.
//! Everything here is pure: callers supply `now` and persist the result.

use super::order::{NewOrder, Order, OrderStatus};
use super::terminal::Terminal;
use crate::error::{OrderError, Result};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// A state change requested on an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BeginProcessing,
    Complete,
    Cancel,
    Expire,
    Promote,
}

/// Builds a freshly created order. `has_live_active` decides queue placement.
pub fn open(
    terminal: &Terminal,
    request: NewOrder,
    has_live_active: bool,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Order {
    let (status, expires_at) = if has_live_active {
        (OrderStatus::Queued, None)
    } else {
        (OrderStatus::Active, Some(now + ttl))
    };

    Order {
        id: Uuid::now_v7(),
        amount: request.amount,
        description: request.description,
        status,
        terminal_id: terminal.id.clone(),
        branch_id: terminal.branch_id.clone(),
        expires_at,
        created_at: now,
        completed_at: None,
        deactivated_at: None,
        exchange: request.exchange,
        metadata: request.metadata,
        external_transaction_id: None,
        error_message: None,
    }
}

/// Turns a would-be `ACTIVE` order into a `QUEUED` one.
pub fn demote_to_queued(mut order: Order) -> Order {
    order.status = OrderStatus::Queued;
    order.expires_at = None;
    order
}

/// Whether `transition` is legal for `order` at `now`.
pub fn is_allowed(order: &Order, transition: Transition, now: DateTime<Utc>) -> bool {
    use OrderStatus::*;
    match transition {
        Transition::BeginProcessing => order.status == Active && !order.is_expired(now),
        Transition::Complete => !order.status.is_final(),
        Transition::Cancel => {
            matches!(order.status, Active | Queued) && order.deactivated_at.is_none()
        }
        Transition::Expire => order.is_expired(now),
        Transition::Promote => order.status == Queued,
    }
}

/// Applies `transition`, returning the updated order.
///
/// Fails with `InvalidTransition` carrying the current status when the
/// precondition does not hold. `ttl` is only read by `Promote`.
pub fn apply(
    order: &Order,
    transition: Transition,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<Order> {
    if !is_allowed(order, transition, now) {
        return Err(OrderError::InvalidTransition {
            order_id: order.id,
            status: order.status,
        });
    }

    let mut next = order.clone();
    match transition {
        Transition::BeginProcessing => {
            next.status = OrderStatus::InProgress;
            next.expires_at = None;
        }
        Transition::Complete => {
            next.status = OrderStatus::Completed;
            next.expires_at = None;
            next.completed_at = Some(now);
        }
        Transition::Cancel => {
            next.status = OrderStatus::Cancelled;
            next.expires_at = None;
            next.deactivated_at = Some(now);
        }
        Transition::Expire => {
            next.status = OrderStatus::Expired;
            next.expires_at = None;
        }
        Transition::Promote => {
            next.status = OrderStatus::Active;
            next.expires_at = Some(now + ttl);
        }
    }
    Ok(next)
}
