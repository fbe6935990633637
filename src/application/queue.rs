use crate::domain::lifecycle::{self, Transition};
use crate::domain::order::{NewOrder, Order, OrderStatus};
use crate::domain::ports::{ClockHandle, OrderStoreHandle};
use crate::domain::terminal::Terminal;
use crate::error::{OrderError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument, warn};

/// One async mutex per terminal, created on first use.
#[derive(Default)]
pub struct TerminalLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TerminalLocks {
    pub async fn acquire(&self, terminal_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(terminal_id.to_string())
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Keeps at most one `ACTIVE` order per terminal and promotes queued orders
/// in FIFO order.
pub struct QueueManager {
    store: OrderStoreHandle,
    clock: ClockHandle,
    ttl: Duration,
    locks: TerminalLocks,
}

impl QueueManager {
    pub fn new(store: OrderStoreHandle, clock: ClockHandle, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            locks: TerminalLocks::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Serializes queue-affecting work on one terminal.
    pub async fn lock(&self, terminal_id: &str) -> OwnedMutexGuard<()> {
        self.locks.acquire(terminal_id).await
    }

    /// Places a new order as `ACTIVE` when the terminal is idle, else `QUEUED`.
    #[instrument(skip(self, terminal, request), fields(terminal_id = %terminal.id))]
    pub async fn create(&self, terminal: &Terminal, request: NewOrder) -> Result<Order> {
        let _guard = self.lock(&terminal.id).await;
        let now = self.clock.now();

        let has_live_active = self.settle_head(&terminal.id, now).await?.is_some();
        let order = lifecycle::open(terminal, request, has_live_active, now, self.ttl);

        let order = match self.store.insert(order.clone()).await {
            Ok(()) => order,
            Err(OrderError::Conflict(reason)) if order.status == OrderStatus::Active => {
                warn!(order_id = %order.id, %reason, "active slot taken; queueing instead");
                let queued = lifecycle::demote_to_queued(order);
                self.store.insert(queued.clone()).await?;
                queued
            }
            Err(e) => return Err(e),
        };

        info!(order_id = %order.id, status = %order.status, "order created");
        Ok(order)
    }

    /// Returns the terminal's live `ACTIVE` order, expiring and promoting as needed.
    #[instrument(skip(self))]
    pub async fn current(&self, terminal_id: &str) -> Result<Order> {
        let _guard = self.lock(terminal_id).await;
        let now = self.clock.now();
        self.settle_head(terminal_id, now)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("no live order for terminal {}", terminal_id)))
    }

    /// Expires a stale `ACTIVE` order and promotes the oldest queued one.
    ///
    /// Caller must hold the terminal lock. Returns the live `ACTIVE` order, if any.
    pub(crate) async fn settle_head(
        &self,
        terminal_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>> {
        let actives = self
            .store
            .find_by_terminal_and_status(terminal_id, OrderStatus::Active)
            .await?;

        for active in actives {
            if active.is_live(now) {
                return Ok(Some(active));
            }
            let expired = lifecycle::apply(&active, Transition::Expire, now, self.ttl)?;
            if self
                .store
                .update_if_status(OrderStatus::Active, expired)
                .await?
            {
                info!(order_id = %active.id, "order expired");
            } else {
                debug!(order_id = %active.id, "order already left ACTIVE");
            }
        }

        self.promote_next(terminal_id, now).await
    }

    async fn promote_next(&self, terminal_id: &str, now: DateTime<Utc>) -> Result<Option<Order>> {
        let queued = self
            .store
            .find_by_terminal_and_status(terminal_id, OrderStatus::Queued)
            .await?;

        for candidate in queued {
            let promoted = lifecycle::apply(&candidate, Transition::Promote, now, self.ttl)?;
            match self
                .store
                .update_if_status(OrderStatus::Queued, promoted.clone())
                .await
            {
                Ok(true) => {
                    info!(order_id = %promoted.id, "queued order promoted");
                    return Ok(Some(promoted));
                }
                // Cancelled or completed since it was listed; try the next one.
                Ok(false) => continue,
                Err(OrderError::Conflict(reason)) => {
                    debug!(%reason, "promotion skipped; terminal already has an active order");
                    let live = self
                        .store
                        .find_by_terminal_and_status(terminal_id, OrderStatus::Active)
                        .await?
                        .into_iter()
                        .find(|o| o.is_live(now));
                    return Ok(live);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
