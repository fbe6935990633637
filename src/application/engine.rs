use super::queue::QueueManager;
use super::settlement::Settlement;
use super::sweeper::Sweeper;
use crate::config::EngineConfig;
use crate::domain::lifecycle::{self, Transition};
use crate::domain::order::{NewOrder, Order, OrderId, OrderStatus};
use crate::domain::ports::{
    ClockHandle, OrderStoreHandle, SettlementNotifierHandle, TerminalDirectoryHandle,
};
use crate::domain::terminal::Terminal;
use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

/// The live order of a terminal, with the directory data shown to customers.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentOrder {
    pub order: Order,
    pub terminal: Terminal,
    pub expires_in_ms: i64,
}

/// Entry point for every order operation.
///
/// `OrderEngine` owns the store and collaborator handles. Queue placement and
/// promotion are delegated to the [`QueueManager`]; explicit transitions are
/// applied here under the same per-terminal lock.
pub struct OrderEngine {
    store: OrderStoreHandle,
    directory: TerminalDirectoryHandle,
    clock: ClockHandle,
    queue: QueueManager,
    settlement: Settlement,
    config: EngineConfig,
}

impl OrderEngine {
    pub fn new(
        store: OrderStoreHandle,
        directory: TerminalDirectoryHandle,
        notifier: SettlementNotifierHandle,
        clock: ClockHandle,
        config: EngineConfig,
    ) -> Self {
        let queue = QueueManager::new(store.clone(), clock.clone(), config.ttl);
        let settlement = Settlement::new(notifier, config.token_unit);
        Self {
            store,
            directory,
            clock,
            queue,
            settlement,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// A sweeper sharing this engine's store and clock.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(self.store.clone(), self.clock.clone())
    }

    pub async fn terminal(&self, terminal_id: &str) -> Result<Terminal> {
        self.directory
            .get(terminal_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("terminal {}", terminal_id)))
    }

    pub async fn get(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("order {}", order_id)))
    }

    /// Full history of a terminal in creation order.
    pub async fn orders_for_terminal(&self, terminal_id: &str) -> Result<Vec<Order>> {
        self.terminal(terminal_id).await?;
        self.store.find_by_terminal(terminal_id).await
    }

    pub async fn create(&self, terminal_id: &str, request: NewOrder) -> Result<Order> {
        let terminal = self.terminal(terminal_id).await?;
        self.queue.create(&terminal, request).await
    }

    /// Public read: the terminal's live order, after lazy expiry and promotion.
    pub async fn current(&self, terminal_id: &str) -> Result<CurrentOrder> {
        let terminal = self.terminal(terminal_id).await?;
        let order = self.queue.current(terminal_id).await?;
        let expires_in_ms = order.expires_in_ms(self.clock.now());
        Ok(CurrentOrder {
            order,
            terminal,
            expires_in_ms,
        })
    }

    /// Moves a live `ACTIVE` order to `IN_PROGRESS`.
    ///
    /// An order that belongs to another terminal is reported as not found. An
    /// `ACTIVE` order past its TTL is expired on the spot (and the next queued
    /// order promoted) before the transition is refused.
    #[instrument(skip(self))]
    pub async fn begin_processing(&self, terminal_id: &str, order_id: OrderId) -> Result<Order> {
        let order = self.get(order_id).await?;
        if order.terminal_id != terminal_id {
            return Err(OrderError::NotFound(format!(
                "order {} on terminal {}",
                order_id, terminal_id
            )));
        }

        let _guard = self.queue.lock(terminal_id).await;
        let now = self.clock.now();
        let order = self.get(order_id).await?;
        if order.is_expired(now) {
            self.queue.settle_head(terminal_id, now).await?;
            return Err(OrderError::InvalidTransition {
                order_id,
                status: OrderStatus::Expired,
            });
        }

        let started = self.transition(&order, Transition::BeginProcessing, now).await?;
        info!(order_id = %started.id, "order in progress");
        Ok(started)
    }

    /// Completes an order and requests settlement.
    ///
    /// Settlement failures are logged only; the order stays `COMPLETED`.
    #[instrument(skip(self))]
    pub async fn complete(&self, order_id: OrderId) -> Result<Order> {
        let completed = {
            let terminal_id = self.get(order_id).await?.terminal_id;
            let _guard = self.queue.lock(&terminal_id).await;
            let now = self.clock.now();
            let order = self.get(order_id).await?;
            self.transition(&order, Transition::Complete, now).await?
        };
        info!(order_id = %completed.id, "order completed");

        self.settlement.settle(&completed).await;
        Ok(completed)
    }

    /// Deactivates an `ACTIVE` or `QUEUED` order.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order> {
        let terminal_id = self.get(order_id).await?.terminal_id;
        let _guard = self.queue.lock(&terminal_id).await;
        let now = self.clock.now();
        let order = self.get(order_id).await?;
        let cancelled = self.transition(&order, Transition::Cancel, now).await?;
        info!(order_id = %cancelled.id, "order cancelled");
        Ok(cancelled)
    }

    async fn transition(
        &self,
        order: &Order,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        let next = lifecycle::apply(order, transition, now, self.config.ttl)?;
        if self.store.update_if_status(order.status, next.clone()).await? {
            return Ok(next);
        }
        // Lost a race with the sweeper; report what is stored now.
        let stored = self.get(order.id).await?;
        Err(OrderError::InvalidTransition {
            order_id: order.id,
            status: stored.status,
        })
    }
}
