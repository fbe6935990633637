use super::command_reader::{Command, CommandOp};
use super::order_writer::OrderRow;
use crate::application::engine::OrderEngine;
use crate::domain::order::{NewOrder, OrderId, OrderStatus};
use crate::domain::ports::Clock;
use crate::error::{OrderError, Result};
use crate::infrastructure::clock::ManualClock;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Drives an [`OrderEngine`] from replay commands on a manual clock.
pub struct Replayer<'a> {
    engine: &'a OrderEngine,
    clock: Arc<ManualClock>,
    labels: HashMap<String, OrderId>,
    names: HashMap<OrderId, String>,
    terminals: Vec<String>,
}

impl<'a> Replayer<'a> {
    pub fn new(engine: &'a OrderEngine, clock: Arc<ManualClock>) -> Self {
        Self {
            engine,
            clock,
            labels: HashMap::new(),
            names: HashMap::new(),
            terminals: Vec::new(),
        }
    }

    pub async fn apply(&mut self, command: Command) -> Result<()> {
        match command.op {
            CommandOp::Create => {
                let terminal = required(&command.terminal, "terminal")?;
                let request = NewOrder::new(
                    required(&command.amount, "amount")?,
                    required(&command.description, "description")?,
                )?;
                if let Some(label) = &command.order
                    && self.labels.contains_key(label)
                {
                    return Err(OrderError::ValidationError(format!(
                        "order label {} already used",
                        label
                    )));
                }
                let order = self.engine.create(terminal, request).await?;
                let label = command.order.unwrap_or_else(|| order.id.to_string());
                self.labels.insert(label.clone(), order.id);
                self.names.insert(order.id, label);
                if !self.terminals.iter().any(|t| t == terminal) {
                    self.terminals.push(terminal.to_string());
                }
            }
            CommandOp::Current => {
                let terminal = required(&command.terminal, "terminal")?;
                let current = self.engine.current(terminal).await?;
                info!(
                    terminal_id = %terminal,
                    order = %self.name_of(current.order.id),
                    amount = %current.order.amount.display(),
                    expires_in_ms = current.expires_in_ms,
                    "current order"
                );
            }
            CommandOp::Begin => {
                let terminal = required(&command.terminal, "terminal")?;
                let id = self.resolve(&command.order)?;
                self.engine.begin_processing(terminal, id).await?;
            }
            CommandOp::Complete => {
                let id = self.resolve(&command.order)?;
                self.engine.complete(id).await?;
            }
            CommandOp::Cancel => {
                let id = self.resolve(&command.order)?;
                self.engine.cancel(id).await?;
            }
            CommandOp::Advance => {
                let seconds = command.seconds.ok_or_else(|| {
                    OrderError::ValidationError("advance requires seconds".to_string())
                })?;
                let by = Duration::try_seconds(seconds).ok_or_else(|| {
                    OrderError::ValidationError(format!("seconds out of range: {}", seconds))
                })?;
                self.clock.advance(by);
            }
            CommandOp::Sweep => {
                let report = self.engine.sweeper().sweep().await?;
                info!(expired = report.expired, failed = report.failed, "sweep");
            }
        }
        Ok(())
    }

    /// Final state of every terminal touched by the script, in creation order.
    pub async fn rows(&self) -> Result<Vec<OrderRow>> {
        let now = self.clock.now();
        let mut terminals = self.terminals.clone();
        terminals.sort();

        let mut rows = Vec::new();
        for terminal in terminals {
            for order in self.engine.orders_for_terminal(&terminal).await? {
                let expires_in_ms =
                    (order.status == OrderStatus::Active).then(|| order.expires_in_ms(now));
                rows.push(OrderRow {
                    order: self.name_of(order.id),
                    terminal: order.terminal_id.clone(),
                    status: order.status,
                    amount: order.amount.display(),
                    expires_in_ms,
                });
            }
        }
        Ok(rows)
    }

    fn resolve(&self, label: &Option<String>) -> Result<OrderId> {
        let label = required(label, "order")?;
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| OrderError::NotFound(format!("order label {}", label)))
    }

    fn name_of(&self, id: OrderId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

fn required<'c>(value: &'c Option<String>, column: &str) -> Result<&'c str> {
    value
        .as_deref()
        .ok_or_else(|| OrderError::ValidationError(format!("missing {} column", column)))
}
