use crate::domain::lifecycle::{self, Transition};
use crate::domain::order::OrderStatus;
use crate::domain::ports::{ClockHandle, OrderStoreHandle};
use crate::error::Result;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Outcome of one sweep pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired: usize,
    /// Orders that left `ACTIVE` between the scan and the update.
    pub skipped: usize,
    pub failed: usize,
}

/// Periodic housekeeping that expires stale `ACTIVE` orders.
///
/// The sweeper never promotes; queued orders move up on the next
/// "current order" read for their terminal.
#[derive(Clone)]
pub struct Sweeper {
    store: OrderStoreHandle,
    clock: ClockHandle,
}

impl Sweeper {
    pub fn new(store: OrderStoreHandle, clock: ClockHandle) -> Self {
        Self { store, clock }
    }

    pub async fn sweep(&self) -> Result<SweepReport> {
        let now = self.clock.now();
        let actives = self.store.find_by_status(OrderStatus::Active).await?;
        let mut report = SweepReport {
            scanned: actives.len(),
            ..SweepReport::default()
        };

        for order in actives.into_iter().filter(|o| o.is_expired(now)) {
            // TTL is unused by the expire transition.
            let expired = lifecycle::apply(&order, Transition::Expire, now, chrono::Duration::zero())?;
            match self.store.update_if_status(OrderStatus::Active, expired).await {
                Ok(true) => report.expired += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "failed to expire order");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Runs `sweep` every `interval` until the returned task is aborted.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match self.sweep().await {
                    Ok(report) if report.expired > 0 || report.failed > 0 => {
                        info!(
                            scanned = report.scanned,
                            expired = report.expired,
                            skipped = report.skipped,
                            failed = report.failed,
                            "sweep finished"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "sweep pass failed"),
                }
            }
        })
    }
}
