use crate::domain::order::Order;
use crate::domain::ports::{SettlementNotifierHandle, SettlementRequest};
use crate::error::{OrderError, Result};
use rust_decimal::Decimal;
use tracing::{error, info};

/// Requests token minting for completed orders.
///
/// Settlement is a side effect of completion: failures are logged and
/// never reach the caller.
pub struct Settlement {
    notifier: SettlementNotifierHandle,
    token_unit: Decimal,
}

impl Settlement {
    pub fn new(notifier: SettlementNotifierHandle, token_unit: Decimal) -> Self {
        Self {
            notifier,
            token_unit,
        }
    }

    /// Whole tokens minted for `order`: `floor(amount / token_unit)`.
    ///
    /// Fails with `DependencyError` when the quotient does not fit a `Decimal`.
    pub fn token_amount(&self, order: &Order) -> Result<Decimal> {
        order
            .amount
            .value()
            .checked_div(self.token_unit)
            .map(|tokens| tokens.floor())
            .ok_or_else(|| {
                OrderError::DependencyError(format!(
                    "token amount for {} / {} overflows",
                    order.amount, self.token_unit
                ))
            })
    }

    pub fn request_for(&self, order: &Order) -> Result<SettlementRequest> {
        Ok(SettlementRequest {
            terminal_id: order.terminal_id.clone(),
            branch_id: order.branch_id.clone(),
            token_amount: self.token_amount(order)?,
            memo: format!("order {}", order.id),
        })
    }

    /// Returns whether the notifier accepted the request.
    pub async fn settle(&self, order: &Order) -> bool {
        let request = match self.request_for(order) {
            Ok(request) => request,
            Err(e) => {
                error!(
                    order_id = %order.id,
                    error = %e,
                    kind = e.kind(),
                    "settlement request not built"
                );
                return false;
            }
        };
        match self.notifier.notify(&request).await {
            Ok(()) => {
                info!(order_id = %order.id, token_amount = %request.token_amount, "settlement requested");
                true
            }
            Err(e) => {
                error!(order_id = %order.id, error = %e, "settlement notification failed");
                false
            }
        }
    }
}
