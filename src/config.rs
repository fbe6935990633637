use crate::error::{OrderError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

pub const DEFAULT_TTL_SECS: u64 = 120;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Tunables shared by the queue manager, sweeper and settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// How long an `ACTIVE` order stays payable.
    pub ttl: chrono::Duration,
    pub sweep_interval: Duration,
    /// Order amount that mints one token.
    pub token_unit: Decimal,
}

impl EngineConfig {
    pub fn new(ttl: Duration, sweep_interval: Duration, token_unit: Decimal) -> Result<Self> {
        if ttl.is_zero() {
            return Err(OrderError::ValidationError(
                "TTL must be greater than zero".to_string(),
            ));
        }
        if sweep_interval.is_zero() {
            return Err(OrderError::ValidationError(
                "Sweep interval must be greater than zero".to_string(),
            ));
        }
        if token_unit <= Decimal::ZERO {
            return Err(OrderError::ValidationError(
                "Token unit must be positive".to_string(),
            ));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| OrderError::ValidationError(format!("TTL out of range: {}", e)))?;

        Ok(Self {
            ttl,
            sweep_interval,
            token_unit,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ttl: chrono::Duration::seconds(DEFAULT_TTL_SECS as i64),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            token_unit: dec!(1),
        }
    }
}
