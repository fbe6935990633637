use crate::domain::ports::{SettlementNotifier, SettlementRequest};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Notifier used when no treasury service is configured: records the mint
/// request in the log and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl SettlementNotifier for LogNotifier {
    async fn notify(&self, request: &SettlementRequest) -> Result<()> {
        info!(
            terminal_id = %request.terminal_id,
            branch_id = %request.branch_id,
            token_amount = %request.token_amount,
            memo = %request.memo,
            "treasury not configured; mint request logged only"
        );
        Ok(())
    }
}

/// Treasury service reached over HTTP.
///
/// Each completed order results in one `POST {base_url}/mint` with the
/// `SettlementRequest` as JSON body.
#[derive(Debug, Clone)]
pub struct HttpTreasuryNotifier {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTreasuryNotifier {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrderError::InternalError(Box::new(e)))?;
        Ok(Self { http, base_url })
    }

    fn mint_url(&self) -> String {
        format!("{}/mint", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SettlementNotifier for HttpTreasuryNotifier {
    async fn notify(&self, request: &SettlementRequest) -> Result<()> {
        let resp = self
            .http
            .post(self.mint_url())
            .json(request)
            .send()
            .await
            .map_err(|e| OrderError::DependencyError(format!("treasury request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OrderError::DependencyError(format!(
                "treasury http error status={} body={}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}
