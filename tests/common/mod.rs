#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use payqueue::application::engine::OrderEngine;
use payqueue::config::EngineConfig;
use payqueue::domain::order::NewOrder;
use payqueue::domain::ports::{Clock, SettlementNotifier, SettlementRequest};
use payqueue::domain::terminal::Terminal;
use payqueue::error::{OrderError, Result};
use payqueue::infrastructure::clock::ManualClock;
use payqueue::infrastructure::in_memory::{InMemoryOrderStore, InMemoryTerminalDirectory};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const TERMINAL_X: &str = "pos-x";
pub const TERMINAL_Y: &str = "pos-y";

pub fn terminals() -> Vec<Terminal> {
    vec![
        Terminal {
            id: TERMINAL_X.to_string(),
            branch_id: "branch-1".to_string(),
            name: "Front counter".to_string(),
            branch_name: "Downtown".to_string(),
            merchant_name: "Acme Coffee".to_string(),
        },
        Terminal {
            id: TERMINAL_Y.to_string(),
            branch_id: "branch-2".to_string(),
            name: "Drive-through".to_string(),
            branch_name: "Airport".to_string(),
            merchant_name: "Acme Coffee".to_string(),
        },
    ]
}

/// Records every request and optionally fails them all.
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub requests: Mutex<Vec<SettlementRequest>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SettlementRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettlementNotifier for RecordingNotifier {
    async fn notify(&self, request: &SettlementRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(OrderError::DependencyError(
                "treasury unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct Harness {
    pub engine: Arc<OrderEngine>,
    pub store: Arc<InMemoryOrderStore>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::default())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self::with_config(notifier, EngineConfig::default())
    }

    pub fn with_config(notifier: RecordingNotifier, config: EngineConfig) -> Self {
        let store = Arc::new(InMemoryOrderStore::new());
        let clock = Arc::new(ManualClock::default());
        let notifier = Arc::new(notifier);
        let engine = OrderEngine::new(
            store.clone(),
            Arc::new(InMemoryTerminalDirectory::new(terminals())),
            notifier.clone(),
            clock.clone(),
            config,
        );
        Self {
            engine: Arc::new(engine),
            store,
            clock,
            notifier,
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance(Duration::seconds(secs));
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

pub fn new_order(amount: &str) -> NewOrder {
    NewOrder::new(amount, "test order").unwrap()
}

pub fn write_terminals(path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string(&terminals()).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

/// Writes a replay script with the standard header.
pub fn write_script(path: &Path, rows: &[[&str; 6]]) -> std::result::Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(["op", "terminal", "order", "amount", "description", "seconds"])?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
