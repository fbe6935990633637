use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::domain::ports::{OrderStore, TerminalDirectory};
use crate::domain::terminal::Terminal;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Orders {
    /// Insertion order; the position doubles as the tie-break sequence.
    rows: Vec<Order>,
    index: HashMap<OrderId, usize>,
}

impl Orders {
    fn active_for(&self, terminal_id: &str) -> Option<&Order> {
        self.rows
            .iter()
            .find(|o| o.terminal_id == terminal_id && o.status == OrderStatus::Active)
    }

    fn sorted(&self, filter: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut out: Vec<Order> = self.rows.iter().filter(|o| filter(o)).cloned().collect();
        // Stable sort keeps insertion order for equal timestamps.
        out.sort_by_key(|o| o.created_at);
        out
    }
}

/// A thread-safe in-memory store for orders.
///
/// Uses `Arc<RwLock<..>>` to allow shared concurrent access. Ideal for testing
/// or small deployments where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Orders>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.index.contains_key(&order.id) {
            return Err(OrderError::Conflict(format!(
                "order {} already exists",
                order.id
            )));
        }
        if order.status == OrderStatus::Active
            && let Some(existing) = orders.active_for(&order.terminal_id)
        {
            return Err(OrderError::Conflict(format!(
                "terminal {} already has active order {}",
                order.terminal_id, existing.id
            )));
        }
        let position = orders.rows.len();
        orders.index.insert(order.id, position);
        orders.rows.push(order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.index.get(&id).map(|&i| orders.rows[i].clone()))
    }

    async fn find_by_terminal(&self, terminal_id: &str) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.sorted(|o| o.terminal_id == terminal_id))
    }

    async fn find_by_terminal_and_status(
        &self,
        terminal_id: &str,
        status: OrderStatus,
    ) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.sorted(|o| o.terminal_id == terminal_id && o.status == status))
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.sorted(|o| o.status == status))
    }

    async fn update_if_status(&self, expected: OrderStatus, order: Order) -> Result<bool> {
        let mut orders = self.orders.write().await;
        let Some(&position) = orders.index.get(&order.id) else {
            return Ok(false);
        };
        if orders.rows[position].status != expected {
            return Ok(false);
        }
        if order.status == OrderStatus::Active
            && let Some(existing) = orders.active_for(&order.terminal_id)
            && existing.id != order.id
        {
            return Err(OrderError::Conflict(format!(
                "terminal {} already has active order {}",
                order.terminal_id, existing.id
            )));
        }
        orders.rows[position] = order;
        Ok(true)
    }
}

/// Terminal directory backed by a fixed list, typically loaded from JSON.
#[derive(Default, Clone)]
pub struct InMemoryTerminalDirectory {
    terminals: Arc<HashMap<String, Terminal>>,
}

impl InMemoryTerminalDirectory {
    pub fn new(terminals: impl IntoIterator<Item = Terminal>) -> Self {
        let terminals = terminals.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            terminals: Arc::new(terminals),
        }
    }

    /// Reads a JSON array of terminals.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let terminals: Vec<Terminal> = serde_json::from_reader(reader)?;
        Ok(Self::new(terminals))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }
}

#[async_trait]
impl TerminalDirectory for InMemoryTerminalDirectory {
    async fn get(&self, terminal_id: &str) -> Result<Option<Terminal>> {
        Ok(self.terminals.get(terminal_id).cloned())
    }
}
