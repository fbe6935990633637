use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::domain::ports::OrderStore;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for order records, keyed by order id.
pub const CF_ORDERS: &str = "orders";
/// Column Family indexing orders by terminal in creation order.
pub const CF_TERMINAL_INDEX: &str = "terminal_index";
/// Column Family for bookkeeping values such as the insertion sequence.
pub const CF_META: &str = "meta";

const SEQ_KEY: &[u8] = b"seq";

/// A persistent order store using RocksDB.
///
/// Orders are stored as JSON under their id. A secondary index keyed by
/// `terminal_id \0 created_at seq` keeps each terminal's orders in FIFO order.
/// Read-modify-write operations are serialized by a store-wide write lock.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ORDERS, CF_TERMINAL_INDEX, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            OrderError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn index_prefix(terminal_id: &str) -> Vec<u8> {
        let mut key = terminal_id.as_bytes().to_vec();
        key.push(0);
        key
    }

    fn index_key(order: &Order, seq: u64) -> Vec<u8> {
        let mut key = Self::index_prefix(&order.terminal_id);
        // Flip the sign bit so negative timestamps still sort first.
        let micros = (order.created_at.timestamp_micros() as u64) ^ (1 << 63);
        key.extend_from_slice(&micros.to_be_bytes());
        key.extend_from_slice(&seq.to_be_bytes());
        key
    }

    fn next_seq(&self) -> Result<u64> {
        let current = self
            .db
            .get_cf(self.cf(CF_META)?, SEQ_KEY)?
            .and_then(|bytes| <[u8; 8]>::try_from(bytes.as_slice()).ok())
            .map(u64::from_be_bytes)
            .unwrap_or(0);
        Ok(current + 1)
    }

    fn decode(bytes: &[u8]) -> Result<Order> {
        serde_json::from_slice(bytes).map_err(|e| {
            OrderError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Deserialization error: {}", e),
            )))
        })
    }

    fn encode(order: &Order) -> Result<Vec<u8>> {
        serde_json::to_vec(order).map_err(|e| {
            OrderError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )))
        })
    }

    fn load(&self, id: OrderId) -> Result<Option<Order>> {
        match self.db.get_cf(self.cf(CF_ORDERS)?, id.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn terminal_orders(&self, terminal_id: &str) -> Result<Vec<Order>> {
        let index = self.cf(CF_TERMINAL_INDEX)?;
        let prefix = Self::index_prefix(terminal_id);
        let mut orders = Vec::new();

        for item in self
            .db
            .iterator_cf(index, IteratorMode::From(prefix.as_slice(), Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let id = Uuid::from_slice(&value)
                .map_err(|e| OrderError::InternalError(Box::new(e)))?;
            if let Some(order) = self.load(id)? {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    fn active_for(&self, terminal_id: &str) -> Result<Option<Order>> {
        Ok(self
            .terminal_orders(terminal_id)?
            .into_iter()
            .find(|o| o.status == OrderStatus::Active))
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if self.load(order.id)?.is_some() {
            return Err(OrderError::Conflict(format!(
                "order {} already exists",
                order.id
            )));
        }
        if order.status == OrderStatus::Active
            && let Some(existing) = self.active_for(&order.terminal_id)?
        {
            return Err(OrderError::Conflict(format!(
                "terminal {} already has active order {}",
                order.terminal_id, existing.id
            )));
        }

        let seq = self.next_seq()?;
        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_ORDERS)?, order.id.as_bytes(), Self::encode(&order)?);
        batch.put_cf(
            self.cf(CF_TERMINAL_INDEX)?,
            Self::index_key(&order, seq),
            order.id.as_bytes(),
        );
        batch.put_cf(self.cf(CF_META)?, SEQ_KEY, seq.to_be_bytes());
        self.db.write(batch)?;

        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.load(id)
    }

    async fn find_by_terminal(&self, terminal_id: &str) -> Result<Vec<Order>> {
        self.terminal_orders(terminal_id)
    }

    async fn find_by_terminal_and_status(
        &self,
        terminal_id: &str,
        status: OrderStatus,
    ) -> Result<Vec<Order>> {
        Ok(self
            .terminal_orders(terminal_id)?
            .into_iter()
            .filter(|o| o.status == status)
            .collect())
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let mut orders = Vec::new();
        for item in self.db.iterator_cf(self.cf(CF_ORDERS)?, IteratorMode::Start) {
            let (_key, value) = item?;
            let order = Self::decode(&value)?;
            if order.status == status {
                orders.push(order);
            }
        }
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn update_if_status(&self, expected: OrderStatus, order: Order) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let Some(stored) = self.load(order.id)? else {
            return Ok(false);
        };
        if stored.status != expected {
            return Ok(false);
        }
        if order.status == OrderStatus::Active
            && let Some(existing) = self.active_for(&order.terminal_id)?
            && existing.id != order.id
        {
            return Err(OrderError::Conflict(format!(
                "terminal {} already has active order {}",
                order.terminal_id, existing.id
            )));
        }

        self.db
            .put_cf(self.cf(CF_ORDERS)?, order.id.as_bytes(), Self::encode(&order)?)?;
        Ok(true)
    }
}
