use crate::domain::order::{OrderId, OrderStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid transition for order {order_id}: current status is {status}")]
    InvalidTransition {
        order_id: OrderId,
        status: OrderStatus,
    },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Dependency failure: {0}")]
    DependencyError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl OrderError {
    /// Stable machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::NotFound(_) => "NOT_FOUND",
            OrderError::InvalidTransition { .. } => "INVALID_TRANSITION",
            OrderError::ValidationError(_) => "VALIDATION",
            OrderError::Conflict(_) => "CONFLICT",
            OrderError::DependencyError(_) => "DEPENDENCY_FAILURE",
            OrderError::CsvError(_)
            | OrderError::IoError(_)
            | OrderError::SerdeError(_)
            | OrderError::InternalError(_) => "INTERNAL",
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for OrderError {
    fn from(e: rocksdb::Error) -> Self {
        OrderError::InternalError(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;
