use crate::domain::order::OrderStatus;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// One line of the replay result table.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct OrderRow {
    pub order: String,
    pub terminal: String,
    pub status: OrderStatus,
    /// Two-digit display amount.
    pub amount: String,
    pub expires_in_ms: Option<i64>,
}

/// Writes order rows as CSV.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_rows(&mut self, rows: impl IntoIterator<Item = OrderRow>) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
