//! Application layer orchestrating the order lifecycle.
//!
//! [`engine::OrderEngine`] is the entry point used by the HTTP and replay
//! interfaces. It delegates queue placement and FIFO promotion to
//! [`queue::QueueManager`], settlement to [`settlement::Settlement`], and hands
//! out [`sweeper::Sweeper`] instances for periodic expiry.

pub mod engine;
pub mod queue;
pub mod settlement;
pub mod sweeper;
