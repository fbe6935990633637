//! Domain layer: order entities, the pure lifecycle rules and the ports the
//! application layer depends on.

pub mod amount;
pub mod lifecycle;
pub mod order;
pub mod ports;
pub mod terminal;
