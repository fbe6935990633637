//! HTTP API served by `payqueue serve`.

pub mod api_types;
pub mod routes;
