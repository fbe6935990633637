use serde::{Deserialize, Serialize};

/// A POS terminal as known to the merchant directory.
///
/// The terminal is the unit of queue partitioning; `branch_id` is copied onto
/// every order it raises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Terminal {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub branch_name: String,
    pub merchant_name: String,
}
