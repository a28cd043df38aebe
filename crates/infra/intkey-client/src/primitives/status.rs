//! Contains the [`TransactionStatus`] enum, the commit status an endpoint reports.

use serde::{Deserialize, Serialize};

/// Commit status of a transaction as seen by one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Durably applied by the endpoint.
    Committed,
    /// Known to the endpoint but not yet applied.
    Pending,
    /// Not known to the endpoint, or the endpoint could not be reached.
    Unknown,
}

impl TransactionStatus {
    /// Whether the endpoint reported the transaction as committed.
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}
