//! Mapping of provider status strings to a closed enum.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a cash-in or refund as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// The transaction was accepted and is awaiting subscriber
    /// confirmation.
    Pending,
    Succeeded,
    /// The subscriber cancelled, the pay token expired, or the provider
    /// rejected the transaction.
    Failed,
    /// A status string the provider has not documented. Deliberately
    /// distinct from [`TransactionStatus::Failed`]: callers should keep
    /// polling rather than treat the transaction as lost.
    Unknown,
}

impl TransactionStatus {
    /// Total mapping over raw provider status strings.
    ///
    /// "SUCCESSFULL" is the spelling the provider actually emits.
    pub fn from_provider_raw(raw: &str) -> Self {
        match raw {
            "PENDING" | "INITIATED" => Self::Pending,
            "SUCCESSFULL" | "SUCCESS" => Self::Succeeded,
            "CANCELLED" | "EXPIRED" | "FAILED" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}
