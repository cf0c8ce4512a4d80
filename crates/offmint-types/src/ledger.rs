//! Ledger entry — the immutable fact that one settlement completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, MerchantId, PaymentRequestId};

/// One completed settlement, appended exactly once per `payment_request_id`.
///
/// Entries are never updated or deleted. The unique index on
/// `payment_request_id` is what makes retries idempotent: a resubmitted
/// request finds the prior entry and returns it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry identifier, generated at write time.
    pub entry_id: EntryId,
    /// Client-supplied idempotency key, unique across all entries.
    pub payment_request_id: PaymentRequestId,
    /// The merchant credited by this settlement.
    pub merchant_id: MerchantId,
    /// Sum of credited denominations.
    pub amount: u64,
    /// When the settlement committed (server clock).
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let entry = LedgerEntry {
            entry_id: EntryId::new(),
            payment_request_id: PaymentRequestId::from("PR-42"),
            merchant_id: MerchantId::from("MCH-CAFE-X"),
            amount: 1800,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
