//! Advisory issuance registry.
//!
//! Every minted token is recorded here for metadata lookup (support tooling,
//! wallet-side sync after a settlement notification). The registry is
//! **never** authoritative: the settlement engine re-verifies every token
//! from its signature alone and ignores this bookkeeping entirely.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use offmint_types::{Token, TokenId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Advisory lifecycle state of an issued token.
///
/// Transitions are monotonic: `Issued → Redeemed`, recorded after the fact
/// from settlement notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssuanceStatus {
    /// The token was minted and handed to the device.
    Issued,
    /// A settlement notification reported this token as spent.
    Redeemed,
}

impl std::fmt::Display for IssuanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Issued => write!(f, "ISSUED"),
            Self::Redeemed => write!(f, "REDEEMED"),
        }
    }
}

/// Metadata recorded for one issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuanceRecord {
    pub token: Token,
    pub minted_at: DateTime<Utc>,
    pub status: IssuanceStatus,
}

/// Tracks every token the minter has issued, keyed by token id.
pub struct IssuanceRegistry {
    records: RwLock<HashMap<TokenId, IssuanceRecord>>,
}

impl IssuanceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Record a freshly minted token as `Issued`.
    pub fn record_issued(&self, token: Token, minted_at: DateTime<Utc>) {
        let record = IssuanceRecord {
            token,
            minted_at,
            status: IssuanceStatus::Issued,
        };
        self.records.write().insert(record.token.token_id, record);
    }

    /// Mark a token as redeemed. Unknown ids are ignored — a settlement may
    /// reference tokens minted by another node.
    pub fn mark_redeemed(&self, token_id: &TokenId) {
        if let Some(record) = self.records.write().get_mut(token_id) {
            record.status = IssuanceStatus::Redeemed;
        }
    }

    /// Look up the metadata for a token.
    #[must_use]
    pub fn get(&self, token_id: &TokenId) -> Option<IssuanceRecord> {
        self.records.read().get(token_id).cloned()
    }

    /// Number of tokens ever recorded.
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.read().len()
    }

    /// Number of tokens still in `Issued` state.
    #[must_use]
    pub fn issued_count(&self) -> usize {
        self.records
            .read()
            .values()
            .filter(|r| r.status == IssuanceStatus::Issued)
            .count()
    }
}

impl Default for IssuanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
