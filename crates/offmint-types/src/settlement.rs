//! Settlement request/outcome value objects and the reconciliation outbox row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, MerchantId, ObligationId, PaymentRequestId, Token, WalletId};

// ---------------------------------------------------------------------------
// SettlementRequest
// ---------------------------------------------------------------------------

/// One settlement attempt: a merchant presents a bundle of tokens under a
/// client-chosen idempotency key. Transient — never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub merchant_id: MerchantId,
    pub payment_request_id: PaymentRequestId,
    pub tokens: Vec<Token>,
}

// ---------------------------------------------------------------------------
// SettlementOutcome
// ---------------------------------------------------------------------------

/// Terminal result of a settlement request that did not reject.
///
/// An idempotent replay reports the originally recorded amount, so a caller
/// cannot distinguish "my retry landed first" from "my first attempt had
/// already landed" — which is the point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// The batch verified and committed; the merchant is credited.
    Success {
        ledger_entry_id: EntryId,
        settled_amount: u64,
        merchant_balance: u64,
    },
    /// A prior entry exists for this `payment_request_id`; nothing was
    /// re-verified or re-credited.
    AlreadySettled {
        ledger_entry_id: EntryId,
        settled_amount: u64,
    },
}

impl SettlementOutcome {
    /// The amount recorded for this request — identical on first commit and
    /// on every replay.
    #[must_use]
    pub fn settled_amount(&self) -> u64 {
        match self {
            Self::Success { settled_amount, .. } | Self::AlreadySettled { settled_amount, .. } => {
                *settled_amount
            }
        }
    }

    /// The ledger entry backing this outcome.
    #[must_use]
    pub fn ledger_entry_id(&self) -> EntryId {
        match self {
            Self::Success {
                ledger_entry_id, ..
            }
            | Self::AlreadySettled {
                ledger_entry_id, ..
            } => *ledger_entry_id,
        }
    }

    /// Whether this outcome is an idempotent replay.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        matches!(self, Self::AlreadySettled { .. })
    }
}

// ---------------------------------------------------------------------------
// BurnObligation
// ---------------------------------------------------------------------------

/// A durable reconciliation obligation: burn `amount` from the issuer
/// wallet's locked balance.
///
/// Written in the **same atomic commit** as the ledger entry, then processed
/// out-of-band by the reconciliation worker — a downed escrow component can
/// delay the burn but never block or unwind the settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnObligation {
    pub obligation_id: ObligationId,
    /// The ledger entry this obligation reconciles.
    pub entry_id: EntryId,
    /// The wallet whose locked balance backs the settled tokens.
    pub wallet_id: WalletId,
    /// Total settled value issued by that wallet in this batch.
    pub amount: u64,
    pub created_at: DateTime<Utc>,
    /// Delivery attempts so far (incremented by the worker on failure).
    pub attempts: u32,
}
