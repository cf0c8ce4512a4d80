//! Storage contract for the finality plane.
//!
//! The engine is generic over [`SettlementStore`] so the same state machine
//! runs against the durable sled store in production and the in-memory store
//! in unit tests. The contract's heart is [`SettlementStore::commit`]: one
//! indivisible unit that re-checks uniqueness under the transaction, because
//! the engine's pre-verification reads are only advisory — the commit is
//! where races are decided.

use offmint_types::{
    BurnObligation, LedgerEntry, MerchantId, ObligationId, PaymentRequestId, Result, TokenId,
};

/// Result of an atomic commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The entry was appended, all tokens marked spent, the merchant
    /// credited, and the obligations enqueued.
    Committed {
        /// The merchant's running credited balance after this commit.
        merchant_balance: u64,
    },
    /// The unique index on `payment_request_id` was already occupied — a
    /// concurrent request with the same key won the race. Nothing was
    /// written; the caller re-reads the winner's entry.
    DuplicateRequest,
}

/// Durable state behind the settlement engine: ledger, spent-token set,
/// merchant balances, and the reconciliation outbox.
///
/// Implementations must uphold two invariants:
/// - a `token_id` is in the spent set **iff** a committed ledger entry
///   consumed it — the two writes are never observable separately;
/// - at most one entry ever exists per `payment_request_id`.
pub trait SettlementStore: Send + Sync {
    /// Register a merchant with a zero balance. Idempotent.
    fn register_merchant(&self, merchant_id: &MerchantId) -> Result<()>;

    /// Whether the merchant is registered.
    fn merchant_exists(&self, merchant_id: &MerchantId) -> Result<bool>;

    /// The merchant's running credited balance, if registered.
    fn merchant_balance(&self, merchant_id: &MerchantId) -> Result<Option<u64>>;

    /// Read-only aggregation over the ledger: the sum of every entry
    /// credited to this merchant. Always equals
    /// [`SettlementStore::merchant_balance`] for a registered merchant.
    fn merchant_earnings(&self, merchant_id: &MerchantId) -> Result<u64>;

    /// The ledger entry recorded under this idempotency key, if any.
    fn entry_for_request(&self, payment_request_id: &PaymentRequestId)
    -> Result<Option<LedgerEntry>>;

    /// Whether the token has ever been redeemed. Advisory outside
    /// [`SettlementStore::commit`] — the commit re-checks under the
    /// transaction.
    fn is_spent(&self, token_id: &TokenId) -> Result<bool>;

    /// Atomically: insert every `spent` id into the spent set, credit the
    /// merchant by `entry.amount`, append `entry`, and enqueue
    /// `obligations`. All or nothing.
    ///
    /// # Errors
    /// - [`offmint_types::OffmintError::TokenAlreadySpent`] if a spent id is
    ///   already present (concurrent double-spend; nothing written)
    /// - [`offmint_types::OffmintError::MerchantNotFound`] if the merchant
    ///   vanished from under the engine
    /// - [`offmint_types::OffmintError::PersistenceFailure`] if the commit
    ///   could not be durably recorded (safe to retry with the same key)
    fn commit(
        &self,
        entry: &LedgerEntry,
        spent: &[TokenId],
        obligations: &[BurnObligation],
    ) -> Result<CommitOutcome>;

    /// All outbox rows not yet reconciled, oldest first.
    fn pending_obligations(&self) -> Result<Vec<BurnObligation>>;

    /// Remove a reconciled obligation from the outbox.
    fn complete_obligation(&self, obligation_id: &ObligationId) -> Result<()>;

    /// Record a failed delivery attempt, leaving the row queued for retry.
    fn record_attempt(&self, obligation_id: &ObligationId) -> Result<()>;
}
