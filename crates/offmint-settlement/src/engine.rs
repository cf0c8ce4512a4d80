//! Settlement engine — the verify-then-credit state machine.
//!
//! One settlement request moves through:
//!
//! ```text
//! RECEIVED → IDEMPOTENCY_CHECKED → TOKENS_VERIFIED → COMMITTED
//!     │              │                    │
//!     │              └─▶ ALREADY_SETTLED  └─▶ REJECTED
//! ```
//!
//! Every token in the batch is verified before any state mutation: a batch
//! containing one invalid token settles zero tokens. The commit itself is
//! delegated to the store's transaction, which re-checks the uniqueness
//! constraints — the engine's reads are advisory, the transaction is where
//! concurrent races are decided.

use std::collections::HashSet;
use std::sync::Arc;

use offmint_types::{
    BurnObligation, Clock, EntryId, LedgerEntry, MerchantId, ObligationId, OffmintError, Result,
    SettlementOutcome, SettlementRequest, TokenId, TokenVerifier, WalletId,
};

use crate::store::{CommitOutcome, SettlementStore};

/// Orchestrates settlement over a [`SettlementStore`].
///
/// Holds only the **public** verification key — a settlement node never
/// needs minting capability. All methods take `&self`; the engine can be
/// shared across request-handling threads via `Arc`.
pub struct SettlementEngine<S> {
    store: Arc<S>,
    verifier: TokenVerifier,
    clock: Arc<dyn Clock>,
}

impl<S: SettlementStore> SettlementEngine<S> {
    #[must_use]
    pub fn new(store: Arc<S>, verifier: TokenVerifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            verifier,
            clock,
        }
    }

    /// Settle a token bundle against a merchant account.
    ///
    /// Safe to retry with the same `payment_request_id`: a replay returns
    /// the originally recorded result without re-verifying or re-crediting.
    ///
    /// # Errors
    /// - [`OffmintError::MerchantNotFound`] — unknown merchant, checked
    ///   before any signature work
    /// - [`OffmintError::EmptySettlement`] — no tokens submitted
    /// - [`OffmintError::TokenAlreadySpent`] / [`OffmintError::InvalidSignature`]
    ///   / [`OffmintError::TokenExpired`] — per-token rejection naming the
    ///   offending token; the whole batch aborts with no side effects
    /// - [`OffmintError::PersistenceFailure`] — the commit could not be
    ///   durably recorded; retry with the same key
    pub fn settle(&self, request: &SettlementRequest) -> Result<SettlementOutcome> {
        // Idempotency first: a merchant that never saw our response must be
        // able to resubmit identically and get the recorded answer.
        if let Some(prior) = self.store.entry_for_request(&request.payment_request_id)? {
            tracing::debug!(
                request = %request.payment_request_id,
                entry = %prior.entry_id,
                "settlement replayed, returning recorded result"
            );
            return Ok(SettlementOutcome::AlreadySettled {
                ledger_entry_id: prior.entry_id,
                settled_amount: prior.amount,
            });
        }

        if !self.store.merchant_exists(&request.merchant_id)? {
            return Err(OffmintError::MerchantNotFound(request.merchant_id.clone()));
        }
        if request.tokens.is_empty() {
            return Err(OffmintError::EmptySettlement);
        }

        // Verify the whole batch before mutating anything.
        let now = self.clock.now();
        let mut total_to_credit = 0u64;
        let mut batch_spent: Vec<TokenId> = Vec::with_capacity(request.tokens.len());
        let mut seen: HashSet<TokenId> = HashSet::with_capacity(request.tokens.len());
        let mut per_wallet: Vec<(WalletId, u64)> = Vec::new();

        for token in &request.tokens {
            // A duplicate within the batch is a double-spend of this very
            // request; the store check catches tokens spent by prior ones.
            if seen.contains(&token.token_id) || self.store.is_spent(&token.token_id)? {
                self.reject(request, "already spent", token.token_id);
                return Err(OffmintError::TokenAlreadySpent(token.token_id));
            }
            if !self
                .verifier
                .verify(&token.canonical_payload(), &token.signature)
            {
                self.reject(request, "invalid signature", token.token_id);
                return Err(OffmintError::InvalidSignature(token.token_id));
            }
            if token.is_expired_at(now) {
                self.reject(request, "expired", token.token_id);
                return Err(OffmintError::TokenExpired {
                    token_id: token.token_id,
                    expired_at: token.expiry_time,
                });
            }

            seen.insert(token.token_id);
            batch_spent.push(token.token_id);
            total_to_credit += token.denomination;
            match per_wallet
                .iter_mut()
                .find(|(wallet, _)| wallet == &token.issuer_wallet_id)
            {
                Some((_, amount)) => *amount += token.denomination,
                None => per_wallet.push((token.issuer_wallet_id.clone(), token.denomination)),
            }
        }

        let entry = LedgerEntry {
            entry_id: EntryId::new(),
            payment_request_id: request.payment_request_id.clone(),
            merchant_id: request.merchant_id.clone(),
            amount: total_to_credit,
            timestamp: now,
        };
        let obligations: Vec<BurnObligation> = per_wallet
            .into_iter()
            .map(|(wallet_id, amount)| BurnObligation {
                obligation_id: ObligationId::new(),
                entry_id: entry.entry_id,
                wallet_id,
                amount,
                created_at: now,
                attempts: 0,
            })
            .collect();

        match self.store.commit(&entry, &batch_spent, &obligations)? {
            CommitOutcome::Committed { merchant_balance } => {
                tracing::info!(
                    request = %request.payment_request_id,
                    merchant = %request.merchant_id,
                    entry = %entry.entry_id,
                    amount = total_to_credit,
                    tokens = batch_spent.len(),
                    "settlement committed"
                );
                Ok(SettlementOutcome::Success {
                    ledger_entry_id: entry.entry_id,
                    settled_amount: total_to_credit,
                    merchant_balance,
                })
            }
            CommitOutcome::DuplicateRequest => {
                // Lost the idempotency race; the winner's entry is the answer.
                let prior = self
                    .store
                    .entry_for_request(&request.payment_request_id)?
                    .ok_or_else(|| {
                        OffmintError::PersistenceFailure(
                            "duplicate request reported but no entry recorded".to_string(),
                        )
                    })?;
                Ok(SettlementOutcome::AlreadySettled {
                    ledger_entry_id: prior.entry_id,
                    settled_amount: prior.amount,
                })
            }
        }
    }

    /// Register a merchant account. Idempotent.
    pub fn register_merchant(&self, merchant_id: &MerchantId) -> Result<()> {
        self.store.register_merchant(merchant_id)
    }

    /// Total credited to a merchant, aggregated over the ledger.
    pub fn merchant_earnings(&self, merchant_id: &MerchantId) -> Result<u64> {
        self.store.merchant_earnings(merchant_id)
    }

    /// The store backing this engine.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn reject(&self, request: &SettlementRequest, reason: &str, token_id: TokenId) {
        tracing::warn!(
            request = %request.payment_request_id,
            merchant = %request.merchant_id,
            token = %token_id,
            reason,
            "settlement rejected"
        );
    }
}
