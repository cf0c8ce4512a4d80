//! In-memory settlement store.
//!
//! All state sits behind one mutex, so every commit is trivially atomic.
//! Suitable for unit tests and single-process experiments — a restart erases
//! spend history, which reopens every burned token to replay, so production
//! deployments use [`crate::SledStore`].

use std::collections::{BTreeMap, HashMap, HashSet};

use offmint_types::{
    BurnObligation, LedgerEntry, MerchantId, ObligationId, OffmintError, PaymentRequestId, Result,
    TokenId,
};
use parking_lot::Mutex;

use crate::store::{CommitOutcome, SettlementStore};

#[derive(Default)]
struct MemoryInner {
    /// Append-only ledger in commit order.
    ledger: Vec<LedgerEntry>,
    /// Unique index: payment_request_id → entry.
    requests: HashMap<PaymentRequestId, LedgerEntry>,
    /// Every token id ever redeemed.
    spent: HashSet<TokenId>,
    /// Registered merchants and their running credited balance.
    merchants: HashMap<MerchantId, u64>,
    /// Reconciliation outbox, ordered by obligation id (UUIDv7 = time order).
    outbox: BTreeMap<ObligationId, BurnObligation>,
}

/// Single-mutex in-memory implementation of [`SettlementStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger entries committed.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.inner.lock().ledger.len()
    }

    /// Number of token ids in the spent set.
    #[must_use]
    pub fn spent_count(&self) -> usize {
        self.inner.lock().spent.len()
    }
}

impl SettlementStore for MemoryStore {
    fn register_merchant(&self, merchant_id: &MerchantId) -> Result<()> {
        self.inner
            .lock()
            .merchants
            .entry(merchant_id.clone())
            .or_insert(0);
        Ok(())
    }

    fn merchant_exists(&self, merchant_id: &MerchantId) -> Result<bool> {
        Ok(self.inner.lock().merchants.contains_key(merchant_id))
    }

    fn merchant_balance(&self, merchant_id: &MerchantId) -> Result<Option<u64>> {
        Ok(self.inner.lock().merchants.get(merchant_id).copied())
    }

    fn merchant_earnings(&self, merchant_id: &MerchantId) -> Result<u64> {
        Ok(self
            .inner
            .lock()
            .ledger
            .iter()
            .filter(|entry| &entry.merchant_id == merchant_id)
            .map(|entry| entry.amount)
            .sum())
    }

    fn entry_for_request(
        &self,
        payment_request_id: &PaymentRequestId,
    ) -> Result<Option<LedgerEntry>> {
        Ok(self.inner.lock().requests.get(payment_request_id).cloned())
    }

    fn is_spent(&self, token_id: &TokenId) -> Result<bool> {
        Ok(self.inner.lock().spent.contains(token_id))
    }

    fn commit(
        &self,
        entry: &LedgerEntry,
        spent: &[TokenId],
        obligations: &[BurnObligation],
    ) -> Result<CommitOutcome> {
        let mut inner = self.inner.lock();

        // Re-check both uniqueness constraints under the lock: the engine's
        // earlier reads raced against concurrent commits.
        if inner.requests.contains_key(&entry.payment_request_id) {
            return Ok(CommitOutcome::DuplicateRequest);
        }
        for token_id in spent {
            if inner.spent.contains(token_id) {
                return Err(OffmintError::TokenAlreadySpent(*token_id));
            }
        }
        let Some(balance) = inner.merchants.get(&entry.merchant_id).copied() else {
            return Err(OffmintError::MerchantNotFound(entry.merchant_id.clone()));
        };

        // All checks passed; apply every write while still holding the lock.
        let merchant_balance = balance + entry.amount;
        inner
            .merchants
            .insert(entry.merchant_id.clone(), merchant_balance);
        for token_id in spent {
            inner.spent.insert(*token_id);
        }
        inner
            .requests
            .insert(entry.payment_request_id.clone(), entry.clone());
        inner.ledger.push(entry.clone());
        for obligation in obligations {
            inner
                .outbox
                .insert(obligation.obligation_id, obligation.clone());
        }

        Ok(CommitOutcome::Committed { merchant_balance })
    }

    fn pending_obligations(&self) -> Result<Vec<BurnObligation>> {
        Ok(self.inner.lock().outbox.values().cloned().collect())
    }

    fn complete_obligation(&self, obligation_id: &ObligationId) -> Result<()> {
        self.inner.lock().outbox.remove(obligation_id);
        Ok(())
    }

    fn record_attempt(&self, obligation_id: &ObligationId) -> Result<()> {
        if let Some(obligation) = self.inner.lock().outbox.get_mut(obligation_id) {
            obligation.attempts += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use offmint_types::{EntryId, WalletId};

    fn entry(request: &str, merchant: &str, amount: u64) -> LedgerEntry {
        LedgerEntry {
            entry_id: EntryId::new(),
            payment_request_id: PaymentRequestId::from(request),
            merchant_id: MerchantId::from(merchant),
            amount,
            timestamp: Utc::now(),
        }
    }

    fn obligation(amount: u64) -> BurnObligation {
        BurnObligation {
            obligation_id: ObligationId::new(),
            entry_id: EntryId::new(),
            wallet_id: WalletId::from("WLT-1"),
            amount,
            created_at: Utc::now(),
            attempts: 0,
        }
    }

    #[test]
    fn commit_credits_and_marks_spent() {
        let store = MemoryStore::new();
        let merchant = MerchantId::from("MCH-1");
        store.register_merchant(&merchant).unwrap();

        let tokens = [TokenId::new(), TokenId::new()];
        let outcome = store
            .commit(&entry("PR-1", "MCH-1", 700), &tokens, &[obligation(700)])
            .unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                merchant_balance: 700
            }
        );
        assert!(store.is_spent(&tokens[0]).unwrap());
        assert!(store.is_spent(&tokens[1]).unwrap());
        assert_eq!(store.merchant_balance(&merchant).unwrap(), Some(700));
        assert_eq!(store.merchant_earnings(&merchant).unwrap(), 700);
        assert_eq!(store.pending_obligations().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_request_writes_nothing() {
        let store = MemoryStore::new();
        store.register_merchant(&MerchantId::from("MCH-1")).unwrap();

        let first = entry("PR-1", "MCH-1", 500);
        store
            .commit(&first, &[TokenId::new()], &[])
            .unwrap();

        let replay_token = TokenId::new();
        let outcome = store
            .commit(&entry("PR-1", "MCH-1", 900), &[replay_token], &[])
            .unwrap();

        assert_eq!(outcome, CommitOutcome::DuplicateRequest);
        assert!(!store.is_spent(&replay_token).unwrap());
        assert_eq!(store.entry_count(), 1);
        assert_eq!(
            store
                .entry_for_request(&PaymentRequestId::from("PR-1"))
                .unwrap()
                .unwrap()
                .amount,
            500
        );
    }

    #[test]
    fn spent_token_aborts_whole_commit() {
        let store = MemoryStore::new();
        store.register_merchant(&MerchantId::from("MCH-1")).unwrap();

        let shared = TokenId::new();
        store
            .commit(&entry("PR-1", "MCH-1", 100), &[shared], &[])
            .unwrap();

        let fresh = TokenId::new();
        let err = store
            .commit(&entry("PR-2", "MCH-1", 200), &[fresh, shared], &[])
            .unwrap_err();

        assert!(matches!(err, OffmintError::TokenAlreadySpent(id) if id == shared));
        // The fresh token from the failed batch must not be marked spent.
        assert!(!store.is_spent(&fresh).unwrap());
        assert_eq!(store.entry_count(), 1);
        assert_eq!(
            store.merchant_balance(&MerchantId::from("MCH-1")).unwrap(),
            Some(100)
        );
    }

    #[test]
    fn unknown_merchant_rejected() {
        let store = MemoryStore::new();
        let err = store
            .commit(&entry("PR-1", "MCH-GHOST", 100), &[TokenId::new()], &[])
            .unwrap_err();
        assert!(matches!(err, OffmintError::MerchantNotFound(_)));
    }

    #[test]
    fn earnings_aggregate_across_entries() {
        let store = MemoryStore::new();
        store.register_merchant(&MerchantId::from("MCH-1")).unwrap();
        store.register_merchant(&MerchantId::from("MCH-2")).unwrap();

        store
            .commit(&entry("PR-1", "MCH-1", 300), &[TokenId::new()], &[])
            .unwrap();
        store
            .commit(&entry("PR-2", "MCH-1", 400), &[TokenId::new()], &[])
            .unwrap();
        store
            .commit(&entry("PR-3", "MCH-2", 1000), &[TokenId::new()], &[])
            .unwrap();

        assert_eq!(
            store.merchant_earnings(&MerchantId::from("MCH-1")).unwrap(),
            700
        );
        assert_eq!(
            store.merchant_balance(&MerchantId::from("MCH-1")).unwrap(),
            Some(700)
        );
        assert_eq!(
            store.merchant_earnings(&MerchantId::from("MCH-2")).unwrap(),
            1000
        );
        assert_eq!(
            store
                .merchant_earnings(&MerchantId::from("MCH-GHOST"))
                .unwrap(),
            0
        );
    }

    #[test]
    fn outbox_complete_and_retry() {
        let store = MemoryStore::new();
        store.register_merchant(&MerchantId::from("MCH-1")).unwrap();

        let ob_a = obligation(100);
        let ob_b = obligation(200);
        store
            .commit(
                &entry("PR-1", "MCH-1", 300),
                &[TokenId::new()],
                &[ob_a.clone(), ob_b.clone()],
            )
            .unwrap();

        store.record_attempt(&ob_a.obligation_id).unwrap();
        let pending = store.pending_obligations().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(
            pending
                .iter()
                .find(|o| o.obligation_id == ob_a.obligation_id)
                .unwrap()
                .attempts,
            1
        );

        store.complete_obligation(&ob_a.obligation_id).unwrap();
        let pending = store.pending_obligations().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].obligation_id, ob_b.obligation_id);
    }

    #[test]
    fn register_merchant_is_idempotent() {
        let store = MemoryStore::new();
        let merchant = MerchantId::from("MCH-1");
        store.register_merchant(&merchant).unwrap();
        store
            .commit(&entry("PR-1", "MCH-1", 100), &[TokenId::new()], &[])
            .unwrap();
        store.register_merchant(&merchant).unwrap();
        // Re-registration must not reset the balance.
        assert_eq!(store.merchant_balance(&merchant).unwrap(), Some(100));
    }
}
