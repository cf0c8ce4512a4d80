//! Durable settlement store on sled's embedded key-value engine.
//!
//! Spend history must survive process restart — losing it reopens every
//! burned token to replay. All records live in one sled tree under a
//! prefixed keyspace so the commit can touch every record class inside a
//! single serializable transaction:
//!
//! | Prefix      | Key suffix                    | Value                     |
//! |-------------|-------------------------------|---------------------------|
//! | `req/`      | `payment_request_id` (UTF-8)  | `json(LedgerEntry)`       |
//! | `entry/`    | `merchant_id/entry_id`        | `json(LedgerEntry)`       |
//! | `spent/`    | `token_id` (UUID text)        | empty                     |
//! | `merchant/` | `merchant_id` (UTF-8)         | balance (8B BE)           |
//! | `outbox/`   | `obligation_id` (UUID text)   | `json(BurnObligation)`    |
//!
//! `req/` doubles as the unique index on the idempotency key and the
//! replay-answer record; `entry/` is the append-only ledger, merchant-scoped
//! so earnings aggregation is a prefix scan. Obligation ids are UUIDv7, so
//! the outbox scan returns rows oldest first.
//!
//! ## Atomicity
//!
//! [`SledStore::commit`] runs as one sled transaction. The transaction
//! re-checks the request index and the spent set before writing, so the
//! loser of a concurrent race aborts cleanly with nothing written — sled's
//! serializable single-tree transactions are the check-and-insert this
//! protocol needs.

use std::path::Path;

use offmint_types::{
    BurnObligation, LedgerEntry, MerchantId, ObligationId, OffmintError, PaymentRequestId, Result,
    TokenId,
};
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};

use crate::store::{CommitOutcome, SettlementStore};

/// Conflicts detected inside the commit transaction.
#[derive(Debug)]
enum CommitConflict {
    DuplicateRequest,
    TokenSpent(TokenId),
    MerchantMissing,
    Corrupt(String),
}

/// Durable implementation of [`SettlementStore`].
///
/// sled is inherently thread-safe; `SledStore` can be shared across threads
/// via `Arc` without external synchronization.
#[derive(Debug, Clone)]
pub struct SledStore {
    tree: sled::Tree,
}

impl SledStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path).map_err(storage_error)?;
        let tree = db.open_tree("settlement").map_err(storage_error)?;
        Ok(Self { tree })
    }

    /// Create a temporary store that is cleaned up on drop. Ideal for
    /// tests — no filesystem side effects to manage.
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(storage_error)?;
        let tree = db.open_tree("settlement").map_err(storage_error)?;
        Ok(Self { tree })
    }

    fn request_key(payment_request_id: &PaymentRequestId) -> Vec<u8> {
        format!("req/{payment_request_id}").into_bytes()
    }

    fn entry_key(merchant_id: &MerchantId, entry: &LedgerEntry) -> Vec<u8> {
        format!("entry/{merchant_id}/{}", entry.entry_id).into_bytes()
    }

    fn entry_prefix(merchant_id: &MerchantId) -> Vec<u8> {
        format!("entry/{merchant_id}/").into_bytes()
    }

    fn spent_key(token_id: &TokenId) -> Vec<u8> {
        format!("spent/{token_id}").into_bytes()
    }

    fn merchant_key(merchant_id: &MerchantId) -> Vec<u8> {
        format!("merchant/{merchant_id}").into_bytes()
    }

    fn outbox_key(obligation_id: &ObligationId) -> Vec<u8> {
        format!("outbox/{}", obligation_id.0).into_bytes()
    }
}

fn storage_error(err: sled::Error) -> OffmintError {
    OffmintError::PersistenceFailure(err.to_string())
}

fn decode_balance(bytes: &[u8]) -> std::result::Result<u64, String> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| format!("balance record has {} bytes, expected 8", bytes.len()))?;
    Ok(u64::from_be_bytes(array))
}

impl SettlementStore for SledStore {
    fn register_merchant(&self, merchant_id: &MerchantId) -> Result<()> {
        // compare_and_swap keeps re-registration from resetting a balance.
        self.tree
            .compare_and_swap(
                Self::merchant_key(merchant_id),
                None::<&[u8]>,
                Some(&0u64.to_be_bytes()[..]),
            )
            .map_err(storage_error)?
            .ok();
        Ok(())
    }

    fn merchant_exists(&self, merchant_id: &MerchantId) -> Result<bool> {
        self.tree
            .contains_key(Self::merchant_key(merchant_id))
            .map_err(storage_error)
    }

    fn merchant_balance(&self, merchant_id: &MerchantId) -> Result<Option<u64>> {
        match self
            .tree
            .get(Self::merchant_key(merchant_id))
            .map_err(storage_error)?
        {
            Some(bytes) => {
                let balance = decode_balance(&bytes).map_err(OffmintError::PersistenceFailure)?;
                Ok(Some(balance))
            }
            None => Ok(None),
        }
    }

    fn merchant_earnings(&self, merchant_id: &MerchantId) -> Result<u64> {
        let mut total = 0u64;
        for item in self.tree.scan_prefix(Self::entry_prefix(merchant_id)) {
            let (_, value) = item.map_err(storage_error)?;
            let entry: LedgerEntry = serde_json::from_slice(&value)?;
            total += entry.amount;
        }
        Ok(total)
    }

    fn entry_for_request(
        &self,
        payment_request_id: &PaymentRequestId,
    ) -> Result<Option<LedgerEntry>> {
        match self
            .tree
            .get(Self::request_key(payment_request_id))
            .map_err(storage_error)?
        {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn is_spent(&self, token_id: &TokenId) -> Result<bool> {
        self.tree
            .contains_key(Self::spent_key(token_id))
            .map_err(storage_error)
    }

    fn commit(
        &self,
        entry: &LedgerEntry,
        spent: &[TokenId],
        obligations: &[BurnObligation],
    ) -> Result<CommitOutcome> {
        // Serialize outside the transaction closure; it may retry.
        let entry_bytes = serde_json::to_vec(entry)?;
        let request_key = Self::request_key(&entry.payment_request_id);
        let entry_key = Self::entry_key(&entry.merchant_id, entry);
        let merchant_key = Self::merchant_key(&entry.merchant_id);
        let spent_keys: Vec<(TokenId, Vec<u8>)> = spent
            .iter()
            .map(|token_id| (*token_id, Self::spent_key(token_id)))
            .collect();
        let outbox_rows: Vec<(Vec<u8>, Vec<u8>)> = obligations
            .iter()
            .map(|obligation| {
                Ok((
                    Self::outbox_key(&obligation.obligation_id),
                    serde_json::to_vec(obligation)?,
                ))
            })
            .collect::<Result<_>>()?;

        let result: TransactionResult<u64, CommitConflict> = self.tree.transaction(|tx| {
            // Unique index on the idempotency key.
            if tx.get(request_key.as_slice())?.is_some() {
                return Err(ConflictableTransactionError::Abort(
                    CommitConflict::DuplicateRequest,
                ));
            }

            // Single-use: check-and-insert on every token in the batch.
            for (token_id, key) in &spent_keys {
                if tx.get(key.as_slice())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        CommitConflict::TokenSpent(*token_id),
                    ));
                }
                tx.insert(key.as_slice(), Vec::<u8>::new())?;
            }

            // Credit the merchant.
            let balance_bytes = tx.get(merchant_key.as_slice())?.ok_or(
                ConflictableTransactionError::Abort(CommitConflict::MerchantMissing),
            )?;
            let balance = decode_balance(&balance_bytes).map_err(|reason| {
                ConflictableTransactionError::Abort(CommitConflict::Corrupt(reason))
            })?;
            let merchant_balance = balance + entry.amount;
            tx.insert(merchant_key.as_slice(), merchant_balance.to_be_bytes().to_vec())?;

            // Append the ledger entry under both the request index and the
            // merchant-scoped ledger keyspace.
            tx.insert(request_key.as_slice(), entry_bytes.as_slice())?;
            tx.insert(entry_key.as_slice(), entry_bytes.as_slice())?;

            // Enqueue reconciliation obligations in the same unit.
            for (key, value) in &outbox_rows {
                tx.insert(key.as_slice(), value.as_slice())?;
            }

            Ok(merchant_balance)
        });

        match result {
            Ok(merchant_balance) => Ok(CommitOutcome::Committed { merchant_balance }),
            Err(TransactionError::Abort(CommitConflict::DuplicateRequest)) => {
                Ok(CommitOutcome::DuplicateRequest)
            }
            Err(TransactionError::Abort(CommitConflict::TokenSpent(token_id))) => {
                Err(OffmintError::TokenAlreadySpent(token_id))
            }
            Err(TransactionError::Abort(CommitConflict::MerchantMissing)) => {
                Err(OffmintError::MerchantNotFound(entry.merchant_id.clone()))
            }
            Err(TransactionError::Abort(CommitConflict::Corrupt(reason))) => {
                Err(OffmintError::PersistenceFailure(reason))
            }
            Err(TransactionError::Storage(err)) => Err(storage_error(err)),
        }
    }

    fn pending_obligations(&self) -> Result<Vec<BurnObligation>> {
        let mut pending = Vec::new();
        for item in self.tree.scan_prefix(b"outbox/") {
            let (_, value) = item.map_err(storage_error)?;
            pending.push(serde_json::from_slice(&value)?);
        }
        Ok(pending)
    }

    fn complete_obligation(&self, obligation_id: &ObligationId) -> Result<()> {
        self.tree
            .remove(Self::outbox_key(obligation_id))
            .map_err(storage_error)?;
        Ok(())
    }

    fn record_attempt(&self, obligation_id: &ObligationId) -> Result<()> {
        let key = Self::outbox_key(obligation_id);
        if let Some(bytes) = self.tree.get(&key).map_err(storage_error)? {
            let mut obligation: BurnObligation = serde_json::from_slice(&bytes)?;
            obligation.attempts += 1;
            self.tree
                .insert(key, serde_json::to_vec(&obligation)?)
                .map_err(storage_error)?;
        }
        Ok(())
    }
}
