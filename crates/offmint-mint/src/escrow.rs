//! Escrow vault — spendable/locked balance accounting per wallet.
//!
//! Locking moves funds spendable → locked before tokens are minted against
//! them. Burning permanently removes locked funds once the settlement ledger
//! has credited a merchant. All mutations are atomic: either the full
//! operation succeeds or the balance is unchanged.

use std::collections::HashMap;

use offmint_types::{OffmintError, Result, WalletId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A single wallet's balance split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WalletBalance {
    /// Usable for new escrow locks.
    pub spendable: u64,
    /// Locked as backing for issued tokens, awaiting settlement burn.
    pub locked: u64,
}

impl WalletBalance {
    /// Total balance (spendable + locked).
    #[must_use]
    pub fn total(&self) -> u64 {
        self.spendable + self.locked
    }
}

/// Source of truth for wallet balances on the issuance side.
///
/// Thread-safe: all operations take `&self` and serialize on an internal
/// lock, so the vault can be shared across the session coordinator and the
/// reconciliation worker via `Arc`.
pub struct EscrowVault {
    wallets: RwLock<HashMap<WalletId, WalletBalance>>,
}

impl EscrowVault {
    /// Create an empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wallets: RwLock::new(HashMap::new()),
        }
    }

    /// Create the wallet if absent and add `amount` to its spendable balance.
    pub fn topup(&self, wallet_id: &WalletId, amount: u64) -> WalletBalance {
        let mut wallets = self.wallets.write();
        let entry = wallets.entry(wallet_id.clone()).or_default();
        entry.spendable += amount;
        *entry
    }

    /// Move `amount` spendable → locked.
    ///
    /// # Errors
    /// - [`OffmintError::WalletNotFound`] if the wallet doesn't exist
    /// - [`OffmintError::InsufficientBalance`] if spendable < amount
    pub fn lock(&self, wallet_id: &WalletId, amount: u64) -> Result<WalletBalance> {
        let mut wallets = self.wallets.write();
        let entry = wallets
            .get_mut(wallet_id)
            .ok_or_else(|| OffmintError::WalletNotFound(wallet_id.clone()))?;

        if entry.spendable < amount {
            return Err(OffmintError::InsufficientBalance {
                needed: amount,
                available: entry.spendable,
            });
        }

        entry.spendable -= amount;
        entry.locked += amount;
        Ok(*entry)
    }

    /// Reverse a lock: move `amount` locked → spendable. Used when a mint
    /// fails after funds were locked, or when unspent tokens expire.
    ///
    /// # Errors
    /// - [`OffmintError::WalletNotFound`] if the wallet doesn't exist
    /// - [`OffmintError::InsufficientLocked`] if locked < amount
    pub fn release(&self, wallet_id: &WalletId, amount: u64) -> Result<WalletBalance> {
        let mut wallets = self.wallets.write();
        let entry = wallets
            .get_mut(wallet_id)
            .ok_or_else(|| OffmintError::WalletNotFound(wallet_id.clone()))?;

        if entry.locked < amount {
            return Err(OffmintError::InsufficientLocked {
                needed: amount,
                locked: entry.locked,
            });
        }

        entry.locked -= amount;
        entry.spendable += amount;
        Ok(*entry)
    }

    /// Permanently remove `amount` from the wallet's locked balance after a
    /// settlement credited the corresponding value to a merchant.
    ///
    /// # Errors
    /// - [`OffmintError::WalletNotFound`] if the wallet doesn't exist
    /// - [`OffmintError::InsufficientLocked`] if locked < amount
    pub fn burn(&self, wallet_id: &WalletId, amount: u64) -> Result<WalletBalance> {
        let mut wallets = self.wallets.write();
        let entry = wallets
            .get_mut(wallet_id)
            .ok_or_else(|| OffmintError::WalletNotFound(wallet_id.clone()))?;

        if entry.locked < amount {
            return Err(OffmintError::InsufficientLocked {
                needed: amount,
                locked: entry.locked,
            });
        }

        entry.locked -= amount;
        Ok(*entry)
    }

    /// Current balance for a wallet (zero split if unknown).
    #[must_use]
    pub fn balance(&self, wallet_id: &WalletId) -> WalletBalance {
        self.wallets
            .read()
            .get(wallet_id)
            .copied()
            .unwrap_or_default()
    }

    /// Number of wallets tracked.
    #[must_use]
    pub fn wallet_count(&self) -> usize {
        self.wallets.read().len()
    }
}

impl Default for EscrowVault {
    fn default() -> Self {
        Self::new()
    }
}
