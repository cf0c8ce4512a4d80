//! Offline-session coordinator — gate → lock → mint as one call.
//!
//! The coordinator is the issuance plane's client-facing entry point. It
//! sequences the integrity gate, the escrow-cap check, the spendable→locked
//! move, and minting. If minting fails after funds were locked, the lock is
//! released so a rejected request leaves every balance unchanged.

use std::sync::Arc;

use offmint_types::{
    IntegrityReport, IntegrityVerdict, OffmintError, Result, Token, WalletId,
};
use serde::{Deserialize, Serialize};

use crate::escrow::EscrowVault;
use crate::gate::IntegrityGate;
use crate::minter::TokenMinter;

/// Result of preparing an offline session: the token bundle plus the
/// wallet's balance split after the lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineSession {
    pub tokens: Vec<Token>,
    pub new_spendable: u64,
    pub new_locked: u64,
}

/// Sequences integrity → escrow lock → mint for one wallet.
pub struct OfflineSessionCoordinator {
    gate: IntegrityGate,
    vault: Arc<EscrowVault>,
    minter: Arc<TokenMinter>,
}

impl OfflineSessionCoordinator {
    #[must_use]
    pub fn new(gate: IntegrityGate, vault: Arc<EscrowVault>, minter: Arc<TokenMinter>) -> Self {
        Self {
            gate,
            vault,
            minter,
        }
    }

    /// Prepare an offline session: verify the device, lock `amount`, and
    /// mint the token bundle backing it.
    ///
    /// # Errors
    /// - [`OffmintError::IntegrityCompromised`] — fail-closed device check
    /// - [`OffmintError::EscrowCapExceeded`] — the lock would breach the
    ///   policy's per-wallet cap
    /// - [`OffmintError::WalletNotFound`] / [`OffmintError::InsufficientBalance`]
    ///   — lock failure, nothing minted
    /// - [`OffmintError::InvalidAmount`] / [`OffmintError::AmountNotDecomposable`]
    ///   — mint failure; the lock is released before returning
    pub fn prepare(
        &self,
        wallet_id: &WalletId,
        amount: u64,
        report: &IntegrityReport,
    ) -> Result<OfflineSession> {
        if let IntegrityVerdict::Compromised { reason } = self.gate.evaluate(report) {
            return Err(OffmintError::IntegrityCompromised { reason });
        }

        let cap = self.minter.policy().escrow_cap;
        let locked = self.vault.balance(wallet_id).locked;
        if locked + amount > cap {
            return Err(OffmintError::EscrowCapExceeded {
                requested: amount,
                locked,
                cap,
            });
        }

        let balance = self.vault.lock(wallet_id, amount)?;

        let tokens = match self.minter.mint(wallet_id, amount) {
            Ok(tokens) => tokens,
            Err(err) => {
                // Compensate: a failed mint must not leave funds locked.
                self.vault.release(wallet_id, amount)?;
                return Err(err);
            }
        };

        tracing::info!(
            wallet = %wallet_id,
            amount,
            tokens = tokens.len(),
            "offline session prepared"
        );
        Ok(OfflineSession {
            tokens,
            new_spendable: balance.spendable,
            new_locked: balance.locked,
        })
    }
}
