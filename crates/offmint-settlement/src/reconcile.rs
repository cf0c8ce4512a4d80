//! Reconciliation worker — drains the burn-obligation outbox.
//!
//! The commit writes obligations durably; this worker delivers them to the
//! escrow side out-of-band. A failed burn is logged, its attempt counter
//! bumped, and the row left queued — settlement is already final and is
//! never unwound. Callers schedule [`ReconciliationWorker::run_once`] on
//! whatever cadence fits their deployment.

use std::sync::Arc;

use offmint_types::{Result, WalletId};

use crate::store::SettlementStore;

/// The escrow side's burn endpoint: permanently remove settled value from
/// an issuer wallet's locked balance.
pub trait EscrowBurner: Send + Sync {
    fn burn(&self, wallet_id: &WalletId, amount: u64) -> Result<()>;
}

/// Outcome of one outbox drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Obligations delivered and removed from the outbox.
    pub completed: usize,
    /// Obligations that failed delivery and remain queued.
    pub failed: usize,
}

/// Drains pending burn obligations against an [`EscrowBurner`].
pub struct ReconciliationWorker<S> {
    store: Arc<S>,
    burner: Arc<dyn EscrowBurner>,
}

impl<S: SettlementStore> ReconciliationWorker<S> {
    #[must_use]
    pub fn new(store: Arc<S>, burner: Arc<dyn EscrowBurner>) -> Self {
        Self { store, burner }
    }

    /// Attempt every pending obligation once, oldest first.
    ///
    /// # Errors
    /// Only storage faults propagate; burn failures are absorbed into the
    /// report and retried on the next pass.
    pub fn run_once(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for obligation in self.store.pending_obligations()? {
            match self.burner.burn(&obligation.wallet_id, obligation.amount) {
                Ok(()) => {
                    self.store.complete_obligation(&obligation.obligation_id)?;
                    report.completed += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        obligation = %obligation.obligation_id,
                        wallet = %obligation.wallet_id,
                        amount = obligation.amount,
                        attempts = obligation.attempts + 1,
                        error = %err,
                        "burn delivery failed, leaving obligation queued"
                    );
                    self.store.record_attempt(&obligation.obligation_id)?;
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
