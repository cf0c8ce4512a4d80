//! # offmint-settlement
//!
//! **Finality plane**: token verification, the atomic verify-then-credit
//! commit, and post-settlement reconciliation.
//!
//! ## Architecture
//!
//! The finality plane receives a [`SettlementRequest`] from a merchant and:
//! 1. Checks idempotency (a resubmitted `payment_request_id` returns the
//!    prior result verbatim)
//! 2. Verifies every token in the batch — spent-set membership, Ed25519
//!    signature, expiry — before touching any state
//! 3. Commits atomically: mark all tokens spent + credit the merchant +
//!    append one ledger entry + enqueue burn obligations
//! 4. Reconciles out-of-band: the outbox worker burns locked escrow on the
//!    issuing side, retrying until it lands
//!
//! ## Why the spent set lives here
//!
//! A bearer token can be copied at will — spend authority must live
//! server-side. The check-then-insert on the spent set is a single
//! atomically-visible operation inside the commit transaction, so two
//! concurrent settlements presenting the same token cannot both succeed.
//!
//! [`SettlementRequest`]: offmint_types::SettlementRequest

pub mod engine;
pub mod memory;
pub mod reconcile;
pub mod sled_store;
pub mod store;

pub use engine::SettlementEngine;
pub use memory::MemoryStore;
pub use reconcile::{EscrowBurner, ReconcileReport, ReconciliationWorker};
pub use sled_store::SledStore;
pub use store::{CommitOutcome, SettlementStore};
