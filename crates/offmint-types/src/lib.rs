//! # offmint-types
//!
//! Shared types, errors, and configuration for the **Offmint** offline
//! escrow settlement core.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`TokenId`], [`WalletId`], [`MerchantId`], [`PaymentRequestId`], [`EntryId`], [`ObligationId`]
//! - **Token model**: [`Token`] and its canonical signing payload
//! - **Signing**: [`TokenSigner`], [`TokenVerifier`] (Ed25519 detached signatures)
//! - **Ledger model**: [`LedgerEntry`]
//! - **Settlement model**: [`SettlementRequest`], [`SettlementOutcome`], [`BurnObligation`]
//! - **Integrity model**: [`IntegrityReport`], [`IntegrityVerdict`]
//! - **Clock**: [`Clock`], [`SystemClock`] (injectable time source)
//! - **Configuration**: [`MintPolicy`]
//! - **Errors**: [`OffmintError`] with `OF_ERR_` prefix codes
//! - **Constants**: denominations, validity window, escrow cap defaults

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod integrity;
pub mod ledger;
pub mod settlement;
pub mod signing;
pub mod token;

// Re-export all primary types at crate root for ergonomic imports:
//   use offmint_types::{Token, TokenSigner, SettlementOutcome, ...};

pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use integrity::*;
pub use ledger::*;
pub use settlement::*;
pub use signing::*;
pub use token::*;

// Constants are accessed via `offmint_types::constants::FOO`
// (not re-exported to avoid name collisions).
