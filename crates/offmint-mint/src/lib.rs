//! # offmint-mint
//!
//! **Issuance plane**: escrow locking, token minting, integrity gating,
//! and offline-session orchestration.
//!
//! ## Architecture
//!
//! The issuance plane converts spendable wallet balance into signed bearer
//! tokens that work with no network link:
//!
//! 1. **IntegrityGate**: fail-closed device check — no mint for a
//!    compromised device
//! 2. **EscrowVault**: moves funds spendable → locked, backing the tokens
//! 3. **TokenMinter**: greedy denomination decomposition + Ed25519 signing
//! 4. **IssuanceRegistry**: advisory metadata for issued tokens
//! 5. **OfflineSessionCoordinator**: sequences gate → lock → mint as one
//!    client-facing call, releasing the lock if minting fails
//!
//! ## Session Flow
//!
//! ```text
//! client → IntegrityGate.evaluate() → EscrowVault.lock() → TokenMinter.mint()
//!        → tokens handed to the device for out-of-band transfer
//! ```
//!
//! Settlement never trusts anything this plane records — every token is
//! re-verified from its signature alone.

pub mod escrow;
pub mod gate;
pub mod issuance;
pub mod minter;
pub mod session;

pub use escrow::{EscrowVault, WalletBalance};
pub use gate::IntegrityGate;
pub use issuance::{IssuanceRecord, IssuanceRegistry, IssuanceStatus};
pub use minter::{TokenMinter, decompose};
pub use session::{OfflineSession, OfflineSessionCoordinator};
