//! Error types for the Offmint settlement core.
//!
//! All errors use the `OF_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Mint errors
//! - 2xx: Wallet / escrow errors
//! - 3xx: Token verification errors
//! - 4xx: Settlement errors
//! - 5xx: Integrity errors
//! - 9xx: General / internal errors
//!
//! Every verification failure is recoverable by the caller: drop the bad
//! token and resubmit, or retry with the same idempotency key. Nothing in
//! this taxonomy is fatal to the process.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{MerchantId, TokenId, WalletId};

/// Central error enum for all Offmint operations.
#[derive(Debug, Error)]
pub enum OffmintError {
    // =================================================================
    // Mint Errors (1xx)
    // =================================================================
    /// Mint requested for a non-positive amount.
    #[error("OF_ERR_100: Invalid mint amount: {amount}")]
    InvalidAmount { amount: u64 },

    /// The amount is not expressible as a sum of the fixed denominations.
    /// Rejected before any token is created — value is never silently dropped.
    #[error("OF_ERR_101: Amount {amount} not decomposable: remainder {remainder} below smallest denomination")]
    AmountNotDecomposable { amount: u64, remainder: u64 },

    // =================================================================
    // Wallet / Escrow Errors (2xx)
    // =================================================================
    /// The referenced wallet does not exist.
    #[error("OF_ERR_200: Wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// Not enough spendable balance to lock.
    #[error("OF_ERR_201: Insufficient spendable balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    /// Not enough locked balance to burn or release.
    #[error("OF_ERR_202: Insufficient locked balance: need {needed}, locked {locked}")]
    InsufficientLocked { needed: u64, locked: u64 },

    /// Locking this amount would exceed the per-wallet escrow cap.
    #[error("OF_ERR_203: Escrow cap exceeded: locking {requested} with {locked} already locked breaches cap {cap}")]
    EscrowCapExceeded {
        requested: u64,
        locked: u64,
        cap: u64,
    },

    // =================================================================
    // Token Verification Errors (3xx)
    // =================================================================
    /// The token has already been redeemed (or appears twice in one batch).
    #[error("OF_ERR_300: Token already spent: {0}")]
    TokenAlreadySpent(TokenId),

    /// The Ed25519 signature over the canonical payload didn't verify.
    #[error("OF_ERR_301: Invalid token signature: {0}")]
    InvalidSignature(TokenId),

    /// The token's expiry is strictly before the verification instant.
    #[error("OF_ERR_302: Token expired: {token_id} expired at {expired_at}")]
    TokenExpired {
        token_id: TokenId,
        expired_at: DateTime<Utc>,
    },

    // =================================================================
    // Settlement Errors (4xx)
    // =================================================================
    /// Settlement references an unknown merchant. Checked before any token
    /// verification to avoid wasted crypto work.
    #[error("OF_ERR_400: Merchant not found: {0}")]
    MerchantNotFound(MerchantId),

    /// Settlement submitted with an empty token bundle.
    #[error("OF_ERR_401: Settlement request carries no tokens")]
    EmptySettlement,

    /// The atomic commit could not be durably recorded. Transient; safe to
    /// retry with the same idempotency key.
    #[error("OF_ERR_402: Persistence failure: {0}")]
    PersistenceFailure(String),

    // =================================================================
    // Integrity Errors (5xx)
    // =================================================================
    /// Device integrity check failed — minting is refused (fail-closed).
    #[error("OF_ERR_500: Device integrity compromised: {reason}")]
    IntegrityCompromised { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OF_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("OF_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Signing key material could not be loaded (bad seed, wrong length).
    #[error("OF_ERR_902: Key material error: {0}")]
    KeyMaterial(String),

    /// Configuration error (invalid policy, missing fields, etc.).
    #[error("OF_ERR_903: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk).
    #[error("OF_ERR_904: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OffmintError>;

// Conversion from std::io::Error
impl From<std::io::Error> for OffmintError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for OffmintError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
