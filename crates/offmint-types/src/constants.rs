//! System-wide constants for the Offmint settlement core.

/// Fixed denomination set, descending. The minter decomposes amounts
/// greedily over this list.
pub const DENOMINATIONS: [u64; 4] = [1000, 500, 200, 100];

/// Token validity window in hours, measured from mint time.
pub const TOKEN_VALIDITY_HOURS: i64 = 48;

/// Default cap on total locked escrow per wallet (operational risk lever).
pub const DEFAULT_ESCROW_CAP: u64 = 5000;

/// Ed25519 seed length in bytes.
pub const SIGNING_SEED_LENGTH: usize = 32;

/// Ed25519 detached signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Field separator inside the canonical signed token payload.
///
/// Part of the wire contract — changing it invalidates every issued token.
pub const CANONICAL_SEPARATOR: char = '|';

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Offmint";
