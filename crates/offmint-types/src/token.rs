//! # Token — the signed bearer instrument
//!
//! A [`Token`] is minted against locked escrow, carried peer-to-peer with no
//! network link, and redeemed exactly once at settlement.
//!
//! ## Lifecycle
//!
//! ```text
//!   ┌────────┐  transfer (out-of-band)  ┌──────────┐  settle   ┌───────┐
//!   │ MINTED ├─────────────────────────▶│ PRESENTED├──────────▶│ SPENT │
//!   └────────┘                          └────┬─────┘           └───────┘
//!                                            │ expired / invalid
//!                                            ▼
//!                                        discarded
//! ```
//!
//! ## Security Properties
//!
//! - **Signature-bound**: every field of the canonical payload is covered by
//!   the issuer's Ed25519 signature; mutating any one invalidates the token
//! - **Time-bound**: expiry is fixed at mint and enforced against the server
//!   clock at settlement
//! - **Stateless**: no spent flag lives on the token — a bearer object can be
//!   copied at will, so spend authority lives server-side in the spent set

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::CANONICAL_SEPARATOR;
use crate::{TokenId, WalletId};

/// A bearer token backed by locked escrow funds.
///
/// All fields are immutable after mint. The signature covers the canonical
/// payload of the other four fields — see [`Token::canonical_payload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Globally unique identifier, assigned at mint.
    pub token_id: TokenId,
    /// The wallet whose locked funds back this token.
    pub issuer_wallet_id: WalletId,
    /// Face value, drawn from the fixed denomination set.
    pub denomination: u64,
    /// Absolute instant after which the token is unredeemable.
    /// Truncated to microsecond precision so the canonical rendering is
    /// lossless across serialization boundaries.
    pub expiry_time: DateTime<Utc>,
    /// Detached Ed25519 signature over the canonical payload, hex on the wire.
    #[serde(with = "hex_signature")]
    pub signature: Vec<u8>,
}

impl Token {
    /// The canonical byte string that is signed at mint and re-verified at
    /// settlement: the pipe-delimited join of `token_id`,
    /// `issuer_wallet_id`, `denomination`, `expiry_time`, in that exact
    /// order. UUIDs render lowercase hyphenated, the denomination as a plain
    /// integer, and the expiry as RFC 3339 with fixed microsecond precision
    /// and a `Z` suffix.
    ///
    /// This is the protocol's wire contract. Any change to field order,
    /// separator, or rendering silently invalidates every issued token and
    /// requires a protocol version bump.
    #[must_use]
    pub fn canonical_payload(&self) -> Vec<u8> {
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.token_id,
            self.issuer_wallet_id,
            self.denomination,
            canonical_timestamp(self.expiry_time),
            sep = CANONICAL_SEPARATOR,
        )
        .into_bytes()
    }

    /// Whether this token's expiry is strictly before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_time < now
    }
}

/// Render a timestamp in the canonical form used inside signed payloads.
#[must_use]
pub fn canonical_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Truncate a timestamp to the microsecond precision the canonical form
/// carries. Applied once at mint so a wire round-trip reproduces the exact
/// signed instant.
#[must_use]
pub fn canonical_truncate(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

mod hex_signature {
    //! Signatures travel as lowercase hex text so tokens survive QR and
    //! JSON transports unmodified.

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(&text).map_err(D::Error::custom)
    }
}

/// Dummy token with a zeroed signature. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Token {
    /// Create an unsigned dummy token for unit tests.
    #[must_use]
    pub fn dummy(denomination: u64) -> Self {
        Self {
            token_id: TokenId::new(),
            issuer_wallet_id: WalletId::from("WLT-DUMMY"),
            denomination,
            expiry_time: canonical_truncate(Utc::now() + chrono::Duration::hours(48)),
            signature: vec![0u8; crate::constants::SIGNATURE_LENGTH],
        }
    }
}
