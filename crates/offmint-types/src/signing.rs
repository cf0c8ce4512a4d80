//! Ed25519 signing and verification for bearer tokens.
//!
//! [`TokenSigner`] exclusively owns the private key material. It is loaded
//! once at startup from securely provisioned seed bytes and is never
//! serialized or logged — its `Debug` impl prints only the public-key
//! fingerprint. [`TokenVerifier`] wraps the public half and can be handed to
//! any settlement node without exposing minting capability.
//!
//! Verification **never raises**: malformed signatures, wrong keys, and
//! tampered payloads all collapse to `false`, so callers cannot be tricked
//! by exception-based bypass.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::constants::{SIGNATURE_LENGTH, SIGNING_SEED_LENGTH};
use crate::{OffmintError, Result};

// ---------------------------------------------------------------------------
// TokenSigner
// ---------------------------------------------------------------------------

/// Holds the Ed25519 signing key and produces detached signatures over
/// canonical token payloads.
pub struct TokenSigner {
    keypair: SigningKey,
}

impl TokenSigner {
    /// Construct from a 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: [u8; SIGNING_SEED_LENGTH]) -> Self {
        Self {
            keypair: SigningKey::from_bytes(&seed),
        }
    }

    /// Construct from a hex-encoded 32-byte seed, as provisioned by a
    /// key-management system.
    ///
    /// # Errors
    /// Returns [`OffmintError::KeyMaterial`] if the hex is malformed or the
    /// decoded seed is not exactly 32 bytes.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self> {
        let bytes = hex::decode(seed_hex.trim())
            .map_err(|e| OffmintError::KeyMaterial(format!("seed is not valid hex: {e}")))?;
        let seed: [u8; SIGNING_SEED_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            OffmintError::KeyMaterial(format!(
                "seed must be {SIGNING_SEED_LENGTH} bytes, got {}",
                v.len()
            ))
        })?;
        Ok(Self::from_seed(seed))
    }

    /// Generate a fresh random keypair (development and tests).
    #[must_use]
    pub fn generate() -> Self {
        Self {
            keypair: SigningKey::generate(&mut OsRng),
        }
    }

    /// Produce a detached 64-byte signature over `payload`.
    #[must_use]
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.keypair.sign(payload).to_bytes().to_vec()
    }

    /// The verifier for this signer's public key.
    #[must_use]
    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier {
            key: self.keypair.verifying_key(),
        }
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("public_key", &self.verifier().fingerprint())
            .field("secret", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TokenVerifier
// ---------------------------------------------------------------------------

/// The public half of the signing keypair. Freely distributable.
#[derive(Debug, Clone, Copy)]
pub struct TokenVerifier {
    key: VerifyingKey,
}

impl TokenVerifier {
    /// Construct from raw public key bytes.
    ///
    /// # Errors
    /// Returns [`OffmintError::KeyMaterial`] if the bytes are not a valid
    /// Ed25519 public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let key = VerifyingKey::from_bytes(bytes)
            .map_err(|e| OffmintError::KeyMaterial(format!("invalid public key: {e}")))?;
        Ok(Self { key })
    }

    /// Raw public key bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// Verify a detached signature over `payload`.
    ///
    /// Any failure — wrong length, unparseable signature, wrong key,
    /// tampered payload — returns `false`. This function cannot panic or
    /// error.
    #[must_use]
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        if signature.len() != SIGNATURE_LENGTH {
            return false;
        }
        let Ok(sig) = Signature::from_slice(signature) else {
            return false;
        };
        self.key.verify(payload, &sig).is_ok()
    }

    /// Short SHA-256 fingerprint of the public key, safe to log.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key.as_bytes());
        hex::encode(&digest[..8])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: [u8; 32] = [7u8; 32];

    #[test]
    fn sign_verify_roundtrip() {
        let signer = TokenSigner::from_seed(SEED);
        let verifier = signer.verifier();
        let payload = b"abc|WLT-1|500|2026-01-01T00:00:00.000000Z";
        let sig = signer.sign(payload);
        assert_eq!(sig.len(), SIGNATURE_LENGTH);
        assert!(verifier.verify(payload, &sig));
    }

    #[test]
    fn deterministic_for_same_seed() {
        let a = TokenSigner::from_seed(SEED);
        let b = TokenSigner::from_seed(SEED);
        assert_eq!(a.sign(b"payload"), b.sign(b"payload"));
        assert_eq!(a.verifier().to_bytes(), b.verifier().to_bytes());
    }

    #[test]
    fn tampered_payload_fails() {
        let signer = TokenSigner::from_seed(SEED);
        let sig = signer.sign(b"amount=100");
        assert!(!signer.verifier().verify(b"amount=900", &sig));
    }

    #[test]
    fn wrong_key_fails() {
        let signer = TokenSigner::from_seed(SEED);
        let other = TokenSigner::from_seed([9u8; 32]);
        let sig = signer.sign(b"payload");
        assert!(!other.verifier().verify(b"payload", &sig));
    }

    #[test]
    fn malformed_signatures_collapse_to_false() {
        let verifier = TokenSigner::from_seed(SEED).verifier();
        assert!(!verifier.verify(b"payload", &[]));
        assert!(!verifier.verify(b"payload", &[0u8; 63]));
        assert!(!verifier.verify(b"payload", &[0u8; 65]));
        assert!(!verifier.verify(b"payload", &[0xFFu8; 64]));
    }

    #[test]
    fn seed_hex_roundtrip() {
        let signer = TokenSigner::from_seed_hex(&hex::encode(SEED)).unwrap();
        assert_eq!(
            signer.verifier().to_bytes(),
            TokenSigner::from_seed(SEED).verifier().to_bytes()
        );
    }

    #[test]
    fn bad_seed_hex_rejected() {
        assert!(matches!(
            TokenSigner::from_seed_hex("not-hex"),
            Err(OffmintError::KeyMaterial(_))
        ));
        assert!(matches!(
            TokenSigner::from_seed_hex("deadbeef"),
            Err(OffmintError::KeyMaterial(_))
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let signer = TokenSigner::from_seed(SEED);
        let dbg = format!("{signer:?}");
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains(&hex::encode(SEED)));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let verifier = TokenSigner::from_seed(SEED).verifier();
        assert_eq!(verifier.fingerprint(), verifier.fingerprint());
        assert_eq!(verifier.fingerprint().len(), 16);
    }

    #[test]
    fn verifier_from_bytes_roundtrip() {
        let verifier = TokenSigner::from_seed(SEED).verifier();
        let restored = TokenVerifier::from_bytes(&verifier.to_bytes()).unwrap();
        let sig = TokenSigner::from_seed(SEED).sign(b"x");
        assert!(restored.verify(b"x", &sig));
    }
}
