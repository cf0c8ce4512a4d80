//! Token minter — greedy denomination decomposition + Ed25519 signing.
//!
//! Minting converts an already-locked escrow amount into a bundle of signed
//! bearer tokens. Decomposition iterates the fixed denomination list in
//! descending order, emitting as many tokens of each value as fit. Amounts
//! that leave a remainder below the smallest denomination are rejected up
//! front — no value is ever silently dropped.

use std::fmt;
use std::sync::Arc;

use offmint_types::{
    Clock, MintPolicy, OffmintError, Result, Token, TokenId, TokenSigner, WalletId,
    canonical_truncate,
};

use crate::issuance::IssuanceRegistry;

/// Decompose `amount` into denominations, greedily, largest first.
///
/// `denominations` must be strictly descending (see
/// [`MintPolicy::validate`]).
///
/// # Errors
/// - [`OffmintError::InvalidAmount`] if `amount` is zero
/// - [`OffmintError::AmountNotDecomposable`] if a nonzero remainder is left
///   after the smallest denomination
pub fn decompose(amount: u64, denominations: &[u64]) -> Result<Vec<u64>> {
    if amount == 0 {
        return Err(OffmintError::InvalidAmount { amount });
    }

    let mut values = Vec::new();
    let mut remaining = amount;
    for &value in denominations {
        while remaining >= value {
            values.push(value);
            remaining -= value;
        }
    }

    if remaining > 0 {
        return Err(OffmintError::AmountNotDecomposable {
            amount,
            remainder: remaining,
        });
    }
    Ok(values)
}

/// Mints signed bearer tokens against a wallet's locked escrow.
///
/// The minter holds the only reference to the [`TokenSigner`] on this node.
/// It does **not** check escrow balances — locking the backing funds is the
/// caller's precondition (see [`crate::OfflineSessionCoordinator`]).
pub struct TokenMinter {
    signer: Arc<TokenSigner>,
    policy: MintPolicy,
    registry: IssuanceRegistry,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenMinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenMinter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl TokenMinter {
    /// Create a minter with the given signer, policy, and clock.
    ///
    /// # Errors
    /// Returns [`OffmintError::Configuration`] if the policy is invalid.
    pub fn new(signer: Arc<TokenSigner>, policy: MintPolicy, clock: Arc<dyn Clock>) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            signer,
            policy,
            registry: IssuanceRegistry::new(),
            clock,
        })
    }

    /// Mint a bundle of tokens summing to exactly `amount`.
    ///
    /// Tokens are returned largest denomination first. Each receives a fresh
    /// id, an expiry of now + the policy's validity window, and a signature
    /// over its canonical payload. Every minted token is registered in the
    /// issuance registry as `ISSUED`.
    ///
    /// # Errors
    /// - [`OffmintError::InvalidAmount`] if `amount` is zero
    /// - [`OffmintError::AmountNotDecomposable`] if the amount doesn't
    ///   decompose over the policy's denominations — rejected before any
    ///   token is created
    pub fn mint(&self, issuer_wallet_id: &WalletId, amount: u64) -> Result<Vec<Token>> {
        let values = decompose(amount, &self.policy.denominations)?;

        let now = self.clock.now();
        let expiry = canonical_truncate(now + self.policy.validity());

        let tokens: Vec<Token> = values
            .into_iter()
            .map(|denomination| {
                let mut token = Token {
                    token_id: TokenId::new(),
                    issuer_wallet_id: issuer_wallet_id.clone(),
                    denomination,
                    expiry_time: expiry,
                    signature: Vec::new(),
                };
                token.signature = self.signer.sign(&token.canonical_payload());
                token
            })
            .collect();

        for token in &tokens {
            self.registry.record_issued(token.clone(), now);
        }

        tracing::debug!(
            wallet = %issuer_wallet_id,
            amount,
            count = tokens.len(),
            "minted token bundle"
        );
        Ok(tokens)
    }

    /// The issuance registry backing this minter.
    #[must_use]
    pub fn registry(&self) -> &IssuanceRegistry {
        &self.registry
    }

    /// The policy this minter issues under.
    #[must_use]
    pub fn policy(&self) -> &MintPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use offmint_types::{FixedClock, SystemClock};
    use std::collections::HashSet;

    fn minter() -> TokenMinter {
        TokenMinter::new(
            Arc::new(TokenSigner::from_seed([7u8; 32])),
            MintPolicy::default(),
            Arc::new(SystemClock),
        )
        .unwrap()
    }

    #[test]
    fn decompose_1800() {
        let values = decompose(1800, &[1000, 500, 200, 100]).unwrap();
        assert_eq!(values, vec![1000, 500, 200, 100]);
    }

    #[test]
    fn decompose_repeats_denominations() {
        let values = decompose(2700, &[1000, 500, 200, 100]).unwrap();
        assert_eq!(values, vec![1000, 1000, 500, 200]);
        assert_eq!(values.iter().sum::<u64>(), 2700);
    }

    #[test]
    fn decompose_zero_rejected() {
        let err = decompose(0, &[1000, 500, 200, 100]).unwrap_err();
        assert!(matches!(err, OffmintError::InvalidAmount { amount: 0 }));
    }

    #[test]
    fn decompose_remainder_rejected() {
        let err = decompose(1850, &[1000, 500, 200, 100]).unwrap_err();
        assert!(matches!(
            err,
            OffmintError::AmountNotDecomposable {
                amount: 1850,
                remainder: 50
            }
        ));
    }

    #[test]
    fn decompose_below_smallest_rejected() {
        let err = decompose(40, &[1000, 500, 200, 100]).unwrap_err();
        assert!(matches!(
            err,
            OffmintError::AmountNotDecomposable {
                amount: 40,
                remainder: 40
            }
        ));
    }

    #[test]
    fn mint_sums_to_amount_with_unique_ids() {
        let minter = minter();
        let tokens = minter.mint(&WalletId::from("WLT-1"), 1800).unwrap();

        assert_eq!(tokens.iter().map(|t| t.denomination).sum::<u64>(), 1800);
        let ids: HashSet<_> = tokens.iter().map(|t| t.token_id).collect();
        assert_eq!(ids.len(), tokens.len());
    }

    #[test]
    fn minted_tokens_verify() {
        let signer = Arc::new(TokenSigner::from_seed([7u8; 32]));
        let verifier = signer.verifier();
        let minter =
            TokenMinter::new(signer, MintPolicy::default(), Arc::new(SystemClock)).unwrap();

        let tokens = minter.mint(&WalletId::from("WLT-1"), 1300).unwrap();
        for token in &tokens {
            assert!(verifier.verify(&token.canonical_payload(), &token.signature));
        }
    }

    #[test]
    fn mint_applies_validity_window() {
        let minted_at = Utc::now() - Duration::hours(1);
        let minter = TokenMinter::new(
            Arc::new(TokenSigner::from_seed([7u8; 32])),
            MintPolicy::default(),
            Arc::new(FixedClock::at(minted_at)),
        )
        .unwrap();

        let tokens = minter.mint(&WalletId::from("WLT-1"), 100).unwrap();
        assert_eq!(
            tokens[0].expiry_time,
            canonical_truncate(minted_at + Duration::hours(48))
        );
    }

    #[test]
    fn mint_registers_issuance_records() {
        let minter = minter();
        let tokens = minter.mint(&WalletId::from("WLT-1"), 700).unwrap();

        assert_eq!(minter.registry().count(), tokens.len());
        for token in &tokens {
            let record = minter.registry().get(&token.token_id).unwrap();
            assert_eq!(record.token.denomination, token.denomination);
        }
    }

    #[test]
    fn mint_rejects_without_side_effects() {
        let minter = minter();
        assert!(minter.mint(&WalletId::from("WLT-1"), 1850).is_err());
        assert_eq!(minter.registry().count(), 0);
    }

    #[test]
    fn invalid_policy_rejected_at_construction() {
        let err = TokenMinter::new(
            Arc::new(TokenSigner::from_seed([7u8; 32])),
            MintPolicy {
                denominations: vec![100, 1000],
                ..MintPolicy::default()
            },
            Arc::new(SystemClock),
        )
        .unwrap_err();
        assert!(matches!(err, OffmintError::Configuration(_)));
    }
}
