//! Configuration for minting and escrow policy.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Operational policy for token issuance.
///
/// Adjustable at runtime by an operator (e.g., shrinking the validity window
/// or escrow cap during a fraud spike) — new mints pick up the new policy,
/// already-issued tokens keep the expiry they were signed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintPolicy {
    /// Fixed denomination set, strictly descending.
    pub denominations: Vec<u64>,
    /// Token validity window in hours, measured from mint time.
    pub validity_hours: i64,
    /// Maximum total locked escrow per wallet.
    pub escrow_cap: u64,
}

impl MintPolicy {
    /// The validity window as a [`chrono::Duration`].
    #[must_use]
    pub fn validity(&self) -> Duration {
        Duration::hours(self.validity_hours)
    }

    /// The smallest denomination in the set.
    #[must_use]
    pub fn smallest_denomination(&self) -> Option<u64> {
        self.denominations.last().copied()
    }

    /// Validate the policy: denominations non-empty, nonzero, strictly
    /// descending; validity positive.
    ///
    /// # Errors
    /// Returns [`crate::OffmintError::Configuration`] describing the first
    /// violation found.
    pub fn validate(&self) -> crate::Result<()> {
        if self.denominations.is_empty() {
            return Err(crate::OffmintError::Configuration(
                "denomination set must not be empty".to_string(),
            ));
        }
        for pair in self.denominations.windows(2) {
            if pair[0] <= pair[1] {
                return Err(crate::OffmintError::Configuration(format!(
                    "denominations must be strictly descending, got {} before {}",
                    pair[0], pair[1]
                )));
            }
        }
        if self.denominations.contains(&0) {
            return Err(crate::OffmintError::Configuration(
                "zero denomination is not allowed".to_string(),
            ));
        }
        if self.validity_hours <= 0 {
            return Err(crate::OffmintError::Configuration(format!(
                "validity_hours must be positive, got {}",
                self.validity_hours
            )));
        }
        Ok(())
    }
}

impl Default for MintPolicy {
    fn default() -> Self {
        Self {
            denominations: constants::DENOMINATIONS.to_vec(),
            validity_hours: constants::TOKEN_VALIDITY_HOURS,
            escrow_cap: constants::DEFAULT_ESCROW_CAP,
        }
    }
}
