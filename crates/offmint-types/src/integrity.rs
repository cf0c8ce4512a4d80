//! Device integrity report types.
//!
//! The client submits a self-report before an offline session is prepared;
//! the gate in `offmint-mint` evaluates it fail-closed. These types only
//! model the boundary — attestation transport is out of scope.

use serde::{Deserialize, Serialize};

/// Client-reported device state, submitted before minting is permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub device_id: String,
    pub is_rooted: bool,
    pub app_signature_valid: bool,
    pub has_debugger: bool,
    pub is_emulator: bool,
}

impl IntegrityReport {
    /// Names of the checks this report fails, in a stable order.
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.is_rooted {
            failed.push("rooted");
        }
        if !self.app_signature_valid {
            failed.push("invalid app signature");
        }
        if self.has_debugger {
            failed.push("debugger attached");
        }
        if self.is_emulator {
            failed.push("emulator");
        }
        failed
    }
}

/// Outcome of the integrity gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntegrityVerdict {
    /// Every check passed; minting may proceed.
    Secure,
    /// At least one check failed; minting is refused.
    Compromised { reason: String },
}

impl IntegrityVerdict {
    #[must_use]
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure)
    }
}

/// Clean report for a well-behaved device. **Test use only.**
#[cfg(any(test, feature = "test-helpers"))]
impl IntegrityReport {
    #[must_use]
    pub fn dummy_secure() -> Self {
        Self {
            device_id: "DEV-TEST".to_string(),
            is_rooted: false,
            app_signature_valid: true,
            has_debugger: false,
            is_emulator: false,
        }
    }
}
