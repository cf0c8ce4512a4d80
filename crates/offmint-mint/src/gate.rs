//! Integrity gate — fail-closed device check ahead of minting.
//!
//! ## Design Principles
//!
//! - **Fail-closed**: any one failing check flips the verdict to
//!   `Compromised`; there is no partial credit
//! - **No bypass**: the session coordinator refuses to lock or mint without
//!   a `Secure` verdict
//! - **Self-report boundary**: the report is client-supplied attestation
//!   data; transport-level hardening is out of scope here

use offmint_types::{IntegrityReport, IntegrityVerdict};

/// Evaluates device integrity reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityGate;

impl IntegrityGate {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a report. Returns `Compromised` naming every failed check
    /// if any of {rooted, invalid app signature, debugger, emulator} holds.
    #[must_use]
    pub fn evaluate(&self, report: &IntegrityReport) -> IntegrityVerdict {
        let failed = report.failed_checks();
        if failed.is_empty() {
            IntegrityVerdict::Secure
        } else {
            tracing::warn!(
                device = %report.device_id,
                checks = ?failed,
                "device integrity check failed"
            );
            IntegrityVerdict::Compromised {
                reason: failed.join(", "),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_device_is_secure() {
        let gate = IntegrityGate::new();
        assert!(gate.evaluate(&IntegrityReport::dummy_secure()).is_secure());
    }

    #[test]
    fn rooted_device_is_compromised() {
        let gate = IntegrityGate::new();
        let report = IntegrityReport {
            is_rooted: true,
            ..IntegrityReport::dummy_secure()
        };
        assert!(!gate.evaluate(&report).is_secure());
    }

    #[test]
    fn invalid_app_signature_is_compromised() {
        let gate = IntegrityGate::new();
        let report = IntegrityReport {
            app_signature_valid: false,
            ..IntegrityReport::dummy_secure()
        };
        assert!(!gate.evaluate(&report).is_secure());
    }

    #[test]
    fn debugger_is_compromised() {
        let gate = IntegrityGate::new();
        let report = IntegrityReport {
            has_debugger: true,
            ..IntegrityReport::dummy_secure()
        };
        assert!(!gate.evaluate(&report).is_secure());
    }

    #[test]
    fn emulator_is_compromised() {
        let gate = IntegrityGate::new();
        let report = IntegrityReport {
            is_emulator: true,
            ..IntegrityReport::dummy_secure()
        };
        assert!(!gate.evaluate(&report).is_secure());
    }

    #[test]
    fn verdict_names_all_failed_checks() {
        let gate = IntegrityGate::new();
        let report = IntegrityReport {
            is_rooted: true,
            has_debugger: true,
            ..IntegrityReport::dummy_secure()
        };
        let IntegrityVerdict::Compromised { reason } = gate.evaluate(&report) else {
            panic!("expected compromised verdict");
        };
        assert!(reason.contains("rooted"));
        assert!(reason.contains("debugger"));
    }
}
