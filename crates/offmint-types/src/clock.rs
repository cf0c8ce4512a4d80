//! Injectable time source.
//!
//! The settlement engine's expiry check and the minter's validity window both
//! read time through [`Clock`] so tests can mint tokens in the past. The
//! server clock is authoritative — client-supplied timestamps are never
//! consulted for expiry decisions.

use chrono::{DateTime, Utc};

/// A source of "now". Implementations must be cheap and infallible.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant. **Test use only.**
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl FixedClock {
    /// Pin the clock at the given instant.
    #[must_use]
    pub fn at(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn fixed_clock_is_pinned() {
        let instant = Utc::now() - Duration::days(3);
        let clock = FixedClock::at(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), clock.now());
    }
}
