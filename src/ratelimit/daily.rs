//! Calendar-day admission counters.
//!
//! Counters for every identity are cleared together when the UTC date
//! moves past the stored day. Increments hold the day marker shared and
//! rollover holds it exclusively, so a clear never interleaves with an
//! increment and nothing counted on the old day survives it.

use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::identity::Identity;

/// Per-identity counts of admissions on the current UTC day.
pub struct DailyCounters {
    /// The day the counters belong to
    day: RwLock<NaiveDate>,
    /// Admissions per identity since `day` began
    counts: DashMap<Identity, u64>,
}

/// Why a request was not counted for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyDenial {
    /// The identity's allowance for today is spent
    Exhausted,
    /// The allowance had room but the caller's gate refused the request
    Gated,
}

impl DailyCounters {
    /// Create empty counters for `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            day: RwLock::new(today),
            counts: DashMap::new(),
        }
    }

    /// Increment the identity's counter for `today` unless it has reached
    /// `limit`.
    ///
    /// Returns `false` (and leaves the counter untouched) when denied.
    pub fn try_admit(&self, identity: &Identity, today: NaiveDate, limit: u64) -> bool {
        self.try_admit_with(identity, today, limit, || true).is_ok()
    }

    /// Like [`try_admit`](Self::try_admit), but only counts the request if
    /// `gate` also accepts it.
    ///
    /// `gate` runs while the identity's counter is locked and only when the
    /// allowance has room, so concurrent callers for the same identity never
    /// observe a count for a request the gate refused.
    pub fn try_admit_with<F>(
        &self,
        identity: &Identity,
        today: NaiveDate,
        limit: u64,
        gate: F,
    ) -> Result<(), DailyDenial>
    where
        F: FnOnce() -> bool,
    {
        let _day = self.enter(today);
        let mut count = self.counts.entry(identity.clone()).or_insert(0);

        if *count >= limit {
            return Err(DailyDenial::Exhausted);
        }
        if !gate() {
            return Err(DailyDenial::Gated);
        }

        *count += 1;
        Ok(())
    }

    /// Acquire the day marker, rolling over first if `today` is later.
    ///
    /// A `today` earlier than the stored day is counted against the stored
    /// day; the marker only moves forward.
    fn enter(&self, today: NaiveDate) -> RwLockReadGuard<'_, NaiveDate> {
        {
            let day = self.day.read();
            if today <= *day {
                return day;
            }
        }

        let mut day = self.day.write();
        // Another request may have rolled over while we waited
        if today > *day {
            let cleared = self.counts.len();
            self.counts.clear();
            info!(
                previous_day = %*day,
                day = %today,
                cleared_identities = cleared,
                "UTC day rolled over, daily counters reset"
            );
            *day = today;
        }
        RwLockWriteGuard::downgrade(day)
    }

    /// Current count for an identity (zero if never seen today).
    pub fn count(&self, identity: &Identity) -> u64 {
        self.counts.get(identity).map(|c| *c).unwrap_or(0)
    }

    /// The day the counters currently belong to.
    pub fn current_day(&self) -> NaiveDate {
        *self.day.read()
    }

    /// Number of identities with a counter today.
    pub fn tracked(&self) -> usize {
        self.counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn issuer(name: &str) -> Identity {
        Identity::Issuer(name.to_string())
    }

    #[test]
    fn test_admits_until_limit() {
        let counters = DailyCounters::new(day(1));
        let y = issuer("service-y");

        assert!(counters.try_admit(&y, day(1), 2));
        assert!(counters.try_admit(&y, day(1), 2));
        assert!(!counters.try_admit(&y, day(1), 2));

        // Denial does not increment
        assert_eq!(counters.count(&y), 2);
    }

    #[test]
    fn test_identities_are_independent() {
        let counters = DailyCounters::new(day(1));
        let y = issuer("service-y");
        let z = issuer("service-z");

        for _ in 0..2 {
            assert!(counters.try_admit(&y, day(1), 2));
        }
        assert!(!counters.try_admit(&y, day(1), 2));
        assert!(counters.try_admit(&z, day(1), 2));
    }

    #[test]
    fn test_rollover_clears_every_identity() {
        let counters = DailyCounters::new(day(1));
        let y = issuer("service-y");
        let z = issuer("service-z");

        assert!(counters.try_admit(&y, day(1), 1));
        assert!(counters.try_admit(&z, day(1), 1));
        assert_eq!(counters.tracked(), 2);

        // First request of the new day resets everyone, not just the caller
        assert!(counters.try_admit(&y, day(2), 1));
        assert_eq!(counters.current_day(), day(2));
        assert_eq!(counters.count(&y), 1);
        assert_eq!(counters.count(&z), 0);
        assert_eq!(counters.tracked(), 1);
    }

    #[test]
    fn test_rollover_happens_once() {
        let counters = DailyCounters::new(day(1));
        let y = issuer("service-y");

        assert!(counters.try_admit(&y, day(2), 5));
        assert!(counters.try_admit(&y, day(2), 5));
        assert_eq!(counters.count(&y), 2);
    }

    #[test]
    fn test_stale_day_counts_against_current_day() {
        let counters = DailyCounters::new(day(2));
        let y = issuer("service-y");

        assert!(counters.try_admit(&y, day(1), 5));
        assert_eq!(counters.current_day(), day(2));
        assert_eq!(counters.count(&y), 1);
    }

    #[test]
    fn test_gate_refusal_is_not_counted() {
        let counters = DailyCounters::new(day(1));
        let y = issuer("service-y");

        assert_eq!(
            counters.try_admit_with(&y, day(1), 1, || false),
            Err(DailyDenial::Gated)
        );
        assert_eq!(counters.count(&y), 0);
        assert!(counters.try_admit(&y, day(1), 1));
    }

    #[test]
    fn test_gate_skipped_when_exhausted() {
        let counters = DailyCounters::new(day(1));
        let y = issuer("service-y");
        assert!(counters.try_admit(&y, day(1), 1));

        let result = counters.try_admit_with(&y, day(1), 1, || panic!("gate must not run"));
        assert_eq!(result, Err(DailyDenial::Exhausted));
    }
}
