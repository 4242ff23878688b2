//! Core dual-window rate limiter.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, trace};

use super::clock::{Clock, SystemClock};
use super::daily::{DailyCounters, DailyDenial};
use super::window::SlidingWindow;
use crate::identity::Identity;

/// Admission caps applied to every identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Requests admitted per rolling 60 seconds
    pub per_minute: u64,
    /// Requests admitted per UTC calendar day
    pub per_day: u64,
}

/// Which limit denied a request, with its configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitExceeded {
    /// The caller used up its daily allowance
    #[error("Daily limit exceeded: {limit} emails per day allowed")]
    Daily { limit: u64 },

    /// The caller sent too many requests in the last 60 seconds
    #[error("Rate limit exceeded: {limit} requests per minute allowed")]
    Minute { limit: u64 },
}

/// Per-identity rate limiter enforcing a sliding 60-second window and a
/// UTC calendar-day counter.
///
/// This struct is thread-safe and can be shared across multiple tasks.
/// Checks for one identity are serialized; different identities only
/// contend when they hash to the same map shard.
pub struct RateLimiter {
    /// Active limits, swapped on config reload
    limits: RwLock<Limits>,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Sliding minute windows indexed by identity
    minute_windows: DashMap<Identity, SlidingWindow>,
    /// Calendar-day counters
    daily: DailyCounters,
}

impl RateLimiter {
    /// Create a new rate limiter on the system clock.
    pub fn new(limits: Limits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    /// Create a new rate limiter on an explicit clock.
    pub fn with_clock(limits: Limits, clock: Arc<dyn Clock>) -> Self {
        let today = clock.now().date_naive();
        Self {
            limits: RwLock::new(limits),
            clock,
            minute_windows: DashMap::new(),
            daily: DailyCounters::new(today),
        }
    }

    /// Count a request against the identity's daily allowance.
    ///
    /// Returns `false` without incrementing once the allowance is spent.
    pub fn check_daily(&self, identity: &Identity) -> bool {
        let limit = self.limits.read().per_day;
        let today = self.clock.now().date_naive();
        self.daily.try_admit(identity, today, limit)
    }

    /// Record a request in the identity's minute window.
    ///
    /// Returns `false` without recording when the window is full.
    pub fn check_minute(&self, identity: &Identity) -> bool {
        let limit = self.limits.read().per_minute;
        let now = self.clock.now();
        let mut window = self.minute_windows.entry(identity.clone()).or_default();
        window.try_record(now, limit)
    }

    /// Run the daily check and then the minute check for one request.
    ///
    /// A request over both limits is reported as [`LimitExceeded::Daily`].
    /// The identity's daily counter stays locked while the minute window is
    /// consulted and is only incremented once both checks pass, so a denied
    /// request is charged against neither window. Lock order is day marker,
    /// daily counter, then minute window.
    pub fn admit(&self, identity: &Identity) -> Result<(), LimitExceeded> {
        let limits = *self.limits.read();
        let now = self.clock.now();

        trace!(identity = %identity, "Checking rate limits");

        let result = self
            .daily
            .try_admit_with(identity, now.date_naive(), limits.per_day, || {
                let mut window = self.minute_windows.entry(identity.clone()).or_default();
                window.try_record(now, limits.per_minute)
            });

        match result {
            Ok(()) => Ok(()),
            Err(DailyDenial::Exhausted) => {
                debug!(identity = %identity, limit = limits.per_day, "Daily limit exceeded");
                Err(LimitExceeded::Daily {
                    limit: limits.per_day,
                })
            }
            Err(DailyDenial::Gated) => {
                debug!(identity = %identity, limit = limits.per_minute, "Minute limit exceeded");
                Err(LimitExceeded::Minute {
                    limit: limits.per_minute,
                })
            }
        }
    }

    /// Drop minute windows with no admissions left in the trailing 60 seconds.
    ///
    /// Returns the number of windows removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let before = self.minute_windows.len();
        self.minute_windows.retain(|_, window| {
            window.purge(now);
            !window.is_empty()
        });
        let removed = before.saturating_sub(self.minute_windows.len());
        if removed > 0 {
            debug!(removed, "Removed idle minute windows");
        }
        removed
    }

    /// Number of identities with a minute window.
    pub fn tracked_identities(&self) -> usize {
        self.minute_windows.len()
    }

    /// Replace the active limits.
    ///
    /// Recorded requests are kept; a lowered minute cap applies as the
    /// window drains.
    pub fn set_limits(&self, limits: Limits) {
        let mut current = self.limits.write();
        if *current != limits {
            info!(
                minute_limit = limits.per_minute,
                daily_limit = limits.per_day,
                "Rate limits updated"
            );
            *current = limits;
        }
    }

    /// Get the active limits.
    pub fn limits(&self) -> Limits {
        *self.limits.read()
    }

    /// Number of requests retained in the identity's minute window.
    ///
    /// Entries are not purged by this call.
    pub fn minute_count(&self, identity: &Identity) -> usize {
        self.minute_windows
            .get(identity)
            .map(|w| w.len())
            .unwrap_or(0)
    }

    /// Requests admitted today for the identity.
    pub fn daily_count(&self, identity: &Identity) -> u64 {
        self.daily.count(identity)
    }

    /// The UTC day the daily counters belong to.
    pub fn current_day(&self) -> chrono::NaiveDate {
        self.daily.current_day()
    }
}
