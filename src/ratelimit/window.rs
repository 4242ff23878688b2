//! Sliding-window admission log for the per-minute limit.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};

/// Span of the sliding window in seconds.
pub const WINDOW_SECS: i64 = 60;

/// Timestamps of admitted requests within the trailing window, oldest first.
///
/// Expired entries are purged from the front lazily, on each admission
/// attempt. A denied attempt leaves no trace.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    /// Admission times, oldest first
    timestamps: VecDeque<DateTime<Utc>>,
    /// Length of the window
    span: TimeDelta,
}

impl SlidingWindow {
    /// Create an empty sixty-second window.
    pub fn new() -> Self {
        Self::with_span(TimeDelta::seconds(WINDOW_SECS))
    }

    /// Create an empty window of arbitrary length.
    pub fn with_span(span: TimeDelta) -> Self {
        Self {
            timestamps: VecDeque::new(),
            span,
        }
    }

    /// Purge expired entries, then record `now` if fewer than `limit`
    /// entries remain.
    ///
    /// Returns `true` if the request was admitted.
    pub fn try_record(&mut self, now: DateTime<Utc>, limit: u64) -> bool {
        self.purge(now);

        if self.timestamps.len() as u64 >= limit {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }

    /// Drop every entry strictly older than `now - span`.
    pub fn purge(&mut self, now: DateTime<Utc>) {
        let floor = now - self.span;
        while let Some(&oldest) = self.timestamps.front() {
            if oldest >= floor {
                break;
            }
            self.timestamps.pop_front();
        }
    }

    /// Number of retained entries (without purging).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the window holds no entries.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Oldest retained admission time.
    pub fn oldest(&self) -> Option<DateTime<Utc>> {
        self.timestamps.front().copied()
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn minute() -> TimeDelta {
        TimeDelta::seconds(WINDOW_SECS)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_admits_up_to_limit() {
        let mut window = SlidingWindow::new();

        for i in 0..3 {
            assert!(window.try_record(t0() + TimeDelta::milliseconds(i * 100), 3));
        }

        // The 4th request within the same second is rejected
        assert!(!window.try_record(t0() + TimeDelta::milliseconds(900), 3));
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_denied_attempt_is_not_recorded() {
        let mut window = SlidingWindow::new();
        assert!(window.try_record(t0(), 1));

        for _ in 0..5 {
            assert!(!window.try_record(t0() + TimeDelta::seconds(1), 1));
        }
        assert_eq!(window.len(), 1);
        assert_eq!(window.oldest(), Some(t0()));
    }

    #[test]
    fn test_entries_expire_after_sixty_seconds() {
        let mut window = SlidingWindow::new();
        for _ in 0..3 {
            assert!(window.try_record(t0(), 3));
        }

        assert!(!window.try_record(t0() + TimeDelta::seconds(30), 3));
        assert!(window.try_record(t0() + TimeDelta::seconds(61), 3));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_entry_exactly_at_floor_is_kept() {
        let mut window = SlidingWindow::new();
        assert!(window.try_record(t0(), 1));

        // now - 60s == t0, which is not strictly older than the floor
        assert!(!window.try_record(t0() + minute(), 1));
        assert!(window.try_record(t0() + minute() + TimeDelta::milliseconds(1), 1));
    }

    #[test]
    fn test_purge_keeps_only_recent_entries() {
        let mut window = SlidingWindow::new();
        for secs in [0, 10, 20, 50] {
            assert!(window.try_record(t0() + TimeDelta::seconds(secs), 10));
        }

        let now = t0() + TimeDelta::seconds(75);
        window.purge(now);

        assert_eq!(window.len(), 2);
        assert!(window.oldest().is_some_and(|oldest| oldest >= now - minute()));
    }

    #[test]
    fn test_zero_limit_admits_nothing() {
        let mut window = SlidingWindow::new();
        assert!(!window.try_record(t0(), 0));
        assert!(window.is_empty());
    }
}
