//! Rate limiting logic and state management.

mod clock;
mod daily;
mod limiter;
mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use daily::{DailyCounters, DailyDenial};
pub use limiter::{LimitExceeded, Limits, RateLimiter};
pub use window::{SlidingWindow, WINDOW_SECS};
