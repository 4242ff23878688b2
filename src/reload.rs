//! Reload-on-change for the config file.
//!
//! Polls the file's modification time and swaps the limiter's limits when
//! it changes. Only limits are applied live; bind address and base URL are
//! fixed for the life of the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::EmulatorConfig;
use crate::error::Result;
use crate::ratelimit::{Limits, RateLimiter};

const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Watches a config file and applies limit changes to a running limiter.
pub struct ConfigWatcher {
    path: PathBuf,
    interval: Duration,
    limiter: Arc<RateLimiter>,
    /// File and environment config the running settings came from, before
    /// any command-line flags were applied
    baseline: EmulatorConfig,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`.
    ///
    /// `baseline` must be the config as loaded from the file and
    /// environment, without command-line flags applied, since reloads are
    /// compared against it.
    pub fn new(
        path: impl Into<PathBuf>,
        interval: Duration,
        limiter: Arc<RateLimiter>,
        baseline: EmulatorConfig,
    ) -> Self {
        let path = path.into();
        let last_modified = modified(&path);
        Self {
            path,
            interval: interval.max(MIN_INTERVAL),
            limiter,
            baseline,
            last_modified,
        }
    }

    /// Re-load the config if the file changed since the last poll.
    ///
    /// Returns `Ok(true)` when new limits were applied. On error the
    /// previous limits stay active.
    pub fn reload_if_changed(&mut self) -> Result<bool> {
        let current = modified(&self.path);
        if current == self.last_modified {
            return Ok(false);
        }
        self.last_modified = current;

        debug!(path = %self.path.display(), "Config file changed, reloading");
        let config = EmulatorConfig::load(Some(self.path.as_path()))?;

        if self.restart_required(&config) {
            warn!(
                path = %self.path.display(),
                "Server and upstream settings changed; restart to apply them"
            );
        }

        let limits = Limits::from(&config.limits);
        let changed = limits != self.limiter.limits();
        self.limiter.set_limits(limits);
        self.baseline = config;
        Ok(changed)
    }

    /// Whether `reloaded` changes settings that only apply on restart.
    pub fn restart_required(&self, reloaded: &EmulatorConfig) -> bool {
        reloaded.server != self.baseline.server || reloaded.upstream != self.baseline.upstream
    }

    /// Poll the file on a background task until the runtime shuts down.
    pub fn spawn(mut self) -> JoinHandle<()> {
        info!(
            path = %self.path.display(),
            interval_secs = self.interval.as_secs(),
            "Watching config file for changes"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            loop {
                interval.tick().await;
                if let Err(e) = self.reload_if_changed() {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Config reload failed, keeping previous limits"
                    );
                }
            }
        })
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
