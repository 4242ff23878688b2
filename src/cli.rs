//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

use crate::config::EmulatorConfig;

/// Notifications API proxy with configurable URLs and rate limiting.
#[derive(Debug, Parser)]
#[command(name = "notify-ratelimit-emulator", version, about)]
pub struct Args {
    /// Host to bind the server to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the server to
    #[arg(long)]
    pub port: Option<u16>,

    /// Reload limits when the config file changes
    #[arg(long)]
    pub reload: bool,

    /// YAML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    /// Apply flags on top of the loaded configuration.
    pub fn apply(&self, config: &mut EmulatorConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.reload {
            config.server.reload = true;
        }
    }
}
