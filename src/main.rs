use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use notify_ratelimit_emulator::cli::Args;
use notify_ratelimit_emulator::config::EmulatorConfig;
use notify_ratelimit_emulator::http::{AppState, HttpForwarder, HttpServer};
use notify_ratelimit_emulator::notify::NotifyRouter;
use notify_ratelimit_emulator::ratelimit::{Limits, RateLimiter};
use notify_ratelimit_emulator::reload::ConfigWatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting Notify rate limit emulator");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let loaded = EmulatorConfig::load(args.config.as_deref())?;
    let mut config = loaded.clone();
    args.apply(&mut config);
    info!(
        bind_addr = %config.bind_addr(),
        minute_limit = config.limits.minute_limit,
        daily_limit = config.limits.daily_limit,
        base_url = %config.upstream.base_url(),
        "Configuration loaded"
    );

    let rate_limiter = Arc::new(RateLimiter::new(Limits::from(&config.limits)));
    let router = NotifyRouter::new(
        rate_limiter.clone(),
        config.upstream.base_url(),
        config.mock.test_marker.clone(),
    );
    let forwarder = HttpForwarder::new(config.upstream.base_url(), config.upstream.timeout())?;
    info!(endpoint = %forwarder.endpoint(), "Forwarding unmarked requests upstream");

    if config.server.reload {
        match &args.config {
            Some(path) => {
                ConfigWatcher::new(
                    path,
                    Duration::from_secs(config.server.reload_interval_secs),
                    rate_limiter.clone(),
                    loaded,
                )
                .spawn();
            }
            None => warn!("--reload has no effect without --config"),
        }
    }

    let cleanup_limiter = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup();
        }
    });

    let state = Arc::new(AppState {
        router,
        forwarder: Arc::new(forwarder),
    });

    HttpServer::new(config.bind_addr(), state)
        .serve_with_shutdown(shutdown_signal())
        .await?;

    info!("Notify rate limit emulator stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
