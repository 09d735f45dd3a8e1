use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use square_watch::{ChromiumLauncher, DingTalkChannel, LogChannel, NotifyChannel, SquareWatcher, WatchConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Watches Binance Square accounts and forwards fresh, relevant posts to a
/// DingTalk group.
#[derive(Debug, Parser)]
#[command(name = "square-watch", version)]
struct Cli {
    /// JSON configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Log alerts instead of posting them (no token needed)
    #[arg(long)]
    dry_run: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = WatchConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.headful {
        config.renderer.headless = false;
    }
    config.validate(!cli.dry_run).context("Invalid configuration")?;
    let config = Arc::new(config);

    let channel: Arc<dyn NotifyChannel> = if cli.dry_run {
        Arc::new(LogChannel::new(config.notify.attribution.clone()))
    } else {
        Arc::new(DingTalkChannel::new(&config.notify).context("Failed to build webhook client")?)
    };
    let launcher = Arc::new(ChromiumLauncher::new(config.renderer.clone()));
    let watcher = SquareWatcher::new(config.clone(), launcher, channel);

    let shutdown = CancellationToken::new();
    tokio::spawn(listen_for_shutdown(shutdown.clone()));

    if cli.once {
        info!("Running a single check");
        let report = watcher.run_cycle(&shutdown).await?;
        info!("Single check finished: {:?}", report);
        return Ok(());
    }

    info!("Starting Binance Square monitoring");
    if let Err(e) = watcher.run(shutdown).await {
        error!("Watcher stopped: {}", e);
        return Err(e.into());
    }

    info!("Binance Square monitoring finished");
    Ok(())
}

async fn listen_for_shutdown(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown signal received, finishing current step");
    shutdown.cancel();
}
