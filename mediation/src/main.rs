//! Conflict Mediation Function (CMF) xApp binary.
//!
//! Watches the decision ledgers of xApp #1 and xApp #2 and raises the block
//! marker for xApp #2 whenever the two have issued contradictory control
//! values for the same target and parameter within the detection window.
//!
//! # Usage
//!
//! ```bash
//! # Ledgers and markers in the current directory, 10 s window
//! cmf
//!
//! # Shared data directory used by both xApps
//! cmf --data-dir /var/lib/xapps
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use mediation::mediator::{Mediator, MediatorConfig, DEFAULT_TIME_THRESHOLD_SECS};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// xApp config file path (passed through to the RIC platform glue)
    #[arg(long, default_value = "")]
    config: String,

    /// HTTP server listen port
    #[arg(long, default_value_t = 8093)]
    http_server_port: u16,

    /// RMR listen port
    #[arg(long, default_value_t = 4563)]
    rmr_port: u16,

    /// E2SM RC RAN function ID
    #[arg(long, default_value_t = 3)]
    ran_func_id: u32,

    /// Directory holding the decision ledgers and block markers
    /// (defaults to the current working directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Recency window for conflict detection, in seconds
    #[arg(long, default_value_t = DEFAULT_TIME_THRESHOLD_SECS)]
    time_threshold: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    info!(
        config = %args.config,
        http_server_port = args.http_server_port,
        rmr_port = args.rmr_port,
        ran_func_id = args.ran_func_id,
        "CMF xApp starting"
    );

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let mut config = MediatorConfig::from_data_dir(&data_dir);
    config.time_threshold_secs = args.time_threshold;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received, finishing current cycle");
                shutdown.store(true, Ordering::Relaxed);
            }
        });
    }

    Mediator::new(config).run(shutdown).await;
    Ok(())
}
