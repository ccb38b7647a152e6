//! PRB slicing xApp binary.
//!
//! # Usage
//!
//! ```bash
//! # xApp #1: proportional allocation, actuating at second 0 of each window
//! slice-xapp --xapp-id xapp-1 --app-mode 1
//!
//! # xApp #2: even-split allocation, actuating at second 5
//! slice-xapp --xapp-id xapp-2 --app-mode 2 --data-dir /var/lib/xapps
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use mediation::metrics::MetricsLog;
use slice_xapp::allocation::policy_for_mode;
use slice_xapp::config::EngineConfig;
use slice_xapp::control::LogOnlyControl;
use slice_xapp::engine::AllocationEngine;
use slice_xapp::measurement::{
    DisconnectedSubscription, KpmSubscription, MeasurementHandler, SubscriptionConfig,
};
use slice_xapp::roster::Roster;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// xApp config file path (passed through to the RIC platform glue)
    #[arg(long, default_value = "")]
    config: String,

    /// HTTP server listen port
    #[arg(long, default_value_t = 8090)]
    http_server_port: u16,

    /// RMR listen port
    #[arg(long, default_value_t = 4560)]
    rmr_port: u16,

    /// E2 node ID the subscription and control requests target
    #[arg(long, default_value = "gnbd_001_001_00019b_0")]
    e2_node_id: String,

    /// E2SM KPM RAN function ID
    #[arg(long, default_value_t = 2)]
    ran_func_id: u32,

    /// Unique ID for this xApp instance
    #[arg(long)]
    xapp_id: String,

    /// KPM report style ID
    #[arg(long, default_value_t = 4)]
    kpm_report_style: u8,

    /// UE IDs known at the E2 node
    #[arg(long, default_value = "0", value_delimiter = ',')]
    ue_ids: Vec<u32>,

    /// KPM metric names to subscribe to
    #[arg(
        long,
        default_value = "DRB.RlcSduTransmittedVolumeDL",
        value_delimiter = ','
    )]
    metrics: Vec<String>,

    /// Allocation formula variant (1 or 2)
    #[arg(long, default_value_t = 1)]
    app_mode: u8,

    /// Directory holding the decision ledger, block marker and metrics log
    /// (defaults to the current working directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,
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
    let Some(policy) = policy_for_mode(args.app_mode) else {
        bail!("unsupported app mode: {} (expected 1 or 2)", args.app_mode);
    };

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    info!(
        xapp_id = %args.xapp_id,
        app_mode = args.app_mode,
        e2_node_id = %args.e2_node_id,
        ran_func_id = args.ran_func_id,
        http_server_port = args.http_server_port,
        rmr_port = args.rmr_port,
        ue_ids = ?args.ue_ids,
        data_dir = %data_dir.display(),
        "slice xApp starting"
    );

    let metrics_log = MetricsLog::new(data_dir.join(format!("xapp_timing_{}.csv", args.app_mode)));
    let (handler, ue_count_rx) = MeasurementHandler::new(metrics_log);

    let subscription_config =
        SubscriptionConfig::new(&args.e2_node_id, args.kpm_report_style, args.metrics);
    DisconnectedSubscription
        .subscribe(&subscription_config, Arc::new(handler))
        .await?;

    let engine_config = EngineConfig::for_mode(
        args.app_mode,
        &args.xapp_id,
        &args.e2_node_id,
        &data_dir,
    );
    let mut engine = AllocationEngine::new(
        engine_config,
        policy,
        Arc::new(LogOnlyControl),
        Roster::default(),
        ue_count_rx,
    );

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

    engine.run(shutdown).await;
    Ok(())
}
