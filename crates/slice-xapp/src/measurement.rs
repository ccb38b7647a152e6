//! KPM indication handling at the subscription boundary.
//!
//! The subscription transport (E2 setup, ASN.1 decoding) belongs to the
//! hosting RIC SDK; this module consumes already-decoded snapshots. The
//! handler logs the indication content, appends normalized metric rows to
//! the metrics log, and publishes the observed UE count to the engine
//! through a watch channel.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use mediation::metrics::{bits_to_megabytes, MetricsLog, MetricsRow};

/// Error type for subscription setup
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("subscription setup failed: {0}")]
    Setup(String),
}

/// One metric time series reported for a UE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub name: String,
    /// Raw values in bits, one per granularity period
    pub values: Vec<f64>,
}

/// Decoded per-UE measurement data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UeMeasurement {
    pub ue_id: u32,
    pub granul_period: Option<u64>,
    pub metrics: Vec<MetricSeries>,
}

/// One decoded KPM indication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSnapshot {
    /// Collection start-time label from the indication header (opaque)
    pub collect_start_time: String,
    pub ues: Vec<UeMeasurement>,
}

/// Subscription parameters handed to the transport.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub e2_node_id: String,
    pub report_style: u8,
    pub report_period_ms: u32,
    pub granul_period_ms: u32,
    pub metric_names: Vec<String>,
}

impl SubscriptionConfig {
    pub fn new(e2_node_id: &str, report_style: u8, metric_names: Vec<String>) -> Self {
        Self {
            e2_node_id: e2_node_id.to_string(),
            report_style,
            report_period_ms: 1000,
            granul_period_ms: 1000,
            metric_names,
        }
    }
}

/// Seam for the measurement subscription transport.
#[async_trait]
pub trait KpmSubscription: Send + Sync {
    async fn subscribe(
        &self,
        config: &SubscriptionConfig,
        handler: Arc<MeasurementHandler>,
    ) -> Result<(), SubscriptionError>;
}

/// Placeholder transport for deployments where the E2 termination is not
/// wired: logs the requested subscription and delivers nothing.
pub struct DisconnectedSubscription;

#[async_trait]
impl KpmSubscription for DisconnectedSubscription {
    async fn subscribe(
        &self,
        config: &SubscriptionConfig,
        _handler: Arc<MeasurementHandler>,
    ) -> Result<(), SubscriptionError> {
        warn!(
            e2_node_id = %config.e2_node_id,
            report_style = config.report_style,
            report_period_ms = config.report_period_ms,
            granul_period_ms = config.granul_period_ms,
            metrics = ?config.metric_names,
            "no E2 termination wired; measurement snapshots must be delivered by the hosting SDK"
        );
        Ok(())
    }
}

/// Consumes decoded snapshots pushed by the transport.
pub struct MeasurementHandler {
    metrics_log: MetricsLog,
    ue_count_tx: watch::Sender<u32>,
}

impl MeasurementHandler {
    /// Returns the handler and the receiver the engine reads the latest UE
    /// count from.
    pub fn new(metrics_log: MetricsLog) -> (Self, watch::Receiver<u32>) {
        let (ue_count_tx, ue_count_rx) = watch::channel(0);
        (
            Self {
                metrics_log,
                ue_count_tx,
            },
            ue_count_rx,
        )
    }

    /// Handle one decoded indication.
    pub fn handle(&self, snapshot: &MeasurementSnapshot) {
        let started = Instant::now();
        info!(
            collect_start_time = %snapshot.collect_start_time,
            ues = snapshot.ues.len(),
            "KPM indication received"
        );
        for ue in &snapshot.ues {
            if let Some(granul_period) = ue.granul_period {
                debug!(ue_id = ue.ue_id, granul_period, "granularity period");
            }
            for series in &ue.metrics {
                let total_mb = bits_to_megabytes(series.values.iter().sum());
                info!(
                    ue_id = ue.ue_id,
                    metric = %series.name,
                    value_mb = format!("{total_mb:.1}"),
                    "measurement"
                );
            }
        }

        let latency_secs = started.elapsed().as_secs_f64();
        let rows: Vec<MetricsRow> = snapshot
            .ues
            .iter()
            .flat_map(|ue| {
                ue.metrics.iter().map(|series| MetricsRow {
                    collect_start_time: snapshot.collect_start_time.clone(),
                    ue_id: ue.ue_id,
                    metric: series.name.clone(),
                    value_mb: bits_to_megabytes(series.values.first().copied().unwrap_or(0.0)),
                    latency_secs,
                })
            })
            .collect();
        if let Err(e) = self.metrics_log.append_rows(&rows) {
            warn!(
                path = %self.metrics_log.path().display(),
                error = %e,
                "failed to append measurement metrics"
            );
        }

        let ue_count = snapshot.ues.len() as u32;
        if self.ue_count_tx.send(ue_count).is_err() {
            debug!("no engine listening for UE count updates");
        }
    }
}
