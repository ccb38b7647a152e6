//! Append-only measurement metrics log.
//!
//! Separate from the decision ledger: this sink records what an xApp observed
//! (per-UE KPM metric values plus handling latency), not what it decided.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Column header written once when the log file is created.
pub const METRICS_HEADER: &str = "Time,UE_id,Metric,Value,latency";

/// Error type for metrics log operations
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics log I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalize a KPM volume counter from bits to megabytes.
pub fn bits_to_megabytes(bits: f64) -> f64 {
    bits / 8.0 / 1000.0
}

/// One logged measurement value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRow {
    /// Collection start-time label from the indication header (opaque)
    pub collect_start_time: String,
    pub ue_id: u32,
    pub metric: String,
    /// Normalized value in megabytes
    pub value_mb: f64,
    /// Handling latency for the indication, in seconds
    pub latency_secs: f64,
}

/// Handle on an xApp's metrics log file.
#[derive(Debug, Clone)]
pub struct MetricsLog {
    path: PathBuf,
}

impl MetricsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a batch of rows, creating the file (header included) on first
    /// use.
    pub fn append_rows(&self, rows: &[MetricsRow]) -> Result<(), MetricsError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{METRICS_HEADER}")?;
        }
        for row in rows {
            writeln!(
                file,
                "{},{},{},{},{}",
                row.collect_start_time, row.ue_id, row.metric, row.value_mb, row.latency_secs,
            )?;
        }
        Ok(())
    }
}
