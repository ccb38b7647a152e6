//! Append-only decision ledger shared between the xApps and the CMF.
//!
//! One CSV file per xApp, single writer, append order == timestamp order.
//! The mediator reads both ledgers with a sliding recency window; a partial
//! trailing row (an append in flight) aborts parsing for that cycle instead
//! of failing the mediation loop.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Column header written once when a ledger file is created.
pub const LEDGER_HEADER: &str =
    "Time,Datetime,Control_Target_Type,Control_Target_ID,Parameter_Name,Parameter_Value";

/// Error type for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed ledger row {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Current wall-clock time as decimal seconds since the Unix epoch.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// One issued control decision.
///
/// Immutable once appended; `time` drives the mediator's recency filtering,
/// `datetime` is display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Seconds since the Unix epoch at issuance
    pub time: f64,
    /// Human-readable timestamp (not used for logic)
    pub datetime: String,
    /// Category of the controlled entity (e.g. "USER")
    pub target_type: String,
    /// Identifier of the controlled entity within its type
    pub target_id: u32,
    /// Name of the controlled parameter (e.g. "PRB_ALLOCATION")
    pub parameter_name: String,
    /// Numeric value assigned to the parameter
    pub parameter_value: f64,
}

impl DecisionRecord {
    /// Build a PRB allocation decision for a UE, stamped with the current time.
    pub fn prb_allocation(ue_id: u32, prbs: u32) -> Self {
        Self {
            time: unix_now(),
            datetime: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            target_type: "USER".to_string(),
            target_id: ue_id,
            parameter_name: "PRB_ALLOCATION".to_string(),
            parameter_value: f64::from(prbs),
        }
    }

    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.time,
            self.datetime,
            self.target_type,
            self.target_id,
            self.parameter_name,
            self.parameter_value,
        )
    }

    fn parse_csv_row(line: usize, row: &str) -> LedgerResult<Self> {
        let fields: Vec<&str> = row.split(',').collect();
        if fields.len() != 6 {
            return Err(LedgerError::Malformed {
                line,
                reason: format!("expected 6 fields, got {}", fields.len()),
            });
        }
        let time: f64 = fields[0].parse().map_err(|_| LedgerError::Malformed {
            line,
            reason: format!("bad Time value: {}", fields[0]),
        })?;
        let target_id: u32 = fields[3].parse().map_err(|_| LedgerError::Malformed {
            line,
            reason: format!("bad Control_Target_ID value: {}", fields[3]),
        })?;
        let parameter_value: f64 = fields[5].parse().map_err(|_| LedgerError::Malformed {
            line,
            reason: format!("bad Parameter_Value value: {}", fields[5]),
        })?;
        Ok(Self {
            time,
            datetime: fields[1].to_string(),
            target_type: fields[2].to_string(),
            target_id,
            parameter_name: fields[4].to_string(),
            parameter_value,
        })
    }
}

/// Handle on one xApp's decision ledger file.
#[derive(Debug, Clone)]
pub struct DecisionLedger {
    path: PathBuf,
}

impl DecisionLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one decision, creating the file (header included) on first use.
    pub fn append(&self, record: &DecisionRecord) -> LedgerResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{LEDGER_HEADER}")?;
        }
        writeln!(file, "{}", record.to_csv_row())?;
        Ok(())
    }

    /// All decisions issued within the last `threshold_secs` seconds.
    ///
    /// The window boundary is inclusive: a decision exactly `threshold_secs`
    /// old is still returned.
    pub fn read_recent(&self, threshold_secs: f64) -> Vec<DecisionRecord> {
        self.read_recent_at(unix_now(), threshold_secs)
    }

    /// Recency read against an explicit `now` (seam for deterministic tests).
    ///
    /// Fails soft: a missing ledger yields an empty set, an unreadable ledger
    /// yields an empty set, and a malformed row stops parsing for this cycle
    /// and returns whatever was collected before it. No error escapes to the
    /// caller so that one corrupt ledger never stalls mediation on the other.
    pub fn read_recent_at(&self, now: f64, threshold_secs: f64) -> Vec<DecisionRecord> {
        if !self.path.exists() {
            return Vec::new();
        }
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read decision ledger, treating as empty"
                );
                return Vec::new();
            }
        };

        let mut recent = Vec::new();
        for (idx, row) in contents.lines().enumerate() {
            if idx == 0 && row == LEDGER_HEADER {
                continue;
            }
            if row.trim().is_empty() {
                continue;
            }
            match DecisionRecord::parse_csv_row(idx + 1, row) {
                Ok(record) => {
                    if now - record.time <= threshold_secs {
                        recent.push(record);
                    }
                }
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "malformed ledger row, returning decisions collected so far"
                    );
                    break;
                }
            }
        }
        recent
    }
}
