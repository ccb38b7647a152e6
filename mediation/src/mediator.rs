//! The CMF polling loop.
//!
//! Once per second: re-read both xApps' recent decisions from scratch,
//! cross-compare them, and raise the block marker for xApp #2 on every
//! detected conflict. xApp #1 always wins; the priority is a fixed policy.
//!
//! Nothing in this loop terminates on I/O errors. Ledger reads fail soft to
//! empty windows and marker creation failures are logged and retried on the
//! next cycle.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::block::BlockSignal;
use crate::conflict::{detect_conflicts, Conflict};
use crate::ledger::DecisionLedger;

/// Default sliding window for recency filtering, in seconds.
pub const DEFAULT_TIME_THRESHOLD_SECS: f64 = 10.0;

/// Mediator configuration: where the side-channels live and how often to poll.
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    pub xapp1_ledger_path: PathBuf,
    pub xapp2_ledger_path: PathBuf,
    pub xapp2_block_path: PathBuf,
    /// Append sink for the JSON conflict audit trail
    pub conflict_log_path: PathBuf,
    pub time_threshold_secs: f64,
    pub poll_interval: Duration,
}

impl MediatorConfig {
    /// Conventional file layout inside a shared data directory.
    pub fn from_data_dir(dir: &Path) -> Self {
        Self {
            xapp1_ledger_path: dir.join("xapp_decisions_1.csv"),
            xapp2_ledger_path: dir.join("xapp_decisions_2.csv"),
            xapp2_block_path: dir.join("xapp_2.block"),
            conflict_log_path: dir.join("cmf_conflicts.jsonl"),
            time_threshold_secs: DEFAULT_TIME_THRESHOLD_SECS,
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl Default for MediatorConfig {
    fn default() -> Self {
        let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_data_dir(&dir)
    }
}

/// The Conflict Mediation Function.
pub struct Mediator {
    config: MediatorConfig,
    xapp1_ledger: DecisionLedger,
    xapp2_ledger: DecisionLedger,
    xapp2_block: BlockSignal,
}

impl Mediator {
    pub fn new(config: MediatorConfig) -> Self {
        let xapp1_ledger = DecisionLedger::new(&config.xapp1_ledger_path);
        let xapp2_ledger = DecisionLedger::new(&config.xapp2_ledger_path);
        let xapp2_block = BlockSignal::new(&config.xapp2_block_path);
        Self {
            config,
            xapp1_ledger,
            xapp2_ledger,
            xapp2_block,
        }
    }

    /// One detection cycle: read both windows, detect, suppress.
    ///
    /// Returns the detected conflicts so tests and callers can observe them.
    pub fn poll_once(&self) -> Vec<Conflict> {
        let recent1 = self.xapp1_ledger.read_recent(self.config.time_threshold_secs);
        let recent2 = self.xapp2_ledger.read_recent(self.config.time_threshold_secs);
        debug!(
            xapp1 = recent1.len(),
            xapp2 = recent2.len(),
            threshold_secs = self.config.time_threshold_secs,
            "read recent control decisions"
        );

        let conflicts = detect_conflicts(&recent1, &recent2);
        for conflict in &conflicts {
            info!("{}", conflict.describe());
            match self.xapp2_block.raise() {
                Ok(true) => {
                    info!(
                        path = %self.xapp2_block.path().display(),
                        "block marker created for xApp #2"
                    );
                }
                Ok(false) => {
                    debug!("block marker for xApp #2 already exists");
                }
                Err(e) => {
                    warn!(error = %e, "failed to create block marker for xApp #2");
                }
            }
            self.append_audit(conflict);
        }
        conflicts
    }

    /// Append one conflict to the JSON audit trail. Best-effort: an audit
    /// write failure must not affect detection or blocking.
    fn append_audit(&self, conflict: &Conflict) {
        let entry = serde_json::json!({
            "detected_at": Utc::now().to_rfc3339(),
            "conflict": conflict,
        });
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.conflict_log_path)
            .and_then(|mut file| writeln!(file, "{entry}"));
        if let Err(e) = result {
            warn!(
                path = %self.config.conflict_log_path.display(),
                error = %e,
                "failed to append conflict audit entry"
            );
        }
    }

    /// Run detection cycles until `shutdown` is set.
    ///
    /// The flag is checked at the iteration boundary, so the cycle in flight
    /// always completes before exit.
    pub async fn run(&self, shutdown: Arc<AtomicBool>) {
        info!(
            xapp1_ledger = %self.config.xapp1_ledger_path.display(),
            xapp2_ledger = %self.config.xapp2_ledger_path.display(),
            xapp2_block = %self.config.xapp2_block_path.display(),
            threshold_secs = self.config.time_threshold_secs,
            "CMF mediation loop starting"
        );
        while !shutdown.load(Ordering::Relaxed) {
            self.poll_once();
            tokio::time::sleep(self.config.poll_interval).await;
        }
        info!("CMF mediation loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{unix_now, DecisionRecord};
    use tempfile::tempdir;

    fn recent_decision(ue_id: u32, value: f64) -> DecisionRecord {
        DecisionRecord {
            time: unix_now(),
            datetime: "2026-01-01 12:00:00".to_string(),
            target_type: "USER".to_string(),
            target_id: ue_id,
            parameter_name: "PRB_ALLOCATION".to_string(),
            parameter_value: value,
        }
    }

    #[test]
    fn test_poll_with_missing_ledgers_is_quiet() {
        let dir = tempdir().unwrap();
        let mediator = Mediator::new(MediatorConfig::from_data_dir(dir.path()));

        assert!(mediator.poll_once().is_empty());
        assert!(!dir.path().join("xapp_2.block").exists());
    }

    #[test]
    fn test_poll_raises_block_and_writes_audit() {
        let dir = tempdir().unwrap();
        let config = MediatorConfig::from_data_dir(dir.path());

        DecisionLedger::new(&config.xapp1_ledger_path)
            .append(&recent_decision(7, 20.0))
            .unwrap();
        DecisionLedger::new(&config.xapp2_ledger_path)
            .append(&recent_decision(7, 15.0))
            .unwrap();

        let mediator = Mediator::new(config.clone());
        let conflicts = mediator.poll_once();

        assert_eq!(conflicts.len(), 1);
        assert!(config.xapp2_block_path.exists());

        let audit = std::fs::read_to_string(&config.conflict_log_path).unwrap();
        assert_eq!(audit.lines().count(), 1);
        assert!(audit.contains("PRB_ALLOCATION"));
    }

    #[test]
    fn test_repeated_polls_keep_single_marker() {
        let dir = tempdir().unwrap();
        let config = MediatorConfig::from_data_dir(dir.path());

        DecisionLedger::new(&config.xapp1_ledger_path)
            .append(&recent_decision(7, 20.0))
            .unwrap();
        DecisionLedger::new(&config.xapp2_ledger_path)
            .append(&recent_decision(7, 15.0))
            .unwrap();

        let mediator = Mediator::new(config.clone());
        mediator.poll_once();
        mediator.poll_once();

        assert!(config.xapp2_block_path.exists());
        assert_eq!(std::fs::metadata(&config.xapp2_block_path).unwrap().len(), 0);
    }
}
