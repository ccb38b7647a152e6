//! Engine configuration assembled from CLI flags and conventions shared with
//! the CMF.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// The RAN is always partitioned into slices A and B.
pub const TOTAL_SLICE_COUNT: u32 = 2;
/// Total PRBs controllable in the cell.
pub const TOTAL_PRB_COUNT: u32 = 51;

/// Per-instance allocation engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Allocation formula variant (1 or 2); also the instance number in the
    /// shared file layout
    pub app_mode: u8,
    /// Unique ID for this xApp instance (logging only)
    pub xapp_id: String,
    /// E2 node the control requests target
    pub e2_node_id: String,
    pub total_slice_count: u32,
    pub total_prb_count: u32,
    /// Second-within-10s at which this instance actuates. Mode 1 fires at 0,
    /// mode 2 at 5, staggering the two xApps' write instants.
    pub execution_trigger: u64,
    pub ledger_path: PathBuf,
    pub block_path: PathBuf,
    pub poll_interval: Duration,
}

impl EngineConfig {
    /// Build the configuration for one app mode against a shared data
    /// directory, using the file layout the CMF watches.
    pub fn for_mode(app_mode: u8, xapp_id: &str, e2_node_id: &str, data_dir: &Path) -> Self {
        let execution_trigger = match app_mode {
            2 => 5,
            _ => 0,
        };
        Self {
            app_mode,
            xapp_id: xapp_id.to_string(),
            e2_node_id: e2_node_id.to_string(),
            total_slice_count: TOTAL_SLICE_COUNT,
            total_prb_count: TOTAL_PRB_COUNT,
            execution_trigger,
            ledger_path: data_dir.join(format!("xapp_decisions_{app_mode}.csv")),
            block_path: data_dir.join(format!("xapp_{app_mode}.block")),
            poll_interval: Duration::from_secs(1),
        }
    }
}
