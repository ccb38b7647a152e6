//! Integration tests for the allocation engine cycle.
//!
//! Drives `process_cycle` directly against real ledger and marker files in a
//! temporary data directory, with a recording control implementation at the
//! dispatch boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use mediation::ledger::{unix_now, DecisionLedger, DecisionRecord};
use mediation::mediator::{Mediator, MediatorConfig};
use mediation::BlockSignal;
use slice_xapp::allocation::policy_for_mode;
use slice_xapp::config::EngineConfig;
use slice_xapp::control::{ControlError, PrbQuotaRequest, SliceControl};
use slice_xapp::engine::AllocationEngine;
use slice_xapp::roster::Roster;

/// Records every dispatched request instead of talking to an E2 node.
#[derive(Default)]
struct RecordingControl {
    requests: Mutex<Vec<PrbQuotaRequest>>,
}

impl RecordingControl {
    fn requests(&self) -> Vec<PrbQuotaRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SliceControl for RecordingControl {
    async fn slice_level_prb_quota(&self, request: &PrbQuotaRequest) -> Result<(), ControlError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    config: EngineConfig,
    control: Arc<RecordingControl>,
    engine: AllocationEngine,
    _ue_count_tx: watch::Sender<u32>,
}

fn fixture(app_mode: u8) -> Fixture {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = EngineConfig::for_mode(
        app_mode,
        &format!("xapp-{app_mode}"),
        "gnbd_001_001_00019b_0",
        dir.path(),
    );
    let control = Arc::new(RecordingControl::default());
    let (ue_count_tx, ue_count_rx) = watch::channel(3);
    let engine = AllocationEngine::new(
        config.clone(),
        policy_for_mode(app_mode).unwrap(),
        control.clone(),
        Roster::default(),
        ue_count_rx,
    );
    Fixture {
        _dir: dir,
        config,
        control,
        engine,
        _ue_count_tx: ue_count_tx,
    }
}

/// An unblocked cycle writes one ledger row and one control request per UE.
#[tokio::test]
async fn test_unblocked_cycle_emits_decisions() {
    let fx = fixture(1);
    fx.engine.process_cycle(3).await;

    // Proportional policy on 51 PRBs with 2 UEs in slice A, 1 in slice B:
    // quotas (34, 17), split to 17 PRBs per UE.
    let rows = DecisionLedger::new(&fx.config.ledger_path).read_recent(60.0);
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.target_type, "USER");
        assert_eq!(row.parameter_name, "PRB_ALLOCATION");
        assert_eq!(row.parameter_value, 17.0);
    }

    let requests = fx.control.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(request.min_prb_ratio, request.max_prb_ratio);
        assert_eq!(request.dedicated_prb_ratio, 100);
    }
    // Ledger rows and control requests agree per UE.
    for (row, request) in rows.iter().zip(&requests) {
        assert_eq!(row.target_id, request.ue_id);
        assert_eq!(row.parameter_value, f64::from(request.min_prb_ratio));
    }
}

/// A raised block marker suppresses the entire cycle.
#[tokio::test]
async fn test_blocked_cycle_emits_nothing() {
    let fx = fixture(2);
    BlockSignal::new(&fx.config.block_path).raise().unwrap();

    fx.engine.process_cycle(3).await;

    assert!(!fx.config.ledger_path.exists());
    assert!(fx.control.requests().is_empty());
}

/// Clearing the marker between cycles resumes control automatically.
#[tokio::test]
async fn test_cleared_block_resumes_next_cycle() {
    let fx = fixture(2);
    let block = BlockSignal::new(&fx.config.block_path);

    block.raise().unwrap();
    fx.engine.process_cycle(3).await;
    assert!(fx.control.requests().is_empty());

    block.clear().unwrap();
    fx.engine.process_cycle(3).await;
    assert_eq!(fx.control.requests().len(), 3);
    assert!(fx.config.ledger_path.exists());
}

/// More reported UEs than rostered ones caps actuation at the roster
/// instead of panicking.
#[tokio::test]
async fn test_excess_ue_count_truncates_to_roster() {
    let fx = fixture(1);
    // 5 reported UEs against 3 rostered: slice B caps at 1, slice A derives
    // 4 but only has 2 rostered UEs to actuate.
    fx.engine.process_cycle(5).await;

    let rows = DecisionLedger::new(&fx.config.ledger_path).read_recent(60.0);
    assert_eq!(rows.len(), 3);
    let mut ue_ids: Vec<u32> = rows.iter().map(|row| row.target_id).collect();
    ue_ids.sort_unstable();
    assert_eq!(ue_ids, vec![0, 1, 2]);

    assert_eq!(fx.control.requests().len(), 3);
}

/// Fired cycles advance the processing counters even while blocked.
#[tokio::test(start_paused = true)]
async fn test_blocked_cycles_still_advance_counters() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = EngineConfig::for_mode(1, "xapp-1", "gnb", dir.path());
    let control = Arc::new(RecordingControl::default());
    let (_ue_count_tx, ue_count_rx) = watch::channel(3);
    // Pin the gate open: second 0 of the window matches mode 1's trigger.
    let mut engine = AllocationEngine::new(
        config.clone(),
        policy_for_mode(1).unwrap(),
        control.clone(),
        Roster::default(),
        ue_count_rx,
    )
    .with_clock(|| 100.0);

    BlockSignal::new(&config.block_path).raise().unwrap();

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            shutdown.store(true, Ordering::Relaxed);
        });
    }
    engine.run(shutdown).await;

    // Every fired cycle was suppressed by the marker, yet each one counted.
    assert!(engine.context().processed_cycles() >= 1);
    assert!(!config.ledger_path.exists());
    assert!(control.requests().is_empty());
}

/// An empty cell produces no ledger writes and no dispatches.
#[tokio::test]
async fn test_zero_ues_is_a_no_op() {
    let fx = fixture(1);
    fx.engine.process_cycle(0).await;

    assert!(!fx.config.ledger_path.exists());
    assert!(fx.control.requests().is_empty());
}

/// Full conflict episode: both xApps decide, the CMF blocks xApp #2, and its
/// next cycle emits zero decisions.
#[tokio::test]
async fn test_mediator_blocks_second_xapp_cycle() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mediator_config = MediatorConfig::from_data_dir(dir.path());

    // xApp #1 runs a cycle and lands its decisions in its ledger.
    let control1 = Arc::new(RecordingControl::default());
    let (_tx1, rx1) = watch::channel(3);
    let engine1 = AllocationEngine::new(
        EngineConfig::for_mode(1, "xapp-1", "gnb", dir.path()),
        policy_for_mode(1).unwrap(),
        control1,
        Roster::default(),
        rx1,
    );
    engine1.process_cycle(3).await;

    // xApp #2 disagrees on UE 1 (even split pins it to 25, not 17).
    DecisionLedger::new(&mediator_config.xapp2_ledger_path)
        .append(&DecisionRecord {
            time: unix_now(),
            datetime: "2026-01-01 12:00:00".to_string(),
            target_type: "USER".to_string(),
            target_id: 1,
            parameter_name: "PRB_ALLOCATION".to_string(),
            parameter_value: 25.0,
        })
        .unwrap();

    let conflicts = Mediator::new(mediator_config.clone()).poll_once();
    assert!(!conflicts.is_empty());
    assert!(mediator_config.xapp2_block_path.exists());

    // xApp #2's next cycle observes the marker and stays silent.
    let control2 = Arc::new(RecordingControl::default());
    let (_tx2, rx2) = watch::channel(3);
    let config2 = EngineConfig::for_mode(2, "xapp-2", "gnb", dir.path());
    let engine2 = AllocationEngine::new(
        config2.clone(),
        policy_for_mode(2).unwrap(),
        control2.clone(),
        Roster::default(),
        rx2,
    );
    let before = std::fs::read_to_string(&config2.ledger_path).unwrap();
    engine2.process_cycle(3).await;
    let after = std::fs::read_to_string(&config2.ledger_path).unwrap();

    assert_eq!(before, after);
    assert!(control2.requests().is_empty());
}
