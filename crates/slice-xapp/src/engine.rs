//! The allocation engine: a per-xApp 1-second control loop.
//!
//! Each iteration reads the latest UE count from the measurement side,
//! waits while the cell is empty, and actuates only at this instance's
//! trigger second within each 10-second window. A fired cycle first checks
//! the CMF block marker; if raised, the whole cycle is suppressed and
//! re-evaluated next time, so an externally cleared marker resumes control
//! without restart. Otherwise the policy's slice quotas are split across
//! each slice's UEs, every share is appended to the decision ledger, and
//! the matching control request is dispatched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use mediation::block::BlockSignal;
use mediation::ledger::{unix_now, DecisionLedger, DecisionRecord};

use crate::allocation::{split_across_ues, AllocationInput, AllocationPolicy};
use crate::config::EngineConfig;
use crate::context::XappContext;
use crate::control::{PrbQuotaRequest, SliceControl};
use crate::roster::{Roster, Ue};

/// Whether the actuation gate fires at this wall-clock instant.
///
/// Fires when the current second within each 10-second window equals the
/// instance's trigger offset; with triggers 0 and 5 the two xApps actuate
/// 5 seconds apart.
pub fn execution_gate(now_unix: f64, trigger: u64) -> bool {
    (now_unix % 10.0).floor() as u64 == trigger
}

pub struct AllocationEngine {
    config: EngineConfig,
    policy: Box<dyn AllocationPolicy>,
    control: Arc<dyn SliceControl>,
    roster: Roster,
    ledger: DecisionLedger,
    block: BlockSignal,
    ue_count_rx: watch::Receiver<u32>,
    context: XappContext,
    clock: fn() -> f64,
}

impl AllocationEngine {
    pub fn new(
        config: EngineConfig,
        policy: Box<dyn AllocationPolicy>,
        control: Arc<dyn SliceControl>,
        roster: Roster,
        ue_count_rx: watch::Receiver<u32>,
    ) -> Self {
        let ledger = DecisionLedger::new(&config.ledger_path);
        let block = BlockSignal::new(&config.block_path);
        Self {
            config,
            policy,
            control,
            roster,
            ledger,
            block,
            ue_count_rx,
            context: XappContext::new(),
            clock: unix_now,
        }
    }

    /// Replace the wall-clock source driving the actuation gate (seam for
    /// deterministic tests).
    pub fn with_clock(mut self, clock: fn() -> f64) -> Self {
        self.clock = clock;
        self
    }

    pub fn context(&self) -> &XappContext {
        &self.context
    }

    /// Run the control loop until `shutdown` is set.
    ///
    /// The flag is checked at the iteration boundary, so the cycle in flight
    /// always completes before exit.
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) {
        info!(
            xapp_id = %self.config.xapp_id,
            app_mode = self.config.app_mode,
            policy = self.policy.name(),
            execution_trigger = self.config.execution_trigger,
            ledger = %self.config.ledger_path.display(),
            "allocation engine starting"
        );
        while !shutdown.load(Ordering::Relaxed) {
            let total_ue_count = *self.ue_count_rx.borrow();
            if total_ue_count == 0 {
                debug!("no UEs reported by the KPM subscription yet, waiting");
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }

            let now = (self.clock)();
            if execution_gate(now, self.config.execution_trigger) {
                let started = Instant::now();
                self.process_cycle(total_ue_count).await;
                // Counters advance on every fired cycle, blocked or not.
                self.context.record_cycle(started.elapsed().as_secs_f64());
                if self.context.should_log_metrics() {
                    self.context.log_metrics();
                }
            } else {
                debug!(
                    execution_timer = (now % 10.0).floor() as u64,
                    execution_trigger = self.config.execution_trigger,
                    "outside actuation window"
                );
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
        info!(xapp_id = %self.config.xapp_id, "allocation engine stopped");
    }

    /// One allocation pass over both slices.
    pub async fn process_cycle(&self, total_ue_count: u32) {
        if self.block.is_raised() {
            info!(
                path = %self.block.path().display(),
                "block marker detected, ceasing control decisions"
            );
            return;
        }

        // Slice B's population is bounded by its static roster; whatever the
        // measurement side reports beyond it lives in slice A.
        let ue_count_slice_b =
            total_ue_count.min(self.roster.slice_b_ues.len() as u32);
        let ue_count_slice_a = total_ue_count - ue_count_slice_b;

        let input = AllocationInput {
            total_slice_count: self.config.total_slice_count,
            total_prb_count: self.config.total_prb_count,
            total_ue_count,
            ue_count_slice_a,
        };
        let quotas = self.policy.slice_quotas(&input);
        info!(
            policy = self.policy.name(),
            slice_a = quotas.slice_a,
            slice_b = quotas.slice_b,
            "computed per-slice PRB quotas"
        );

        self.apply_slice("A", quotas.slice_a, ue_count_slice_a, &self.roster.slice_a_ues)
            .await;
        self.apply_slice("B", quotas.slice_b, ue_count_slice_b, &self.roster.slice_b_ues)
            .await;
    }

    /// Split one slice's quota across its UEs and actuate each share.
    async fn apply_slice(&self, slice_name: &str, quota: u32, ue_count: u32, ues: &[Ue]) {
        let shares = split_across_ues(quota, ue_count);
        info!(
            slice = slice_name,
            quota,
            shares = ?shares,
            "PRBs split among UEs"
        );
        if shares.len() > ues.len() {
            warn!(
                slice = slice_name,
                reported = shares.len(),
                rostered = ues.len(),
                "more UEs reported than rostered, truncating to roster"
            );
        }
        for (ue, share) in ues.iter().zip(shares) {
            let record = DecisionRecord::prb_allocation(ue.id, share);
            if let Err(e) = self.ledger.append(&record) {
                warn!(
                    ue_id = ue.id,
                    error = %e,
                    "failed to append control decision to ledger"
                );
            }
            let request = PrbQuotaRequest::fixed_share(&self.config.e2_node_id, ue, share);
            // Fire-and-forget: a dispatch failure never stalls the loop.
            if let Err(e) = self.control.slice_level_prb_quota(&request).await {
                warn!(ue_id = ue.id, error = %e, "control dispatch failed");
            }
        }
    }
}
