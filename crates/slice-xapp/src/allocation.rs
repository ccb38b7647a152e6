//! PRB quota policies and the per-UE split.
//!
//! The quota formula is the one thing the two xApp variants disagree on, so
//! it lives behind a strategy trait selected once at startup instead of
//! branching on the mode inside the loop body.

use tracing::debug;

/// Inputs for one quota computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationInput {
    pub total_slice_count: u32,
    pub total_prb_count: u32,
    /// Live UE total from the latest measurement snapshot
    pub total_ue_count: u32,
    pub ue_count_slice_a: u32,
}

/// Per-slice PRB quotas. Contract: `slice_a + slice_b <= total_prb_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceQuotas {
    pub slice_a: u32,
    pub slice_b: u32,
}

/// Strategy for dividing the cell's PRBs between the two slices.
pub trait AllocationPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn slice_quotas(&self, input: &AllocationInput) -> SliceQuotas;
}

/// Mode 1: quotas proportional to the live UE population of each slice.
pub struct ProportionalPolicy;

impl AllocationPolicy for ProportionalPolicy {
    fn name(&self) -> &'static str {
        "proportional"
    }

    fn slice_quotas(&self, input: &AllocationInput) -> SliceQuotas {
        let total_ues = input.total_ue_count.max(1);
        let ue_count_slice_b = input.total_ue_count.saturating_sub(input.ue_count_slice_a);
        let slice_a = input.total_prb_count * input.ue_count_slice_a / total_ues;
        let slice_b = input.total_prb_count * ue_count_slice_b / total_ues;
        debug!(slice_a, slice_b, "proportional quota computation");
        SliceQuotas { slice_a, slice_b }
    }
}

/// Mode 2: even floor split regardless of UE placement.
pub struct EvenSplitPolicy;

impl AllocationPolicy for EvenSplitPolicy {
    fn name(&self) -> &'static str {
        "even-split"
    }

    fn slice_quotas(&self, input: &AllocationInput) -> SliceQuotas {
        let per_slice = input.total_prb_count / input.total_slice_count.max(1);
        SliceQuotas {
            slice_a: per_slice,
            slice_b: per_slice,
        }
    }
}

/// Resolve an `--app-mode` value to its policy, `None` for unknown modes.
pub fn policy_for_mode(mode: u8) -> Option<Box<dyn AllocationPolicy>> {
    match mode {
        1 => Some(Box::new(ProportionalPolicy)),
        2 => Some(Box::new(EvenSplitPolicy)),
        _ => None,
    }
}

/// Divide an integer PRB quota across the UEs of one slice.
///
/// Floor-even split; the remainder is handed out one PRB each to the first
/// `quota % ue_count` UEs. Deterministic, sums to exactly `quota`, and an
/// empty slice yields an empty split instead of a division by zero.
pub fn split_across_ues(quota: u32, ue_count: u32) -> Vec<u32> {
    if ue_count == 0 {
        return Vec::new();
    }
    let base = quota / ue_count;
    let remainder = quota % ue_count;
    (0..ue_count)
        .map(|i| base + u32::from(i < remainder))
        .collect()
}
