//! KPM-driven PRB slicing xApp.
//!
//! Each xApp instance runs an independent 1-second control loop: it tracks
//! the UE population reported by the E2SM-KPM subscription, computes
//! per-slice PRB quotas through its allocation policy, splits each quota
//! fairly across the slice's UEs, records every decision in its ledger, and
//! dispatches the matching slice-level PRB quota control request.
//!
//! Before every actuation the engine consults its CMF block marker; a raised
//! marker suppresses the whole cycle. The marker is re-checked each cycle,
//! so clearing it externally resumes control automatically.

pub mod allocation;
pub mod config;
pub mod context;
pub mod control;
pub mod engine;
pub mod measurement;
pub mod roster;

pub use allocation::{policy_for_mode, AllocationInput, AllocationPolicy, SliceQuotas};
pub use config::EngineConfig;
pub use engine::AllocationEngine;
