//! RIC control dispatch boundary (E2SM-RC slice-level PRB quota).
//!
//! The engine treats dispatch as fire-and-forget: no return value is
//! consulted, failures are logged and the loop continues. The real E2
//! termination lives in the hosting RIC SDK; `LogOnlyControl` stands at that
//! boundary.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::roster::Ue;

/// Error type for control dispatch
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control dispatch failed: {0}")]
    Dispatch(String),
}

/// One slice-level PRB quota control request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrbQuotaRequest {
    pub node_id: String,
    pub ue_id: u32,
    pub min_prb_ratio: u32,
    pub max_prb_ratio: u32,
    pub dedicated_prb_ratio: u32,
    pub ack_request: u8,
    pub sst: u8,
    pub sd: u32,
}

impl PrbQuotaRequest {
    /// Pin a UE to exactly `share` PRBs: the share is used as both the
    /// minimum and maximum ratio, with the dedicated ceiling fixed at 100.
    pub fn fixed_share(node_id: &str, ue: &Ue, share: u32) -> Self {
        Self {
            node_id: node_id.to_string(),
            ue_id: ue.id,
            min_prb_ratio: share,
            max_prb_ratio: share,
            dedicated_prb_ratio: 100,
            ack_request: 1,
            sst: ue.sst,
            sd: ue.sd,
        }
    }
}

/// Seam for the RIC control service.
#[async_trait]
pub trait SliceControl: Send + Sync {
    async fn slice_level_prb_quota(&self, request: &PrbQuotaRequest) -> Result<(), ControlError>;
}

/// Logs each request and succeeds; used where no E2 termination is wired.
pub struct LogOnlyControl;

#[async_trait]
impl SliceControl for LogOnlyControl {
    async fn slice_level_prb_quota(&self, request: &PrbQuotaRequest) -> Result<(), ControlError> {
        info!(
            node_id = %request.node_id,
            ue_id = request.ue_id,
            sd = request.sd,
            prb = request.min_prb_ratio,
            "RIC control request: slice-level PRB quota"
        );
        Ok(())
    }
}
