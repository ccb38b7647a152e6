//! Conflict Mediation Function (CMF) library
//!
//! This library provides the shared coordination layer for RAN slicing xApps:
//! - An append-only **decision ledger** per xApp, recording every control
//!   decision it issued
//! - A durable **block signal** per xApp that suppresses further control
//!   decisions once raised
//! - Pairwise **conflict detection** between the two xApps' recent decisions
//! - The **mediator** polling loop that ties the three together
//!
//! The xApps and the CMF run as independent processes with no shared memory;
//! they rendezvous exclusively through the ledger files and block markers on
//! a common filesystem. The mediator's sliding detection window (not mutual
//! exclusion) is the correctness mechanism.
//!
//! # Usage
//!
//! ```bash
//! # Run the CMF against ledgers in the current directory
//! cmf
//!
//! # Custom data directory and detection window
//! cmf --data-dir /var/lib/xapps --time-threshold 10
//! ```

pub mod block;
pub mod conflict;
pub mod ledger;
pub mod mediator;
pub mod metrics;

pub use block::BlockSignal;
pub use conflict::{detect_conflicts, Conflict};
pub use ledger::{DecisionLedger, DecisionRecord};
pub use mediator::{Mediator, MediatorConfig};
