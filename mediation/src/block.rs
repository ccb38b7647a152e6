//! Durable per-xApp block marker.
//!
//! A zero-length file whose existence is the entire signal. Only the mediator
//! raises it; the allocation engine re-checks it every cycle, so removing the
//! marker (an operator action) resumes the xApp within one polling interval.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

/// Error type for block marker operations
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block marker I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle on one xApp's block marker file.
#[derive(Debug, Clone)]
pub struct BlockSignal {
    path: PathBuf,
}

impl BlockSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the marker. Idempotent: returns `Ok(true)` when the marker was
    /// newly created and `Ok(false)` when it already existed.
    pub fn raise(&self) -> Result<bool, BlockError> {
        if self.path.exists() {
            return Ok(false);
        }
        std::fs::File::create(&self.path)?;
        Ok(true)
    }

    /// Whether the marker currently exists.
    ///
    /// A failed existence check is treated as not-blocked: a transient
    /// filesystem error must not suppress an xApp on its own.
    pub fn is_raised(&self) -> bool {
        match std::fs::metadata(&self.path) {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "block marker check failed, treating as not blocked"
                );
                false
            }
        }
    }

    /// Remove the marker. The mediator never calls this; it is the external
    /// release path for operators and tests.
    pub fn clear(&self) -> Result<(), BlockError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
