//! Error codes, the error channel, and cooperative cancellation.
//!
//! Every call can fail locally (returning a code to the caller) and
//! every failure also latches a process-wide sticky flag that prevents
//! new client callbacks once tripped. [`GraphError`] is the typed
//! leaf; call boundaries still return `anyhow::Result` so callers can
//! use `?` freely.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use thiserror::Error;

/// Discrete error codes reported across the public API.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    #[error("no lanes: the engine was asked to run with zero worker lanes")]
    NoLanes,
    #[error("callback missing: a plan is missing a callback its enabled phases require")]
    CallbackMissing,
    #[error("out of memory")]
    OutOfMemory,
    #[error("overflow: a queue or counter exceeded its representable range")]
    Overflow,
    #[error("contract violation")]
    ContractViolation,
    #[error("cancelled: the killswitch was set")]
    Cancelled,
    #[error("allocation limit reached")]
    AllocationLimit,
    #[error("client callback reported error code {0}")]
    ClientReported(i32),
}

impl GraphError {
    /// Numeric code matching the taxonomy, stable across releases.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            GraphError::NoLanes => 1,
            GraphError::CallbackMissing => 2,
            GraphError::OutOfMemory => 3,
            GraphError::Overflow => 4,
            GraphError::ContractViolation => 5,
            GraphError::Cancelled => 6,
            GraphError::AllocationLimit => 7,
            GraphError::ClientReported(_) => 8,
        }
    }

    /// Human-readable rendering of this error code.
    #[must_use]
    pub fn strerror(self) -> String {
        self.to_string()
    }
}

/// Per-call status plus a process-wide sticky code.
///
/// Once either is non-zero the engine makes no new callbacks into the
/// client, completes only reclamation, and returns. The sticky flag is
/// global so a transformation started after a failed one on the same
/// channel also refuses to run.
#[derive(Default)]
pub struct ErrorChannel {
    sticky: AtomicU32,
}

impl fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorChannel")
            .field("sticky", &self.sticky.load(Ordering::Relaxed))
            .finish()
    }
}

impl ErrorChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch an error code. Does not overwrite an existing sticky code;
    /// the first failure wins.
    pub fn set(&self, err: GraphError) {
        self.sticky
            .compare_exchange(0, err.code(), Ordering::AcqRel, Ordering::Acquire)
            .ok();
    }

    /// True once any lane has reported an error.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.sticky.load(Ordering::Acquire) != 0
    }

    #[must_use]
    pub fn code(&self) -> u32 {
        self.sticky.load(Ordering::Acquire)
    }
}

/// Externally-writable cooperative cancellation flag.
///
/// Polled by every worker at the start of a task and after completing
/// each vertex visit. Cancellation never interrupts an in-flight
/// callback.
#[derive(Default)]
pub struct Killswitch {
    tripped: AtomicBool,
}

impl Killswitch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trip(&self) {
        self.tripped.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticky_latches_first_error_only() {
        let ch = ErrorChannel::new();
        ch.set(GraphError::NoLanes);
        ch.set(GraphError::Cancelled);
        assert_eq!(ch.code(), GraphError::NoLanes.code());
        assert!(ch.is_tripped());
    }

    #[test]
    fn killswitch_round_trips() {
        let k = Killswitch::new();
        assert!(!k.is_tripped());
        k.trip();
        assert!(k.is_tripped());
    }
}
