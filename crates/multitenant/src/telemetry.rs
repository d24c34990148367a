//! Best-effort reporting of unscoped reads.
//!
//! Reports go to a [`ViolationSink`]. A failing or panicking sink never
//! changes the outcome of the read being reported: its failure is caught
//! around the sink call and discarded.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, trace, warn};

use crate::context::WorkOrigin;

/// A read of a bound entity type with no active tenant and no override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnscopedRead {
    /// The entity type being queried.
    pub entity_type: String,
    /// Where the unit of work came from.
    pub origin: WorkOrigin,
    /// `true` if the read is being rejected.
    pub denied: bool,
}

/// Error returned by a sink that could not record a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError(pub String);

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "violation sink failed: {}", self.0)
    }
}

impl std::error::Error for SinkError {}

/// Destination for policy violation reports.
pub trait ViolationSink: Send + Sync {
    /// Records one unscoped read.
    fn report(&self, violation: &UnscopedRead) -> Result<(), SinkError>;
}

/// Reports violations through `tracing`.
///
/// Denied reads are logged at `error`, tolerated ones at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ViolationSink for TracingSink {
    fn report(&self, violation: &UnscopedRead) -> Result<(), SinkError> {
        if violation.denied {
            error!(
                entity_type = %violation.entity_type,
                origin = violation.origin.label(),
                queue = violation.origin.queue().unwrap_or_default(),
                "Unscoped background read of tenant data rejected"
            );
        } else {
            warn!(
                entity_type = %violation.entity_type,
                origin = %violation.origin,
                "Tenant data read without a current tenant"
            );
        }
        Ok(())
    }
}

/// Calls the sink, discarding any error or panic it raises.
pub fn report_best_effort(sink: &dyn ViolationSink, violation: &UnscopedRead) {
    match panic::catch_unwind(AssertUnwindSafe(|| sink.report(violation))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => trace!(error = %err, "Discarded violation sink error"),
        Err(_) => trace!("Discarded violation sink panic"),
    }
}

/// Decides which tolerated reads get reported.
///
/// `every = 1` reports all of them, `every = n` every n-th, `every = 0` none.
#[derive(Debug)]
pub struct Sampler {
    every: u32,
    seen: AtomicU64,
}

impl Sampler {
    /// Creates a sampler reporting one read out of `every`.
    pub fn new(every: u32) -> Self {
        Self {
            every,
            seen: AtomicU64::new(0),
        }
    }

    /// Counts one occurrence and returns `true` if it should be reported.
    pub fn should_report(&self) -> bool {
        if self.every == 0 {
            return false;
        }
        let n = self.seen.fetch_add(1, Ordering::Relaxed);
        n % u64::from(self.every) == 0
    }
}
