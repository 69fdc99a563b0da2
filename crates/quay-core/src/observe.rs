//! Optional metrics instrumentation for quay.
//!
//! When the `observe` feature is enabled, queue operations emit counters and
//! histograms via the [`metrics`] crate. A downstream application must install
//! a metrics recorder to collect the data.
//!
//! Without the feature every function in this module is a zero-cost no-op.

use crate::keys::Position;

/// Record a push at one end of a sequence.
///
/// - `quay.sequence.pushes_total` – counter with `position` label
#[inline]
pub fn record_push(position: Position) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("quay.sequence.pushes_total", "position" => position.as_str())
            .increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = position;
    }
}

/// Record a successful pop.
///
/// - `quay.sequence.pops_total` – counter with `position` label
#[inline]
pub fn record_pop(position: Position) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("quay.sequence.pops_total", "position" => position.as_str())
            .increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = position;
    }
}

/// Record a blocking pop that found its bucket empty and started waiting.
///
/// - `quay.session.waits_total` – counter
#[inline]
pub fn record_blocked_wait() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("quay.session.waits_total").increment(1);
    }
}

/// Record how long a blocking pop waited before it found a value.
///
/// - `quay.session.wait_duration_seconds` – histogram
#[inline]
pub fn record_wait(duration: std::time::Duration) {
    #[cfg(feature = "observe")]
    {
        metrics::histogram!("quay.session.wait_duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = duration;
    }
}

/// Record work handed to a waiting transaction instead of opening a new one.
///
/// - `quay.session.handoffs_total` – counter with `outcome` label
#[inline]
pub fn record_handoff(committed: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if committed { "committed" } else { "rolled_back" };
        metrics::counter!("quay.session.handoffs_total", "outcome" => outcome).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = committed;
    }
}
