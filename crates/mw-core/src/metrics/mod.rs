//! Metrics collection abstraction for screens and controllers.
//!
//! Backends (prometheus, ...) implement [`MetricsBackend`] and are injected at construction.
mod backend;
pub use backend::{EnvelopeOutcome, MetricsBackend, MetricsHandle};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
