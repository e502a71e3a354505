//! Prometheus metrics backend for the wall engine.
//!
//! [`PrometheusMetrics`] implements [`mw_core::MetricsBackend`]; hand it to screens and
//! controllers as a `MetricsHandle` and expose [`PrometheusMetrics::encode_text`] on an
//! HTTP route.
//!
//! ```rust
//! use std::sync::Arc;
//! use mw_core::MetricsHandle;
//! use mw_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: MetricsHandle = Arc::new(metrics.clone());
//! handle.record_transition();
//! assert!(metrics.encode_text()?.contains("multiwall_transitions_total 1"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `multiwall_envelopes_total{role, outcome}` - Counter
//! - `multiwall_transitions_total` - Counter
//! - `multiwall_drift_corrections_total` - Counter
//! - `multiwall_drift_skipped_indices` - Histogram
//! - `multiwall_publish_failures_total{transport}` - Counter
mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
