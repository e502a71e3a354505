use std::sync::Arc;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use mw_core::{EnvelopeOutcome, MetricsBackend};

const NAMESPACE: &str = "multiwall";

/// Prometheus-backed [`MetricsBackend`].
///
/// Every label is low cardinality: `role` is `screen` or `controller`, `outcome` one of the
/// [`EnvelopeOutcome`] labels, `transport` the transport name.
#[derive(Clone)]
pub struct PrometheusMetrics {
    envelopes: IntCounterVec,
    transitions: IntCounter,
    drift_corrections: IntCounter,
    drift_skipped: Histogram,
    publish_failures: IntCounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let envelopes = IntCounterVec::new(
            Opts::new("envelopes_total", "Inbound envelopes by receiver role and verdict")
                .namespace(NAMESPACE),
            &["role", "outcome"],
        )?;
        registry.register(Box::new(envelopes.clone()))?;

        let transitions = IntCounter::with_opts(
            Opts::new("transitions_total", "Animated rotation transitions started")
                .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(transitions.clone()))?;

        let drift_corrections = IntCounter::with_opts(
            Opts::new(
                "drift_corrections_total",
                "Drift checks that had to re-render the displayed index",
            )
            .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(drift_corrections.clone()))?;

        let drift_skipped = Histogram::with_opts(
            HistogramOpts::new(
                "drift_skipped_indices",
                "Distance between displayed and derived index at correction time",
            )
            .namespace(NAMESPACE)
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 100.0, 1000.0]),
        )?;
        registry.register(Box::new(drift_skipped.clone()))?;

        let publish_failures = IntCounterVec::new(
            Opts::new("publish_failures_total", "Envelopes the transport refused")
                .namespace(NAMESPACE),
            &["transport"],
        )?;
        registry.register(Box::new(publish_failures.clone()))?;

        Ok(Self {
            envelopes,
            transitions,
            drift_corrections,
            drift_skipped,
            publish_failures,
            registry,
        })
    }

    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_envelope(&self, role: &str, outcome: EnvelopeOutcome) {
        self.envelopes
            .with_label_values(&[role, outcome.as_label()])
            .inc();
    }

    fn record_transition(&self) {
        self.transitions.inc();
    }

    fn record_drift_correction(&self, skipped: u64) {
        self.drift_corrections.inc();
        self.drift_skipped.observe(skipped as f64);
    }

    fn record_publish_failure(&self, transport: &str) {
        self.publish_failures.with_label_values(&[transport]).inc();
    }
}
