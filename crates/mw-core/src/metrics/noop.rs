use crate::metrics::backend::{EnvelopeOutcome, MetricsBackend};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_envelope(&self, _: &str, _: EnvelopeOutcome) {}

    #[inline(always)]
    fn record_transition(&self) {}

    #[inline(always)]
    fn record_drift_correction(&self, _: u64) {}

    #[inline(always)]
    fn record_publish_failure(&self, _: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpMetrics>(), 0);
    }

    #[test]
    fn noop_can_be_called_repeatedly() {
        let metrics = NoOpMetrics;
        for _ in 0..1000 {
            metrics.record_envelope("screen", EnvelopeOutcome::Stale);
            metrics.record_transition();
            metrics.record_drift_correction(3);
            metrics.record_publish_failure("local");
        }
    }
}
