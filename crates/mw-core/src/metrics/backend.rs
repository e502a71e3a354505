use std::sync::Arc;

/// What happened to one inbound envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeOutcome {
    /// Accepted and applied.
    Accepted,
    /// At or below the high-water mark.
    Stale,
    /// Published by the receiver itself.
    SelfEcho,
    /// Could not be decoded.
    Malformed,
    /// Decoded but not meant for this receiver (wrong target or message type).
    Ignored,
}

impl EnvelopeOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            EnvelopeOutcome::Accepted => "accepted",
            EnvelopeOutcome::Stale => "stale",
            EnvelopeOutcome::SelfEcho => "self_echo",
            EnvelopeOutcome::Malformed => "malformed",
            EnvelopeOutcome::Ignored => "ignored",
        }
    }
}

/// Backend metrics collection interface.
///
/// Implementations are handed to screens and controllers as a [`MetricsHandle`].
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record one inbound envelope.
    ///
    /// # Arguments
    /// - `role`: receiver kind (`screen` or `controller`)
    /// - `outcome`: sequencer / decode verdict
    fn record_envelope(&self, role: &str, outcome: EnvelopeOutcome);
    /// Record the start of an animated transition.
    fn record_transition(&self);
    /// Record a drift check that had to correct the displayed index.
    fn record_drift_correction(&self, skipped: u64);
    /// Record a failed publish.
    ///
    /// # Arguments
    /// - `transport`: transport name
    fn record_publish_failure(&self, transport: &str);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
