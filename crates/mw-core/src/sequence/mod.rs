//! Envelope sequencing.
//!
//! Publishers stamp envelopes with a [`SequenceClock`]; receivers run every inbound envelope
//! through a [`Sequencer`] that discards duplicates and reordered stale deliveries.
//!
//! Sequence values are a per-session logical clock derived from wall-clock milliseconds.
//! There is no global sequence authority, so cross-session comparisons only hold as well as
//! the publishers' clocks agree.
mod filter;
pub use filter::{AdoptionPolicy, Sequencer, Verdict};

use mw_model::{EpochMs, Sequence};

/// Process-local generator of strictly increasing sequence numbers.
///
/// Yields the current wall-clock millisecond, or the previous value plus one when the clock
/// has not moved past it (same millisecond, or a clock step backwards).
#[derive(Debug, Clone, Default)]
pub struct SequenceClock {
    last: Sequence,
}

impl SequenceClock {
    pub fn new() -> Self {
        Self { last: 0 }
    }

    pub fn next(&mut self, now: EpochMs) -> Sequence {
        self.last = if now <= self.last { self.last.saturating_add(1) } else { now };
        self.last
    }

    pub fn last(&self) -> Sequence {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::SequenceClock;

    #[test]
    fn follows_wall_clock_when_it_moves() {
        let mut seq = SequenceClock::new();
        assert_eq!(seq.next(1_000), 1_000);
        assert_eq!(seq.next(1_500), 1_500);
    }

    #[test]
    fn bumps_by_one_within_the_same_millisecond() {
        let mut seq = SequenceClock::new();
        assert_eq!(seq.next(1_000), 1_000);
        assert_eq!(seq.next(1_000), 1_001);
        assert_eq!(seq.next(1_000), 1_002);
        assert_eq!(seq.next(1_001), 1_003);
        assert_eq!(seq.next(1_010), 1_010);
    }

    #[test]
    fn never_regresses_when_clock_steps_back() {
        let mut seq = SequenceClock::new();
        seq.next(5_000);
        assert_eq!(seq.next(4_000), 5_001);
    }
}
