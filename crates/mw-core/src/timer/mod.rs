//! Autonomous rotation timer.
//!
//! Two independent deadlines are tracked against wall-clock time:
//! - the steady-state tick, first aligned to the next interval boundary and then repeating
//!   every interval;
//! - the drift check, on its own fixed period, which re-derives the index from scratch.
//!
//! The timer never sleeps itself; the runtime sleeps until [`EpochTimer::next_deadline`] and
//! then calls [`EpochTimer::poll`].
mod epoch;
pub use epoch::{Epoch, delay_to_next_boundary, global_index, normalize_interval};

use mw_model::EpochMs;
use tracing::trace;

/// Default period of the drift check.
pub const DEFAULT_DRIFT_CHECK_MS: u64 = 5_000;

/// Which deadline fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFire {
    Tick,
    DriftCheck,
}

#[derive(Debug, Clone)]
pub struct EpochTimer {
    epoch: Option<Epoch>,
    next_tick: Option<EpochMs>,
    next_drift: Option<EpochMs>,
    drift_period_ms: u64,
}

impl EpochTimer {
    pub fn new(drift_period_ms: u64) -> Self {
        Self {
            epoch: None,
            next_tick: None,
            next_drift: None,
            drift_period_ms: drift_period_ms.max(1),
        }
    }

    /// Start (or restart) both timers for `epoch`.
    pub fn arm(&mut self, epoch: Epoch, now: EpochMs) {
        let first_tick = epoch.next_boundary(now);
        trace!(
            start_time = epoch.start_time,
            interval_ms = epoch.interval_ms,
            delay_ms = first_tick - now,
            "timer armed"
        );
        self.epoch = Some(epoch);
        self.next_tick = Some(first_tick);
        self.next_drift = Some(now.saturating_add(self.drift_period_ms));
    }

    /// Cancel both timers. Returns `true` if anything was armed.
    pub fn disarm(&mut self) -> bool {
        let was_armed = self.epoch.is_some();
        self.epoch = None;
        self.next_tick = None;
        self.next_drift = None;
        was_armed
    }

    pub fn is_armed(&self) -> bool {
        self.epoch.is_some()
    }

    pub fn epoch(&self) -> Option<Epoch> {
        self.epoch
    }

    /// Earliest pending deadline, `None` when disarmed.
    pub fn next_deadline(&self) -> Option<EpochMs> {
        match (self.next_tick, self.next_drift) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Pop one due deadline and reschedule it.
    ///
    /// Call repeatedly until it returns `None`. Missed ticks are coalesced into one while
    /// keeping the boundary phase.
    pub fn poll(&mut self, now: EpochMs) -> Option<TimerFire> {
        let epoch = self.epoch?;
        let tick_due = self.next_tick.filter(|t| *t <= now);
        let drift_due = self.next_drift.filter(|t| *t <= now);

        match (tick_due, drift_due) {
            (Some(tick), drift) if drift.is_none_or(|d| tick <= d) => {
                let interval = epoch.interval_ms;
                let missed = (now - tick) / interval;
                let step = missed.saturating_add(1).saturating_mul(interval);
                self.next_tick = Some(tick.saturating_add(step));
                Some(TimerFire::Tick)
            }
            (_, Some(_)) => {
                self.next_drift = Some(now.saturating_add(self.drift_period_ms));
                Some(TimerFire::DriftCheck)
            }
            _ => None,
        }
    }
}

impl Default for EpochTimer {
    fn default() -> Self {
        Self::new(DEFAULT_DRIFT_CHECK_MS)
    }
}
