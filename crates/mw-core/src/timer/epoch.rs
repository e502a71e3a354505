//! Pure epoch arithmetic.
//!
//! The rotation phase is never counted locally; it is re-derived from wall-clock time
//! against a shared origin every time it is needed.
use mw_model::{DEFAULT_INTERVAL_MS, EpochMs, IntervalMs};

/// Substitute the default for a zero interval.
#[inline]
pub fn normalize_interval(interval_ms: IntervalMs) -> IntervalMs {
    if interval_ms == 0 {
        DEFAULT_INTERVAL_MS
    } else {
        interval_ms
    }
}

/// `floor((now - start_time) / interval_ms)`, negative before the epoch.
///
/// Computed in `i128` so any `u64` pair is valid; the result saturates at the `i64` range.
pub fn global_index(start_time: EpochMs, interval_ms: IntervalMs, now: EpochMs) -> i64 {
    let index = elapsed(start_time, now).div_euclid(normalize_interval(interval_ms) as i128);
    i64::try_from(index).unwrap_or(if index < 0 { i64::MIN } else { i64::MAX })
}

/// Milliseconds until the next interval boundary, in `(0, interval_ms]`.
pub fn delay_to_next_boundary(start_time: EpochMs, interval_ms: IntervalMs, now: EpochMs) -> u64 {
    let interval = normalize_interval(interval_ms) as i128;
    // Always in (0, interval], so it fits back into u64.
    (interval - elapsed(start_time, now).rem_euclid(interval)) as u64
}

#[inline]
fn elapsed(start_time: EpochMs, now: EpochMs) -> i128 {
    now as i128 - start_time as i128
}

/// Shared epoch of a group: origin plus interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch {
    pub start_time: EpochMs,
    pub interval_ms: IntervalMs,
}

impl Epoch {
    pub fn new(start_time: EpochMs, interval_ms: IntervalMs) -> Self {
        Self {
            start_time,
            interval_ms: normalize_interval(interval_ms),
        }
    }

    /// Epoch placing `index` at `now`, for publishers that only send a start index.
    pub fn anchored(index: u64, interval_ms: IntervalMs, now: EpochMs) -> Self {
        let interval = normalize_interval(interval_ms);
        let back = index.saturating_mul(interval);
        Self::new(now.saturating_sub(back), interval)
    }

    pub fn index_at(&self, now: EpochMs) -> i64 {
        global_index(self.start_time, self.interval_ms, now)
    }

    pub fn next_boundary(&self, now: EpochMs) -> EpochMs {
        now.saturating_add(delay_to_next_boundary(self.start_time, self.interval_ms, now))
    }
}
