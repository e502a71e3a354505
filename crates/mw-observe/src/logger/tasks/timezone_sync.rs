//! Periodic re-detection of the local timezone offset.
//!
//! Keeps local log timestamps right across DST changes in long-running processes.
//! Requires [`init_local_offset`](crate::init_local_offset) in `main()` before the runtime starts.
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::logger::object::timezone::sync_local_offset;

/// Delay between two re-detections.
pub const TZ_SYNC_PERIOD: Duration = Duration::from_secs(3_600);

/// Run until `cancel` fires, re-detecting the offset every `period`.
pub async fn timezone_sync(period: Duration, cancel: CancellationToken) {
    debug!(period_s = period.as_secs(), "timezone sync started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(period) => sync_local_offset(),
        }
    }
    debug!("timezone sync stopped");
}
