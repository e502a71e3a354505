use std::{
    fmt,
    str::FromStr,
    sync::{OnceLock, RwLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::UtcOffset;
use tracing::debug;

use crate::logger::LoggerError;

/// Cached local offset; `time` refuses to detect it once the process is multi-threaded.
static LOCAL_OFFSET: RwLock<UtcOffset> = RwLock::new(UtcOffset::UTC);

/// Set once the cache holds a detected (or explicitly initialized) value.
static DETECTED: OnceLock<()> = OnceLock::new();

/// Timezone of log timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggerTimeZone {
    #[default]
    Utc,
    Local,
}

impl FromStr for LoggerTimeZone {
    type Err = LoggerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(LoggerError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl fmt::Display for LoggerTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoggerTimeZone::Utc => "utc",
            LoggerTimeZone::Local => "local",
        })
    }
}

impl Serialize for LoggerTimeZone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LoggerTimeZone {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Detect the local offset while the process is still single-threaded.
///
/// Call from `main()` before building the tokio runtime. Falls back to UTC.
pub fn init_local_offset() {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    store(offset);
    let _ = DETECTED.set(());
}

/// Re-detect the local offset; a no-op where detection is not possible.
#[cfg_attr(not(feature = "timezone-sync"), allow(dead_code))]
pub(crate) fn sync_local_offset() {
    let Ok(fresh) = UtcOffset::current_local_offset() else {
        debug!("timezone re-detection unavailable in this context");
        return;
    };
    let previous = local_offset();
    if previous != fresh {
        store(fresh);
        debug!(
            from = %format_offset(previous),
            to = %format_offset(fresh),
            "local timezone offset changed"
        );
    }
}

/// Offset used for local timestamps.
pub(crate) fn local_offset() -> UtcOffset {
    DETECTED.get_or_init(|| {
        if let Ok(offset) = UtcOffset::current_local_offset() {
            store(offset);
        }
    });
    LOCAL_OFFSET.read().map(|g| *g).unwrap_or(UtcOffset::UTC)
}

fn store(offset: UtcOffset) {
    if let Ok(mut guard) = LOCAL_OFFSET.write() {
        *guard = offset;
    }
}

/// `UTC±HH` or `UTC±HH:MM`.
fn format_offset(offset: UtcOffset) -> String {
    let (h, m, _) = offset.as_hms();
    let sign = if offset.is_negative() { '-' } else { '+' };
    if m == 0 {
        format!("UTC{sign}{:02}", h.unsigned_abs())
    } else {
        format!("UTC{sign}{:02}:{:02}", h.unsigned_abs(), m.unsigned_abs())
    }
}
