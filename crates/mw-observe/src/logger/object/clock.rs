use std::fmt;

use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

use crate::logger::object::timezone::{LoggerTimeZone, local_offset};

/// RFC3339 timestamp formatter.
///
/// In local mode the cached offset is read on every line, so a DST change picked up by the
/// timezone sync task shows up without reinstalling the subscriber.
#[derive(Debug, Clone, Copy)]
pub struct LogClock {
    tz: LoggerTimeZone,
}

impl LogClock {
    pub fn new(tz: LoggerTimeZone) -> Self {
        Self { tz }
    }

    fn offset(&self) -> UtcOffset {
        match self.tz {
            LoggerTimeZone::Utc => UtcOffset::UTC,
            LoggerTimeZone::Local => local_offset(),
        }
    }
}

impl FormatTime for LogClock {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = OffsetDateTime::now_utc().to_offset(self.offset());
        match now.format(&Rfc3339) {
            Ok(ts) => write!(w, "{ts} "),
            Err(_) => w.write_str("<invalid-time> "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_clock_writes_rfc3339_with_z() {
        let mut out = String::new();
        LogClock::new(LoggerTimeZone::Utc)
            .format_time(&mut Writer::new(&mut out))
            .unwrap();

        let ts = out.trim_end();
        assert!(ts.ends_with('Z'), "unexpected timestamp {ts}");
        assert_eq!(ts.as_bytes()[10], b'T');
    }
}
